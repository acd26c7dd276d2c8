use crate::config::{FlowConfig, InputKind, QuestionSpec, QuestionTag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Widget {
    Text { prefill: Option<String> },
    DaySelector,
    TimeSelector,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub tag: QuestionTag,
    pub widget: Widget,
}

impl Detection {
    fn free_form() -> Self {
        Self {
            tag: QuestionTag::FreeForm,
            widget: Widget::Text { prefill: None },
        }
    }

    fn for_question(question: &QuestionSpec) -> Self {
        let widget = match question.input {
            InputKind::Text => Widget::Text {
                prefill: question.prefill.clone(),
            },
            InputKind::DaySelector => Widget::DaySelector,
            InputKind::TimeSelector => Widget::TimeSelector,
        };
        Self {
            tag: question.tag,
            widget,
        }
    }
}

/// Decides which question a bot reply asks. An explicit tag from the relay
/// wins; otherwise the first question in the flow's detection order whose
/// anchor occurs in the text; otherwise free-form.
pub fn detect_question(flow: &FlowConfig, text: &str, explicit: Option<QuestionTag>) -> Detection {
    if let Some(tag) = explicit {
        return match flow.question(tag) {
            Some(question) => Detection::for_question(question),
            None => Detection::free_form(),
        };
    }

    flow.detection_order()
        .into_iter()
        .find(|q| !q.anchor.is_empty() && text.contains(q.anchor.as_str()))
        .map(Detection::for_question)
        .unwrap_or_else(Detection::free_form)
}
