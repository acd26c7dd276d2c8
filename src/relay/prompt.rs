use std::fmt::Write;

use crate::config::FlowConfig;
use crate::relay::extract::{DATA_CLOSE, DATA_OPEN};

/// The instruction placed ahead of every conversation. A literal
/// `system_prompt` on the flow is used as-is.
pub fn build_system_prompt(flow: &FlowConfig) -> String {
    if let Some(prompt) = &flow.system_prompt {
        return prompt.clone();
    }

    let mut prompt = String::new();
    let _ = writeln!(prompt, "{}", flow.intro.trim());
    let _ = writeln!(
        prompt,
        "\nAsk the following questions in order, one at a time, only moving on after the user responds:\n"
    );
    for (i, question) in flow.questions.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", i + 1, question.prompt);
    }

    let _ = writeln!(
        prompt,
        "\nAfter collecting all the answers, thank the user warmly and say exactly the following message:\n\n\"{}\"",
        flow.closing_message
    );

    if let Some(url) = &flow.button_url {
        let _ = writeln!(
            prompt,
            "\nRight after that closing message, add this token on its own line: [SHOW_BUTTON:{}]",
            url
        );
    }

    if flow.tag_questions {
        let _ = writeln!(
            prompt,
            "\nWhenever your reply asks one of the questions above, end it with the marker of that \
             question on its own line. Never add a marker to any other reply. Markers:"
        );
        for (i, question) in flow.questions.iter().enumerate() {
            let _ = writeln!(prompt, "{}. [QUESTION:{}]", i + 1, question.tag);
        }
    }

    if flow.structured_data {
        let shape: Vec<String> = flow
            .data_fields()
            .iter()
            .map(|f| format!("\"{}\": \"...\"", f.column()))
            .collect();
        let _ = writeln!(
            prompt,
            "\nFinally, return all the collected information as JSON wrapped in {} tags, exactly in this format:\n\n{}\n{{\n{}\n}}\n{}",
            DATA_OPEN,
            DATA_OPEN,
            shape.join(",\n"),
            DATA_CLOSE
        );
        let _ = writeln!(
            prompt,
            "\nIf the user refuses to answer something or skips a question, use null for that field."
        );
    }

    let _ = write!(prompt, "\nKeep the conversation friendly throughout.");
    prompt
}
