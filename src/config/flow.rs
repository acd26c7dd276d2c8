//! Questionnaire definitions.
//!
//! A flow is the single description of a deployment's conversation: the
//! ordered questions (with the phrase that betrays each one in bot text and
//! the widget used to answer it), the split anchors, the closing message and
//! who persists the answers. The relay builds its system prompt from it and
//! the client uses it to interpret bot replies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::models::Field;

/// The client's belief about which answer the next user message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionTag {
    Name,
    /// Email or phone, whichever the visitor offers.
    Contact,
    Email,
    Linkedin,
    Motivation,
    AvailableDays,
    PreferredTime,
    Age,
    About,
    Goal,
    AppExperience,
    AiExperience,
    UnavailableDays,
    ReferralSource,
    FreeForm,
}

impl QuestionTag {
    pub const ALL: [QuestionTag; 15] = [
        QuestionTag::Name,
        QuestionTag::Contact,
        QuestionTag::Email,
        QuestionTag::Linkedin,
        QuestionTag::Motivation,
        QuestionTag::AvailableDays,
        QuestionTag::PreferredTime,
        QuestionTag::Age,
        QuestionTag::About,
        QuestionTag::Goal,
        QuestionTag::AppExperience,
        QuestionTag::AiExperience,
        QuestionTag::UnavailableDays,
        QuestionTag::ReferralSource,
        QuestionTag::FreeForm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionTag::Name => "name",
            QuestionTag::Contact => "contact",
            QuestionTag::Email => "email",
            QuestionTag::Linkedin => "linkedin",
            QuestionTag::Motivation => "motivation",
            QuestionTag::AvailableDays => "available_days",
            QuestionTag::PreferredTime => "preferred_time",
            QuestionTag::Age => "age",
            QuestionTag::About => "about",
            QuestionTag::Goal => "goal",
            QuestionTag::AppExperience => "app_experience",
            QuestionTag::AiExperience => "ai_experience",
            QuestionTag::UnavailableDays => "unavailable_days",
            QuestionTag::ReferralSource => "referral_source",
            QuestionTag::FreeForm => "free_form",
        }
    }

    /// The column a plain answer to this question lands in. `Contact` is split
    /// between email and phone at capture time and `FreeForm` lands nowhere.
    pub fn field(self) -> Option<Field> {
        match self {
            QuestionTag::Name => Some(Field::Name),
            QuestionTag::Email => Some(Field::Email),
            QuestionTag::Linkedin => Some(Field::Linkedin),
            QuestionTag::Motivation => Some(Field::Motivation),
            QuestionTag::AvailableDays => Some(Field::AvailableDays),
            QuestionTag::PreferredTime => Some(Field::PreferredTime),
            QuestionTag::Age => Some(Field::Age),
            QuestionTag::About => Some(Field::About),
            QuestionTag::Goal => Some(Field::Goal),
            QuestionTag::AppExperience => Some(Field::AppExperience),
            QuestionTag::AiExperience => Some(Field::AiExperience),
            QuestionTag::UnavailableDays => Some(Field::UnavailableDays),
            QuestionTag::ReferralSource => Some(Field::ReferralSource),
            QuestionTag::Contact | QuestionTag::FreeForm => None,
        }
    }

    pub fn fields(self) -> Vec<Field> {
        match self {
            QuestionTag::Contact => vec![Field::Email, Field::Phone],
            other => other.field().into_iter().collect(),
        }
    }
}

impl fmt::Display for QuestionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionTag::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown question tag '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    #[default]
    Text,
    DaySelector,
    TimeSelector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub tag: QuestionTag,
    /// Wording handed to the model.
    pub prompt: String,
    /// Literal substring of bot text that means this question is being asked.
    pub anchor: String,
    #[serde(default)]
    pub input: InputKind,
    /// Text placed in the input box when the question is detected.
    #[serde(default)]
    pub prefill: Option<String>,
}

impl QuestionSpec {
    fn text(tag: QuestionTag, prompt: &str, anchor: &str) -> Self {
        Self {
            tag,
            prompt: prompt.to_string(),
            anchor: anchor.to_string(),
            input: InputKind::Text,
            prefill: None,
        }
    }

    fn with_input(mut self, input: InputKind) -> Self {
        self.input = input;
        self
    }

    fn with_prefill(mut self, prefill: &str) -> Self {
        self.prefill = Some(prefill.to_string());
        self
    }
}

/// Which side writes application records. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceOwner {
    #[default]
    Client,
    Relay,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistencePolicy {
    /// Insert on the first captured answer, update by id afterwards.
    #[default]
    Incremental,
    /// Insert one row once every question has been answered.
    CollectThenInsert,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub owner: PersistenceOwner,
    #[serde(default)]
    pub policy: PersistencePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub name: String,
    /// Role and tone paragraph at the top of the system prompt.
    pub intro: String,
    pub questions: Vec<QuestionSpec>,
    pub closing_message: String,
    /// Phrases at which one bot reply is broken into two transcript entries,
    /// tried in order.
    #[serde(default)]
    pub split_anchors: Vec<String>,
    /// Order in which question anchors are matched against a reply. Questions
    /// left out are tried afterwards in flow order; contact questions always
    /// come last unless listed.
    #[serde(default)]
    pub detect_priority: Vec<QuestionTag>,
    /// Shown when the opening call to the relay fails.
    pub fallback_opening: String,
    #[serde(default)]
    pub button_url: Option<String>,
    /// Ask the model for a trailing application data block.
    #[serde(default)]
    pub structured_data: bool,
    /// Ask the model to mark each question with `[QUESTION:<tag>]`.
    #[serde(default = "default_true")]
    pub tag_questions: bool,
    /// Literal system prompt; replaces the generated one.
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

fn default_true() -> bool {
    true
}

fn default_temperature() -> f32 {
    0.7
}

fn default_reveal_delay_ms() -> u64 {
    1000
}

pub const LINKEDIN_PREFIX: &str = "https://www.linkedin.com/in/";

const CLOSING: &str = "Thanks so much! Someone from our team will be in touch with next steps soon.";

impl FlowConfig {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "intake" => Some(Self::intake()),
            "bootcamp" => Some(Self::bootcamp()),
            _ => None,
        }
    }

    /// Reads a flow definition from a YAML/TOML/JSON file.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?
            .try_deserialize()
    }

    /// Six short questions answered through the chat widget, persisted by the
    /// client one answer at a time.
    pub fn intake() -> Self {
        Self {
            name: "intake".to_string(),
            intro: "You are a warm, upbeat assistant collecting applications for a 6-week \
                    in-person AI app-building bootcamp in Barcelona. Ask exactly one question \
                    per reply, acknowledge each answer in one short sentence and keep every \
                    reply brief."
                .to_string(),
            questions: vec![
                QuestionSpec::text(QuestionTag::Name, "What's your name?", "What's your name"),
                QuestionSpec::text(
                    QuestionTag::Linkedin,
                    "Could you share your LinkedIn profile?",
                    "share your LinkedIn",
                )
                .with_prefill(LINKEDIN_PREFIX),
                QuestionSpec::text(
                    QuestionTag::Contact,
                    "What's the best way to reach you? Please share your email or phone number.",
                    "email or phone",
                ),
                QuestionSpec::text(
                    QuestionTag::Motivation,
                    "Complete this sentence: \"I want to join the bootcamp because...\"",
                    "Complete this sentence",
                ),
                QuestionSpec::text(
                    QuestionTag::AvailableDays,
                    "Which days of the week are you available?",
                    "Which days of the week",
                )
                .with_input(InputKind::DaySelector),
                QuestionSpec::text(
                    QuestionTag::PreferredTime,
                    "What time of day works best for you?",
                    "What time of day",
                )
                .with_input(InputKind::TimeSelector),
            ],
            closing_message: CLOSING.to_string(),
            split_anchors: vec![
                "Could you share your LinkedIn".to_string(),
                "Complete this sentence".to_string(),
                "Thanks so much!".to_string(),
            ],
            detect_priority: vec![
                QuestionTag::Name,
                QuestionTag::Motivation,
                QuestionTag::Linkedin,
                QuestionTag::AvailableDays,
                QuestionTag::PreferredTime,
                QuestionTag::Contact,
            ],
            fallback_opening: "Hi there! I'm here to help you apply for the bootcamp. What's your name?"
                .to_string(),
            button_url: None,
            structured_data: false,
            tag_questions: true,
            system_prompt: None,
            temperature: default_temperature(),
            reveal_delay_ms: default_reveal_delay_ms(),
            persistence: PersistenceConfig {
                owner: PersistenceOwner::Client,
                policy: PersistencePolicy::Incremental,
            },
        }
    }

    /// Eleven-question variant whose answers come back from the model as one
    /// data block and are stored by the relay.
    pub fn bootcamp() -> Self {
        Self {
            name: "bootcamp".to_string(),
            intro: "You are a helpful and friendly assistant that collects information from \
                    candidates interested in attending a 6-week in-person bootcamp in Barcelona. \
                    Engage the visitor in a natural, conversational way, ask one question at a \
                    time and be warm, encouraging and supportive."
                .to_string(),
            questions: vec![
                QuestionSpec::text(QuestionTag::Age, "What's your age?", "your age"),
                QuestionSpec::text(QuestionTag::Email, "What's your email address?", "email address"),
                QuestionSpec::text(
                    QuestionTag::Linkedin,
                    "Can you share your LinkedIn profile? (optional)",
                    "LinkedIn profile",
                )
                .with_prefill(LINKEDIN_PREFIX),
                QuestionSpec::text(
                    QuestionTag::About,
                    "Tell me a bit about yourself. (background, interests, what you're doing now)",
                    "about yourself",
                ),
                QuestionSpec::text(
                    QuestionTag::Motivation,
                    "Why do you want to join this bootcamp?",
                    "Why do you want to join",
                ),
                QuestionSpec::text(
                    QuestionTag::Goal,
                    "What do you want to achieve by the end of the bootcamp?",
                    "want to achieve",
                ),
                QuestionSpec::text(
                    QuestionTag::AppExperience,
                    "How much experience do you have with building apps? (None / Beginner / Intermediate / Advanced)",
                    "building apps",
                ),
                QuestionSpec::text(
                    QuestionTag::AiExperience,
                    "How much experience do you have with AI tools? (None / Beginner / Intermediate / Advanced)",
                    "experience do you have with AI tools",
                ),
                QuestionSpec::text(
                    QuestionTag::PreferredTime,
                    "What time of day works best for you? (Morning / Afternoon / Evening)",
                    "What time of day",
                )
                .with_input(InputKind::TimeSelector),
                QuestionSpec::text(
                    QuestionTag::UnavailableDays,
                    "Are there any days you cannot attend sessions?",
                    "cannot attend",
                )
                .with_input(InputKind::DaySelector),
                QuestionSpec::text(
                    QuestionTag::ReferralSource,
                    "How did you hear about the bootcamp?",
                    "hear about the bootcamp",
                ),
            ],
            closing_message: format!(
                "{}\n\nBy the way, both this app and our landing page were built using the same AI \
                 tools you'll learn during the bootcamp. Pretty cool, right?",
                CLOSING
            ),
            split_anchors: vec!["Thanks so much!".to_string()],
            detect_priority: Vec::new(),
            fallback_opening: "Hi! Thanks for your interest in the Barcelona bootcamp. To get started, what's your age?"
                .to_string(),
            button_url: None,
            structured_data: true,
            tag_questions: true,
            system_prompt: None,
            temperature: default_temperature(),
            reveal_delay_ms: default_reveal_delay_ms(),
            persistence: PersistenceConfig {
                owner: PersistenceOwner::Relay,
                policy: PersistencePolicy::CollectThenInsert,
            },
        }
    }

    pub fn question(&self, tag: QuestionTag) -> Option<&QuestionSpec> {
        self.questions.iter().find(|q| q.tag == tag)
    }

    /// Questions in the order their anchors are checked.
    pub fn detection_order(&self) -> Vec<&QuestionSpec> {
        let mut ordered: Vec<&QuestionSpec> = self
            .detect_priority
            .iter()
            .filter_map(|tag| self.question(*tag))
            .collect();

        let (contact, rest): (Vec<&QuestionSpec>, Vec<&QuestionSpec>) = self
            .questions
            .iter()
            .filter(|q| !self.detect_priority.contains(&q.tag))
            .partition(|q| matches!(q.tag, QuestionTag::Contact | QuestionTag::Email));
        ordered.extend(rest);
        ordered.extend(contact);
        ordered
    }

    /// Every field the flow can fill, in question order.
    pub fn data_fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        for question in &self.questions {
            for field in question.tag.fields() {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        }
        fields
    }
}
