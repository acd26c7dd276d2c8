use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single answer slot of an application. The snake_case name doubles as the
/// store column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Phone,
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
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::Name,
        Field::Email,
        Field::Phone,
        Field::Linkedin,
        Field::Motivation,
        Field::AvailableDays,
        Field::PreferredTime,
        Field::Age,
        Field::About,
        Field::Goal,
        Field::AppExperience,
        Field::AiExperience,
        Field::UnavailableDays,
        Field::ReferralSource,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Linkedin => "linkedin",
            Field::Motivation => "motivation",
            Field::AvailableDays => "available_days",
            Field::PreferredTime => "preferred_time",
            Field::Age => "age",
            Field::About => "about",
            Field::Goal => "goal",
            Field::AppExperience => "app_experience",
            Field::AiExperience => "ai_experience",
            Field::UnavailableDays => "unavailable_days",
            Field::ReferralSource => "referral_source",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.column() == s)
            .ok_or_else(|| format!("unknown application field '{}'", s))
    }
}

/// Sparse set of answers, keyed by field.
pub type ApplicationFields = BTreeMap<Field, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: ApplicationFields,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ApplicationRecord {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}
