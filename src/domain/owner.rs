use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Language used for user-visible text.
///
/// Tags outside the supported set fall back to English so an exotic locale
/// never blocks a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

impl Language {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "hi" | "hi-in" | "hin" => Self::Hi,
            _ => Self::En,
        }
    }
}

/// A shopkeeper account. Owns customers and transactions; every lookup the
/// engine performs is scoped to one owner.
///
/// Registration lives outside the engine: the store only reads and writes
/// rows, and nothing here mutates an owner except the external registration
/// path updating the language preference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,
    pub name: String,
    pub contact: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

impl Owner {
    pub fn new(name: impl Into<String>, contact: impl Into<String>, language: Language) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            contact: contact.into(),
            language,
            created_at: Utc::now(),
        }
    }
}
