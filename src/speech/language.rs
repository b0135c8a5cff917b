use crate::StudioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages offered in the language selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    #[default]
    EnUs,
    EnGb,
    HiIn,
    BhoIn,
}

impl Language {
    pub fn all() -> &'static [Language] {
        &[Language::EnUs, Language::EnGb, Language::HiIn, Language::BhoIn]
    }

    /// BCP-47 tag
    pub fn tag(&self) -> &'static str {
        match self {
            Language::EnUs => "en-US",
            Language::EnGb => "en-GB",
            Language::HiIn => "hi-IN",
            Language::BhoIn => "bho-IN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::EnUs => "English (US)",
            Language::EnGb => "English (UK)",
            Language::HiIn => "Hindi",
            Language::BhoIn => "Bhojpuri",
        }
    }

    /// Tag used to pick a synthesis voice
    ///
    /// Bhojpuri has no voices of its own and is spoken with Hindi ones.
    pub fn synthesis_tag(&self) -> &'static str {
        synthesis_alias(self.tag())
    }

    /// Whisper language code, `None` when recognition has no model for it
    pub fn recognition_code(&self) -> Option<&'static str> {
        match self {
            Language::EnUs | Language::EnGb => Some("en"),
            Language::HiIn => Some("hi"),
            Language::BhoIn => None,
        }
    }
}

/// Map a requested voice tag through the alias table
pub fn synthesis_alias(tag: &str) -> &str {
    match tag {
        "bho-IN" => "hi-IN",
        other => other,
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| StudioError::ConfigError(format!("Unknown language tag: {}", s)))
    }
}

impl TryFrom<String> for Language {
    type Error = StudioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.tag().to_string()
    }
}
