use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use unic_langid::{LanguageIdentifier, LanguageIdentifierError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportedLanguage {
    #[default]
    #[serde(rename = "tr")]
    Turkish,
    #[serde(rename = "en")]
    English,
}

impl SupportedLanguage {
    pub fn all() -> &'static [SupportedLanguage] {
        &[SupportedLanguage::Turkish, SupportedLanguage::English]
    }

    pub fn code(&self) -> &'static str {
        match self {
            SupportedLanguage::Turkish => "tr",
            SupportedLanguage::English => "en",
        }
    }

    /// Language identifier for the Fluent bundle
    pub fn lang_id(&self) -> Result<LanguageIdentifier, LanguageIdentifierError> {
        match self {
            SupportedLanguage::Turkish => "tr".parse(),
            SupportedLanguage::English => "en-US".parse(),
        }
    }

    /// First supported language in an Accept-Language header, Turkish otherwise.
    pub fn from_accept_language(accept_language: &str) -> Self {
        for lang_part in accept_language.split(',') {
            let lang = lang_part.trim().split(';').next().unwrap_or("");
            let lang = lang.to_lowercase();

            if lang.starts_with("tr") {
                return SupportedLanguage::Turkish;
            } else if lang.starts_with("en") {
                return SupportedLanguage::English;
            }
        }

        Self::default()
    }
}

impl Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for SupportedLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tr" | "tr-tr" | "turkish" | "türkçe" => Ok(SupportedLanguage::Turkish),
            "en" | "english" | "en-us" | "en-gb" => Ok(SupportedLanguage::English),
            _ => Err(format!("Unsupported language: {}", s)),
        }
    }
}
