//! Language type: the two languages of the bilingual NOC exports.
//!
//! Codes are the ISO 639-1 codes the translation backends understand, names
//! are the lowercase English names used as column suffixes
//! (`name_english`, `type_french`, ...).

use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

/// A supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "fr")
    code: &'static str,
}

struct LanguageEntry {
    code: &'static str,
    name: &'static str,
    column_suffix: &'static str,
}

const LANGUAGES: [LanguageEntry; 2] = [
    LanguageEntry {
        code: "en",
        name: "English",
        column_suffix: "english",
    },
    LanguageEntry {
        code: "fr",
        name: "French",
        column_suffix: "french",
    },
];

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };
    pub const FRENCH: Language = Language { code: "fr" };

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is one of the supported languages
    /// * `Err` otherwise
    pub fn from_code(code: &str) -> Result<Language> {
        let normalized = code.trim().to_ascii_lowercase();
        match LANGUAGES.iter().find(|entry| entry.code == normalized) {
            Some(entry) => Ok(Language { code: entry.code }),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// Get the ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the English name of the language (e.g., "English", "French").
    pub fn name(&self) -> &'static str {
        self.entry().name
    }

    /// Suffix used by the merged table's column names.
    pub fn column_suffix(&self) -> &'static str {
        self.entry().column_suffix
    }

    /// The other language of the pair.
    pub fn other(&self) -> Language {
        if *self == Language::ENGLISH {
            Language::FRENCH
        } else {
            Language::ENGLISH
        }
    }

    fn entry(&self) -> &'static LanguageEntry {
        // Language values are only built from LANGUAGES, so the lookup cannot miss
        LANGUAGES
            .iter()
            .find(|entry| entry.code == self.code)
            .unwrap_or(&LANGUAGES[0])
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Language::from_code(s)
    }
}
