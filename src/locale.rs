//! String tables and dialog composition.
//!
//! Two tables per language: `dialogs` holds line templates with
//! `{value1}` / `{value2}` placeholders, `strings` holds display names for
//! fighters, moves and menu labels.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const EMBEDDED_EN: &str = include_str!("../assets/locales/en.ron");
const EMBEDDED_ES: &str = include_str!("../assets/locales/es.ron");

#[derive(thiserror::Error, Debug)]
pub enum LocaleError {
    #[error("failed to parse {language} string table: {source}")]
    Parse {
        language: &'static str,
        source: ron::error::SpannedError,
    },
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
}

/// Lookup service used by the battle and the session screens.
///
/// Missing entries resolve to an empty string.
pub trait Localizer {
    fn dialog_template(&self, key: &str) -> String;
    fn localized_string(&self, key: &str) -> String;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, LocaleError> {
        match code.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            other => Err(LocaleError::UnknownLanguage(other.to_string())),
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Language::En => Language::Es,
            Language::Es => Language::En,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StringTable {
    #[serde(default)]
    pub dialogs: BTreeMap<String, String>,
    #[serde(default)]
    pub strings: BTreeMap<String, String>,
}

impl StringTable {
    pub fn from_ron_str(language: Language, text: &str) -> Result<Self, LocaleError> {
        ron::de::from_str(text).map_err(|source| LocaleError::Parse {
            language: language.code(),
            source,
        })
    }
}

impl Localizer for StringTable {
    fn dialog_template(&self, key: &str) -> String {
        match self.dialogs.get(key) {
            Some(template) => template.clone(),
            None => {
                tracing::debug!(key, "missing dialog entry");
                String::new()
            }
        }
    }

    fn localized_string(&self, key: &str) -> String {
        match self.strings.get(key) {
            Some(value) => value.clone(),
            None => {
                tracing::debug!(key, "missing string entry");
                String::new()
            }
        }
    }
}

/// Both shipped languages plus the active selection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Locales {
    pub language: Language,
    en: StringTable,
    es: StringTable,
}

impl Locales {
    pub fn embedded(language: Language) -> Result<Self, LocaleError> {
        Ok(Self {
            language,
            en: StringTable::from_ron_str(Language::En, EMBEDDED_EN)?,
            es: StringTable::from_ron_str(Language::Es, EMBEDDED_ES)?,
        })
    }

    pub fn active(&self) -> &StringTable {
        match self.language {
            Language::En => &self.en,
            Language::Es => &self.es,
        }
    }
}

impl Localizer for Locales {
    fn dialog_template(&self, key: &str) -> String {
        self.active().dialog_template(key)
    }

    fn localized_string(&self, key: &str) -> String {
        self.active().localized_string(key)
    }
}

/// First letter upper case, the rest lower case.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

/// Localized display name, falling back to the raw key.
pub fn display_name(strings: &dyn Localizer, key: &str) -> String {
    let localized = strings.localized_string(key);
    if localized.is_empty() {
        key.to_string()
    } else {
        localized
    }
}

/// Resolves a dialog template and fills its placeholders.
///
/// Values are localized (raw value when no entry exists) and capitalized
/// before substitution. `<br>` becomes a line break.
pub fn compose_dialog(
    strings: &dyn Localizer,
    key: &str,
    value1: Option<&str>,
    value2: Option<&str>,
) -> String {
    let mut dialog = strings.dialog_template(key).replace("<br>", "\n");
    if let Some(value) = value1 {
        dialog = dialog.replace("{value1}", &capitalize(&display_name(strings, value)));
    }
    if let Some(value) = value2 {
        dialog = dialog.replace("{value2}", &capitalize(&display_name(strings, value)));
    }
    dialog
}

/// Like [`compose_dialog`] but substitutes `value` verbatim. Used for lines
/// that name people rather than fighters or moves.
pub fn fill_dialog(strings: &dyn Localizer, key: &str, value: &str) -> String {
    strings
        .dialog_template(key)
        .replace("<br>", "\n")
        .replace("{value1}", value)
}
