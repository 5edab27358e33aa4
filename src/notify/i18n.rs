//! Subject-line localization
//!
//! A [`Localizer`] maps message keys to strings for one active locale. The
//! built-in English catalogue is always present; `<locale>.json` files
//! (flat `{"key": "text"}` objects) can override or extend it. Lookups never
//! fail: a missing key falls back to English, then to the key itself.

use std::collections::HashMap;
use std::path::Path;

/// Locales with a recognised catalogue file name
pub const SUPPORTED_LOCALES: &[&str] = &["en", "es", "fr", "de"];

const FALLBACK_LOCALE: &str = "en";

fn builtin_catalogue() -> HashMap<String, String> {
    [
        ("event.created.subject", "Event created"),
        ("event.updated.subject", "Event updated"),
        ("event.deleted.subject", "Event deleted"),
        ("event.created.body", "Your event \"{title}\" on {date} was created."),
        ("event.updated.body", "Your event \"{title}\" on {date} was updated."),
        ("event.deleted.body", "Your event \"{title}\" on {date} was deleted."),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Key → string lookup for an active locale
#[derive(Debug, Clone)]
pub struct Localizer {
    locale: String,
    catalogues: HashMap<String, HashMap<String, String>>,
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new(FALLBACK_LOCALE)
    }
}

impl Localizer {
    /// Localizer with only the built-in English catalogue
    pub fn new(locale: impl Into<String>) -> Self {
        let mut catalogues = HashMap::new();
        catalogues.insert(FALLBACK_LOCALE.to_string(), builtin_catalogue());
        Self {
            locale: locale.into(),
            catalogues,
        }
    }

    /// Load `<locale>.json` catalogues for the supported locales from `dir`.
    ///
    /// Missing or malformed files are logged and skipped.
    pub fn load_dir(locale: impl Into<String>, dir: &Path) -> Self {
        let mut localizer = Self::new(locale);

        for code in SUPPORTED_LOCALES {
            let path = dir.join(format!("{}.json", code));
            let data = match std::fs::read_to_string(&path) {
                Ok(data) => data,
                Err(e) => {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!("Failed to read {}: {}", path.display(), e);
                    }
                    continue;
                }
            };
            match serde_json::from_str::<HashMap<String, String>>(&data) {
                Ok(entries) => localizer.extend(code, entries),
                Err(e) => tracing::warn!("Failed to parse {}: {}", path.display(), e),
            }
        }

        localizer
    }

    /// Add or override entries for a locale
    pub fn extend(&mut self, locale: &str, entries: HashMap<String, String>) {
        self.catalogues
            .entry(locale.to_string())
            .or_default()
            .extend(entries);
    }

    /// Active locale
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Translate `key` in the active locale
    pub fn translate(&self, key: &str) -> String {
        [self.locale.as_str(), FALLBACK_LOCALE]
            .iter()
            .filter_map(|code| self.catalogues.get(*code))
            .find_map(|catalogue| catalogue.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Translate `key` and substitute `{name}` placeholders
    pub fn translate_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.translate(key), |text, (name, value)| {
                text.replace(&format!("{{{}}}", name), value)
            })
    }
}
