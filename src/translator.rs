use super::config;
use indexmap::IndexMap;

/// Knows the available locales and how to name a language in each of them.
pub trait Translator: std::fmt::Debug + Send + Sync {
    /// Available locale codes, in preference order.
    fn locales(&self) -> Vec<String>;

    fn current_locale(&self) -> String;

    /// Name of the language `code`, written in `in_lang`.
    fn language_name(&self, code: &str, in_lang: &str) -> Option<String>;
}

/// In-memory translator: `names[code][in_lang] = name`.
#[derive(Debug, Clone)]
pub struct StaticTranslator {
    current: String,
    names: IndexMap<String, IndexMap<String, String>>,
}

impl Default for StaticTranslator {
    fn default() -> Self {
        StaticTranslator {
            current: config::DEFAULT_LANG.to_string(),
            names: IndexMap::new(),
        }
    }
}

impl StaticTranslator {
    pub fn new(current: &str) -> Self {
        StaticTranslator {
            current: current.to_string(),
            ..Default::default()
        }
    }

    /// Register a locale with its name in the given languages.
    pub fn with_locale(mut self, code: &str, names: &[(&str, &str)]) -> Self {
        let entry = self.names.entry(code.to_string()).or_default();
        for (lang, name) in names {
            entry.insert(lang.to_string(), name.to_string());
        }
        self
    }
}

impl Translator for StaticTranslator {
    fn locales(&self) -> Vec<String> {
        self.names.keys().cloned().collect()
    }

    fn current_locale(&self) -> String {
        self.current.clone()
    }

    fn language_name(&self, code: &str, in_lang: &str) -> Option<String> {
        let names = self.names.get(code)?;
        names
            .get(in_lang)
            .or_else(|| names.get(&self.current))
            .cloned()
    }
}
