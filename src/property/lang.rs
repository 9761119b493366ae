use super::{Choice, DisplayOptions, Property};
use crate::models::Value;

impl Property {
    fn language_name(&self, code: &str, in_lang: &str) -> String {
        self.deps
            .translator
            .as_ref()
            .and_then(|t| t.language_name(code, in_lang))
            .unwrap_or_else(|| code.to_uppercase())
    }

    /// The translator's locales. The list is fixed; definitions can not
    /// add to it.
    pub(super) fn lang_choices(&self, opts: &DisplayOptions) -> Vec<Choice> {
        let Some(translator) = self.deps.translator.as_ref() else {
            return vec![];
        };
        let lang = self.lang_for(opts);
        let selected: Vec<String> = match &self.val {
            Value::List(codes) => codes.iter().map(ToString::to_string).collect(),
            Value::Null => vec![],
            other => vec![other.to_string()],
        };
        translator
            .locales()
            .into_iter()
            .map(|code| Choice {
                label: self.language_name(&code, &lang),
                selected: selected.contains(&code),
                value: Value::from(code),
            })
            .collect()
    }

    pub(super) fn lang_display_val(
        &self,
        val: &Value,
        opts: &DisplayOptions,
    ) -> String {
        let lang = self.lang_for(opts);
        let codes: Vec<String> = match self.localized(val, opts) {
            Value::Null => vec![],
            Value::List(codes) => codes.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        };
        codes
            .iter()
            .filter(|code| !code.is_empty())
            .map(|code| self.language_name(code, &lang))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        factory::PropertyOptions,
        property::{PropertyKind, Storable},
        translator::StaticTranslator,
    };
    use std::sync::Arc;

    fn lang_prop() -> Property {
        let translator = StaticTranslator::new("en")
            .with_locale("en", &[("en", "English"), ("fr", "Anglais")])
            .with_locale("fr", &[("en", "French"), ("fr", "Français")]);
        Property::with_options(
            PropertyKind::Lang,
            PropertyOptions {
                translator: Some(Arc::new(translator)),
                ..Default::default()
            },
        )
        .expect("property")
    }

    #[test]
    fn test_display_uses_language_names() {
        let mut prop = lang_prop();
        prop.set_val("fr").expect("set");
        assert_eq!(prop.display_val(None, &DisplayOptions::default()), "French");
        assert_eq!(
            prop.display_val(None, &DisplayOptions::lang("fr")),
            "Français"
        );
        prop.set_val("xx").expect("set");
        assert_eq!(prop.display_val(None, &DisplayOptions::default()), "XX");
    }

    #[test]
    fn test_multiple_codes_are_joined() {
        let mut prop = lang_prop();
        prop.set_multiple(true).expect("multiple");
        prop.set_val("en,fr,de").expect("set");
        assert_eq!(
            prop.display_val(None, &DisplayOptions::default()),
            "English, French, DE"
        );
        assert_eq!(prop.sql_type(), "TEXT");
    }

    #[test]
    fn test_choices_come_from_translator() {
        let mut prop = lang_prop();
        prop.set_val("fr").expect("set");
        let choices = prop.choices(&DisplayOptions::default());
        let labels: Vec<&str> =
            choices.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["English", "French"]);
        assert!(!choices[0].selected);
        assert!(choices[1].selected);

        assert!(Property::lang()
            .choices(&DisplayOptions::default())
            .is_empty());
        assert_eq!(Property::lang().sql_type(), "CHAR(2)");
    }
}
