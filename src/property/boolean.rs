use super::{DisplayOptions, Property, PropertyKind};
use crate::{
    errors::{PropertyError, Result},
    models::{Translation, Value},
};
use serde::Serialize;
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq)]
pub struct BooleanConfig {
    true_label: Translation,
    false_label: Translation,
}

impl Default for BooleanConfig {
    fn default() -> Self {
        BooleanConfig {
            true_label: Translation::new("True"),
            false_label: Translation::new("False"),
        }
    }
}

impl BooleanConfig {
    pub fn true_label(&self) -> &Translation {
        &self.true_label
    }

    pub fn set_true_label(&mut self, label: impl Into<Translation>) -> &mut Self {
        self.true_label = label.into();
        self
    }

    pub fn false_label(&self) -> &Translation {
        &self.false_label
    }

    pub fn set_false_label(
        &mut self,
        label: impl Into<Translation>,
    ) -> &mut Self {
        self.false_label = label.into();
        self
    }

    fn label_for(&self, val: bool, lang: &str) -> String {
        let label = if val {
            &self.true_label
        } else {
            &self.false_label
        };
        label.clone().with_lang(lang).to_string()
    }

    pub(super) fn display_val(&self, val: &Value, lang: &str) -> String {
        match value_bool(val) {
            Ok(b) if !val.is_null() => self.label_for(b, lang),
            _ => String::new(),
        }
    }

    pub(super) fn set_field(&mut self, key: &str, val: &Json) -> Result<bool> {
        match key {
            "true_label" => {
                self.set_true_label(Translation::try_from(val)?);
            }
            "false_label" => {
                self.set_false_label(Translation::try_from(val)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(super) fn field(&self, name: &str) -> Option<Json> {
        match name {
            "true_label" => Some(Value::from(self.true_label.clone()).to_json()),
            "false_label" => {
                Some(Value::from(self.false_label.clone()).to_json())
            }
            _ => None,
        }
    }
}

/// One option of a choice-type input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub label: String,
    pub selected: bool,
    pub value: Value,
}

fn value_bool(val: &Value) -> Result<bool> {
    match val {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::Str(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Ok(true),
            "" | "0" | "false" | "off" | "no" => Ok(false),
            _ => Err(PropertyError::invalid(format!("{s} is not a boolean"))),
        },
        other => Err(PropertyError::invalid(format!("{other} is not a boolean"))),
    }
}

impl Property {
    pub(super) fn boolean_val(&self, val: Value) -> Result<Value> {
        if val.is_null() {
            if self.allow_null {
                return Ok(Value::Null);
            }
            return Err(PropertyError::invalid(format!(
                "Property \"{}\" value can not be NULL (not allowed)",
                self.ident
            )));
        }
        value_bool(&val).map(Value::Bool)
    }

    /// Options for choice inputs: the two labels for booleans, the
    /// translator's locales for languages. Other types have none.
    pub fn choices(&self, opts: &DisplayOptions) -> Vec<Choice> {
        match &self.kind {
            PropertyKind::Boolean(c) => {
                let lang = self.lang_for(opts);
                let checked = matches!(self.val, Value::Bool(true));
                vec![
                    Choice {
                        label: c.label_for(true, &lang),
                        selected: checked,
                        value: Value::Int(1),
                    },
                    Choice {
                        label: c.label_for(false, &lang),
                        selected: !checked,
                        value: Value::Int(0),
                    },
                ]
            }
            PropertyKind::Lang => self.lang_choices(opts),
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::PdoType, property::Storable, upload::Uploads,
        validation::Validatable,
    };
    use serde_json::json;

    #[test]
    fn test_coercion() {
        let mut prop = Property::boolean();
        for (raw, want) in [
            (Value::from("on"), true),
            (Value::from("yes"), true),
            (Value::from("1"), true),
            (Value::Int(5), true),
            (Value::from("off"), false),
            (Value::from(""), false),
            (Value::Int(0), false),
            (Value::Bool(true), true),
        ] {
            prop.set_val(raw.clone()).expect("set");
            assert_eq!(prop.val(), &Value::Bool(want), "{raw:?}");
        }
        assert!(prop.set_val("maybe").is_err());
        prop.set_val(Value::Null).expect("null");
        assert_eq!(prop.val(), &Value::Null);
    }

    #[test]
    fn test_never_multiple() {
        let mut prop = Property::boolean();
        assert!(prop.set_multiple(true).is_err());
        assert!(!prop.multiple());
    }

    #[test]
    fn test_labels_and_choices() {
        let mut prop = Property::boolean();
        prop.as_boolean_mut()
            .expect("boolean")
            .set_true_label(
                Translation::try_from(&json!({"en": "Yes", "fr": "Oui"}))
                    .expect("label"),
            );
        prop.set_val(true).expect("set");
        assert_eq!(prop.display_val(None, &DisplayOptions::lang("fr")), "Oui");
        assert_eq!(prop.display_val(None, &DisplayOptions::default()), "Yes");
        assert_eq!(
            prop.display_val(Some(&Value::Bool(false)), &DisplayOptions::default()),
            "False"
        );

        let choices = prop.choices(&DisplayOptions::default());
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].label, "Yes");
        assert!(choices[0].selected);
        assert_eq!(choices[0].value, Value::Int(1));
        assert!(!choices[1].selected);
        assert_eq!(choices[1].value, Value::Int(0));
    }

    #[test]
    fn test_storage_and_save() {
        let mut prop = Property::boolean();
        assert_eq!(prop.sql_type(), "TINYINT(1) UNSIGNED");
        assert_eq!(prop.sql_pdo_type(), PdoType::Bool);
        prop.set_val("true").expect("set");
        assert_eq!(prop.storage_val().expect("storage"), Value::Int(1));
        assert_eq!(
            prop.save(&Uploads::new()).expect("save"),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_required_means_checked() {
        let mut prop = Property::boolean();
        prop.set_required(true);
        prop.set_val(false).expect("set");
        assert!(!prop.validate());
        prop.set_val(true).expect("set");
        assert!(prop.validate());
    }
}
