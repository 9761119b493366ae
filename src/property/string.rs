use super::{json_bool, json_i64, json_string, Property};
use crate::{
    config,
    errors::{PropertyError, Result},
    models::Value,
};
use regex::{Regex, RegexBuilder};
use serde_json::Value as Json;

/// Length and pattern constraints shared by `string` and `html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringConfig {
    min_length: usize,
    /// 0 means unbounded.
    max_length: usize,
    regexp: String,
    allow_empty: bool,
}

impl Default for StringConfig {
    fn default() -> Self {
        StringConfig {
            min_length: 0,
            max_length: config::DEFAULT_STRING_MAX_LENGTH,
            regexp: String::new(),
            allow_empty: true,
        }
    }
}

impl StringConfig {
    pub fn html() -> Self {
        StringConfig {
            max_length: 0,
            ..Default::default()
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn set_min_length(&mut self, min: i64) -> Result<&mut Self> {
        self.min_length = non_negative(min, "min length")?;
        Ok(self)
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn set_max_length(&mut self, max: i64) -> Result<&mut Self> {
        self.max_length = non_negative(max, "max length")?;
        Ok(self)
    }

    pub fn regexp(&self) -> &str {
        &self.regexp
    }

    pub fn set_regexp(&mut self, regexp: &str) -> &mut Self {
        self.regexp = regexp.to_string();
        self
    }

    pub fn allow_empty(&self) -> bool {
        self.allow_empty
    }

    pub fn set_allow_empty(&mut self, allow_empty: bool) -> &mut Self {
        self.allow_empty = allow_empty;
        self
    }

    pub(super) fn sql_type(&self) -> String {
        match self.max_length {
            0 => "TEXT".to_string(),
            n if n > config::DEFAULT_STRING_MAX_LENGTH => "TEXT".to_string(),
            n => format!("VARCHAR({n})"),
        }
    }

    pub(super) fn set_field(&mut self, key: &str, val: &Json) -> Result<bool> {
        match key {
            "min_length" => {
                self.set_min_length(json_i64(val)?)?;
            }
            "max_length" => {
                self.set_max_length(json_i64(val)?)?;
            }
            "regexp" => {
                self.set_regexp(&json_string(val)?);
            }
            "allow_empty" => {
                self.set_allow_empty(json_bool(val)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(super) fn field(&self, name: &str) -> Option<Json> {
        match name {
            "min_length" => Some(Json::from(self.min_length)),
            "max_length" => Some(Json::from(self.max_length)),
            "regexp" => Some(Json::from(self.regexp.as_str())),
            "allow_empty" => Some(Json::from(self.allow_empty)),
            _ => None,
        }
    }
}

fn non_negative(n: i64, what: &str) -> Result<usize> {
    usize::try_from(n).map_err(|_| {
        PropertyError::invalid(format!("{what} must be a positive integer"))
    })
}

/// Bare patterns, or `/pattern/flags` with `i`, `m`, `s` and `x` honored.
fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    if let Some((body, flags)) = pattern
        .strip_prefix('/')
        .and_then(|rest| rest.rsplit_once('/'))
    {
        return RegexBuilder::new(body)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .ignore_whitespace(flags.contains('x'))
            .build();
    }
    Regex::new(pattern)
}

/// Every string held by a value, across locales and multiple items.
fn strings_of(val: &Value, out: &mut Vec<String>) {
    match val {
        Value::Null => {}
        Value::List(items) => items.iter().for_each(|i| strings_of(i, out)),
        Value::Map(by_lang) => by_lang.values().for_each(|v| strings_of(v, out)),
        Value::Translation(t) => out.extend(t.values().values().cloned()),
        other => out.push(other.to_string()),
    }
}

impl Property {
    /// Character count of the current value.
    pub fn length(&self) -> Result<usize> {
        if self.val.is_null() {
            return Err(PropertyError::invalid(format!(
                "Property \"{}\" has no value to measure",
                self.ident
            )));
        }
        Ok(self.val.to_string().chars().count())
    }

    fn strings(&self) -> Vec<String> {
        let mut out = vec![];
        strings_of(&self.val, &mut out);
        out
    }

    pub fn validate_min_length(&mut self) -> bool {
        let Some(c) = self.as_string() else {
            return true;
        };
        let (min, allow_empty) = (c.min_length, c.allow_empty);
        if min == 0 {
            return true;
        }
        let valid = !self.val.is_null()
            && self.strings().iter().all(|s| {
                if s.is_empty() {
                    allow_empty
                } else {
                    s.chars().count() >= min
                }
            });
        if !valid {
            self.validator.error(
                format!("The value must be at least {min} characters long."),
                "minLength",
            );
        }
        valid
    }

    pub fn validate_max_length(&mut self) -> bool {
        let Some(max) = self.as_string().map(StringConfig::max_length) else {
            return true;
        };
        if max == 0 {
            return true;
        }
        let valid = self.strings().iter().all(|s| s.chars().count() <= max);
        if !valid {
            self.validator.error(
                format!("The value must be at most {max} characters long."),
                "maxLength",
            );
        }
        valid
    }

    pub fn validate_regexp(&mut self) -> bool {
        let Some(pattern) = self
            .as_string()
            .map(|c| c.regexp.clone())
            .filter(|r| !r.is_empty())
        else {
            return true;
        };
        let re = match compile(&pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!(
                    ident = %self.ident,
                    pattern = %pattern,
                    "bad regexp: {e}"
                );
                self.validator
                    .error(format!("Invalid pattern {pattern}"), "regexp");
                return false;
            }
        };
        let valid = self.strings().iter().all(|s| re.is_match(s));
        if !valid {
            self.validator.error(
                format!("The value does not match the pattern {pattern}"),
                "regexp",
            );
        }
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        factory::PropertyFactory,
        property::{DisplayOptions, Storable},
    };
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let prop = Property::string();
        let c = prop.as_string().expect("string");
        assert_eq!(c.min_length(), 0);
        assert_eq!(c.max_length(), 255);
        assert_eq!(c.regexp(), "");
        assert!(c.allow_empty());
        assert_eq!(prop.r#type(), "string");
    }

    #[test]
    fn test_negative_lengths_are_rejected() {
        let mut prop = Property::string();
        let c = prop.as_string_mut().expect("string");
        assert!(matches!(
            c.set_min_length(-1),
            Err(PropertyError::InvalidValue(_))
        ));
        assert!(c.set_max_length(-1).is_err());
    }

    #[test]
    fn test_length_counts_chars() {
        let mut prop = Property::string();
        assert!(prop.length().is_err());
        prop.set_val("foo").expect("set");
        assert_eq!(prop.length().expect("length"), 3);
        prop.set_val("é").expect("set");
        assert_eq!(prop.length().expect("length"), 1);
    }

    #[test]
    fn test_min_length_utf8() {
        let mut prop = Property::string();
        prop.as_string_mut()
            .expect("string")
            .set_min_length(5)
            .expect("min");
        prop.set_val("Éçä˚").expect("set");
        assert!(!prop.validate_min_length());
        prop.set_val("∂çäÇµ").expect("set");
        assert!(prop.validate_min_length());
    }

    #[test]
    fn test_min_length_allow_empty() {
        let mut prop = Property::string();
        prop.set_allow_null(false);
        prop.as_string_mut()
            .expect("string")
            .set_min_length(5)
            .expect("min");
        prop.set_val("").expect("set");
        assert!(prop.validate_min_length());
        prop.as_string_mut().expect("string").set_allow_empty(false);
        assert!(!prop.validate_min_length());
    }

    #[test]
    fn test_min_length_without_val_fails() {
        let mut prop = Property::string();
        prop.as_string_mut()
            .expect("string")
            .set_min_length(5)
            .expect("min");
        assert!(!prop.validate_min_length());
    }

    #[test]
    fn test_max_length() {
        let mut prop = Property::string();
        prop.as_string_mut()
            .expect("string")
            .set_max_length(5)
            .expect("max");
        prop.set_val("ß¨ˆ®©").expect("set");
        assert!(prop.validate_max_length());
        prop.set_val("123456").expect("set");
        assert!(!prop.validate_max_length());

        prop.as_string_mut()
            .expect("string")
            .set_max_length(0)
            .expect("max");
        assert!(prop.validate_max_length());
    }

    #[test]
    fn test_slash_delimited_regexp() {
        let mut prop = Property::string();
        prop.as_string_mut().expect("string").set_regexp("/[0-9*]/");
        assert!(prop.validate_regexp());
        prop.set_val("123").expect("set");
        assert!(prop.validate_regexp());
        prop.set_val("abc").expect("set");
        assert!(!prop.validate_regexp());

        prop.as_string_mut().expect("string").set_regexp("/^ABC$/i");
        assert!(prop.validate_regexp());
    }

    #[test]
    fn test_multiple_checks_every_item() {
        let mut prop = Property::string();
        prop.set_multiple(true).expect("multiple");
        prop.as_string_mut()
            .expect("string")
            .set_max_length(3)
            .expect("max");
        prop.set_val("abc,de").expect("set");
        assert!(prop.validate_max_length());
        prop.set_val("abc,defg").expect("set");
        assert!(!prop.validate_max_length());
    }

    #[test]
    fn test_sql_type() {
        let mut prop = Property::string();
        assert_eq!(prop.sql_type(), "VARCHAR(255)");
        prop.as_string_mut()
            .expect("string")
            .set_max_length(20)
            .expect("max");
        assert_eq!(prop.sql_type(), "VARCHAR(20)");
        prop.as_string_mut()
            .expect("string")
            .set_max_length(256)
            .expect("max");
        assert_eq!(prop.sql_type(), "TEXT");

        let mut prop = Property::string();
        prop.set_multiple(true).expect("multiple");
        assert_eq!(prop.sql_type(), "TEXT");
    }

    #[test]
    fn test_set_data() {
        let prop = PropertyFactory::default()
            .create_from_definition(
                "code",
                json!({
                    "type": "string",
                    "min_length": 5,
                    "maxLength": 42,
                    "regexp": "/[0-9]*/",
                    "allow_empty": false
                })
                .as_object()
                .expect("obj"),
            )
            .expect("property");
        let c = prop.as_string().expect("string");
        assert_eq!(c.min_length(), 5);
        assert_eq!(c.max_length(), 42);
        assert_eq!(c.regexp(), "/[0-9]*/");
        assert!(!c.allow_empty());
        assert_eq!(prop.field("max_length"), Some(json!(42)));
    }

    #[test]
    fn test_html_is_sanitized_for_display() {
        let mut prop = Property::html();
        assert_eq!(prop.r#type(), "html");
        assert_eq!(prop.as_string().map(StringConfig::max_length), Some(0));
        assert_eq!(prop.sql_type(), "TEXT");
        prop.set_val("<p>hi<script>alert(1)</script></p>").expect("set");
        assert_eq!(
            prop.display_val(None, &DisplayOptions::default()),
            "<p>hi</p>"
        );
        // untouched for editing
        assert_eq!(
            prop.input_val(None, &DisplayOptions::default()),
            "<p>hi<script>alert(1)</script></p>"
        );
    }
}
