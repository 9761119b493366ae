use super::{json_string, Property};
use crate::{
    config,
    errors::{PropertyError, Result},
    models::Value,
};
use chrono::{
    format::{Item, StrftimeItems},
    DateTime, Local, NaiveDate, NaiveDateTime,
};
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeConfig {
    min: Option<NaiveDateTime>,
    max: Option<NaiveDateTime>,
    /// strftime pattern used by `display_val`.
    format: String,
}

impl Default for DateTimeConfig {
    fn default() -> Self {
        DateTimeConfig {
            min: None,
            max: None,
            format: config::DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }
}

impl DateTimeConfig {
    pub fn min(&self) -> Option<NaiveDateTime> {
        self.min
    }

    /// Accepts anything `set_val` would; null or blank clears the bound.
    pub fn set_min(&mut self, min: impl Into<Value>) -> Result<&mut Self> {
        self.min = bound(min.into())?;
        Ok(self)
    }

    pub fn max(&self) -> Option<NaiveDateTime> {
        self.max
    }

    pub fn set_max(&mut self, max: impl Into<Value>) -> Result<&mut Self> {
        self.max = bound(max.into())?;
        Ok(self)
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn set_format(&mut self, format: &str) -> Result<&mut Self> {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(PropertyError::invalid(format!(
                "\"{format}\" is not a valid date format"
            )));
        }
        self.format = format.to_string();
        Ok(self)
    }

    pub(super) fn set_field(&mut self, key: &str, val: &Json) -> Result<bool> {
        match key {
            "min" => {
                self.set_min(Value::from(val.clone()))?;
            }
            "max" => {
                self.set_max(Value::from(val.clone()))?;
            }
            "format" => {
                self.set_format(&json_string(val)?)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(super) fn field(&self, name: &str) -> Option<Json> {
        let show = |dt: Option<NaiveDateTime>| {
            dt.map_or(Json::Null, |dt| Value::DateTime(dt).to_json())
        };
        match name {
            "min" => Some(show(self.min)),
            "max" => Some(show(self.max)),
            "format" => Some(Json::from(self.format.as_str())),
            _ => None,
        }
    }
}

fn bound(val: Value) -> Result<Option<NaiveDateTime>> {
    match val {
        Value::Null => Ok(None),
        Value::Str(s) if s.trim().is_empty() => Ok(None),
        Value::Str(s) => parse_datetime(&s).map(Some),
        Value::DateTime(dt) => Ok(Some(dt)),
        other => Err(PropertyError::invalid(format!(
            "Invalid datetime value: {other}"
        ))),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// RFC 3339 (converted to UTC), `@<unix seconds>`, the `now`, `today`,
/// `tomorrow` and `yesterday` keywords, or one of the local date-time
/// spellings above. Bare dates are taken at midnight.
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();
    let invalid =
        || PropertyError::invalid(format!("Invalid datetime value: {raw}"));
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    if let Some(secs) = s.strip_prefix('@') {
        let secs: i64 = secs.parse().map_err(|_| invalid())?;
        return DateTime::from_timestamp(secs, 0)
            .map(|dt| dt.naive_utc())
            .ok_or_else(invalid);
    }
    let today = Local::now().date_naive();
    let day = match s.to_lowercase().as_str() {
        "now" => return Ok(Local::now().naive_local()),
        "today" => Some(today),
        "tomorrow" => today.succ_opt(),
        "yesterday" => today.pred_opt(),
        _ => None,
    };
    if let Some(midnight) = day.and_then(|d| d.and_hms_opt(0, 0, 0)) {
        return Ok(midnight);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(invalid)
}

fn is_blank(val: &Value) -> bool {
    match val {
        Value::Null => true,
        Value::Str(s) => s.trim().is_empty(),
        Value::List(items) => items.iter().all(is_blank),
        Value::Map(parts) => parts.values().all(is_blank),
        _ => false,
    }
}

/// `["2020-01-01", "10:30"]` becomes `"2020-01-01 10:30"`.
fn join_fragments<'a>(parts: impl Iterator<Item = &'a Value>) -> String {
    parts
        .filter(|p| !is_blank(p))
        .map(|p| p.to_string().trim().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Property {
    pub(super) fn datetime_val(&self, val: Value) -> Result<Value> {
        if is_blank(&val) {
            if self.allow_null {
                return Ok(Value::Null);
            }
            return Err(PropertyError::invalid(format!(
                "Property \"{}\" value can not be NULL (not allowed)",
                self.ident
            )));
        }
        let dt = match val {
            Value::DateTime(dt) => dt,
            Value::Str(s) => parse_datetime(&s)?,
            Value::List(parts) => parse_datetime(&join_fragments(parts.iter()))?,
            Value::Map(parts) => {
                parse_datetime(&join_fragments(parts.values()))?
            }
            other => {
                return Err(PropertyError::invalid(format!(
                    "Invalid datetime value: {other}"
                )))
            }
        };
        Ok(Value::DateTime(dt))
    }

    fn datetime_in(&self, val: &Value, format: &str) -> String {
        match val {
            Value::DateTime(dt) => dt.format(format).to_string(),
            Value::Str(s) => match parse_datetime(s) {
                Ok(dt) => dt.format(format).to_string(),
                Err(_) => s.clone(),
            },
            _ => String::new(),
        }
    }

    pub(super) fn datetime_input_val(&self, val: &Value) -> String {
        self.datetime_in(val, config::DEFAULT_DATETIME_FORMAT)
    }

    pub(super) fn datetime_display_val(
        &self,
        val: &Value,
        c: &DateTimeConfig,
    ) -> String {
        self.datetime_in(val, c.format())
    }

    /// Null values pass; range checks only apply to a set date.
    pub fn validate_min(&mut self) -> bool {
        let Some(min) = self.as_datetime().and_then(DateTimeConfig::min) else {
            return true;
        };
        let Value::DateTime(val) = self.val else {
            return true;
        };
        if val >= min {
            return true;
        }
        self.validator
            .error("The date is smaller than the minimum value", "min");
        false
    }

    pub fn validate_max(&mut self) -> bool {
        let Some(max) = self.as_datetime().and_then(DateTimeConfig::max) else {
            return true;
        };
        let Value::DateTime(val) = self.val else {
            return true;
        };
        if val <= max {
            return true;
        }
        self.validator
            .error("The date is bigger than the maximum value", "max");
        false
    }
}
