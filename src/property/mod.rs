//! A property is one typed field of a model. It normalizes raw input into
//! its canonical [`Value`], projects that value for form inputs, display
//! and storage, and validates it.
//!
//! The type-specific behavior lives with the [`PropertyKind`] variants:
//!
//! - `generic`, `number`, `lang`
//! - `string`, `html` (length and pattern checks)
//! - `boolean`
//! - `color` (hex or `rgba()` normalization)
//! - `date-time`
//! - `file` (upload handling)
//! - `model-structure` (nested, schema-driven models)

mod boolean;
mod color;
mod datetime;
mod file;
mod lang;
mod string;
mod structure;

pub use boolean::{BooleanConfig, Choice};
pub use color::{parse_color, ColorConfig, Rgba};
pub use datetime::{parse_datetime, DateTimeConfig};
pub use file::{detect_mimetype, sanitize_filename, FileConfig};
pub use string::StringConfig;
pub use structure::{
    DefaultData, StructureConfig, StructureModel, StructureModelKind,
    StructureOptions, Structured,
};

use super::{
    config,
    errors::{PropertyError, Result},
    factory::{Dependencies, PropertyOptions},
    metadata::{Describable, MetadataData},
    models::{MultipleOptions, PdoType, Translation, Value},
    upload::Uploads,
    validation::{run_checks, Check, Validatable, Validator},
};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as Json;
use std::fmt::Display;

#[derive(Debug, Clone)]
pub enum PropertyKind {
    Generic,
    Number,
    String(StringConfig),
    Html(StringConfig),
    Boolean(BooleanConfig),
    Color(ColorConfig),
    DateTime(DateTimeConfig),
    File(FileConfig),
    Lang,
    Structure(StructureConfig),
}

impl PropertyKind {
    pub fn type_ident(&self) -> &'static str {
        match self {
            PropertyKind::Generic => "generic",
            PropertyKind::Number => "number",
            PropertyKind::String(_) => "string",
            PropertyKind::Html(_) => "html",
            PropertyKind::Boolean(_) => "boolean",
            PropertyKind::Color(_) => "color",
            PropertyKind::DateTime(_) => "date-time",
            PropertyKind::File(_) => "file",
            PropertyKind::Lang => "lang",
            PropertyKind::Structure(c) if c.is_map() => "map-structure",
            PropertyKind::Structure(_) => "model-structure",
        }
    }
}

/// Options for the input and display projections.
#[derive(Debug, Clone, Default)]
pub struct DisplayOptions {
    /// Locale to pick out of localized values. Defaults to the translator's
    /// current locale.
    pub lang: Option<String>,
}

impl DisplayOptions {
    pub fn lang(lang: &str) -> Self {
        DisplayOptions {
            lang: Some(lang.to_string()),
        }
    }
}

/// Storage projection. A storage layer maps one property to one column.
pub trait Storable {
    fn sql_type(&self) -> String;

    fn sql_extra(&self) -> String {
        String::new()
    }

    fn sql_pdo_type(&self) -> PdoType {
        PdoType::Str
    }

    /// The value as it should be written to the column.
    fn storage_val(&self) -> Result<Value>;
}

#[derive(Debug, Clone)]
pub struct Property {
    ident: String,
    label: Option<Translation>,
    description: Translation,
    notes: Translation,
    l10n: bool,
    hidden: bool,
    required: bool,
    unique: bool,
    allow_null: bool,
    storable: bool,
    active: bool,
    multiple: bool,
    multiple_options: MultipleOptions,
    val: Value,
    display_type: Option<String>,
    view_options: MetadataData,
    definition: MetadataData,
    validator: Validator,
    kind: PropertyKind,
    deps: Dependencies,
}

impl Property {
    pub fn new(kind: PropertyKind) -> Self {
        Property {
            ident: String::new(),
            label: None,
            description: Translation::default(),
            notes: Translation::default(),
            l10n: false,
            hidden: false,
            required: false,
            unique: false,
            allow_null: true,
            storable: true,
            active: true,
            multiple: false,
            multiple_options: MultipleOptions::default(),
            val: Value::Null,
            display_type: None,
            view_options: MetadataData::new(),
            definition: MetadataData::new(),
            validator: Validator::default(),
            kind,
            deps: Dependencies::default(),
        }
    }

    pub fn with_options(
        kind: PropertyKind,
        options: PropertyOptions,
    ) -> Result<Self> {
        let mut prop = Property::new(kind);
        prop.deps = Dependencies::from(&options);
        if let (Some(model), PropertyKind::Structure(c)) =
            (options.structure_model.as_deref(), &mut prop.kind)
        {
            c.set_structure_model(model)?;
        }
        Ok(prop)
    }

    pub fn generic() -> Self {
        Property::new(PropertyKind::Generic)
    }

    pub fn number() -> Self {
        Property::new(PropertyKind::Number)
    }

    pub fn string() -> Self {
        Property::new(PropertyKind::String(StringConfig::default()))
    }

    pub fn html() -> Self {
        Property::new(PropertyKind::Html(StringConfig::html()))
    }

    pub fn boolean() -> Self {
        Property::new(PropertyKind::Boolean(BooleanConfig::default()))
    }

    pub fn color() -> Self {
        Property::new(PropertyKind::Color(ColorConfig::default()))
    }

    pub fn datetime() -> Self {
        Property::new(PropertyKind::DateTime(DateTimeConfig::default()))
    }

    pub fn file() -> Self {
        Property::new(PropertyKind::File(FileConfig::default()))
    }

    pub fn lang() -> Self {
        Property::new(PropertyKind::Lang)
    }

    pub fn structure() -> Self {
        Property::new(PropertyKind::Structure(StructureConfig::default()))
    }

    pub fn map_structure() -> Self {
        Property::new(PropertyKind::Structure(StructureConfig::map()))
    }

    pub fn r#type(&self) -> &'static str {
        self.kind.type_ident()
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.deps
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn set_ident(&mut self, ident: &str) -> &mut Self {
        self.ident = ident.to_string();
        self.validator.set_ident(ident);
        self
    }

    // Value lifecycle ------------------------------------------------------

    /// Normalize `val` into the canonical form and store it. Null and empty
    /// strings become [`Value::Null`] when null is allowed; multiple
    /// properties split strings on their separator; localized properties
    /// apply all of that per locale.
    pub fn set_val(&mut self, val: impl Into<Value>) -> Result<&mut Self> {
        let val = val.into();
        self.val = match self.kind {
            PropertyKind::DateTime(_) => self.datetime_val(val)?,
            PropertyKind::Boolean(_) => self.boolean_val(val)?,
            PropertyKind::Structure(_) => {
                self.coerce(structure::decode_json(val)?)?
            }
            _ => {
                let coerced = self.coerce(val)?;
                self.normalize(coerced)?
            }
        };
        if let PropertyKind::File(c) = &mut self.kind {
            c.forget_detected();
        }
        Ok(self)
    }

    pub fn val(&self) -> &Value {
        &self.val
    }

    /// Hook for types that read a stored form back into their working form.
    pub fn parse_val(&self, val: Value) -> Value {
        match self.kind {
            PropertyKind::Structure(_) => {
                structure::decode_json(val.clone()).unwrap_or(val)
            }
            _ => val,
        }
    }

    /// Form-input projection. Non-scalars are rendered as pretty JSON so
    /// that they can be edited in a textarea.
    pub fn input_val(&self, val: Option<&Value>, opts: &DisplayOptions) -> String {
        let val = val.unwrap_or(&self.val);
        match self.kind {
            PropertyKind::DateTime(_) => return self.datetime_input_val(val),
            // records are edited as one JSON document
            PropertyKind::Structure(_) => {
                return match self.localized(val, opts) {
                    Value::Null => String::new(),
                    Value::Str(s) => s,
                    v => v.to_json_pretty(),
                }
            }
            _ => {}
        }
        match self.joined(self.localized(val, opts)) {
            v @ (Value::List(_) | Value::Map(_) | Value::Translation(_)) => {
                v.to_json_pretty()
            }
            v => v.to_string(),
        }
    }

    /// Human-readable projection.
    pub fn display_val(
        &self,
        val: Option<&Value>,
        opts: &DisplayOptions,
    ) -> String {
        let val = val.unwrap_or(&self.val);
        match &self.kind {
            PropertyKind::DateTime(c) => self.datetime_display_val(val, c),
            PropertyKind::Boolean(c) => {
                c.display_val(&self.localized(val, opts), &self.lang_for(opts))
            }
            PropertyKind::Lang => self.lang_display_val(val, opts),
            // sanitize at render time
            PropertyKind::Html(_) => ammonia::clean(
                &self.joined(self.localized(val, opts)).to_string(),
            ),
            _ => self.joined(self.localized(val, opts)).to_string(),
        }
    }

    /// Null handling, locale maps and multiple splitting, shared by every
    /// type.
    fn coerce(&self, val: Value) -> Result<Value> {
        if val.is_null_or_empty() {
            if self.allow_null {
                return Ok(Value::Null);
            }
            if val.is_null() {
                return Err(PropertyError::invalid(format!(
                    "Property \"{}\" value can not be NULL (not allowed)",
                    self.ident
                )));
            }
        }
        if !self.l10n {
            return self.coerce_multiple(val);
        }
        match val {
            Value::Map(by_lang) => by_lang
                .into_iter()
                .map(|(lang, v)| self.coerce_multiple(v).map(|v| (lang, v)))
                .collect::<Result<IndexMap<_, _>>>()
                .map(Value::Map),
            Value::Translation(t) => t
                .values()
                .iter()
                .map(|(lang, text)| {
                    self.coerce_multiple(Value::from(text.as_str()))
                        .map(|v| (lang.clone(), v))
                })
                .collect::<Result<IndexMap<_, _>>>()
                .map(Value::Map),
            other => self.coerce_multiple(other),
        }
    }

    fn coerce_multiple(&self, val: Value) -> Result<Value> {
        if !self.multiple() {
            return Ok(val);
        }
        match val {
            Value::Null => Ok(Value::Null),
            Value::Str(s) if s.is_empty() => Ok(Value::List(vec![])),
            Value::Str(s) => Ok(Value::List(
                s.split(self.multiple_separator()).map(Value::from).collect(),
            )),
            Value::List(items) => Ok(Value::List(items)),
            other => Err(PropertyError::invalid(format!(
                "Property \"{}\" value must be a string or a list, got {other}",
                self.ident
            ))),
        }
    }

    /// Run the per-item hook over every element of a coerced value.
    fn normalize(&self, val: Value) -> Result<Value> {
        match val {
            Value::Map(by_lang) if self.l10n => by_lang
                .into_iter()
                .map(|(lang, v)| self.normalize_items(v).map(|v| (lang, v)))
                .collect::<Result<IndexMap<_, _>>>()
                .map(Value::Map),
            other => self.normalize_items(other),
        }
    }

    fn normalize_items(&self, val: Value) -> Result<Value> {
        match val {
            Value::Null => Ok(Value::Null),
            Value::List(items) if self.multiple() => items
                .into_iter()
                .map(|item| self.normalize_item(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            other => self.normalize_item(other),
        }
    }

    fn normalize_item(&self, item: Value) -> Result<Value> {
        match &self.kind {
            PropertyKind::Color(c) => c.color_val(item),
            _ => Ok(item),
        }
    }

    fn lang_for(&self, opts: &DisplayOptions) -> String {
        opts.lang
            .clone()
            .or_else(|| self.deps.translator.as_ref().map(|t| t.current_locale()))
            .unwrap_or_else(|| config::DEFAULT_LANG.to_string())
    }

    /// Pick the requested locale out of a localized value. Missing locales
    /// come out as an empty string.
    fn localized(&self, val: &Value, opts: &DisplayOptions) -> Value {
        let lang = self.lang_for(opts);
        match val {
            Value::Map(_) | Value::Translation(_) if self.l10n => {
                val.get_lang(&lang).unwrap_or_else(|| Value::from(""))
            }
            Value::Translation(t) => {
                Value::from(t.clone().with_lang(lang).to_string())
            }
            other => other.clone(),
        }
    }

    fn joined(&self, val: Value) -> Value {
        match val {
            Value::List(items) if self.multiple() => Value::from(
                items
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(self.multiple_separator()),
            ),
            other => other,
        }
    }

    // Descriptive fields -----------------------------------------------------

    /// The explicit label, or one derived from the ident: `first_name`
    /// becomes `First Name`.
    pub fn label(&self) -> Translation {
        match self.label.as_ref().filter(|l| !l.is_empty()) {
            Some(label) => label.clone(),
            None => Translation::new(default_label(&self.ident)),
        }
    }

    pub fn set_label(&mut self, label: impl Into<Translation>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    pub fn description(&self) -> &Translation {
        &self.description
    }

    pub fn set_description(
        &mut self,
        description: impl Into<Translation>,
    ) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn notes(&self) -> &Translation {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: impl Into<Translation>) -> &mut Self {
        self.notes = notes.into();
        self
    }

    pub fn display_type(&self) -> String {
        self.display_type
            .clone()
            .or_else(|| {
                self.definition
                    .get("admin")
                    .and_then(|a| a.get("display_type"))
                    .and_then(Json::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| config::DEFAULT_DISPLAY_TYPE.to_string())
    }

    pub fn set_display_type(&mut self, display_type: &str) -> &mut Self {
        self.display_type = Some(display_type.to_string());
        self
    }

    /// All view options, or the ones stored under `ident`. Missing idents
    /// come out as an empty object.
    pub fn view_options(&self, ident: Option<&str>) -> Json {
        match ident {
            None => Json::Object(self.view_options.clone()),
            Some(ident) => self
                .view_options
                .get(ident)
                .cloned()
                .unwrap_or_else(|| Json::Object(MetadataData::new())),
        }
    }

    pub fn set_view_options(&mut self, opts: MetadataData) -> &mut Self {
        self.view_options = opts;
        self
    }

    // Flags --------------------------------------------------------------

    pub fn l10n(&self) -> bool {
        self.l10n
    }

    pub fn set_l10n(&mut self, l10n: bool) -> &mut Self {
        self.l10n = l10n;
        self
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) -> &mut Self {
        self.hidden = hidden;
        self
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn set_required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    pub fn unique(&self) -> bool {
        self.unique
    }

    pub fn set_unique(&mut self, unique: bool) -> &mut Self {
        self.unique = unique;
        self
    }

    pub fn allow_null(&self) -> bool {
        self.allow_null
    }

    pub fn set_allow_null(&mut self, allow_null: bool) -> &mut Self {
        self.allow_null = allow_null;
        self
    }

    pub fn storable(&self) -> bool {
        self.storable
    }

    pub fn set_storable(&mut self, storable: bool) -> &mut Self {
        self.storable = storable;
        self
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) -> &mut Self {
        self.active = active;
        self
    }

    /// Date-times and booleans are never multiple.
    pub fn multiple(&self) -> bool {
        match self.kind {
            PropertyKind::DateTime(_) | PropertyKind::Boolean(_) => false,
            _ => self.multiple,
        }
    }

    pub fn set_multiple(&mut self, multiple: bool) -> Result<&mut Self> {
        if multiple
            && matches!(
                self.kind,
                PropertyKind::DateTime(_) | PropertyKind::Boolean(_)
            )
        {
            return Err(PropertyError::invalid(format!(
                "Multiple is not supported for {} properties",
                self.r#type()
            )));
        }
        self.multiple = multiple;
        self.resplit()?;
        Ok(self)
    }

    pub fn multiple_options(&self) -> &MultipleOptions {
        &self.multiple_options
    }

    /// Merge a partial `{separator, min, max}` object over the current
    /// options.
    pub fn set_multiple_options(&mut self, opts: &Json) -> Result<&mut Self> {
        let obj = opts.as_object().ok_or_else(|| {
            PropertyError::invalid("multiple options must be an object")
        })?;
        if let Some(sep) = obj.get("separator") {
            let sep = json_string(sep)?;
            if sep.is_empty() {
                return Err(PropertyError::invalid(
                    "multiple separator can not be empty",
                ));
            }
            self.multiple_options.separator = sep;
        }
        if let Some(min) = obj.get("min") {
            self.multiple_options.min = json_usize(min)?;
        }
        if let Some(max) = obj.get("max") {
            self.multiple_options.max = json_usize(max)?;
        }
        self.resplit()?;
        Ok(self)
    }

    /// Run a string value that was stored before the property became
    /// multiple back through [`Property::set_val`] so it is split.
    fn resplit(&mut self) -> Result<()> {
        if !self.multiple() {
            return Ok(());
        }
        let unsplit = match &self.val {
            Value::Str(_) => true,
            Value::Map(by_lang) if self.l10n => {
                by_lang.values().any(|v| matches!(v, Value::Str(_)))
            }
            _ => false,
        };
        if unsplit {
            let current = self.val.clone();
            self.set_val(current)?;
        }
        Ok(())
    }

    pub fn multiple_separator(&self) -> &str {
        &self.multiple_options.separator
    }

    // Persistence ----------------------------------------------------------

    /// Pre-storage hook. Files move their uploads into place, structures
    /// save their nested properties; everything else returns its value
    /// unchanged.
    pub fn save(&mut self, uploads: &Uploads) -> Result<Value> {
        match self.kind {
            PropertyKind::File(_) => self.save_file(uploads),
            PropertyKind::Structure(_) => self.save_structure(uploads),
            _ => Ok(self.val.clone()),
        }
    }

    pub fn serialize_val(&self) -> Result<String> {
        serde_json::to_string(&self.val)
            .map_err(|e| PropertyError::invalid(e.to_string()))
    }

    pub fn unserialize(&mut self, data: &str) -> Result<&mut Self> {
        let val: Value = serde_json::from_str(data)
            .map_err(|e| PropertyError::invalid(e.to_string()))?;
        self.set_val(val)
    }

    // Setter and getter registries -----------------------------------------

    /// Apply a definition record. Keys may be snake_case or camelCase;
    /// keys without a setter are ignored. The value is applied last so it
    /// is coerced under the final configuration.
    pub fn set_data(&mut self, data: &MetadataData) -> Result<&mut Self> {
        let mut val = None;
        for (key, v) in data {
            let key = snake_case(key);
            if key == "val" {
                val = Some(v);
                continue;
            }
            if !self.set_field(&key, v)? {
                tracing::trace!(ident = %self.ident, key = %key, "no setter for key");
            }
        }
        if let Some(v) = val {
            self.set_field("val", v)?;
        }
        self.definition.extend(data.clone());
        Ok(self)
    }

    fn set_field(&mut self, key: &str, val: &Json) -> Result<bool> {
        match key {
            "ident" => {
                self.set_ident(&json_string(val)?);
            }
            "label" => {
                self.set_label(Translation::try_from(val)?);
            }
            "description" => {
                self.set_description(Translation::try_from(val)?);
            }
            "notes" => {
                self.set_notes(Translation::try_from(val)?);
            }
            "l10n" => self.l10n = json_bool(val)?,
            "hidden" => self.hidden = json_bool(val)?,
            "required" => self.required = json_bool(val)?,
            "unique" => self.unique = json_bool(val)?,
            "allow_null" => self.allow_null = json_bool(val)?,
            "storable" => self.storable = json_bool(val)?,
            "active" => self.active = json_bool(val)?,
            "multiple" => {
                self.set_multiple(json_bool(val)?)?;
            }
            "multiple_options" => {
                self.set_multiple_options(val)?;
            }
            "display_type" => self.display_type = Some(json_string(val)?),
            "view_options" => {
                self.view_options = val.as_object().cloned().unwrap_or_default()
            }
            "val" => {
                self.set_val(Value::from(val.clone()))?;
            }
            _ => return self.set_kind_field(key, val),
        }
        Ok(true)
    }

    fn set_kind_field(&mut self, key: &str, val: &Json) -> Result<bool> {
        match &mut self.kind {
            PropertyKind::String(c) | PropertyKind::Html(c) => {
                c.set_field(key, val)
            }
            PropertyKind::Boolean(c) => c.set_field(key, val),
            PropertyKind::Color(c) => c.set_field(key, val),
            PropertyKind::DateTime(c) => c.set_field(key, val),
            PropertyKind::File(c) => c.set_field(key, val),
            PropertyKind::Structure(c) => c.set_field(key, val),
            PropertyKind::Generic | PropertyKind::Number | PropertyKind::Lang => {
                Ok(false)
            }
        }
    }

    /// Read a field by name, the counterpart of [`Property::set_data`].
    pub fn field(&self, name: &str) -> Option<Json> {
        let name = snake_case(name);
        Some(match name.as_str() {
            "ident" => Json::from(self.ident.as_str()),
            "type" => Json::from(self.r#type()),
            "label" => Value::from(self.label()).to_json(),
            "description" => Value::from(self.description.clone()).to_json(),
            "notes" => Value::from(self.notes.clone()).to_json(),
            "l10n" => Json::from(self.l10n),
            "hidden" => Json::from(self.hidden),
            "required" => Json::from(self.required),
            "unique" => Json::from(self.unique),
            "allow_null" => Json::from(self.allow_null),
            "storable" => Json::from(self.storable),
            "active" => Json::from(self.active),
            "multiple" => Json::from(self.multiple()),
            "multiple_options" => {
                serde_json::to_value(&self.multiple_options).ok()?
            }
            "display_type" => Json::from(self.display_type()),
            "view_options" => self.view_options(None),
            "val" => self.val.to_json(),
            "sql_type" => Json::from(self.sql_type()),
            _ => return self.kind_field(&name),
        })
    }

    fn kind_field(&self, name: &str) -> Option<Json> {
        match &self.kind {
            PropertyKind::String(c) | PropertyKind::Html(c) => c.field(name),
            PropertyKind::Boolean(c) => c.field(name),
            PropertyKind::Color(c) => c.field(name),
            PropertyKind::DateTime(c) => c.field(name),
            PropertyKind::File(c) => c.field(name),
            PropertyKind::Structure(c) => c.field(name),
            PropertyKind::Generic | PropertyKind::Number | PropertyKind::Lang => {
                None
            }
        }
    }

    // Typed access to variant configuration ---------------------------------

    pub fn as_string(&self) -> Option<&StringConfig> {
        match &self.kind {
            PropertyKind::String(c) | PropertyKind::Html(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_string_mut(&mut self) -> Option<&mut StringConfig> {
        match &mut self.kind {
            PropertyKind::String(c) | PropertyKind::Html(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<&BooleanConfig> {
        match &self.kind {
            PropertyKind::Boolean(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_boolean_mut(&mut self) -> Option<&mut BooleanConfig> {
        match &mut self.kind {
            PropertyKind::Boolean(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&ColorConfig> {
        match &self.kind {
            PropertyKind::Color(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_color_mut(&mut self) -> Option<&mut ColorConfig> {
        match &mut self.kind {
            PropertyKind::Color(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTimeConfig> {
        match &self.kind {
            PropertyKind::DateTime(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_datetime_mut(&mut self) -> Option<&mut DateTimeConfig> {
        match &mut self.kind {
            PropertyKind::DateTime(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileConfig> {
        match &self.kind {
            PropertyKind::File(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut FileConfig> {
        match &mut self.kind {
            PropertyKind::File(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&StructureConfig> {
        match &self.kind {
            PropertyKind::Structure(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_structure_mut(&mut self) -> Option<&mut StructureConfig> {
        match &mut self.kind {
            PropertyKind::Structure(c) => Some(c),
            _ => None,
        }
    }

    // Base checks ----------------------------------------------------------

    pub fn validate_required(&mut self) -> bool {
        if self.required && self.val.is_falsy() {
            self.validator.error("Value is required.", "required");
            return false;
        }
        true
    }

    /// Uniqueness needs a view of the other stored records, which a
    /// property does not have. Storage layers run their own check.
    pub fn validate_unique(&mut self) -> bool {
        true
    }

    pub fn validate_allow_null(&mut self) -> bool {
        if !self.allow_null && self.val.is_null() {
            self.validator.error("Value can not be null.", "allowNull");
            return false;
        }
        true
    }

    /// Item count per locale (or the single count for unlocalized values).
    /// Null values are not counted at all.
    fn item_counts(&self) -> Vec<usize> {
        let count = |v: &Value| match v {
            Value::Null => None,
            Value::List(items) => Some(items.len()),
            _ => Some(1),
        };
        match &self.val {
            Value::Map(by_lang) if self.l10n => {
                by_lang.values().filter_map(count).collect()
            }
            other => count(other).into_iter().collect(),
        }
    }

    pub fn validate_multiple_min(&mut self) -> bool {
        let min = self.multiple_options.min;
        if !self.multiple() || min == 0 {
            return true;
        }
        if self.item_counts().iter().all(|n| *n >= min) {
            return true;
        }
        self.validator.error(
            format!("At least {min} values are required."),
            "multipleMin",
        );
        false
    }

    pub fn validate_multiple_max(&mut self) -> bool {
        let max = self.multiple_options.max;
        if !self.multiple() || max == 0 {
            return true;
        }
        if self.item_counts().iter().all(|n| *n <= max) {
            return true;
        }
        self.validator.error(
            format!("At most {max} values are allowed."),
            "multipleMax",
        );
        false
    }
}

/// The check handler table.
fn check_for(name: &str) -> Option<Check<Property>> {
    let check: Check<Property> = match name {
        "required" => Property::validate_required,
        "unique" => Property::validate_unique,
        "allowNull" => Property::validate_allow_null,
        "multipleMin" => Property::validate_multiple_min,
        "multipleMax" => Property::validate_multiple_max,
        "min" => Property::validate_min,
        "max" => Property::validate_max,
        "acceptedMimetypes" => Property::validate_accepted_mimetypes,
        "maxFilesize" => Property::validate_max_filesize,
        "minLength" => Property::validate_min_length,
        "maxLength" => Property::validate_max_length,
        "regexp" => Property::validate_regexp,
        "structure" => Property::validate_structure,
        _ => return None,
    };
    Some(check)
}

impl Validatable for Property {
    fn validation_methods(&self) -> Vec<&'static str> {
        let mut methods = vec!["required", "unique", "allowNull"];
        if self.multiple() {
            methods.extend(["multipleMin", "multipleMax"]);
        }
        match self.kind {
            PropertyKind::DateTime(_) => methods.extend(["min", "max"]),
            PropertyKind::File(_) => {
                methods.extend(["acceptedMimetypes", "maxFilesize"])
            }
            PropertyKind::String(_) | PropertyKind::Html(_) => {
                methods.extend(["minLength", "maxLength", "regexp"])
            }
            PropertyKind::Structure(_) => methods.push("structure"),
            _ => {}
        }
        methods
    }

    fn validator(&self) -> &Validator {
        &self.validator
    }

    fn validate(&mut self) -> bool {
        self.validator.clear();
        let methods = self.validation_methods();
        run_checks(self, &methods, check_for)
    }
}

impl Storable for Property {
    fn sql_type(&self) -> String {
        let multiple = self.multiple();
        let sql = match &self.kind {
            PropertyKind::Html(_) | PropertyKind::Structure(_) => "TEXT",
            PropertyKind::Boolean(_) => "TINYINT(1) UNSIGNED",
            PropertyKind::DateTime(_) => "DATETIME",
            _ if multiple => "TEXT",
            PropertyKind::String(c) => return c.sql_type(),
            PropertyKind::Color(c) if c.support_alpha() => "VARCHAR(32)",
            PropertyKind::Color(_) => "CHAR(7)",
            PropertyKind::Number => "DOUBLE",
            PropertyKind::Lang => "CHAR(2)",
            PropertyKind::Generic | PropertyKind::File(_) => "VARCHAR(255)",
        };
        sql.to_string()
    }

    fn sql_pdo_type(&self) -> PdoType {
        match self.kind {
            PropertyKind::Boolean(_) => PdoType::Bool,
            _ => PdoType::Str,
        }
    }

    /// Multiple values are joined on the separator, booleans become 0 or
    /// 1, date-times use the storage format and anything structured is
    /// stored as JSON.
    fn storage_val(&self) -> Result<Value> {
        if self.val.is_null() {
            if !self.allow_null {
                return Err(PropertyError::invalid(format!(
                    "Property \"{}\" value can not be NULL (not allowed)",
                    self.ident
                )));
            }
            return Ok(Value::Null);
        }
        Ok(match &self.val {
            Value::Bool(b) => Value::Int(i64::from(*b)),
            Value::DateTime(_) => Value::from(self.val.to_string()),
            Value::List(items)
                if self.multiple() && items.iter().all(Value::is_scalar) =>
            {
                self.joined(self.val.clone())
            }
            Value::List(_) | Value::Map(_) | Value::Translation(_) => {
                Value::from(self.val.to_json().to_string())
            }
            other => other.clone(),
        })
    }
}

impl Describable for Property {
    fn metadata(&self) -> &MetadataData {
        &self.definition
    }
}

/// Only the value is serialized.
impl Serialize for Property {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.val.serialize(s)
    }
}

impl Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.val {
            Value::Str(_) | Value::DateTime(_) | Value::Translation(_) => {
                write!(f, "{}", self.val)
            }
            _ => Ok(()),
        }
    }
}

fn default_label(ident: &str) -> String {
    ident
        .replace(['.', '_'], " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `allowNull` and `allow-null` both become `allow_null`.
fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '-' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}

pub(crate) fn json_bool(val: &Json) -> Result<bool> {
    match val {
        Json::Null => Ok(false),
        Json::Bool(b) => Ok(*b),
        Json::Number(n) => Ok(n.as_f64().is_some_and(|n| n != 0.0)),
        Json::String(s) => match s.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "" | "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(PropertyError::invalid(format!("{s} is not a boolean"))),
        },
        other => Err(PropertyError::invalid(format!("{other} is not a boolean"))),
    }
}

pub(crate) fn json_string(val: &Json) -> Result<String> {
    match val {
        Json::Null => Ok(String::new()),
        Json::String(s) => Ok(s.clone()),
        Json::Number(n) => Ok(n.to_string()),
        other => Err(PropertyError::invalid(format!("{other} is not a string"))),
    }
}

pub(crate) fn json_i64(val: &Json) -> Result<i64> {
    match val {
        Json::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| PropertyError::invalid(format!("{n} is not an integer"))),
        Json::String(s) => s
            .trim()
            .parse()
            .map_err(|_| PropertyError::invalid(format!("{s} is not an integer"))),
        other => {
            Err(PropertyError::invalid(format!("{other} is not an integer")))
        }
    }
}

pub(crate) fn json_usize(val: &Json) -> Result<usize> {
    let n = json_i64(val)?;
    usize::try_from(n)
        .map_err(|_| PropertyError::invalid(format!("{n} can not be negative")))
}
