//! Model-structure properties hold a nested record (or a list of records)
//! whose fields are described by a [`StructureMetadata`] schema. In
//! `model` mode every schema field becomes a real [`Property`], so nested
//! values go through the same coercion, validation and save pipeline as
//! top-level ones.

use super::{json_string, Property, PropertyKind};
use crate::{
    errors::{PropertyError, Result},
    factory::{Container, PropertyFactory},
    metadata::{normalize_interface, Describable, MetadataData, StructureMetadata},
    models::Value,
    upload::Uploads,
    validation::{run_checks, Check, Validatable, Validator},
};
use anyhow::anyhow;
use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use serde_json::Value as Json;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StructureModelKind {
    /// Fields are built as properties through the factory.
    #[default]
    Model,
    /// Records are kept as raw maps.
    Plain,
}

impl FromStr for StructureModelKind {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "model" => Ok(StructureModelKind::Model),
            "plain" | "map" | "array" => Ok(StructureModelKind::Plain),
            other => Err(PropertyError::invalid(format!(
                "unknown structure model \"{other}\""
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructureConfig {
    model_kind: StructureModelKind,
    interfaces: IndexSet<String>,
    /// Explicitly assigned schema, merged over the interfaces.
    terminal: Option<MetadataData>,
    resolved: Option<StructureMetadata>,
    map: bool,
}

impl StructureConfig {
    /// A `map-structure`: plain records unless a model is asked for.
    pub fn map() -> Self {
        StructureConfig {
            model_kind: StructureModelKind::Plain,
            map: true,
            ..Default::default()
        }
    }

    pub fn is_map(&self) -> bool {
        self.map
    }

    pub fn model_kind(&self) -> StructureModelKind {
        self.model_kind
    }

    pub fn set_structure_model(&mut self, model: &str) -> Result<&mut Self> {
        self.model_kind = model.parse()?;
        Ok(self)
    }

    pub fn structure_interfaces(&self) -> Vec<&str> {
        self.interfaces.iter().map(String::as_str).collect()
    }

    pub fn set_structure_interfaces<I, S>(&mut self, interfaces: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.interfaces.clear();
        self.resolved = None;
        for interface in interfaces {
            self.add_structure_interface(interface.as_ref());
        }
        self
    }

    /// Blank idents are ignored; duplicates keep their first position.
    pub fn add_structure_interface(&mut self, interface: &str) -> &mut Self {
        if !interface.is_empty() {
            self.interfaces.insert(normalize_interface(interface));
            self.resolved = None;
        }
        self
    }

    pub fn structure_terminal(&self) -> Option<&MetadataData> {
        self.terminal.as_ref()
    }

    pub fn set_structure_metadata(
        &mut self,
        data: Option<MetadataData>,
    ) -> &mut Self {
        self.terminal = data;
        self.resolved = None;
        self
    }

    pub(super) fn set_field(&mut self, key: &str, val: &Json) -> Result<bool> {
        match key {
            "structure_metadata" => {
                let data = match val {
                    Json::Null => None,
                    Json::Object(o) => Some(o.clone()),
                    Json::String(s) => match serde_json::from_str(s) {
                        Ok(Json::Object(o)) => Some(o),
                        _ => {
                            return Err(PropertyError::invalid(
                                "structure metadata must be an object",
                            ))
                        }
                    },
                    _ => {
                        return Err(PropertyError::invalid(
                            "structure metadata must be an object",
                        ))
                    }
                };
                self.set_structure_metadata(data);
            }
            "structure_interfaces" => {
                let interfaces = match val {
                    Json::Array(items) => items
                        .iter()
                        .map(json_string)
                        .collect::<Result<Vec<_>>>()?,
                    other => vec![json_string(other)?],
                };
                self.set_structure_interfaces(interfaces);
            }
            "structure_model" => {
                self.set_structure_model(&json_string(val)?)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(super) fn field(&self, name: &str) -> Option<Json> {
        match name {
            "structure_interfaces" => {
                Some(Json::from(self.structure_interfaces()))
            }
            "structure_model" => Some(Json::from(match self.model_kind {
                StructureModelKind::Model => "model",
                StructureModelKind::Plain => "plain",
            })),
            "structure_metadata" => {
                Some(self.terminal.clone().map_or(Json::Null, Json::Object))
            }
            _ => None,
        }
    }
}

/// What a new structure model starts from before the value is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DefaultData {
    #[default]
    None,
    /// The schema's own `default_data`.
    Schema,
    Custom(IndexMap<String, Value>),
}

#[derive(Debug, Clone, Default)]
pub struct StructureOptions {
    pub default_data: DefaultData,
}

#[derive(Debug, Clone)]
pub enum Structured {
    None,
    One(StructureModel),
    Many(Vec<StructureModel>),
}

/// Strings are taken to be JSON documents.
pub(super) fn decode_json(val: Value) -> Result<Value> {
    match val {
        Value::Str(s) if !s.trim().is_empty() => serde_json::from_str::<Json>(&s)
            .map(Value::from)
            .map_err(|e| {
                PropertyError::invalid(format!("structure is not valid JSON: {e}"))
            }),
        other => Ok(other),
    }
}

impl Property {
    /// The resolved schema: every interface in registration order, then the
    /// terminal data on top. Cached until the interfaces or terminal data
    /// change.
    pub fn structure_metadata(&mut self) -> Result<StructureMetadata> {
        let Some(c) = self.as_structure() else {
            return Ok(StructureMetadata::new());
        };
        if let Some(resolved) = &c.resolved {
            return Ok(resolved.clone());
        }
        let resolved = self.load_structure_metadata()?;
        if let Some(c) = self.as_structure_mut() {
            c.resolved = Some(resolved.clone());
        }
        Ok(resolved)
    }

    fn load_structure_metadata(&self) -> Result<StructureMetadata> {
        let mut meta = StructureMetadata::new();
        let Some(c) = self.as_structure() else {
            return Ok(meta);
        };
        if !c.interfaces.is_empty() {
            let loader = self.deps.metadata_loader.as_ref().ok_or_else(|| {
                anyhow!("property \"{}\" has no metadata loader", self.ident)
            })?;
            for interface in &c.interfaces {
                tracing::debug!(
                    ident = %self.ident,
                    interface = %interface,
                    "loading structure interface"
                );
                meta.merge(&loader.load(interface)?);
            }
        }
        if let Some(terminal) = &c.terminal {
            meta.merge(terminal);
        }
        Ok(meta)
    }

    fn structure_factory(&self) -> PropertyFactory {
        self.deps.property_factory.clone().unwrap_or_else(|| {
            PropertyFactory::new(Container {
                metadata_loader: self.deps.metadata_loader.clone(),
                translator: self.deps.translator.clone(),
                path_resolver: Some(self.deps.path_resolver.clone()),
            })
        })
    }

    /// Build structure models out of `val` (or the current value). Null
    /// gives no model, or an empty list when multiple.
    pub fn structure_val(
        &mut self,
        val: Option<&Value>,
        opts: &StructureOptions,
    ) -> Result<Structured> {
        let val = decode_json(val.unwrap_or(&self.val).clone())?;
        if val.is_null() {
            return Ok(if self.multiple() {
                Structured::Many(vec![])
            } else {
                Structured::None
            });
        }
        let metadata = self.structure_metadata()?;
        let defaults = match &opts.default_data {
            DefaultData::None => IndexMap::new(),
            DefaultData::Schema => metadata
                .default_data()
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect(),
            DefaultData::Custom(data) => data.clone(),
        };
        let kind = self
            .as_structure()
            .map(StructureConfig::model_kind)
            .unwrap_or_default();
        let factory = match kind {
            StructureModelKind::Model => Some(self.structure_factory().nested()?),
            StructureModelKind::Plain => None,
        };
        let build = |record: &Value| -> Result<StructureModel> {
            let mut model =
                StructureModel::new(metadata.clone(), factory.as_ref())?;
            model.set_data(&defaults)?;
            model.set_data(record_of(record)?)?;
            Ok(model)
        };
        if !self.multiple() {
            return build(&val).map(Structured::One);
        }
        match &val {
            Value::List(records) => records
                .iter()
                .map(build)
                .collect::<Result<Vec<_>>>()
                .map(Structured::Many),
            other => Err(PropertyError::invalid(format!(
                "Property \"{}\" expects a list of records, got {other}",
                self.ident
            ))),
        }
    }

    fn models_structure(&self) -> bool {
        !self.l10n
            && matches!(
                &self.kind,
                PropertyKind::Structure(c) if c.model_kind == StructureModelKind::Model
            )
    }

    pub(super) fn save_structure(&mut self, uploads: &Uploads) -> Result<Value> {
        if !self.models_structure() {
            return Ok(self.val.clone());
        }
        self.val = match self.structure_val(None, &StructureOptions::default())? {
            Structured::None => Value::Null,
            Structured::One(mut model) => {
                model.save_properties(uploads)?;
                Value::Map(model.data().clone())
            }
            Structured::Many(models) => {
                let mut records = Vec::with_capacity(models.len());
                for mut model in models {
                    model.save_properties(uploads)?;
                    records.push(Value::Map(model.data().clone()));
                }
                Value::List(records)
            }
        };
        Ok(self.val.clone())
    }

    /// Validate every nested field. Errors are reported under
    /// `{ident}.{field}`, or `{ident}.{index}.{field}` for multiple
    /// structures.
    pub fn validate_structure(&mut self) -> bool {
        if !self.models_structure() {
            return true;
        }
        let structured =
            match self.structure_val(None, &StructureOptions::default()) {
                Ok(s) => s,
                Err(e) => {
                    self.validator.error(e.to_string(), "structure");
                    return false;
                }
            };
        match structured {
            Structured::None => true,
            Structured::One(mut model) => {
                if model.validate() {
                    return true;
                }
                self.validator.absorb(model.validator());
                false
            }
            Structured::Many(models) => {
                let mut valid = true;
                for (i, mut model) in models.into_iter().enumerate() {
                    if model.validate() {
                        continue;
                    }
                    let mut entry = Validator::new(i.to_string());
                    entry.absorb(model.validator());
                    self.validator.absorb(&entry);
                    valid = false;
                }
                valid
            }
        }
    }
}

fn record_of(val: &Value) -> Result<&IndexMap<String, Value>> {
    static EMPTY: Lazy<IndexMap<String, Value>> = Lazy::new(IndexMap::new);
    match val {
        Value::Map(record) => Ok(record),
        Value::Null => Ok(&EMPTY),
        other => Err(PropertyError::invalid(format!(
            "structure records must be objects, got {other}"
        ))),
    }
}

/// One nested record.
#[derive(Debug, Clone)]
pub struct StructureModel {
    metadata: StructureMetadata,
    properties: IndexMap<String, Property>,
    data: IndexMap<String, Value>,
    validator: Validator,
}

impl StructureModel {
    /// With a factory every schema field is built as a property; without
    /// one the model is a plain map.
    pub fn new(
        metadata: StructureMetadata,
        factory: Option<&PropertyFactory>,
    ) -> Result<Self> {
        let mut properties = IndexMap::new();
        let mut data = IndexMap::new();
        if let Some(factory) = factory {
            for (ident, definition) in metadata.properties() {
                let prop = factory.create_from_definition(ident, definition)?;
                data.insert(ident.to_string(), prop.val().clone());
                properties.insert(ident.to_string(), prop);
            }
        }
        Ok(StructureModel {
            metadata,
            properties,
            data,
            validator: Validator::default(),
        })
    }

    /// Fields with a property are coerced through it; anything else is kept
    /// as is.
    pub fn set_data(&mut self, data: &IndexMap<String, Value>) -> Result<&mut Self> {
        for (ident, val) in data {
            let val = match self.properties.get_mut(ident) {
                Some(prop) => prop.set_val(val.clone())?.val().clone(),
                None => val.clone(),
            };
            self.data.insert(ident.clone(), val);
        }
        Ok(self)
    }

    pub fn data(&self) -> &IndexMap<String, Value> {
        &self.data
    }

    pub fn get(&self, ident: &str) -> Option<&Value> {
        self.data.get(ident)
    }

    pub fn property(&self, ident: &str) -> Option<&Property> {
        self.properties.get(ident)
    }

    pub fn property_mut(&mut self, ident: &str) -> Option<&mut Property> {
        self.properties.get_mut(ident)
    }

    pub fn structure_metadata(&self) -> &StructureMetadata {
        &self.metadata
    }

    /// Run every field's save hook and keep what it returns.
    pub fn save_properties(&mut self, uploads: &Uploads) -> Result<()> {
        for (ident, prop) in self.properties.iter_mut() {
            let saved = prop.save(uploads)?;
            self.data.insert(ident.clone(), saved);
        }
        Ok(())
    }

    fn validate_properties(&mut self) -> bool {
        let mut valid = true;
        for prop in self.properties.values_mut() {
            if !prop.validate() {
                self.validator.append(prop.validator());
                valid = false;
            }
        }
        valid
    }
}

fn model_check(name: &str) -> Option<Check<StructureModel>> {
    match name {
        "properties" => Some(StructureModel::validate_properties),
        _ => None,
    }
}

impl Validatable for StructureModel {
    fn validation_methods(&self) -> Vec<&'static str> {
        vec!["properties"]
    }

    fn validator(&self) -> &Validator {
        &self.validator
    }

    fn validate(&mut self) -> bool {
        self.validator.clear();
        let methods = self.validation_methods();
        run_checks(self, &methods, model_check)
    }
}

impl Describable for StructureModel {
    fn metadata(&self) -> &MetadataData {
        self.metadata.data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config,
        factory::PropertyOptions,
        metadata::MemoryMetadataLoader,
        property::{DisplayOptions, Storable},
    };
    use serde_json::json;
    use std::sync::Arc;

    fn obj(v: Json) -> MetadataData {
        v.as_object().cloned().expect("object")
    }

    fn address_schema() -> MetadataData {
        obj(json!({
            "properties": {
                "street": {"type": "string", "max_length": 20},
                "zip": {"type": "string", "required": true},
                "active": {"type": "boolean"}
            },
            "default_data": {"country": "CA"}
        }))
    }

    fn address_prop() -> Property {
        let mut prop = Property::structure();
        prop.set_ident("address");
        prop.as_structure_mut()
            .expect("structure")
            .set_structure_metadata(Some(address_schema()));
        prop
    }

    fn loader_prop(loader: MemoryMetadataLoader) -> Property {
        Property::with_options(
            PropertyKind::Structure(StructureConfig::default()),
            PropertyOptions {
                metadata_loader: Some(Arc::new(loader)),
                ..Default::default()
            },
        )
        .expect("property")
    }

    #[test]
    fn test_terminal_data_wins_over_interfaces() {
        let loader = MemoryMetadataLoader::new().with(
            "app/postal-address",
            json!({"properties": {
                "street": {"type": "string"},
                "zip": {"type": "string", "label": "Zip"}
            }}),
        );
        let mut prop = loader_prop(loader);
        prop.as_structure_mut()
            .expect("structure")
            .add_structure_interface("App\\PostalAddress")
            .set_structure_metadata(Some(obj(
                json!({"properties": {"zip": {"type": "number"}}}),
            )));
        let meta = prop.structure_metadata().expect("metadata");
        assert_eq!(meta.property("zip").expect("zip")["type"], "number");
        assert_eq!(meta.property("zip").expect("zip")["label"], "Zip");
        assert_eq!(meta.property("street").expect("street")["type"], "string");
    }

    #[test]
    fn test_metadata_cache_is_invalidated() {
        let loader = MemoryMetadataLoader::new()
            .with("a", json!({"properties": {"x": {}}}))
            .with("b", json!({"properties": {"y": {}}}));
        let mut prop = loader_prop(loader);
        prop.as_structure_mut()
            .expect("structure")
            .add_structure_interface("a");
        let first = prop.structure_metadata().expect("metadata");
        assert!(first.property("y").is_none());
        assert_eq!(prop.structure_metadata().expect("cached"), first);

        prop.as_structure_mut()
            .expect("structure")
            .add_structure_interface("b");
        let second = prop.structure_metadata().expect("metadata");
        assert!(second.property("x").is_some());
        assert!(second.property("y").is_some());

        prop.as_structure_mut()
            .expect("structure")
            .set_structure_interfaces(["b"]);
        let third = prop.structure_metadata().expect("metadata");
        assert!(third.property("x").is_none());
    }

    #[test]
    fn test_interfaces_need_a_loader() {
        let mut prop = Property::structure();
        prop.as_structure_mut()
            .expect("structure")
            .add_structure_interface("app/address");
        assert!(matches!(
            prop.structure_metadata(),
            Err(PropertyError::Collaborator(_))
        ));

        let mut prop = loader_prop(MemoryMetadataLoader::new());
        prop.as_structure_mut()
            .expect("structure")
            .add_structure_interface("app/missing");
        assert!(prop.structure_metadata().is_err());
    }

    #[test]
    fn test_json_strings_are_decoded() {
        let mut prop = address_prop();
        prop.set_val(r#"{"street": "Main St", "zip": "H0H"}"#)
            .expect("set");
        let record = prop.val().as_map().expect("map");
        assert_eq!(record["street"], Value::from("Main St"));
        assert_eq!(prop.sql_type(), "TEXT");
        assert_eq!(
            prop.storage_val().expect("storage"),
            Value::from(r#"{"street":"Main St","zip":"H0H"}"#)
        );
        assert!(matches!(
            prop.set_val("{nope"),
            Err(PropertyError::InvalidValue(_))
        ));
        prop.set_val("").expect("blank");
        assert_eq!(prop.val(), &Value::Null);
    }

    #[test]
    fn test_model_fields_are_coerced() {
        let mut prop = address_prop();
        prop.set_val(Value::from(json!({"zip": "H0H", "active": "yes", "note": 3})))
            .expect("set");
        let Structured::One(model) = prop
            .structure_val(None, &StructureOptions::default())
            .expect("model")
        else {
            panic!("expected one model");
        };
        assert_eq!(model.get("active"), Some(&Value::Bool(true)));
        assert_eq!(model.get("street"), Some(&Value::Null));
        assert_eq!(model.get("note"), Some(&Value::Int(3)));
        assert_eq!(model.property("zip").map(Property::r#type), Some("string"));
        assert_eq!(model.metadata()["default_data"]["country"], "CA");

        let saved = prop.save(&Uploads::new()).expect("save");
        let record = saved.as_map().expect("map");
        assert_eq!(record["active"], Value::Bool(true));
        assert_eq!(prop.val(), &saved);
    }

    #[test]
    fn test_default_data() {
        let mut prop = address_prop();
        prop.set_val(Value::from(json!({"zip": "H0H"}))).expect("set");
        let opts = StructureOptions {
            default_data: DefaultData::Schema,
        };
        let Structured::One(model) = prop.structure_val(None, &opts).expect("model")
        else {
            panic!("expected one model");
        };
        assert_eq!(model.get("country"), Some(&Value::from("CA")));
        assert_eq!(model.get("zip"), Some(&Value::from("H0H")));

        let mut custom = IndexMap::new();
        custom.insert("zip".to_string(), Value::from("default"));
        custom.insert("country".to_string(), Value::from("FR"));
        let opts = StructureOptions {
            default_data: DefaultData::Custom(custom),
        };
        let Structured::One(model) = prop.structure_val(None, &opts).expect("model")
        else {
            panic!("expected one model");
        };
        assert_eq!(model.get("country"), Some(&Value::from("FR")));
        // the value is applied after the defaults
        assert_eq!(model.get("zip"), Some(&Value::from("H0H")));
    }

    #[test]
    fn test_multiple_structures() {
        let mut prop = address_prop();
        prop.set_multiple(true).expect("multiple");
        assert!(matches!(
            prop.structure_val(None, &StructureOptions::default()),
            Ok(Structured::Many(models)) if models.is_empty()
        ));
        prop.set_val(Value::from(json!([{"zip": "A"}, {"zip": "B"}])))
            .expect("set");
        let Structured::Many(models) = prop
            .structure_val(None, &StructureOptions::default())
            .expect("models")
        else {
            panic!("expected many models");
        };
        assert_eq!(models.len(), 2);
        assert_eq!(models[1].get("zip"), Some(&Value::from("B")));
        assert!(prop
            .structure_val(
                Some(&Value::from(json!({"zip": "A"}))),
                &StructureOptions::default()
            )
            .is_err());
    }

    #[test]
    fn test_nested_errors_are_prefixed() {
        let mut prop = address_prop();
        prop.set_val(Value::from(json!({"street": "Main St"})))
            .expect("set");
        assert_eq!(
            prop.validation_methods(),
            ["required", "unique", "allowNull", "structure"]
        );
        assert!(!prop.validate());
        let err = &prop.validator().errors()[0];
        assert_eq!(err.ident, "address.zip");
        assert_eq!(err.code, "required");

        prop.set_multiple(true).expect("multiple");
        prop.set_val(Value::from(json!([
            {"zip": "A"},
            {"zip": "B", "street": "a street name well over twenty chars"}
        ])))
        .expect("set");
        assert!(!prop.validate());
        let idents: Vec<&str> = prop
            .validator()
            .errors()
            .iter()
            .map(|e| e.ident.as_str())
            .collect();
        assert_eq!(idents, ["address.1.street"]);

        prop.set_val(Value::from(json!([{"zip": "A"}]))).expect("set");
        assert!(prop.validate());
    }

    #[test]
    fn test_plain_structures_skip_modeling() {
        let mut prop = Property::with_options(
            PropertyKind::Structure(StructureConfig::default()),
            PropertyOptions {
                structure_model: Some("plain".to_string()),
                ..Default::default()
            },
        )
        .expect("property");
        prop.as_structure_mut()
            .expect("structure")
            .set_structure_metadata(Some(address_schema()));
        let raw = Value::from(json!({"active": "not a boolean"}));
        prop.set_val(raw.clone()).expect("set");
        assert!(prop.validate());
        assert_eq!(prop.save(&Uploads::new()).expect("save"), raw);
        let Structured::One(model) = prop
            .structure_val(None, &StructureOptions::default())
            .expect("model")
        else {
            panic!("expected one model");
        };
        assert!(model.property("active").is_none());
        assert_eq!(model.get("active"), Some(&Value::from("not a boolean")));

        assert!(matches!(
            Property::with_options(
                PropertyKind::Structure(StructureConfig::default()),
                PropertyOptions {
                    structure_model: Some("teapot".to_string()),
                    ..Default::default()
                },
            ),
            Err(PropertyError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_map_structures_are_plain() {
        let mut prop = Property::map_structure();
        assert_eq!(prop.r#type(), "map-structure");
        assert_eq!(
            prop.as_structure().map(StructureConfig::model_kind),
            Some(StructureModelKind::Plain)
        );
        assert_eq!(Property::structure().r#type(), "model-structure");

        let def = json!({"type": "map-structure", "structure_model": "model"});
        let modeled = PropertyFactory::default()
            .create_from_definition("extras", def.as_object().expect("obj"))
            .expect("property");
        assert_eq!(modeled.r#type(), "map-structure");
        assert_eq!(
            modeled.as_structure().map(StructureConfig::model_kind),
            Some(StructureModelKind::Model)
        );

        prop.set_val(Value::from(json!({"anything": [1, 2]})))
            .expect("set");
        assert!(prop.validate());
    }

    #[test]
    fn test_multiple_input_val_is_one_document() {
        let mut prop = address_prop();
        prop.set_multiple(true).expect("multiple");
        let records = Value::from(json!([{"zip": "A"}, {"zip": "B"}]));
        prop.set_val(records.clone()).expect("set");
        let input = prop.input_val(None, &DisplayOptions::default());
        assert!(input.starts_with('['), "{input}");
        prop.set_val(input).expect("set back");
        assert_eq!(prop.val(), &records);
    }

    #[test]
    fn test_nesting_depth_is_capped() {
        let mut factory = PropertyFactory::default();
        for _ in 0..config::MAX_STRUCTURE_DEPTH {
            factory = factory.nested().expect("within bounds");
        }
        let mut prop = Property::with_options(
            PropertyKind::Structure(StructureConfig::default()),
            PropertyOptions {
                property_factory: Some(factory),
                ..Default::default()
            },
        )
        .expect("property");
        prop.set_val(Value::from(json!({"a": 1}))).expect("set");
        assert!(matches!(
            prop.structure_val(None, &StructureOptions::default()),
            Err(PropertyError::InvalidValue(_))
        ));
        assert!(!prop.validate());
        assert_eq!(prop.validator().errors()[0].code, "structure");
    }

    #[test]
    fn test_definition_keys() {
        let def = json!({
            "type": "model-structure",
            "structure_interfaces": ["App.Address"],
            "structure_metadata": r#"{"properties": {"zip": {"type": "string"}}}"#
        });
        let prop = PropertyFactory::default()
            .create_from_definition("address", def.as_object().expect("obj"))
            .expect("property");
        let c = prop.as_structure().expect("structure");
        assert_eq!(c.structure_interfaces(), ["app/address"]);
        assert!(c.structure_terminal().is_some());
        assert_eq!(prop.field("structure_model"), Some(json!("model")));
    }
}
