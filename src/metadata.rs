//! Structure metadata is the schema of a structured property: which
//! sub-fields exist (`properties`), what they default to (`default_data`)
//! and whatever else the host application cares to put in there. Schemas
//! can be assembled from several "interfaces" loaded through a
//! [`MetadataLoader`].

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as Json};
use std::{collections::HashMap, fs, path::PathBuf};

pub type MetadataData = Map<String, Json>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureMetadata {
    data: MetadataData,
}

impl StructureMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: MetadataData) -> Self {
        StructureMetadata { data }
    }

    /// Deep-merge `data` over the current schema. Objects are merged key by
    /// key; anything else in `data` replaces what was there.
    pub fn merge(&mut self, data: &MetadataData) -> &mut Self {
        merge_data(&mut self.data, data);
        self
    }

    pub fn data(&self) -> &MetadataData {
        &self.data
    }

    /// Sub-field definitions, keyed by ident, in schema order.
    pub fn properties(&self) -> Vec<(&str, &MetadataData)> {
        self.data
            .get("properties")
            .and_then(Json::as_object)
            .map(|props| {
                props
                    .iter()
                    .filter_map(|(k, v)| v.as_object().map(|o| (k.as_str(), o)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn property(&self, ident: &str) -> Option<&MetadataData> {
        self.data
            .get("properties")
            .and_then(|p| p.get(ident))
            .and_then(Json::as_object)
    }

    pub fn default_data(&self) -> MetadataData {
        self.data
            .get("default_data")
            .and_then(Json::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

/// Anything that carries the definition it was built from.
pub trait Describable {
    fn metadata(&self) -> &MetadataData;
}

/// Recursive merge of JSON objects; `source` wins on conflicts.
pub fn merge_data(target: &mut MetadataData, source: &MetadataData) {
    for (key, val) in source {
        if let (Some(Json::Object(existing)), Json::Object(incoming)) =
            (target.get_mut(key), val)
        {
            merge_data(existing, incoming);
            continue;
        }
        target.insert(key.clone(), val.clone());
    }
}

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid regex"));

/// `App\Foo\BarBaz` or `app.foo.barBaz` becomes
/// `app/foo/bar-baz`.
pub fn normalize_interface(interface: &str) -> String {
    CAMEL_BOUNDARY
        .replace_all(interface, "$1-$2")
        .replace(['\\', '.'], "/")
        .to_lowercase()
}

/// Source of named partial schemas. The loader only fetches; merging is up
/// to the caller.
pub trait MetadataLoader: std::fmt::Debug + Send + Sync {
    fn load(&self, ident: &str) -> Result<MetadataData>;
}

/// Schemas registered up-front, by normalized ident.
#[derive(Debug, Default)]
pub struct MemoryMetadataLoader {
    schemas: HashMap<String, MetadataData>,
}

impl MemoryMetadataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ident: &str, data: Json) -> Self {
        self.insert(ident, data);
        self
    }

    pub fn insert(&mut self, ident: &str, data: Json) {
        if let Json::Object(o) = data {
            self.schemas.insert(normalize_interface(ident), o);
        }
    }
}

impl MetadataLoader for MemoryMetadataLoader {
    fn load(&self, ident: &str) -> Result<MetadataData> {
        self.schemas
            .get(ident)
            .cloned()
            .with_context(|| format!("no metadata registered for {ident}"))
    }
}

/// Reads `{root}/{ident}.json`.
#[derive(Debug)]
pub struct JsonDirMetadataLoader {
    root: PathBuf,
}

impl JsonDirMetadataLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonDirMetadataLoader { root: root.into() }
    }
}

impl MetadataLoader for JsonDirMetadataLoader {
    fn load(&self, ident: &str) -> Result<MetadataData> {
        let path = self.root.join(format!("{ident}.json"));
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading metadata {}", path.display()))?;
        let json: Json = serde_json::from_str(&raw)
            .with_context(|| format!("parsing metadata {}", path.display()))?;
        match json {
            Json::Object(o) => Ok(o),
            _ => anyhow::bail!("metadata {} is not an object", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Json) -> MetadataData {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn test_normalize_interface() {
        assert_eq!(
            normalize_interface("App\\Property\\MapStructure"),
            "app/property/map-structure"
        );
        assert_eq!(
            normalize_interface("app.structure.postalAddress"),
            "app/structure/postal-address"
        );
    }

    #[test]
    fn test_merge_is_deep_and_source_wins() {
        let mut meta = StructureMetadata::from_data(obj(json!({
            "properties": {
                "x": {"type": "string", "label": "X"},
                "y": {"type": "number"}
            }
        })));
        meta.merge(&obj(json!({
            "properties": {"x": {"type": "color"}},
            "default_data": {"y": 4}
        })));
        let x = meta.property("x").expect("x");
        assert_eq!(x["type"], "color");
        assert_eq!(x["label"], "X");
        assert!(meta.property("y").is_some());
        assert_eq!(meta.default_data()["y"], 4);
    }

    #[test]
    fn test_properties_keep_schema_order() {
        let meta = StructureMetadata::from_data(obj(json!({
            "properties": {"b": {}, "a": {}, "c": {}}
        })));
        let idents: Vec<&str> =
            meta.properties().into_iter().map(|(k, _)| k).collect();
        assert_eq!(idents, ["b", "a", "c"]);
    }

    #[test]
    fn test_json_dir_loader() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        fs::create_dir_all(dir.path().join("app")).expect("mkdir");
        fs::write(
            dir.path().join("app/address.json"),
            r#"{"properties": {"street": {"type": "string"}}}"#,
        )
        .expect("write");
        let loader = JsonDirMetadataLoader::new(dir.path());
        let data = loader.load("app/address").expect("load");
        assert!(data["properties"]["street"].is_object());
        assert!(loader.load("app/missing").is_err());
    }
}
