//! The upload transport: whatever received the request hands over a map of
//! property ident to uploaded file(s), laid out like a multipart form
//! decoder would lay them out. Multiple and per-locale uploads come in as
//! parallel arrays (or maps) of `name`, `tmp_name`, `error`, `type` and
//! `size`.

use super::errors::{PropertyError, Result};
use base64::{engine::general_purpose, Engine as _};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as Json;
use std::{collections::HashMap, path::PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub tmp_name: PathBuf,
    #[serde(default)]
    pub error: i64,
    #[serde(default, rename = "type")]
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
}

impl UploadedFile {
    pub fn new(name: &str, tmp_name: impl Into<PathBuf>) -> Self {
        UploadedFile {
            name: name.to_string(),
            tmp_name: tmp_name.into(),
            ..Default::default()
        }
    }

    /// Both a client filename and a temp file are needed for an upload to
    /// be considered at all; empty slots in multi uploads have neither.
    pub fn is_present(&self) -> bool {
        !self.name.is_empty() && !self.tmp_name.as_os_str().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEntry {
    Single(UploadedFile),
    Multiple(Vec<UploadedFile>),
    Localized(IndexMap<String, UploadedFile>),
}

impl UploadEntry {
    /// Decode one transport entry. `name` decides the layout: a string for
    /// a single file, an array for multiple files, an object for
    /// per-locale files; the other fields follow the same layout.
    pub fn from_transport(json: &Json) -> Result<Self> {
        let obj = json.as_object().ok_or_else(|| {
            PropertyError::invalid("upload entry must be an object")
        })?;
        match obj.get("name") {
            Some(Json::String(_)) => serde_json::from_value(json.clone())
                .map(UploadEntry::Single)
                .map_err(|e| PropertyError::invalid(e.to_string())),
            Some(Json::Array(names)) => {
                let files = (0..names.len())
                    .map(|i| file_at(obj, |field| field.get(i)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(UploadEntry::Multiple(files))
            }
            Some(Json::Object(names)) => {
                let files = names
                    .keys()
                    .map(|lang| {
                        file_at(obj, |field| field.get(lang))
                            .map(|f| (lang.clone(), f))
                    })
                    .collect::<Result<IndexMap<_, _>>>()?;
                Ok(UploadEntry::Localized(files))
            }
            _ => Err(PropertyError::invalid("upload entry has no name")),
        }
    }

    pub fn is_present(&self) -> bool {
        match self {
            UploadEntry::Single(f) => f.is_present(),
            UploadEntry::Multiple(files) => files.iter().any(|f| f.is_present()),
            UploadEntry::Localized(files) => {
                files.values().any(|f| f.is_present())
            }
        }
    }
}

/// Pick slot `pick` out of every parallel field and assemble a file.
fn file_at(
    obj: &serde_json::Map<String, Json>,
    pick: impl Fn(&Json) -> Option<&Json>,
) -> Result<UploadedFile> {
    let slot: serde_json::Map<String, Json> = obj
        .iter()
        .filter_map(|(k, v)| pick(v).map(|v| (k.clone(), v.clone())))
        .collect();
    serde_json::from_value(Json::Object(slot))
        .map_err(|e| PropertyError::invalid(e.to_string()))
}

/// Uploads received with the current request, by property ident.
#[derive(Debug, Clone, Default)]
pub struct Uploads {
    entries: HashMap<String, UploadEntry>,
}

impl Uploads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_transport(json: &Json) -> Result<Self> {
        let obj = json.as_object().ok_or_else(|| {
            PropertyError::invalid("uploads must be an object")
        })?;
        let mut uploads = Uploads::new();
        for (ident, entry) in obj {
            uploads.insert(ident, UploadEntry::from_transport(entry)?);
        }
        Ok(uploads)
    }

    pub fn insert(&mut self, ident: &str, entry: UploadEntry) -> &mut Self {
        self.entries.insert(ident.to_string(), entry);
        self
    }

    pub fn get(&self, ident: &str) -> Option<&UploadEntry> {
        self.entries.get(ident)
    }
}

/// Decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub fn is_data_uri(s: &str) -> bool {
    s.starts_with("data:")
}

impl DataUri {
    /// `data:[<mediatype>][;base64],<data>`
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| PropertyError::invalid("not a data: URI"))?;
        let (meta, payload) = rest.split_once(',').ok_or_else(|| {
            PropertyError::invalid("File content could not be decoded.")
        })?;
        let (meta, is_base64) = match meta.strip_suffix(";base64") {
            Some(m) => (m, true),
            None => (meta, false),
        };
        let mime_type = meta
            .split(';')
            .next()
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        let bytes = if is_base64 {
            general_purpose::STANDARD
                .decode(payload.trim())
                .map_err(|_| {
                    PropertyError::invalid("File content could not be decoded.")
                })?
        } else {
            urlencoding::decode_binary(payload.as_bytes()).into_owned()
        };
        Ok(DataUri { mime_type, bytes })
    }
}
