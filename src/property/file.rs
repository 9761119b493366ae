//! File properties store the path of a file that was moved into the
//! property's upload directory, relative to the resolver's base path.
//! Files arrive either through the upload transport ([`Uploads`]) or
//! inline, as `data:` URIs in the value itself.

use super::{json_bool, json_string, json_usize, Property};
use crate::{
    config,
    errors::{PropertyError, Result},
    models::Value,
    upload::{self, DataUri, UploadEntry, UploadedFile, Uploads},
};
use chrono::Local;
use indexmap::IndexMap;
use serde_json::Value as Json;
use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfig {
    public_access: bool,
    upload_path: String,
    overwrite: bool,
    accepted_mimetypes: Vec<String>,
    /// In bytes, 0 means unbounded.
    max_filesize: u64,
    /// Explicit overrides; they survive value changes.
    mimetype: Option<String>,
    filesize: Option<u64>,
    detected_mimetype: Option<String>,
    detected_filesize: Option<u64>,
}

impl Default for FileConfig {
    fn default() -> Self {
        FileConfig {
            public_access: false,
            upload_path: config::DEFAULT_UPLOAD_PATH.to_string(),
            overwrite: false,
            accepted_mimetypes: vec![],
            max_filesize: config::DEFAULT_MAX_FILESIZE,
            mimetype: None,
            filesize: None,
            detected_mimetype: None,
            detected_filesize: None,
        }
    }
}

impl FileConfig {
    pub fn public_access(&self) -> bool {
        self.public_access
    }

    pub fn set_public_access(&mut self, public: bool) -> &mut Self {
        self.public_access = public;
        self
    }

    pub fn upload_path(&self) -> &str {
        &self.upload_path
    }

    /// Always stored with exactly one trailing slash.
    pub fn set_upload_path(&mut self, path: &str) -> &mut Self {
        let trimmed = path.trim_end_matches('/');
        self.upload_path = if trimmed.is_empty() {
            config::DEFAULT_UPLOAD_PATH.to_string()
        } else {
            format!("{trimmed}/")
        };
        self
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn set_overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    pub fn accepted_mimetypes(&self) -> &[String] {
        &self.accepted_mimetypes
    }

    pub fn set_accepted_mimetypes(&mut self, types: Vec<String>) -> &mut Self {
        self.accepted_mimetypes = types;
        self
    }

    pub fn max_filesize(&self) -> u64 {
        self.max_filesize
    }

    pub fn set_max_filesize(&mut self, max: u64) -> &mut Self {
        self.max_filesize = max;
        self
    }

    /// Override the detected mimetype of the current file.
    pub fn set_mimetype(&mut self, mimetype: Option<String>) -> &mut Self {
        self.mimetype = mimetype;
        self
    }

    pub fn set_filesize(&mut self, filesize: Option<u64>) -> &mut Self {
        self.filesize = filesize;
        self
    }

    /// Drop what was detected from the previous file.
    pub(super) fn forget_detected(&mut self) {
        self.detected_mimetype = None;
        self.detected_filesize = None;
    }

    pub(super) fn set_field(&mut self, key: &str, val: &Json) -> Result<bool> {
        match key {
            "public_access" => {
                self.set_public_access(json_bool(val)?);
            }
            "upload_path" => {
                self.set_upload_path(&json_string(val)?);
            }
            "overwrite" => {
                self.set_overwrite(json_bool(val)?);
            }
            "accepted_mimetypes" => {
                let types = match val {
                    Json::Array(items) => items
                        .iter()
                        .map(json_string)
                        .collect::<Result<Vec<_>>>()?,
                    Json::Null => vec![],
                    other => json_string(other)?
                        .split(',')
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect(),
                };
                self.set_accepted_mimetypes(types);
            }
            "max_filesize" => {
                self.set_max_filesize(json_usize(val)? as u64);
            }
            "mimetype" => {
                self.set_mimetype(Some(json_string(val)?).filter(|m| !m.is_empty()));
            }
            "filesize" => {
                self.set_filesize(Some(json_usize(val)? as u64));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub(super) fn field(&self, name: &str) -> Option<Json> {
        match name {
            "public_access" => Some(Json::from(self.public_access)),
            "upload_path" => Some(Json::from(self.upload_path.as_str())),
            "overwrite" => Some(Json::from(self.overwrite)),
            "accepted_mimetypes" => {
                Some(Json::from(self.accepted_mimetypes.clone()))
            }
            "max_filesize" => Some(Json::from(self.max_filesize)),
            _ => None,
        }
    }
}

const BLACKLIST: &[char] =
    &['/', '\\', '\0', '*', ':', '?', '"', '<', '>', '|', '#', '&', '!', '`'];

/// Replace characters that are unsafe in paths with `_` and strip leading
/// dots so uploads can not become hidden files.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .replace(BLACKLIST, "_")
        .trim_start_matches('.')
        .to_string()
}

/// Sniff the content first, then try the extension, then whatever the
/// client declared. Undetected UTF-8 content is plain text.
pub fn detect_mimetype(
    bytes: &[u8],
    name: Option<&Path>,
    declared: Option<&str>,
) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    if let Some(guess) = name.and_then(|n| mime_guess::from_path(n).first()) {
        return guess.essence_str().to_string();
    }
    if let Some(declared) = declared.filter(|d| !d.is_empty()) {
        return declared.to_string();
    }
    if std::str::from_utf8(bytes).is_ok() {
        return "text/plain".to_string();
    }
    "application/octet-stream".to_string()
}

/// Enough of the head of a file for content sniffing.
fn sniff(path: &Path) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(8192);
    fs::File::open(path)?.take(8192).read_to_end(&mut head)?;
    Ok(head)
}

/// `path` exists, optionally ignoring the case of the file name.
pub fn file_exists(path: &Path, case_insensitive: bool) -> bool {
    if path.exists() {
        return true;
    }
    if !case_insensitive {
        return false;
    }
    let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
        return false;
    };
    let name = name.to_string_lossy().to_lowercase();
    fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|e| {
                e.file_name().to_string_lossy().to_lowercase() == name
            })
        })
        .unwrap_or(false)
}

fn mimetype_of(path: &Path) -> Option<String> {
    let head = sniff(path).ok()?;
    Some(detect_mimetype(&head, Some(path), None))
}

fn filesize_of(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
        .or_else(|_| fs::copy(from, to).and_then(|_| fs::remove_file(from)))
}

/// 13 characters, like the classic `uniqid()`.
fn uniqid() -> String {
    Uuid::new_v4().simple().to_string()[..13].to_string()
}

impl Property {
    /// Extension appended to generated filenames; none by default.
    pub fn generate_extension(&self) -> String {
        String::new()
    }

    /// `{label} {timestamp}`, used for inline uploads that carry no name.
    pub fn generate_filename(&self) -> String {
        let name = format!(
            "{} {}",
            self.label(),
            Local::now().format("%Y-%m-%d %H-%M-%S")
        );
        let name = sanitize_filename(&name);
        match self.generate_extension() {
            ext if ext.is_empty() => name,
            ext => format!("{name}.{ext}"),
        }
    }

    /// Where an upload named `filename` should be written. Creates the
    /// upload directory if needed. Unless overwriting is enabled, a name
    /// that is taken gets a unique suffix before its extension.
    pub fn upload_target(&self, filename: Option<&str>) -> Result<PathBuf> {
        let (upload_path, overwrite) = match self.as_file() {
            Some(c) => (c.upload_path.as_str(), c.overwrite),
            None => (config::DEFAULT_UPLOAD_PATH, false),
        };
        let dir = self.deps.path_resolver.resolve(upload_path);
        if !dir.exists() {
            tracing::debug!(dir = %dir.display(), "creating upload directory");
            fs::create_dir_all(&dir).map_err(|e| PropertyError::io(&dir, e))?;
        }
        let writable = fs::metadata(&dir)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false);
        if !writable {
            return Err(PropertyError::PermissionDenied(dir));
        }

        let filename = filename
            .map(sanitize_filename)
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| self.generate_filename());
        let target = dir.join(&filename);
        if overwrite || !file_exists(&target, true) {
            return Ok(target);
        }
        let name = Path::new(&filename);
        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = name
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        loop {
            let candidate = dir.join(format!("{stem}-{}{ext}", uniqid()));
            if !file_exists(&candidate, true) {
                return Ok(candidate);
            }
        }
    }

    /// Path of the current file, resolved against the base path. For
    /// multiple or localized values this is the first referenced file.
    fn current_file(&self) -> Option<PathBuf> {
        self.referenced_files().into_iter().next()
    }

    /// Every file the value points at: list items and locale values
    /// included, blanks and `data:` URIs skipped.
    fn referenced_files(&self) -> Vec<PathBuf> {
        fn collect<'a>(val: &'a Value, out: &mut Vec<&'a str>) {
            match val {
                Value::Str(s) => out.push(s),
                Value::List(items) => items.iter().for_each(|v| collect(v, out)),
                Value::Map(by_lang) => {
                    by_lang.values().for_each(|v| collect(v, out))
                }
                _ => {}
            }
        }
        let mut rels = vec![];
        collect(&self.val, &mut rels);
        rels.into_iter()
            .filter(|rel| !rel.is_empty() && !upload::is_data_uri(rel))
            .map(|rel| self.deps.path_resolver.resolve(rel))
            .collect()
    }

    /// Mimetype of the current file: the explicitly set one, else detected
    /// from the file on disk and cached until the value changes.
    pub fn mimetype(&mut self) -> Option<String> {
        let c = self.as_file()?;
        if let Some(m) = c.mimetype.as_ref().or(c.detected_mimetype.as_ref()) {
            return Some(m.clone());
        }
        let detected = mimetype_of(&self.current_file()?)?;
        if let Some(c) = self.as_file_mut() {
            c.detected_mimetype = Some(detected.clone());
        }
        Some(detected)
    }

    /// Size of the current file in bytes; 0 when there is none.
    pub fn filesize(&mut self) -> u64 {
        let Some(c) = self.as_file() else {
            return 0;
        };
        if let Some(size) = c.filesize.or(c.detected_filesize) {
            return size;
        }
        let Some(size) = self.current_file().and_then(|p| filesize_of(&p)) else {
            return 0;
        };
        if let Some(c) = self.as_file_mut() {
            c.detected_filesize = Some(size);
        }
        size
    }

    /// Every referenced file must have an accepted mimetype. Files that are
    /// missing from disk are not checked.
    pub fn validate_accepted_mimetypes(&mut self) -> bool {
        let Some(c) = self.as_file() else {
            return true;
        };
        if c.accepted_mimetypes.is_empty() {
            return true;
        }
        if let Some(m) = c.mimetype.clone() {
            return self.check_mimetype(&m);
        }
        let mut valid = true;
        for path in self.referenced_files() {
            if let Some(m) = mimetype_of(&path) {
                valid &= self.check_mimetype(&m);
            }
        }
        valid
    }

    pub fn validate_max_filesize(&mut self) -> bool {
        let Some(c) = self.as_file() else {
            return true;
        };
        if c.max_filesize == 0 {
            return true;
        }
        if let Some(size) = c.filesize {
            return self.check_filesize(size);
        }
        let mut valid = true;
        for path in self.referenced_files() {
            if let Some(size) = filesize_of(&path) {
                valid &= self.check_filesize(size);
            }
        }
        valid
    }

    fn check_mimetype(&mut self, mimetype: &str) -> bool {
        let accepted = self
            .as_file()
            .map_or(true, |c| c.accepted_mimetypes.iter().any(|a| a == mimetype));
        if !accepted {
            self.validator.error(
                format!("The file type \"{mimetype}\" is not accepted."),
                "acceptedMimetypes",
            );
        }
        accepted
    }

    fn check_filesize(&mut self, size: u64) -> bool {
        let max = self.as_file().map_or(0, FileConfig::max_filesize);
        if max == 0 || size <= max {
            return true;
        }
        self.validator.error(
            format!("The file is too big ({size} bytes, at most {max})."),
            "maxFilesize",
        );
        false
    }

    /// Run both file checks on an upload before it is stored.
    fn accepts(&mut self, mimetype: &str, filesize: u64) -> bool {
        let mime_ok = self
            .as_file()
            .map_or(true, |c| c.accepted_mimetypes.is_empty())
            || self.check_mimetype(mimetype);
        let size_ok = self.check_filesize(filesize);
        mime_ok && size_ok
    }

    /// Move one transport upload into place. Returns the stored path, or an
    /// empty string when the file was rejected or could not be moved.
    pub fn file_upload(&mut self, file: &UploadedFile) -> Result<String> {
        if file.error != 0 {
            tracing::warn!(
                ident = %self.ident,
                name = %file.name,
                code = file.error,
                "upload failed before reaching us"
            );
            return Ok(String::new());
        }
        let target = self.upload_target(Some(&file.name))?;
        if file.tmp_name.exists() {
            let head = sniff(&file.tmp_name)
                .map_err(|e| PropertyError::io(&file.tmp_name, e))?;
            let mimetype = detect_mimetype(
                &head,
                Some(Path::new(&file.name)),
                Some(file.mime_type.as_str()),
            );
            let filesize = fs::metadata(&file.tmp_name)
                .map(|m| m.len())
                .unwrap_or(file.size);
            if !self.accepts(&mimetype, filesize) {
                tracing::warn!(
                    ident = %self.ident,
                    name = %file.name,
                    "upload rejected by validation"
                );
                return Ok(String::new());
            }
        }
        match move_file(&file.tmp_name, &target) {
            Ok(()) => {
                tracing::info!(
                    ident = %self.ident,
                    target = %target.display(),
                    "file uploaded successfully"
                );
                Ok(self.deps.path_resolver.relativize(&target))
            }
            Err(e) => {
                tracing::warn!(
                    ident = %self.ident,
                    target = %target.display(),
                    "could not upload file: {e}"
                );
                Ok(String::new())
            }
        }
    }

    /// Decode a `data:` URI and write it under a generated name.
    pub fn data_upload(&mut self, data: &str) -> Result<String> {
        let uri = DataUri::parse(data)?;
        let mimetype =
            detect_mimetype(&uri.bytes, None, uri.mime_type.as_deref());
        if !self.accepts(&mimetype, uri.bytes.len() as u64) {
            tracing::warn!(ident = %self.ident, "inline file rejected by validation");
            return Ok(String::new());
        }
        let target = self.upload_target(None)?;
        match fs::write(&target, &uri.bytes) {
            Ok(()) => {
                tracing::info!(
                    ident = %self.ident,
                    target = %target.display(),
                    "inline file stored"
                );
                Ok(self.deps.path_resolver.relativize(&target))
            }
            Err(e) => {
                tracing::warn!(
                    ident = %self.ident,
                    target = %target.display(),
                    "could not store inline file: {e}"
                );
                Ok(String::new())
            }
        }
    }

    /// Replace every `data:` URI in `val` with the path it was stored at.
    fn store_inline(&mut self, val: Value) -> Result<Value> {
        match val {
            Value::Str(s) if upload::is_data_uri(&s) => {
                self.data_upload(&s).map(Value::from)
            }
            Value::List(items) => items
                .into_iter()
                .map(|item| self.store_inline(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Value::Map(by_lang) => by_lang
                .into_iter()
                .map(|(lang, v)| self.store_inline(v).map(|v| (lang, v)))
                .collect::<Result<IndexMap<_, _>>>()
                .map(Value::Map),
            other => Ok(other),
        }
    }

    pub(super) fn save_file(&mut self, uploads: &Uploads) -> Result<Value> {
        let entry = uploads
            .get(&self.ident)
            .filter(|e| e.is_present())
            .cloned();
        let saved = match entry {
            Some(UploadEntry::Multiple(files)) if self.multiple() => {
                let mut paths = Vec::with_capacity(files.len());
                for file in &files {
                    let path = if file.is_present() {
                        self.file_upload(file)?
                    } else {
                        String::new()
                    };
                    paths.push(Value::from(path));
                }
                Value::List(paths)
            }
            Some(UploadEntry::Localized(files)) if self.l10n => {
                // locales without an upload keep what they had
                let mut by_lang = self.val.as_map().cloned().unwrap_or_default();
                for (lang, file) in &files {
                    if file.name.is_empty() {
                        by_lang.entry(lang.clone()).or_insert(Value::from(""));
                        continue;
                    }
                    let path = self.file_upload(file)?;
                    by_lang.insert(lang.clone(), Value::from(path));
                }
                Value::Map(by_lang)
            }
            Some(entry) => {
                let first = match entry {
                    UploadEntry::Single(file) => Some(file),
                    UploadEntry::Multiple(files) => {
                        files.into_iter().find(UploadedFile::is_present)
                    }
                    UploadEntry::Localized(files) => {
                        files.into_values().find(UploadedFile::is_present)
                    }
                };
                match first {
                    Some(file) => Value::from(self.file_upload(&file)?),
                    None => self.val.clone(),
                }
            }
            None => {
                let current = self.val.clone();
                self.store_inline(current)?
            }
        };
        self.set_val(saved)?;
        Ok(self.val.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        factory::PropertyOptions,
        path::FixedBasePath,
        property::{PropertyKind, Storable},
        validation::Validatable,
    };
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn file_prop(base: &Path) -> Property {
        let mut prop = Property::with_options(
            PropertyKind::File(FileConfig::default()),
            PropertyOptions {
                path_resolver: Some(Arc::new(FixedBasePath(base.into()))),
                ..Default::default()
            },
        )
        .expect("property");
        prop.set_ident("attachment");
        prop
    }

    fn tmp_upload(dir: &TempDir, name: &str, body: &[u8]) -> UploadedFile {
        let tmp = dir.path().join(format!("tmp-{name}"));
        fs::write(&tmp, body).expect("write tmp");
        UploadedFile::new(name, tmp)
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b\\c*d?.txt"), "a_b_c_d_.txt");
        assert_eq!(sanitize_filename("..hidden"), "hidden");
        assert_eq!(sanitize_filename("rock&roll!.mp3"), "rock_roll_.mp3");
    }

    #[test]
    fn test_upload_path_has_trailing_slash() {
        let mut c = FileConfig::default();
        assert_eq!(c.upload_path(), "uploads/");
        c.set_upload_path("files/docs//");
        assert_eq!(c.upload_path(), "files/docs/");
        c.set_upload_path("media");
        assert_eq!(c.upload_path(), "media/");
    }

    #[test]
    fn test_upload_and_relative_path() {
        let base = TempDir::new().expect("tempdir");
        let mut prop = file_prop(base.path());
        let file = tmp_upload(&base, "report.txt", b"hello");
        let mut uploads = Uploads::new();
        uploads.insert("attachment", UploadEntry::Single(file.clone()));

        let saved = prop.save(&uploads).expect("save");
        assert_eq!(saved, Value::from("uploads/report.txt"));
        assert!(base.path().join("uploads/report.txt").exists());
        assert!(!file.tmp_name.exists());
        assert_eq!(prop.mimetype().as_deref(), Some("text/plain"));
        assert_eq!(prop.filesize(), 5);
    }

    #[test]
    fn test_taken_names_get_a_suffix() {
        let base = TempDir::new().expect("tempdir");
        let prop = file_prop(base.path());
        fs::create_dir_all(base.path().join("uploads")).expect("mkdir");
        fs::write(base.path().join("uploads/photo.png"), b"x").expect("write");

        let target = prop.upload_target(Some("photo.png")).expect("target");
        assert_ne!(target, base.path().join("uploads/photo.png"));
        let name = target.file_name().expect("name").to_string_lossy();
        assert!(name.starts_with("photo-"), "{name}");
        assert!(name.ends_with(".png"), "{name}");
        assert_eq!(name.len(), "photo-".len() + 13 + ".png".len());

        // differing case counts as taken
        let target = prop.upload_target(Some("PHOTO.png")).expect("target");
        assert_ne!(target, base.path().join("uploads/PHOTO.png"));

        let mut prop = prop;
        prop.as_file_mut().expect("file").set_overwrite(true);
        let target = prop.upload_target(Some("photo.png")).expect("target");
        assert_eq!(target, base.path().join("uploads/photo.png"));
    }

    #[cfg(unix)]
    #[test]
    fn test_readonly_directory_is_refused() {
        use std::os::unix::fs::PermissionsExt;
        let base = TempDir::new().expect("tempdir");
        let dir = base.path().join("uploads");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555))
            .expect("chmod");
        let prop = file_prop(base.path());
        assert!(matches!(
            prop.upload_target(Some("a.txt")),
            Err(PropertyError::PermissionDenied(_))
        ));
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755))
            .expect("chmod");
    }

    #[test]
    fn test_rejected_upload_becomes_empty() {
        let base = TempDir::new().expect("tempdir");
        let mut prop = file_prop(base.path());
        prop.set_allow_null(false);
        prop.as_file_mut()
            .expect("file")
            .set_accepted_mimetypes(vec!["image/png".to_string()]);
        let file = tmp_upload(&base, "notes.txt", b"not an image");
        assert_eq!(prop.file_upload(&file).expect("upload"), "");
        assert!(file.tmp_name.exists());
        assert_eq!(prop.validator().errors()[0].code, "acceptedMimetypes");
    }

    #[test]
    fn test_multiple_uploads_tolerate_failures() {
        let base = TempDir::new().expect("tempdir");
        let mut prop = file_prop(base.path());
        prop.set_multiple(true).expect("multiple");
        let good = tmp_upload(&base, "a.txt", b"a");
        let mut failed = UploadedFile::new("b.txt", base.path().join("gone"));
        failed.error = 3;
        let mut uploads = Uploads::new();
        uploads.insert("attachment", UploadEntry::Multiple(vec![good, failed]));

        let saved = prop.save(&uploads).expect("save");
        assert_eq!(saved, Value::from(vec!["uploads/a.txt", ""]));
        assert_eq!(prop.sql_type(), "TEXT");
    }

    #[test]
    fn test_localized_uploads_skip_empty_names() {
        let base = TempDir::new().expect("tempdir");
        let mut prop = file_prop(base.path());
        prop.set_l10n(true);
        prop.set_val(Value::from(json!({"fr": "uploads/ancien.pdf"})))
            .expect("set");
        let mut files = IndexMap::new();
        files.insert("en".to_string(), tmp_upload(&base, "doc.txt", b"doc"));
        files.insert("fr".to_string(), UploadedFile::default());
        let mut uploads = Uploads::new();
        uploads.insert("attachment", UploadEntry::Localized(files));

        let saved = prop.save(&uploads).expect("save");
        assert_eq!(
            saved,
            Value::from(json!({"fr": "uploads/ancien.pdf", "en": "uploads/doc.txt"}))
        );
    }

    #[test]
    fn test_inline_data_uris_are_stored() {
        let base = TempDir::new().expect("tempdir");
        let mut prop = file_prop(base.path());
        prop.set_multiple(true).expect("multiple");
        prop.set_val(vec![
            "data:text/plain;base64,aGVsbG8=",
            "uploads/kept.txt",
            "data:text/plain;base64,d29ybGQ=",
        ])
        .expect("set");

        let saved = prop.save(&Uploads::new()).expect("save");
        let paths = saved.as_list().expect("list");
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[1], Value::from("uploads/kept.txt"));
        for stored in [&paths[0], &paths[2]] {
            let rel = stored.as_str().expect("path");
            assert!(rel.starts_with("uploads/Attachment "), "{rel}");
            assert!(base.path().join(rel).exists());
        }
        assert_ne!(paths[0], paths[2]);
    }

    #[test]
    fn test_broken_data_uri_is_an_error() {
        let base = TempDir::new().expect("tempdir");
        let mut prop = file_prop(base.path());
        prop.set_val("data:text/plain;base64,***").expect("set");
        assert!(matches!(
            prop.save(&Uploads::new()),
            Err(PropertyError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_file_checks_pass_vacuously() {
        let mut prop = Property::file();
        prop.as_file_mut().expect("file").set_max_filesize(0);
        prop.as_file_mut()
            .expect("file")
            .set_mimetype(Some("application/pdf".into()))
            .set_filesize(Some(u64::MAX));
        assert!(prop.validate());
        assert_eq!(
            prop.validation_methods(),
            ["required", "unique", "allowNull", "acceptedMimetypes", "maxFilesize"]
        );

        prop.as_file_mut()
            .expect("file")
            .set_max_filesize(10)
            .set_accepted_mimetypes(vec!["image/png".into()]);
        assert!(!prop.validate());
        let codes: Vec<&str> = prop
            .validator()
            .errors()
            .iter()
            .map(|e| e.code.as_str())
            .collect();
        assert_eq!(codes, ["acceptedMimetypes", "maxFilesize"]);
    }

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    fn png_only(base: &Path) -> Property {
        fs::create_dir_all(base.join("uploads")).expect("mkdir");
        fs::write(base.join("uploads/ok.png"), PNG).expect("write");
        fs::write(base.join("uploads/bad.txt"), b"plain words").expect("write");
        let mut prop = file_prop(base);
        prop.as_file_mut()
            .expect("file")
            .set_accepted_mimetypes(vec!["image/png".to_string()]);
        prop
    }

    #[test]
    fn test_every_listed_file_is_checked() {
        let base = TempDir::new().expect("tempdir");
        let mut prop = png_only(base.path());
        prop.set_multiple(true).expect("multiple");
        prop.set_val(vec!["uploads/ok.png", "uploads/bad.txt"])
            .expect("set");
        assert!(!prop.validate());
        assert_eq!(prop.validator().errors().len(), 1);
        assert!(prop.validator().errors()[0].message.contains("text/plain"));

        prop.set_val(vec!["uploads/ok.png"]).expect("set");
        assert!(prop.validate());
    }

    #[test]
    fn test_every_locale_file_is_checked() {
        let base = TempDir::new().expect("tempdir");
        let mut prop = png_only(base.path());
        prop.set_l10n(true);
        prop.set_val(Value::from(json!({"en": "uploads/bad.txt"})))
            .expect("set");
        assert!(!prop.validate());

        prop.set_val(Value::from(json!({"en": "uploads/ok.png", "fr": ""})))
            .expect("set");
        assert!(prop.validate());
    }

    #[test]
    fn test_detection_follows_the_value() {
        let base = TempDir::new().expect("tempdir");
        let mut prop = png_only(base.path());
        prop.set_val("uploads/ok.png").expect("set");
        assert!(prop.validate());
        assert_eq!(prop.mimetype().as_deref(), Some("image/png"));
        assert_eq!(prop.filesize(), PNG.len() as u64);

        prop.set_val("uploads/bad.txt").expect("set");
        assert_eq!(prop.mimetype().as_deref(), Some("text/plain"));
        assert_eq!(prop.filesize(), 11);
        assert!(!prop.validate());

        // an explicit mimetype is kept across values
        prop.as_file_mut()
            .expect("file")
            .set_mimetype(Some("image/png".into()));
        prop.set_val("uploads/ok.png").expect("set");
        assert_eq!(prop.mimetype().as_deref(), Some("image/png"));
        prop.set_val("uploads/bad.txt").expect("set");
        assert_eq!(prop.mimetype().as_deref(), Some("image/png"));
        assert!(prop.validate());
    }

    #[test]
    fn test_every_file_size_is_checked() {
        let base = TempDir::new().expect("tempdir");
        let mut prop = png_only(base.path());
        prop.as_file_mut()
            .expect("file")
            .set_accepted_mimetypes(vec![])
            .set_max_filesize(10);
        prop.set_multiple(true).expect("multiple");
        prop.set_val(vec!["uploads/ok.png", "uploads/bad.txt"])
            .expect("set");
        assert!(!prop.validate());
        assert_eq!(prop.validator().errors()[0].code, "maxFilesize");
        assert!(prop.validator().errors()[0].message.contains("11 bytes"));
    }

    #[test]
    fn test_detect_mimetype() {
        assert_eq!(detect_mimetype(PNG, None, None), "image/png");
        assert_eq!(
            detect_mimetype(b"a,b", Some(Path::new("x.csv")), None),
            "text/csv"
        );
        assert_eq!(detect_mimetype(b"plain", None, None), "text/plain");
        assert_eq!(
            detect_mimetype(&[0xc3, 0x28, 0x01], None, Some("audio/x-thing")),
            "audio/x-thing"
        );
    }
}
