//! Defaults every property starts from. Definitions override them per
//! property.
//!
//! The only thing read from the environment is the base path uploads are
//! resolved against; see [`crate::path::EnvPathResolver`].

/// Storage separator for multiple values, unless a property overrides it in
/// its `multiple_options`.
pub const DEFAULT_SEPARATOR: &str = ",";

/// strftime spelling of `Y-m-d H:i:s`. Used for input and storage
/// projections, and as the default display format.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Relative to the base path, always with a trailing slash.
pub const DEFAULT_UPLOAD_PATH: &str = "uploads/";

/// 128M, give or take.
pub const DEFAULT_MAX_FILESIZE: u64 = 134_220_000;

pub const DEFAULT_STRING_MAX_LENGTH: usize = 255;

pub const DEFAULT_LANG: &str = "en";

/// Structure schemas may embed structure properties, which may embed
/// structure properties, and so on. Nothing in a schema prevents it from
/// referencing itself, so model construction refuses to go deeper than
/// this.
pub const MAX_STRUCTURE_DEPTH: usize = 16;

/// Environment variable holding the directory upload paths are relative to.
pub const BASE_PATH_VAR: &str = "PROPVAL_BASE_PATH";

/// Display widget used when neither the property nor its definition's
/// `admin.display_type` names one.
pub const DEFAULT_DISPLAY_TYPE: &str = "property/display/text";
