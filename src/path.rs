use super::config;
use std::{
    env,
    path::{Path, PathBuf},
};

/// Resolves the directory that relative upload paths hang off, and turns
/// absolute targets back into the relative form that gets stored.
pub trait PathResolver: std::fmt::Debug + Send + Sync {
    fn base_path(&self) -> Option<&Path>;

    fn resolve(&self, relative: &str) -> PathBuf {
        match self.base_path() {
            Some(base) => base.join(relative),
            None => PathBuf::from(relative),
        }
    }

    /// Strip the base path off an absolute target. Targets outside of the
    /// base path are returned unchanged.
    fn relativize(&self, target: &Path) -> String {
        let rel = self
            .base_path()
            .and_then(|base| target.strip_prefix(base).ok())
            .unwrap_or(target);
        rel.to_string_lossy().into_owned()
    }
}

/// Paths are relative to the working directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBasePath;

impl PathResolver for NoBasePath {
    fn base_path(&self) -> Option<&Path> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct FixedBasePath(pub PathBuf);

impl PathResolver for FixedBasePath {
    fn base_path(&self) -> Option<&Path> {
        Some(&self.0)
    }
}

/// Base path from `$PROPVAL_BASE_PATH`, read once at construction.
#[derive(Debug, Clone, Default)]
pub struct EnvPathResolver {
    base: Option<PathBuf>,
}

impl EnvPathResolver {
    pub fn from_env() -> Self {
        EnvPathResolver {
            base: env::var(config::BASE_PATH_VAR)
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

impl PathResolver for EnvPathResolver {
    fn base_path(&self) -> Option<&Path> {
        self.base.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relativize_strips_base() {
        let resolver = FixedBasePath(PathBuf::from("/srv/site"));
        let target = resolver.resolve("uploads/a.png");
        assert_eq!(target, PathBuf::from("/srv/site/uploads/a.png"));
        assert_eq!(resolver.relativize(&target), "uploads/a.png");
        assert_eq!(
            resolver.relativize(Path::new("/elsewhere/a.png")),
            "/elsewhere/a.png"
        );
    }

    #[test]
    fn test_no_base_path() {
        assert_eq!(NoBasePath.resolve("uploads/"), PathBuf::from("uploads/"));
        assert_eq!(NoBasePath.relativize(Path::new("uploads/a")), "uploads/a");
    }
}
