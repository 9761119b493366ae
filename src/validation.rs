//! Validation is a list of named checks. Each check is looked up by name in
//! a handler table and run in order; a name without a handler passes.
//! Every check runs, even after an earlier one fails, so that a form can
//! report all problems at once.

use serde::Serialize;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Ident of the property (or structure field) that failed.
    pub ident: String,
    /// Name of the check that failed, i.e, `required` or `maxFilesize`.
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    ident: String,
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new(ident: impl Into<String>) -> Self {
        Validator {
            ident: ident.into(),
            errors: vec![],
        }
    }

    pub fn set_ident(&mut self, ident: impl Into<String>) {
        self.ident = ident.into();
    }

    pub fn error(&mut self, message: impl Into<String>, code: &str) {
        self.errors.push(ValidationError {
            ident: self.ident.clone(),
            code: code.to_string(),
            message: message.into(),
        });
    }

    /// Fold errors from a nested validator into this one, prefixing their
    /// idents with ours.
    pub fn absorb(&mut self, nested: &Validator) {
        for err in &nested.errors {
            self.errors.push(ValidationError {
                ident: format!("{}.{}", self.ident, err.ident),
                ..err.clone()
            });
        }
    }

    /// Take over errors from `other` as they are.
    pub fn append(&mut self, other: &Validator) {
        self.errors.extend(other.errors.iter().cloned());
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }
}

/// A check handler. Records its own error on failure.
pub type Check<T> = fn(&mut T) -> bool;

pub trait Validatable {
    /// Names of the checks to run, base checks first.
    fn validation_methods(&self) -> Vec<&'static str>;

    fn validator(&self) -> &Validator;

    /// Run every check in [`Validatable::validation_methods`]. Errors from
    /// a previous run are discarded first.
    fn validate(&mut self) -> bool;
}

/// Run `methods` against `target`, resolving each name through `lookup`.
/// Returns the logical AND of every check; none are skipped because an
/// earlier one failed.
pub fn run_checks<T>(
    target: &mut T,
    methods: &[&'static str],
    lookup: fn(&str) -> Option<Check<T>>,
) -> bool {
    let mut valid = true;
    for name in methods {
        match lookup(name) {
            Some(check) => {
                let passed = check(target);
                tracing::debug!(check = name, passed, "validation check");
                valid &= passed;
            }
            None => {
                tracing::debug!(check = name, "no handler for check, skipping")
            }
        }
    }
    valid
}
