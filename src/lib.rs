//! Typed properties for content models: value coercion, validation,
//! storage mapping and display projections, with multiple-value and
//! per-locale handling shared by every property type.

pub mod config;
pub mod errors;
pub mod factory;
pub mod metadata;
pub mod models;
pub mod path;
pub mod property;
pub mod translator;
pub mod upload;
pub mod validation;

pub use errors::{PropertyError, Result};
pub use factory::{Container, PropertyFactory, PropertyOptions};
pub use models::{Translation, Value};
pub use property::{DisplayOptions, Property, PropertyKind, Storable};
pub use validation::{Validatable, ValidationError, Validator};
