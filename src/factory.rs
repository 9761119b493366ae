use super::{
    config,
    errors::{PropertyError, Result},
    metadata::{MetadataData, MetadataLoader},
    path::{NoBasePath, PathResolver},
    property::{
        BooleanConfig, ColorConfig, DateTimeConfig, FileConfig, Property,
        PropertyKind, StringConfig, StructureConfig,
    },
    translator::Translator,
};
use std::sync::Arc;

/// Collaborators shared by every property built through one factory.
#[derive(Debug, Clone, Default)]
pub struct Container {
    pub metadata_loader: Option<Arc<dyn MetadataLoader>>,
    pub translator: Option<Arc<dyn Translator>>,
    pub path_resolver: Option<Arc<dyn PathResolver>>,
}

impl Container {
    pub fn property_factory(&self) -> PropertyFactory {
        PropertyFactory::new(self.clone())
    }
}

/// Construction options. Explicit collaborators win over the ones the
/// container would resolve.
#[derive(Debug, Clone, Default)]
pub struct PropertyOptions {
    pub property_factory: Option<PropertyFactory>,
    pub metadata_loader: Option<Arc<dyn MetadataLoader>>,
    pub container: Option<Container>,
    /// `model` or `plain`; only meaningful for structure properties.
    pub structure_model: Option<String>,
    pub translator: Option<Arc<dyn Translator>>,
    pub path_resolver: Option<Arc<dyn PathResolver>>,
}

/// Resolved collaborators, as held by a property.
#[derive(Debug, Clone)]
pub struct Dependencies {
    pub property_factory: Option<PropertyFactory>,
    pub metadata_loader: Option<Arc<dyn MetadataLoader>>,
    pub translator: Option<Arc<dyn Translator>>,
    pub path_resolver: Arc<dyn PathResolver>,
}

impl Default for Dependencies {
    fn default() -> Self {
        Dependencies {
            property_factory: None,
            metadata_loader: None,
            translator: None,
            path_resolver: Arc::new(NoBasePath),
        }
    }
}

impl From<&PropertyOptions> for Dependencies {
    fn from(opts: &PropertyOptions) -> Self {
        let container = opts.container.as_ref();
        Dependencies {
            property_factory: opts
                .property_factory
                .clone()
                .or_else(|| container.map(Container::property_factory)),
            metadata_loader: opts
                .metadata_loader
                .clone()
                .or_else(|| container.and_then(|c| c.metadata_loader.clone())),
            translator: opts
                .translator
                .clone()
                .or_else(|| container.and_then(|c| c.translator.clone())),
            path_resolver: opts
                .path_resolver
                .clone()
                .or_else(|| container.and_then(|c| c.path_resolver.clone()))
                .unwrap_or_else(|| Arc::new(NoBasePath)),
        }
    }
}

/// Builds properties by type ident. Nested structure models get a factory
/// one level deeper, which is how runaway self-referencing schemas are
/// stopped.
#[derive(Debug, Clone, Default)]
pub struct PropertyFactory {
    container: Container,
    depth: usize,
}

impl PropertyFactory {
    pub fn new(container: Container) -> Self {
        PropertyFactory {
            container,
            depth: 0,
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn nested(&self) -> Result<PropertyFactory> {
        if self.depth >= config::MAX_STRUCTURE_DEPTH {
            return Err(PropertyError::invalid(format!(
                "structure nesting is limited to {} levels",
                config::MAX_STRUCTURE_DEPTH
            )));
        }
        Ok(PropertyFactory {
            container: self.container.clone(),
            depth: self.depth + 1,
        })
    }

    pub fn options(&self) -> PropertyOptions {
        PropertyOptions {
            property_factory: Some(self.clone()),
            container: Some(self.container.clone()),
            ..Default::default()
        }
    }

    /// Fresh property of the given type, i.e, `color` or `date-time`.
    pub fn create(&self, type_ident: &str) -> Result<Property> {
        Property::with_options(kind_for(type_ident)?, self.options())
    }

    /// Property from a definition record: `type` picks the variant (default
    /// `generic`), every other key goes through [`Property::set_data`].
    pub fn create_from_definition(
        &self,
        ident: &str,
        definition: &MetadataData,
    ) -> Result<Property> {
        let type_ident = definition
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("generic");
        let mut opts = self.options();
        opts.structure_model = definition
            .get("structure_model")
            .and_then(|m| m.as_str())
            .map(str::to_string);
        let mut prop = Property::with_options(kind_for(type_ident)?, opts)?;
        prop.set_ident(ident);
        prop.set_data(definition)?;
        Ok(prop)
    }
}

pub fn kind_for(type_ident: &str) -> Result<PropertyKind> {
    Ok(match type_ident {
        "generic" => PropertyKind::Generic,
        "number" => PropertyKind::Number,
        "string" | "text" => PropertyKind::String(StringConfig::default()),
        "html" => PropertyKind::Html(StringConfig::html()),
        "boolean" => PropertyKind::Boolean(BooleanConfig::default()),
        "color" => PropertyKind::Color(ColorConfig::default()),
        "date-time" | "datetime" => {
            PropertyKind::DateTime(DateTimeConfig::default())
        }
        "file" => PropertyKind::File(FileConfig::default()),
        "lang" => PropertyKind::Lang,
        "model-structure" | "structure" => {
            PropertyKind::Structure(StructureConfig::default())
        }
        "map-structure" => PropertyKind::Structure(StructureConfig::map()),
        other => {
            return Err(PropertyError::invalid(format!(
                "unknown property type \"{other}\""
            )))
        }
    })
}
