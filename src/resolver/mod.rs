//! Integration points for XML parsers and transformation engines.
//!
//! [`EntityResolutionAdapter`] answers the external identifiers a parser
//! meets in a DTD, and [`UriResolutionAdapter`] answers the URIs a
//! transformation dereferences. Both share one [`CatalogStore`].

pub mod entity;
pub mod uri;

use crate::{catalog::CatalogStore, error::UriResolutionError, params::TransformParameters};

pub use entity::EntityResolutionAdapter;
pub use uri::UriResolutionAdapter;

/// The location an external entity resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    /// Public identifier of the request, if any.
    pub public_id: Option<String>,
    /// The catalog target to read the entity from.
    pub system_id: String,
    /// System identifier of the request, if any.
    pub original_system_id: Option<String>,
}

/// Resolver invoked by a parser for external entities.
pub trait EntityResolver {
    /// Returns `None` to let the parser use its default resolution.
    fn resolve_entity(
        &self,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Option<ResolvedInput>;
}

impl<F> EntityResolver for F
where
    F: Fn(Option<&str>, Option<&str>) -> Option<ResolvedInput>,
{
    fn resolve_entity(
        &self,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Option<ResolvedInput> {
        self(public_id, system_id)
    }
}

/// Resolver invoked by a transformation for `xsl:include`, `xsl:import`,
/// `document()` and similar.
pub trait UriResolver {
    fn resolve_uri(&self, href: &str, base: Option<&str>) -> Result<String, UriResolutionError>;
}

impl<F> UriResolver for F
where
    F: Fn(&str, Option<&str>) -> Result<String, UriResolutionError>,
{
    fn resolve_uri(&self, href: &str, base: Option<&str>) -> Result<String, UriResolutionError> {
        self(href, base)
    }
}

/// A single lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionRequest {
    Entity {
        public_id: Option<String>,
        system_id: Option<String>,
    },
    Uri {
        href: String,
        base: Option<String>,
    },
}

/// Everything a transformation driver needs: both resolvers, built on the
/// same catalog, and the parameters of the transformation.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    entity: EntityResolutionAdapter,
    uri: UriResolutionAdapter,
    params: TransformParameters,
}

impl ResolutionContext {
    pub fn new(store: CatalogStore) -> Self {
        Self {
            entity: EntityResolutionAdapter::new(store.clone()),
            uri: UriResolutionAdapter::new(store),
            params: TransformParameters::new(),
        }
    }

    pub fn with_parameters(mut self, params: TransformParameters) -> Self {
        self.params = params;
        self
    }

    pub fn entity_resolver(&self) -> &EntityResolutionAdapter {
        &self.entity
    }

    pub fn uri_resolver(&self) -> &UriResolutionAdapter {
        &self.uri
    }

    pub fn parameters(&self) -> &TransformParameters {
        &self.params
    }

    pub fn parameters_mut(&mut self) -> &mut TransformParameters {
        &mut self.params
    }

    /// Resolve one request with the matching resolver.
    ///
    /// An entity request without catalog match yields `Ok(None)`.
    /// An URI request always yields a location or an error.
    pub fn resolve(&self, request: &ResolutionRequest) -> Result<Option<String>, UriResolutionError> {
        match request {
            ResolutionRequest::Entity {
                public_id,
                system_id,
            } => Ok(self
                .entity
                .resolve_entity(public_id.as_deref(), system_id.as_deref())
                .map(|resolved| resolved.system_id)),
            ResolutionRequest::Uri { href, base } => {
                self.uri.resolve(href, base.as_deref()).map(Some)
            }
        }
    }
}
