//! The request mapper: resolve, flatten and cast, validate, reconstruct.

use std::fmt;
use std::sync::Arc;

use facet::Facet;
use inlet_value::Object;
use tracing::debug;

use crate::{
    CacheScope, ChronoDateParser, ClassSchema, ConstructError, DEFAULT_MAX_DEPTH, DateParser, Flattener,
    Mappable, Mapping, RequestData, Registry, Resolver, RuleEvaluator, SchemaCache, SchemaError,
    SharedSchemaCache, Violations, reconstruct, reconstruct_reflected,
};

/// Tunables of a [`RequestMapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperConfig {
    /// Maximum class nesting depth.
    pub max_depth: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Why [`RequestMapper::map`] failed.
#[derive(Debug)]
pub enum MapError {
    /// The declarations are broken.
    Schema(SchemaError),
    /// The request does not satisfy the derived rules.
    Validation(Violations),
    /// The data does not fit the type being built.
    Construct(ConstructError),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Schema(err) => write!(f, "schema error: {err}"),
            MapError::Validation(err) => write!(f, "{err}"),
            MapError::Construct(err) => write!(f, "construction failed: {err}"),
        }
    }
}

impl core::error::Error for MapError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            MapError::Schema(err) => Some(err),
            MapError::Validation(err) => Some(err),
            MapError::Construct(err) => Some(err),
        }
    }
}

impl From<SchemaError> for MapError {
    fn from(err: SchemaError) -> Self {
        MapError::Schema(err)
    }
}

impl From<Violations> for MapError {
    fn from(err: Violations) -> Self {
        MapError::Validation(err)
    }
}

impl From<ConstructError> for MapError {
    fn from(err: ConstructError) -> Self {
        MapError::Construct(err)
    }
}

/// Configures a [`RequestMapper`].
pub struct RequestMapperBuilder {
    registry: Registry,
    evaluator: Box<dyn RuleEvaluator>,
    cache: Option<Arc<dyn SchemaCache>>,
    dates: Option<Box<dyn DateParser>>,
    config: MapperConfig,
}

impl RequestMapperBuilder {
    /// Share schemas through `cache`. Defaults to a fresh
    /// [`SharedSchemaCache`].
    pub fn cache(mut self, cache: Arc<dyn SchemaCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Parse dates with `dates`. Defaults to [`ChronoDateParser`].
    pub fn date_parser(mut self, dates: impl DateParser + 'static) -> Self {
        self.dates = Some(Box::new(dates));
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Limit class nesting depth.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Finish.
    pub fn build(self) -> RequestMapper {
        RequestMapper {
            registry: self.registry,
            evaluator: self.evaluator,
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(SharedSchemaCache::new())),
            dates: self.dates.unwrap_or_else(|| Box::new(ChronoDateParser)),
            config: self.config,
        }
    }
}

/// Maps requests onto types deriving `Facet`, and onto [`Mappable`] classes.
///
/// A mapper owns its registry and is meant to live as long as the
/// application; resolved schemas are cached across calls.
pub struct RequestMapper {
    registry: Registry,
    evaluator: Box<dyn RuleEvaluator>,
    cache: Arc<dyn SchemaCache>,
    dates: Box<dyn DateParser>,
    config: MapperConfig,
}

impl RequestMapper {
    /// Start configuring a mapper over `registry`, checking rules with
    /// `evaluator`.
    pub fn builder(
        registry: Registry,
        evaluator: impl RuleEvaluator + 'static,
    ) -> RequestMapperBuilder {
        RequestMapperBuilder {
            registry,
            evaluator: Box::new(evaluator),
            cache: None,
            dates: None,
            config: MapperConfig::default(),
        }
    }

    /// The registry declarations are resolved against.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The configuration in effect.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// The schema of `class`, from the cache when possible.
    pub fn resolve(&self, class: &str) -> Result<Arc<ClassSchema>, SchemaError> {
        let resolver = Resolver::new(&self.registry).with_max_depth(self.config.max_depth);
        let scope = CacheScope {
            registry: self.registry.id(),
            max_depth: self.config.max_depth,
        };
        self.cache
            .get_or_resolve(scope, class, &mut || resolver.resolve(class))
    }

    /// The cast data tree of `request` and the rules it must satisfy.
    pub fn flatten_and_cast(&self, schema: &ClassSchema, request: &dyn RequestData) -> Mapping {
        Flattener::new(&*self.dates).flatten_and_cast(schema, request)
    }

    /// Run the evaluator over a mapping.
    pub fn validate(&self, mapping: &Mapping) -> Result<(), Violations> {
        self.evaluator.evaluate(&mapping.data, &mapping.rules)
    }

    /// Build a `T` from a cast data tree through its shape.
    pub fn reconstruct<T: Facet<'static>>(
        &self,
        schema: &ClassSchema,
        data: &Object,
    ) -> Result<T, ConstructError> {
        reconstruct_reflected(schema, data)
    }

    /// Build a `T` from a cast data tree through its hooks.
    pub fn reconstruct_declared<T: Mappable>(
        &self,
        schema: &ClassSchema,
        data: &Object,
    ) -> Result<T, ConstructError> {
        reconstruct(schema, data)
    }

    /// Resolve `T`, flatten and cast `request`, validate, and build the
    /// instance.
    ///
    /// `T` is resolved under its type identifier and must have been
    /// registered with [`Registry::with_type`].
    pub fn map<T: Facet<'static>>(&self, request: &dyn RequestData) -> Result<T, MapError> {
        let (schema, mapping) = self.checked_mapping(T::SHAPE.type_identifier, request)?;
        Ok(self.reconstruct(&schema, &mapping.data)?)
    }

    /// [`map`](Self::map) for a class registered with
    /// [`Registry::with_class`].
    pub fn map_declared<T: Mappable>(&self, request: &dyn RequestData) -> Result<T, MapError> {
        let (schema, mapping) = self.checked_mapping(T::CLASS, request)?;
        Ok(self.reconstruct_declared(&schema, &mapping.data)?)
    }

    fn checked_mapping(
        &self,
        class: &str,
        request: &dyn RequestData,
    ) -> Result<(Arc<ClassSchema>, Mapping), MapError> {
        let schema = self.resolve(class)?;
        let mapping = self.flatten_and_cast(&schema, request);
        if let Err(violations) = self.validate(&mapping) {
            debug!(class, violations = violations.len(), "request rejected");
            return Err(violations.into());
        }
        Ok((schema, mapping))
    }
}

impl fmt::Debug for RequestMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMapper")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
