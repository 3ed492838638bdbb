//! Memoization of resolved schemas across mapping operations.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use crate::{ClassSchema, RegistryId, SchemaError};

/// Everything a resolved schema depends on besides its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheScope {
    /// The registry declarations were read from.
    pub registry: RegistryId,
    /// The nesting limit resolution ran under.
    pub max_depth: usize,
}

/// Stores top-level schemas by scope and class identifier.
///
/// `resolve` is a pure function of both, so two threads racing on the same
/// unseen class may both run it; whichever result is stored first is the one
/// every caller gets from then on. Mappers over different registries or
/// depth limits can share one cache without seeing each other's schemas.
pub trait SchemaCache: Send + Sync {
    /// The cached schema of `class` in `scope`, running `resolve` on a miss.
    fn get_or_resolve(
        &self,
        scope: CacheScope,
        class: &str,
        resolve: &mut dyn FnMut() -> Result<ClassSchema, SchemaError>,
    ) -> Result<Arc<ClassSchema>, SchemaError>;
}

/// A process-wide cache behind a read-write lock.
#[derive(Debug, Default)]
pub struct SharedSchemaCache {
    schemas: RwLock<HashMap<(CacheScope, String), Arc<ClassSchema>>>,
}

impl SharedSchemaCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SchemaCache for SharedSchemaCache {
    fn get_or_resolve(
        &self,
        scope: CacheScope,
        class: &str,
        resolve: &mut dyn FnMut() -> Result<ClassSchema, SchemaError>,
    ) -> Result<Arc<ClassSchema>, SchemaError> {
        let key = (scope, class.to_string());
        if let Some(schema) = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            trace!(class, "schema cache hit");
            return Ok(Arc::clone(schema));
        }

        // resolve outside the lock, nested resolution can be slow
        let resolved = Arc::new(resolve()?);
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        let schema = schemas.entry(key).or_insert(resolved);
        trace!(class, "schema cached");
        Ok(Arc::clone(schema))
    }
}

/// Resolves on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSchemaCache;

impl SchemaCache for NoSchemaCache {
    fn get_or_resolve(
        &self,
        _scope: CacheScope,
        _class: &str,
        resolve: &mut dyn FnMut() -> Result<ClassSchema, SchemaError>,
    ) -> Result<Arc<ClassSchema>, SchemaError> {
        resolve().map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassBuilder, ClassVTable, DEFAULT_MAX_DEPTH, Registry};

    struct Empty;

    impl crate::Mappable for Empty {
        const CLASS: &'static str = "Empty";

        fn declare(_decl: &mut crate::ClassDecl) {}

        fn construct(_args: &mut crate::Arguments) -> Result<Self, crate::ConstructError> {
            Ok(Empty)
        }
    }

    fn scope(registry: &Registry) -> CacheScope {
        CacheScope {
            registry: registry.id(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    fn empty() -> ClassSchema {
        ClassSchema::new(
            "Empty".into(),
            Vec::new(),
            ClassBuilder::Hooks(ClassVTable::of::<Empty>()),
        )
    }

    #[test]
    fn shared_cache_resolves_once() {
        let cache = SharedSchemaCache::new();
        let mut calls = 0;
        let mut resolve = || {
            calls += 1;
            Ok::<_, SchemaError>(empty())
        };

        let id = scope(&Registry::new());
        let first = cache.get_or_resolve(id, "Empty", &mut resolve).unwrap();
        let second = cache.get_or_resolve(id, "Empty", &mut resolve).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = SharedSchemaCache::new();
        let err = cache
            .get_or_resolve(scope(&Registry::new()), "Nope", &mut || {
                Err::<ClassSchema, _>(SchemaError::UnknownClass {
                    class: "Nope".into(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownClass { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn no_cache_resolves_every_time() {
        let mut calls = 0;
        let mut resolve = || {
            calls += 1;
            Ok::<_, SchemaError>(empty())
        };
        let id = scope(&Registry::new());
        NoSchemaCache.get_or_resolve(id, "Empty", &mut resolve).unwrap();
        NoSchemaCache.get_or_resolve(id, "Empty", &mut resolve).unwrap();
        assert_eq!(calls, 2);
    }

    #[test]
    fn registries_do_not_share_entries() {
        let cache = SharedSchemaCache::new();
        let mut calls = 0;
        let mut resolve = || {
            calls += 1;
            Ok::<_, SchemaError>(empty())
        };

        let (a, b) = (Registry::new(), Registry::new());
        let first = cache.get_or_resolve(scope(&a), "Empty", &mut resolve).unwrap();
        let second = cache.get_or_resolve(scope(&b), "Empty", &mut resolve).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 2);

        let clone = a.clone();
        let third = cache.get_or_resolve(scope(&clone), "Empty", &mut resolve).unwrap();
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(calls, 2);
    }

    #[test]
    fn depth_limits_do_not_share_entries() {
        let cache = SharedSchemaCache::new();
        let mut resolve = || Ok::<_, SchemaError>(empty());

        let registry = Registry::new();
        let shallow = CacheScope {
            max_depth: 2,
            ..scope(&registry)
        };
        let first = cache.get_or_resolve(shallow, "Empty", &mut resolve).unwrap();
        let second = cache
            .get_or_resolve(scope(&registry), "Empty", &mut resolve)
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 2);
    }
}
