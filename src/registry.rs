//! Schema Registry
//!
//! Owns the composed schema for the lifetime of a process and hands out
//! compiled validators, one per requested type. Validators are compiled on
//! first use and memoized; there is no invalidation path, so a reload means
//! building a fresh registry.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::compose::{compose, ComposeOptions, ComposedSchema, DEFINITIONS_PREFIX};
use crate::engine::{ConstraintEngine, JsonSchemaEngine, Validator, Violation};
use crate::error::{Result, SchemaError};
use crate::fragment;
use crate::lint::KeywordLinter;

/// Cache key of a compiled validator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// No type requested: the schema's root reference
    Root,
    /// A named definition
    Named(String),
}

impl TypeKey {
    pub fn from_option(type_name: Option<&str>) -> Self {
        match type_name {
            Some(name) => Self::Named(name.to_string()),
            None => Self::Root,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "<root>"),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A validator bound to one schema body
pub struct CompiledValidator {
    key: TypeKey,
    inner: Box<dyn Validator>,
}

impl CompiledValidator {
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Check a whole document value, collecting every violation
    pub fn check(&self, instance: &Value) -> Vec<Violation> {
        self.inner.check(instance)
    }
}

impl fmt::Debug for CompiledValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledValidator").field("key", &self.key).finish()
    }
}

/// The composed schema plus its validator cache
pub struct SchemaRegistry {
    schema: ComposedSchema,
    engine: Box<dyn ConstraintEngine>,
    linter: KeywordLinter,
    cache: RwLock<HashMap<TypeKey, Arc<CompiledValidator>>>,
}

impl SchemaRegistry {
    /// Build a registry with the default engine
    ///
    /// The root validator is compiled eagerly, so a schema that cannot be
    /// compiled fails here rather than on the first document.
    pub fn new(schema: ComposedSchema) -> Result<Self> {
        Self::with_engine(schema, Box::new(JsonSchemaEngine::default()))
    }

    /// Build a registry around a custom constraint engine
    pub fn with_engine(schema: ComposedSchema, engine: Box<dyn ConstraintEngine>) -> Result<Self> {
        let registry = Self {
            schema,
            engine,
            linter: KeywordLinter::new(),
            cache: RwLock::new(HashMap::new()),
        };
        registry.compile(None)?;
        Ok(registry)
    }

    /// Registry over the fragments shipped with the crate
    pub fn embedded() -> Result<Self> {
        let fragments = fragment::load_embedded()?;
        Self::new(compose(&fragments, &ComposeOptions::default())?)
    }

    /// Registry over the fragments found in `dir`
    pub fn from_dir(dir: &Path, options: &ComposeOptions) -> Result<Self> {
        let fragments = fragment::load_from_directory(dir)?;
        Self::new(compose(&fragments, options)?)
    }

    /// The composed schema
    pub fn schema(&self) -> &ComposedSchema {
        &self.schema
    }

    /// Definition names, in canonical order
    pub fn type_names(&self) -> Vec<String> {
        self.schema.type_names()
    }

    /// Number of validators compiled so far
    pub fn compiled_count(&self) -> usize {
        self.cache.read().len()
    }

    /// Compiled validator for `type_name`, or the root when `None`
    ///
    /// Returns `Ok(None)` for a type that is not a definition. Repeated calls
    /// with the same key return the same cached instance.
    pub fn compile(&self, type_name: Option<&str>) -> Result<Option<Arc<CompiledValidator>>> {
        if let Some(name) = type_name {
            if !self.schema.has_type(name) {
                return Ok(None);
            }
        }
        let key = TypeKey::from_option(type_name);

        if let Some(validator) = self.cache.read().get(&key) {
            debug!(target_type = %key, "validator cache hit");
            return Ok(Some(Arc::clone(validator)));
        }

        // Single writer: re-check under the write lock so two racing callers
        // never compile the same key twice.
        let mut cache = self.cache.write();
        if let Some(validator) = cache.get(&key) {
            debug!(target_type = %key, "validator cache hit");
            return Ok(Some(Arc::clone(validator)));
        }

        debug!(target_type = %key, "validator cache miss, compiling");
        let validator = Arc::new(self.compile_uncached(key.clone())?);
        cache.insert(key, Arc::clone(&validator));
        Ok(Some(validator))
    }

    fn compile_uncached(&self, key: TypeKey) -> Result<CompiledValidator> {
        let mut schema = self.schema.to_value();
        if let Value::Object(obj) = &mut schema {
            // The versioned identifier is not resolvable; keep references local
            obj.remove("$id");
            if let TypeKey::Named(name) = &key {
                obj.insert(
                    "$ref".to_string(),
                    Value::String(format!("{}{}", DEFINITIONS_PREFIX, name)),
                );
            }
        }

        self.linter.check(&key.to_string(), &schema)?;

        let inner = self.engine.compile(&schema).map_err(|reason| SchemaError::Compile {
            target: key.to_string(),
            reason,
        })?;

        Ok(CompiledValidator { key, inner })
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("id", &self.schema.id)
            .field("types", &self.schema.definitions.len())
            .field("compiled", &self.compiled_count())
            .finish()
    }
}
