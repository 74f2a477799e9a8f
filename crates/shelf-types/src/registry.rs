use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::entity::{Entity, EntityDescriptor, FieldRole};
use crate::error::{TypeError, TypeResult};
use crate::names::validate_type_name;

/// Validated metadata for one entity type.
///
/// Accessors operate on the encoded JSON document rather than on the Rust
/// value, so the store can read and assign identifiers generically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityMeta {
    type_name: String,
    identifier: String,
    version: Option<String>,
}

impl EntityMeta {
    /// Validate a descriptor.
    ///
    /// Fails with [`TypeError::Configuration`] when the descriptor declares
    /// zero or several identifier fields, several version fields, the same
    /// field twice, or a type name that is not a valid path segment.
    pub fn resolve(descriptor: &EntityDescriptor) -> TypeResult<Self> {
        let type_name = descriptor.type_name();
        validate_type_name(type_name)
            .map_err(|e| TypeError::configuration(type_name, e.to_string()))?;

        let mut seen = HashSet::new();
        for field in descriptor.fields() {
            if field.name.is_empty() {
                return Err(TypeError::configuration(
                    type_name,
                    format!("{} field has an empty name", field.role),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(TypeError::configuration(
                    type_name,
                    format!("field {:?} declared more than once", field.name),
                ));
            }
        }

        let identifier = single_field(descriptor, FieldRole::Identifier)?.ok_or_else(|| {
            TypeError::configuration(type_name, "no identifier field declared")
        })?;
        let version = single_field(descriptor, FieldRole::Version)?;

        Ok(Self {
            type_name: type_name.to_string(),
            identifier,
            version,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// JSON member name of the identifier field.
    pub fn identifier_field(&self) -> &str {
        &self.identifier
    }

    /// JSON member name of the version field, if one is declared.
    pub fn version_field(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Read the identifier from an encoded document.
    ///
    /// Returns `Ok(None)` when the member is absent or `null`. A non-string
    /// value is a configuration error.
    pub fn identifier_in<'a>(&self, document: &'a Value) -> TypeResult<Option<&'a str>> {
        match self.member(document, &self.identifier)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(id)) => Ok(Some(id.as_str())),
            Some(other) => Err(TypeError::configuration(
                &self.type_name,
                format!(
                    "identifier field {:?} must be a string, found {}",
                    self.identifier,
                    json_kind(other)
                ),
            )),
        }
    }

    /// Write the identifier into an encoded document.
    pub fn set_identifier(&self, document: &mut Value, id: &str) -> TypeResult<()> {
        let Value::Object(map) = document else {
            return Err(self.not_an_object(document));
        };
        map.insert(self.identifier.clone(), Value::String(id.to_string()));
        Ok(())
    }

    /// Read the version from an encoded document.
    ///
    /// Returns `Ok(None)` when no version field is declared, or when the
    /// member is absent or `null`. Versions are signed; any value that is not
    /// an integer in `i64` range is a configuration error.
    pub fn version_in(&self, document: &Value) -> TypeResult<Option<i64>> {
        let Some(field) = &self.version else {
            return Ok(None);
        };
        match self.member(document, field)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_i64().map(Some).ok_or_else(|| {
                TypeError::configuration(
                    &self.type_name,
                    format!(
                        "version field {field:?} must be an integer, found {}",
                        json_kind(value)
                    ),
                )
            }),
        }
    }

    fn member<'a>(&self, document: &'a Value, field: &str) -> TypeResult<Option<&'a Value>> {
        match document {
            Value::Object(map) => Ok(map.get(field)),
            other => Err(self.not_an_object(other)),
        }
    }

    fn not_an_object(&self, document: &Value) -> TypeError {
        TypeError::configuration(
            &self.type_name,
            format!("entity must encode to a JSON object, found {}", json_kind(document)),
        )
    }
}

fn single_field(descriptor: &EntityDescriptor, role: FieldRole) -> TypeResult<Option<String>> {
    let mut fields = descriptor.fields_with_role(role);
    let first = fields.next().map(|f| f.name.clone());
    if fields.next().is_some() {
        return Err(TypeError::configuration(
            descriptor.type_name(),
            format!("more than one {role} field declared"),
        ));
    }
    Ok(first)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Resolves entity metadata once per Rust type and caches it.
///
/// The cache lives as long as the registry (one per store). Failed
/// resolutions are not cached, so every use of a misdeclared type keeps
/// failing with the same configuration error.
#[derive(Default)]
pub struct MetadataRegistry {
    cache: RwLock<HashMap<TypeId, Arc<EntityMeta>>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve (or fetch cached) metadata for `E`.
    pub fn resolve<E: Entity>(&self) -> TypeResult<Arc<EntityMeta>> {
        let key = TypeId::of::<E>();
        if let Some(meta) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(meta));
        }

        let meta = Arc::new(EntityMeta::resolve(&E::descriptor())?);
        debug!(
            type_name = meta.type_name(),
            identifier = meta.identifier_field(),
            version = ?meta.version_field(),
            "resolved entity metadata"
        );

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(key).or_insert(meta)))
    }

    /// Name of the identifier field of `E`.
    pub fn identifier_of<E: Entity>(&self) -> TypeResult<String> {
        Ok(self.resolve::<E>()?.identifier_field().to_string())
    }

    /// Name of the version field of `E`, if declared.
    pub fn version_of<E: Entity>(&self) -> TypeResult<Option<String>> {
        Ok(self.resolve::<E>()?.version_field().map(str::to_string))
    }

    /// Number of cached types.
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRegistry")
            .field("cached_types", &self.len())
            .finish()
    }
}
