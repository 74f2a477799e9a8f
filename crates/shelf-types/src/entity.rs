use serde::de::DeserializeOwned;
use serde::Serialize;

/// A type that can be persisted by the store.
///
/// Implementors register their schema explicitly: the descriptor names the
/// on-disk type directory, the JSON field holding the identifier, and
/// optionally the JSON field holding the optimistic-concurrency version.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use shelf_types::{Entity, EntityDescriptor};
///
/// #[derive(Serialize, Deserialize)]
/// struct Widget {
///     id: Option<String>,
///     version: Option<i64>,
///     label: String,
/// }
///
/// impl Entity for Widget {
///     fn descriptor() -> EntityDescriptor {
///         EntityDescriptor::new("Widget").identifier("id").version("version")
///     }
///
///     fn assign_identifier(&mut self, id: &str) {
///         self.id = Some(id.to_string());
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + 'static {
    /// The schema of this type. Called once per store; the result is cached.
    fn descriptor() -> EntityDescriptor;

    /// Set the identifier field to a freshly generated `id`.
    ///
    /// Called by the store when a value is saved with a blank identifier.
    /// Only the identifier may change; every other field is left as it is.
    fn assign_identifier(&mut self, id: &str);
}

/// The role a declared field plays for the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// String-valued record identifier. Exactly one per type.
    Identifier,
    /// Integer-valued optimistic-concurrency version. At most one per type.
    Version,
}

impl std::fmt::Display for FieldRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Version => write!(f, "version"),
        }
    }
}

/// A single declared field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// JSON member name in the encoded document.
    pub name: String,
    pub role: FieldRole,
}

/// Unvalidated schema declaration for an entity type.
///
/// Built with the chained constructors below. Validation happens later, in
/// [`crate::EntityMeta::resolve`], so that a malformed declaration surfaces as a
/// configuration error at first use rather than a panic at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityDescriptor {
    type_name: String,
    fields: Vec<FieldSpec>,
}

impl EntityDescriptor {
    /// Start a descriptor for the given type name.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Declare the identifier field.
    pub fn identifier(self, field: impl Into<String>) -> Self {
        self.field(field, FieldRole::Identifier)
    }

    /// Declare the version field.
    pub fn version(self, field: impl Into<String>) -> Self {
        self.field(field, FieldRole::Version)
    }

    /// Declare a field with an explicit role.
    pub fn field(mut self, field: impl Into<String>, role: FieldRole) -> Self {
        self.fields.push(FieldSpec {
            name: field.into(),
            role,
        });
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Fields declared with the given role, in declaration order.
    pub fn fields_with_role(&self, role: FieldRole) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(move |f| f.role == role)
    }
}
