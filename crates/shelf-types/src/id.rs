use uuid::Uuid;

/// Strategy for assigning identifiers to records saved without one.
///
/// Each store holds its own generator; there is no process-wide default.
/// Closures `Fn(&str) -> String` receiving the entity type name implement this
/// trait directly.
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh identifier for a record of the given type.
    fn generate(&self, type_name: &str) -> String;
}

/// Random UUID v4 identifiers in hyphenated lowercase form.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self, _type_name: &str) -> String {
        Uuid::new_v4().to_string()
    }
}

impl<F> IdGenerator for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn generate(&self, type_name: &str) -> String {
        self(type_name)
    }
}
