use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::PoisonError;

use serde_json::Value;
use shelf_gate::{Gate, PathLocks};
use shelf_shard::{identifier_from_file_name, ShardLayout};
use shelf_types::{Entity, EntityMeta, IdGenerator, MetadataRegistry, UuidGenerator};
use tracing::{debug, info, warn};

use crate::codec::{DocumentCodec, JsonCodec};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::fs as fsx;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SaveMode {
    Upsert,
    Insert,
}

/// Sharded JSON document store.
///
/// All methods take `&self`; the store is `Send + Sync` and meant to be shared
/// across threads (typically behind an `Arc`).
pub struct ObjectStore {
    base_dir: PathBuf,
    config: StoreConfig,
    gate: Gate,
    locks: PathLocks,
    registry: MetadataRegistry,
    codec: Box<dyn DocumentCodec>,
    id_generator: Box<dyn IdGenerator>,
}

impl ObjectStore {
    /// Open (and create if needed) the store rooted at `config.base_dir`.
    ///
    /// Fails with [`StoreError::Configuration`] if the settings are invalid or
    /// the base path exists but is not a directory.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        let requested = &config.base_dir;
        if requested.exists() && !requested.is_dir() {
            return Err(StoreError::Configuration(format!(
                "base directory {} exists and is not a directory",
                requested.display()
            )));
        }
        fs::create_dir_all(requested)?;
        let base_dir = requested.canonicalize()?;

        info!(
            base_dir = %base_dir.display(),
            shard_width = config.shard.width,
            "object store opened"
        );

        Ok(Self {
            base_dir,
            gate: Gate::new(config.gate.clone()),
            locks: PathLocks::new(),
            registry: MetadataRegistry::new(),
            codec: Box::new(JsonCodec::new(config.pretty_json)),
            id_generator: Box::new(UuidGenerator),
            config,
        })
    }

    pub fn with_id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.set_id_generator(generator);
        self
    }

    /// Replace the generator used for records saved without an identifier.
    pub fn set_id_generator(&mut self, generator: impl IdGenerator + 'static) {
        self.id_generator = Box::new(generator);
    }

    pub fn with_codec(mut self, codec: impl DocumentCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Canonical root directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn layout(&self) -> &ShardLayout {
        &self.config.shard
    }

    /// The gate shared by every mutation of this store.
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Where the record `id` of type `E` lives (whether or not it exists).
    pub fn record_path<E: Entity>(&self, id: &str) -> StoreResult<PathBuf> {
        let meta = self.registry.resolve::<E>()?;
        self.path_of(&meta, id)
    }

    /// Load a record. A blank identifier or a missing file yields `None`.
    pub fn read<E: Entity>(&self, id: &str) -> StoreResult<Option<E>> {
        let meta = self.registry.resolve::<E>()?;
        if id.trim().is_empty() {
            return Ok(None);
        }
        let path = self.path_of(&meta, id)?;
        self.read_path(&path)
    }

    pub fn exists<E: Entity>(&self, id: &str) -> StoreResult<bool> {
        let meta = self.registry.resolve::<E>()?;
        if id.trim().is_empty() {
            return Ok(false);
        }
        Ok(self.path_of(&meta, id)?.is_file())
    }

    /// Create or replace a record.
    ///
    /// An entity with a blank identifier is assigned one from the store's
    /// generator through [`Entity::assign_identifier`]. If the type declares a
    /// version field and a stored record exists, the presented version must
    /// equal the stored one; the store never advances versions itself.
    /// Returns the record identifier.
    pub fn upsert<E: Entity>(&self, entity: &mut E) -> StoreResult<String> {
        self.save(entity, SaveMode::Upsert)
    }

    /// Like [`upsert`](Self::upsert), but fails with
    /// [`StoreError::AlreadyExists`] if the record is already stored.
    pub fn insert<E: Entity>(&self, entity: &mut E) -> StoreResult<String> {
        self.save(entity, SaveMode::Insert)
    }

    /// Remove a record. Returns `true` once the record is absent, including
    /// when it never existed.
    pub fn delete<E: Entity>(&self, id: &str) -> StoreResult<bool> {
        let meta = self.registry.resolve::<E>()?;
        if id.trim().is_empty() {
            return Ok(true);
        }
        let path = self.path_of(&meta, id)?;

        let _permit = self.gate.acquire_mutation()?;
        let lock = self.locks.lock_for(&path);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let removed = fsx::remove_if_exists(&path)?;
        debug!(type_name = meta.type_name(), id, removed, "record deleted");
        Ok(!path.exists())
    }

    /// Remove the record an entity value refers to. An entity without an
    /// identifier refers to nothing and yields `false`.
    pub fn delete_entity<E: Entity>(&self, entity: &E) -> StoreResult<bool> {
        let meta = self.registry.resolve::<E>()?;
        let document = to_document(entity)?;
        match meta.identifier_in(&document)? {
            Some(id) if !id.trim().is_empty() => self.delete::<E>(id),
            _ => Ok(false),
        }
    }

    /// Scan every record of type `E` in shard order, then file-name order.
    ///
    /// `predicate` returns `Some(true)` to keep a record, `Some(false)` to skip
    /// it and `None` to stop the scan. A record that fails to decode aborts
    /// the whole scan with [`StoreError::CorruptRecord`].
    pub fn list<E, F>(&self, mut predicate: F) -> StoreResult<Vec<E>>
    where
        E: Entity,
        F: FnMut(&E) -> Option<bool>,
    {
        let meta = self.registry.resolve::<E>()?;
        let mut results = Vec::new();
        for path in self.record_files(&meta)? {
            let Some(entity) = self.read_path::<E>(&path)? else {
                continue;
            };
            match predicate(&entity) {
                Some(true) => results.push(entity),
                Some(false) => {}
                None => {
                    debug!(type_name = meta.type_name(), kept = results.len(), "scan stopped early");
                    break;
                }
            }
        }
        Ok(results)
    }

    pub fn list_all<E: Entity>(&self) -> StoreResult<Vec<E>> {
        self.list(|_| Some(true))
    }

    /// Identifiers of all stored records of type `E`, from file names only.
    pub fn list_ids<E: Entity>(&self) -> StoreResult<Vec<String>> {
        let meta = self.registry.resolve::<E>()?;
        Ok(self
            .record_files(&meta)?
            .iter()
            .filter_map(|p| p.file_name()?.to_str())
            .filter_map(identifier_from_file_name)
            .map(str::to_string)
            .collect())
    }

    pub fn count<E: Entity>(&self) -> StoreResult<usize> {
        let meta = self.registry.resolve::<E>()?;
        Ok(self.record_files(&meta)?.len())
    }

    fn save<E: Entity>(&self, entity: &mut E, mode: SaveMode) -> StoreResult<String> {
        let meta = self.registry.resolve::<E>()?;
        let type_name = meta.type_name();
        let mut document = to_document(entity)?;

        let existing = meta
            .identifier_in(&document)?
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.id_generator.generate(type_name);
                if id.trim().is_empty() {
                    return Err(StoreError::Configuration(format!(
                        "identifier generator returned a blank identifier for {type_name}"
                    )));
                }
                meta.set_identifier(&mut document, &id)?;
                entity.assign_identifier(&id);
                debug!(type_name, id = %id, "identifier assigned");
                id
            }
        };

        let presented = meta.version_in(&document)?;
        let path = self.path_of(&meta, &id)?;
        let bytes = self.codec.encode(&document)?;

        let _permit = self.gate.acquire_mutation()?;
        let lock = self.locks.lock_for(&path);
        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if mode == SaveMode::Insert && path.exists() {
            return Err(StoreError::AlreadyExists {
                type_name: type_name.to_string(),
                id,
            });
        }
        if meta.version_field().is_some() {
            if let Some(stored_document) = self.load_document(&path)? {
                let stored = meta.version_in(&stored_document)?;
                if stored != presented {
                    warn!(type_name, id = %id, ?presented, ?stored, "version conflict");
                    return Err(StoreError::VersionConflict {
                        type_name: type_name.to_string(),
                        id,
                        presented,
                        stored,
                    });
                }
            }
        }

        fsx::write_atomic(&path, &bytes, self.config.fsync)?;
        debug!(type_name, id = %id, bytes = bytes.len(), "record written");
        Ok(id)
    }

    fn path_of(&self, meta: &EntityMeta, id: &str) -> StoreResult<PathBuf> {
        Ok(self
            .config
            .shard
            .record_path(&self.base_dir, meta.type_name(), id)?)
    }

    /// Record files of a type: shard directories in name order, then
    /// `<id>.json` files in name order. Temporary files are skipped.
    fn record_files(&self, meta: &EntityMeta) -> StoreResult<Vec<PathBuf>> {
        let type_dir = self
            .config
            .shard
            .type_dir(&self.base_dir, meta.type_name())?;
        let mut files = Vec::new();
        for shard in fsx::sorted_entries(&type_dir)? {
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fsx::sorted_entries(&shard.path())? {
                let name = entry.file_name();
                if fsx::is_temp_file_name(&name) || !entry.file_type()?.is_file() {
                    continue;
                }
                if name.to_str().and_then(identifier_from_file_name).is_some() {
                    files.push(entry.path());
                }
            }
        }
        Ok(files)
    }

    fn read_path<E: Entity>(&self, path: &Path) -> StoreResult<Option<E>> {
        let document = {
            let lock = self.locks.lock_for(path);
            let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.load_document(path)?
        };
        document
            .map(|d| serde_json::from_value(d).map_err(|e| corrupt(path, e)))
            .transpose()
    }

    /// Read and decode a document. Caller holds the path lock.
    fn load_document(&self, path: &Path) -> StoreResult<Option<Value>> {
        fsx::read_if_exists(path)?
            .map(|bytes| self.codec.decode(&bytes).map_err(|e| corrupt(path, e)))
            .transpose()
    }
}

impl fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStore")
            .field("base_dir", &self.base_dir)
            .field("layout", &self.config.shard)
            .field("gate", &self.gate)
            .field("locks", &self.locks.len())
            .field("types", &self.registry.len())
            .finish()
    }
}

fn to_document<E: Entity>(entity: &E) -> StoreResult<Value> {
    serde_json::to_value(entity).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn corrupt(path: &Path, reason: impl fmt::Display) -> StoreError {
    StoreError::CorruptRecord {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use shelf_gate::GateConfig;
    use shelf_types::EntityDescriptor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: String,
        label: String,
    }

    impl Entity for Widget {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("Widget").identifier("id")
        }

        fn assign_identifier(&mut self, id: &str) {
            self.id = id.to_string();
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        key: Option<String>,
        version: Option<i64>,
        body: String,
    }

    impl Entity for Doc {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("Doc").identifier("key").version("version")
        }

        fn assign_identifier(&mut self, id: &str) {
            self.key = Some(id.to_string());
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Anonymous {
        name: String,
    }

    impl Entity for Anonymous {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("Anonymous")
        }

        fn assign_identifier(&mut self, _id: &str) {}
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct NumericId {
        id: u64,
    }

    impl Entity for NumericId {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("NumericId").identifier("id")
        }

        fn assign_identifier(&mut self, _id: &str) {}
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Cached {
        id: String,
        #[serde(skip)]
        scratch: String,
    }

    impl Entity for Cached {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("Cached").identifier("id")
        }

        fn assign_identifier(&mut self, id: &str) {
            self.id = id.to_string();
        }
    }

    /// Compact JSON behind a fixed marker, to tell its files apart.
    struct MarkedCodec;

    const MARK: &[u8] = b"#shelf\n";

    impl DocumentCodec for MarkedCodec {
        fn encode(&self, document: &Value) -> StoreResult<Vec<u8>> {
            let mut bytes = MARK.to_vec();
            bytes.extend(JsonCodec::compact().encode(document)?);
            Ok(bytes)
        }

        fn decode(&self, bytes: &[u8]) -> StoreResult<Value> {
            let body = bytes
                .strip_prefix(MARK)
                .ok_or_else(|| StoreError::Serialization("missing marker".into()))?;
            JsonCodec::compact().decode(body)
        }
    }

    fn widget(id: &str, label: &str) -> Widget {
        Widget {
            id: id.into(),
            label: label.into(),
        }
    }

    fn temp_store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::open(StoreConfig::new(dir.path().join("store"))).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested").join("store");
        let store = ObjectStore::open(StoreConfig::new(&base)).unwrap();
        assert!(base.is_dir());
        assert_eq!(store.base_dir(), base.canonicalize().unwrap());
    }

    #[test]
    fn open_rejects_file_as_base() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, b"x").unwrap();
        let err = ObjectStore::open(StoreConfig::new(&file)).unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }

    #[test]
    fn upsert_then_read() {
        let (_dir, store) = temp_store();
        let mut w = widget("a", "first");
        assert_eq!(store.upsert(&mut w).unwrap(), "a");
        assert_eq!(store.read::<Widget>("a").unwrap(), Some(w));
    }

    #[test]
    fn record_lands_in_shard_directory() {
        let (_dir, store) = temp_store();
        store.upsert(&mut widget("a", "first")).unwrap();
        let expected = store.base_dir().join("Widget").join("1u0so").join("a.json");
        assert_eq!(store.record_path::<Widget>("a").unwrap(), expected);
        let on_disk: Value = serde_json::from_slice(&fs::read(&expected).unwrap()).unwrap();
        assert_eq!(on_disk["label"], "first");
    }

    #[test]
    fn missing_and_blank_reads_are_none() {
        let (_dir, store) = temp_store();
        assert!(store.read::<Widget>("nope").unwrap().is_none());
        assert!(store.read::<Widget>("").unwrap().is_none());
        assert!(store.read::<Widget>("   ").unwrap().is_none());
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, store) = temp_store();
        assert!(store.delete::<Widget>("ghost").unwrap());

        store.upsert(&mut widget("a", "x")).unwrap();
        assert!(store.exists::<Widget>("a").unwrap());
        assert!(store.delete::<Widget>("a").unwrap());
        assert!(!store.exists::<Widget>("a").unwrap());
        assert!(store.read::<Widget>("a").unwrap().is_none());
        assert!(store.delete::<Widget>("a").unwrap());
    }

    #[test]
    fn delete_entity_uses_identifier() {
        let (_dir, store) = temp_store();
        let mut w = widget("a", "x");
        store.upsert(&mut w).unwrap();
        assert!(store.delete_entity(&w).unwrap());
        assert!(!store.exists::<Widget>("a").unwrap());
        assert!(!store.delete_entity(&widget("", "unsaved")).unwrap());
    }

    #[test]
    fn blank_identifier_is_assigned_once() {
        let (_dir, store) = temp_store();
        let mut w = widget("", "fresh");
        let id = store.upsert(&mut w).unwrap();
        assert!(!id.is_empty());
        assert_eq!(w.id, id);

        w.label = "renamed".into();
        assert_eq!(store.upsert(&mut w).unwrap(), id);
        assert_eq!(store.count::<Widget>().unwrap(), 1);
        assert_eq!(store.read::<Widget>(&id).unwrap().unwrap().label, "renamed");
    }

    #[test]
    fn assigned_identifier_keeps_unserialized_state() {
        let (_dir, store) = temp_store();
        let mut c = Cached {
            id: String::new(),
            scratch: "keep".into(),
        };
        let id = store.upsert(&mut c).unwrap();
        assert_eq!(c.id, id);
        assert_eq!(c.scratch, "keep");
        assert_eq!(store.read::<Cached>(&id).unwrap().unwrap().scratch, "");
    }

    #[test]
    fn custom_codec_shapes_files() {
        let (_dir, store) = temp_store();
        let store = store.with_codec(MarkedCodec);
        let mut d = Doc {
            key: Some("k".into()),
            version: Some(1),
            body: "marked".into(),
        };
        store.upsert(&mut d).unwrap();

        let raw = fs::read(store.record_path::<Doc>("k").unwrap()).unwrap();
        assert!(raw.starts_with(MARK));
        assert!(!raw[MARK.len()..].contains(&b'\n'));
        assert_eq!(store.read::<Doc>("k").unwrap(), Some(d.clone()));

        // The version check decodes the stored record through the same codec.
        d.body = "again".into();
        store.upsert(&mut d).unwrap();
        assert_eq!(store.read::<Doc>("k").unwrap().unwrap().body, "again");
    }

    #[test]
    fn custom_id_generator() {
        let (_dir, store) = temp_store();
        let counter = AtomicUsize::new(0);
        let store = store.with_id_generator(move |type_name: &str| {
            format!("{}-{}", type_name.to_lowercase(), counter.fetch_add(1, Ordering::SeqCst))
        });
        let mut first = Doc {
            key: None,
            version: None,
            body: "x".into(),
        };
        assert_eq!(store.upsert(&mut first).unwrap(), "doc-0");
        assert_eq!(first.key.as_deref(), Some("doc-0"));
        let mut second = widget("", "y");
        assert_eq!(store.upsert(&mut second).unwrap(), "widget-1");
    }

    #[test]
    fn blank_generated_identifier_is_rejected() {
        let (_dir, mut store) = temp_store();
        store.set_id_generator(|_: &str| String::new());
        let err = store.upsert(&mut widget("", "x")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn version_conflict_leaves_record_unchanged() {
        let (_dir, store) = temp_store();
        let mut v1 = Doc {
            key: Some("k".into()),
            version: Some(1),
            body: "one".into(),
        };
        store.upsert(&mut v1).unwrap();

        let mut stale = Doc {
            key: Some("k".into()),
            version: Some(0),
            body: "stale".into(),
        };
        let err = store.upsert(&mut stale).unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                presented: Some(0),
                stored: Some(1),
                ..
            }
        ));
        assert_eq!(store.read::<Doc>("k").unwrap().unwrap().body, "one");

        // Caller-advanced versions are accepted when the presented one matches.
        let mut same = store.read::<Doc>("k").unwrap().unwrap();
        same.body = "two".into();
        store.upsert(&mut same).unwrap();
        assert_eq!(store.read::<Doc>("k").unwrap().unwrap().body, "two");
    }

    #[test]
    fn negative_versions_are_checked() {
        let (_dir, store) = temp_store();
        let mut d = Doc {
            key: Some("neg".into()),
            version: Some(-1),
            body: "below zero".into(),
        };
        store.upsert(&mut d).unwrap();
        assert_eq!(store.read::<Doc>("neg").unwrap().unwrap().version, Some(-1));

        d.body = "still".into();
        store.upsert(&mut d).unwrap();

        d.version = Some(-2);
        let err = store.upsert(&mut d).unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                presented: Some(-2),
                stored: Some(-1),
                ..
            }
        ));
        assert_eq!(store.read::<Doc>("neg").unwrap().unwrap().body, "still");
    }

    #[test]
    fn first_save_accepts_any_version() {
        let (_dir, store) = temp_store();
        let mut d = Doc {
            key: Some("k".into()),
            version: Some(42),
            body: "x".into(),
        };
        store.upsert(&mut d).unwrap();
        assert_eq!(store.read::<Doc>("k").unwrap().unwrap().version, Some(42));
    }

    #[test]
    fn insert_rejects_existing() {
        let (_dir, store) = temp_store();
        store.insert(&mut widget("a", "x")).unwrap();
        let err = store.insert(&mut widget("a", "y")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.read::<Widget>("a").unwrap().unwrap().label, "x");
    }

    #[test]
    fn list_with_filter() {
        let (_dir, store) = temp_store();
        store.upsert(&mut widget("a", "keep")).unwrap();
        store.upsert(&mut widget("b", "drop")).unwrap();

        let all: Vec<Widget> = store.list_all().unwrap();
        assert_eq!(all.len(), 2);

        let kept = store
            .list::<Widget, _>(|w| Some(w.label == "keep"))
            .unwrap();
        assert_eq!(kept, vec![widget("a", "keep")]);

        let mut ids = store.list_ids::<Widget>().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn list_stops_when_predicate_quits() {
        let (_dir, store) = temp_store();
        for i in 0..5 {
            store.upsert(&mut widget(&format!("w{i}"), "x")).unwrap();
        }
        let mut seen = 0;
        let got = store
            .list::<Widget, _>(|_| {
                seen += 1;
                (seen <= 2).then_some(true)
            })
            .unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(seen, 3);
    }

    #[test]
    fn list_of_empty_type_is_empty() {
        let (_dir, store) = temp_store();
        assert!(store.list_all::<Widget>().unwrap().is_empty());
        assert_eq!(store.count::<Widget>().unwrap(), 0);
    }

    #[test]
    fn list_skips_temp_and_foreign_files() {
        let (_dir, store) = temp_store();
        store.upsert(&mut widget("a", "x")).unwrap();
        let shard_dir = store.record_path::<Widget>("a").unwrap();
        let shard_dir = shard_dir.parent().unwrap();
        fs::write(shard_dir.join(".shelf-tmp123"), b"{partial").unwrap();
        fs::write(shard_dir.join("notes.txt"), b"hello").unwrap();
        fs::write(store.base_dir().join("Widget").join("stray.json"), b"{}").unwrap();

        assert_eq!(store.list_all::<Widget>().unwrap().len(), 1);
        assert_eq!(store.count::<Widget>().unwrap(), 1);
    }

    #[test]
    fn corrupt_record_aborts_listing() {
        let (_dir, store) = temp_store();
        store.upsert(&mut widget("a", "x")).unwrap();
        let bad = store.record_path::<Widget>("b").unwrap();
        fs::create_dir_all(bad.parent().unwrap()).unwrap();
        fs::write(&bad, b"{not json").unwrap();

        let err = store.list_all::<Widget>().unwrap_err();
        assert!(matches!(err, StoreError::CorruptRecord { .. }));
        assert!(matches!(
            store.read::<Widget>("b").unwrap_err(),
            StoreError::CorruptRecord { .. }
        ));
    }

    #[test]
    fn misdeclared_type_is_configuration_error() {
        let (_dir, store) = temp_store();
        let err = store.read::<Anonymous>("x").unwrap_err();
        assert!(err.is_configuration());
        let err = store
            .upsert(&mut Anonymous { name: "n".into() })
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn non_string_identifier_is_configuration_error() {
        let (_dir, store) = temp_store();
        let err = store.upsert(&mut NumericId { id: 7 }).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn path_like_identifier_is_rejected() {
        let (_dir, store) = temp_store();
        let err = store.upsert(&mut widget("../escape", "x")).unwrap_err();
        assert!(matches!(err, StoreError::Shard(_)));
    }

    #[test]
    fn concurrent_writers_and_readers_see_whole_documents() {
        let (_dir, store) = temp_store();
        store.upsert(&mut widget("hot", "seed")).unwrap();
        let store = &store;

        thread::scope(|s| {
            for t in 0..4 {
                s.spawn(move || {
                    for i in 0..25 {
                        let label = format!("{t}-{i}-{}", "x".repeat(4096));
                        store.upsert(&mut widget("hot", &label)).unwrap();
                    }
                });
            }
            for _ in 0..4 {
                s.spawn(move || {
                    for _ in 0..50 {
                        let w = store.read::<Widget>("hot").unwrap().unwrap();
                        assert_eq!(w.id, "hot");
                    }
                });
            }
        });
        assert_eq!(store.count::<Widget>().unwrap(), 1);
    }

    #[test]
    fn mutations_wait_for_exclusive_holder() {
        let (_dir, store) = temp_store();
        let store = &store;

        thread::scope(|s| {
            let permit = store.gate().acquire_exclusive().unwrap();
            let writer = s.spawn(move || store.upsert(&mut widget("late", "x")).unwrap());

            thread::sleep(Duration::from_millis(100));
            assert!(!writer.is_finished());
            assert!(!store.exists::<Widget>("late").unwrap());
            // Reads are not gated.
            assert!(store.read::<Widget>("late").unwrap().is_none());

            drop(permit);
            assert_eq!(writer.join().unwrap(), "late");
        });
        assert!(store.exists::<Widget>("late").unwrap());
    }

    #[test]
    fn mutation_times_out_behind_exclusive_holder() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path())
            .with_gate(GateConfig::default().with_timeout(Duration::from_millis(50)));
        let store = ObjectStore::open(config).unwrap();

        let _permit = store.gate().acquire_exclusive().unwrap();
        let err = store.upsert(&mut widget("a", "x")).unwrap_err();
        assert!(matches!(err, StoreError::Gate(_)));
        assert!(!store.exists::<Widget>("a").unwrap());
    }
}
