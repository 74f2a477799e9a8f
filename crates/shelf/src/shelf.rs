use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use shelf_backup::{BackupReader, BackupReport, BackupWriter, RestoreMode};
use shelf_store::{ObjectStore, StoreConfig};
use shelf_types::{Entity, IdGenerator};
use tracing::info;

use crate::config::ShelfConfig;
use crate::error::ShelfResult;

/// A sharded JSON document store with checksummed backup and restore.
#[derive(Debug)]
pub struct Shelf {
    store: ObjectStore,
}

impl Shelf {
    pub fn open(config: ShelfConfig) -> ShelfResult<Self> {
        config.validate()?;
        Ok(Self {
            store: ObjectStore::open(config.store)?,
        })
    }

    /// Open with default settings rooted at `base_dir`.
    pub fn open_dir(base_dir: impl Into<PathBuf>) -> ShelfResult<Self> {
        Self::open(ShelfConfig::new(StoreConfig::new(base_dir)))
    }

    pub fn from_toml_file(path: &Path) -> ShelfResult<Self> {
        let config = ShelfConfig::from_file(path)?;
        info!(config = %path.display(), "configuration loaded");
        Self::open(config)
    }

    pub fn with_id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.store.set_id_generator(generator);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn base_dir(&self) -> &Path {
        self.store.base_dir()
    }

    // ---- Records ----

    pub fn read<E: Entity>(&self, id: &str) -> ShelfResult<Option<E>> {
        Ok(self.store.read(id)?)
    }

    pub fn upsert<E: Entity>(&self, entity: &mut E) -> ShelfResult<String> {
        Ok(self.store.upsert(entity)?)
    }

    pub fn insert<E: Entity>(&self, entity: &mut E) -> ShelfResult<String> {
        Ok(self.store.insert(entity)?)
    }

    pub fn delete<E: Entity>(&self, id: &str) -> ShelfResult<bool> {
        Ok(self.store.delete::<E>(id)?)
    }

    pub fn delete_entity<E: Entity>(&self, entity: &E) -> ShelfResult<bool> {
        Ok(self.store.delete_entity(entity)?)
    }

    pub fn exists<E: Entity>(&self, id: &str) -> ShelfResult<bool> {
        Ok(self.store.exists::<E>(id)?)
    }

    pub fn list<E, F>(&self, predicate: F) -> ShelfResult<Vec<E>>
    where
        E: Entity,
        F: FnMut(&E) -> Option<bool>,
    {
        Ok(self.store.list(predicate)?)
    }

    pub fn list_all<E: Entity>(&self) -> ShelfResult<Vec<E>> {
        Ok(self.store.list_all()?)
    }

    pub fn count<E: Entity>(&self) -> ShelfResult<usize> {
        Ok(self.store.count::<E>()?)
    }

    // ---- Backup ----

    pub fn write_backup<W: Write>(&self, sink: W) -> ShelfResult<BackupReport> {
        Ok(BackupWriter::new(&self.store).write(sink)?)
    }

    /// Restore a backup. With `additive` unset the store is emptied first.
    pub fn read_backup<R: Read>(&self, source: R, additive: bool) -> ShelfResult<BackupReport> {
        self.restore(source, RestoreMode::from_additive(additive))
    }

    pub fn restore<R: Read>(&self, source: R, mode: RestoreMode) -> ShelfResult<BackupReport> {
        Ok(BackupReader::new(&self.store).restore(source, mode)?)
    }

    pub fn backup_to_file(&self, path: &Path) -> ShelfResult<BackupReport> {
        let mut sink = BufWriter::new(File::create(path)?);
        let report = self.write_backup(&mut sink)?;
        sink.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        Ok(report)
    }

    pub fn restore_from_file(&self, path: &Path, mode: RestoreMode) -> ShelfResult<BackupReport> {
        self.restore(BufReader::new(File::open(path)?), mode)
    }
}
