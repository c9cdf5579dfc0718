use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{CollectionError, EntityStore, NetworkSnapshot};
use crate::model::{Agency, Line, NetworkEntity, Node, Path, Schedule, Service};

/// in-memory table backing one collection of a [`MemoryNetworkStore`]. counts
/// every call and can be told to fail, which makes it usable as a test double.
#[derive(Debug)]
pub struct EntityTable<T> {
    rows: Mutex<BTreeMap<String, T>>,
    failing_ids: Mutex<HashSet<String>>,
    fail_loads: AtomicBool,
    load_count: AtomicUsize,
    save_count: AtomicUsize,
    delete_count: AtomicUsize,
    bulk_insert_count: AtomicUsize,
}

impl<T: NetworkEntity> EntityTable<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self {
            rows: Mutex::new(
                rows.into_iter()
                    .map(|r| (r.id().to_string(), r))
                    .collect(),
            ),
            failing_ids: Mutex::new(HashSet::new()),
            fail_loads: AtomicBool::new(false),
            load_count: AtomicUsize::new(0),
            save_count: AtomicUsize::new(0),
            delete_count: AtomicUsize::new(0),
            bulk_insert_count: AtomicUsize::new(0),
        }
    }

    /// snapshot of the stored rows, ordered by id.
    pub fn rows(&self) -> Vec<T> {
        match self.rows.lock() {
            Ok(rows) => rows.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.rows.lock().ok().and_then(|rows| rows.get(id).cloned())
    }

    /// any later save or delete of this id fails.
    pub fn fail_saves_for(&self, id: &str) {
        if let Ok(mut ids) = self.failing_ids.lock() {
            ids.insert(id.to_string());
        }
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    pub fn bulk_insert_count(&self) -> usize {
        self.bulk_insert_count.load(Ordering::SeqCst)
    }

    fn lock_rows(&self) -> Result<MutexGuard<'_, BTreeMap<String, T>>, CollectionError> {
        self.rows.lock().map_err(|e| {
            CollectionError::Internal(format!("{} table lock poisoned: {e}", T::ENTITY_NAME))
        })
    }

    fn check_failing(&self, id: &str) -> Result<(), String> {
        let failing = self
            .failing_ids
            .lock()
            .map(|ids| ids.contains(id))
            .unwrap_or(false);
        if failing {
            Err(String::from("rejected by store"))
        } else {
            Ok(())
        }
    }
}

impl<T: NetworkEntity> EntityStore<T> for EntityTable<T> {
    async fn load_all(&self) -> Result<Vec<T>, CollectionError> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(CollectionError::Load {
                entity: T::ENTITY_NAME,
                message: String::from("store unavailable"),
            });
        }
        Ok(self.lock_rows()?.values().cloned().collect())
    }

    async fn save(&self, entity: &T) -> Result<(), CollectionError> {
        self.save_count.fetch_add(1, Ordering::SeqCst);
        self.check_failing(entity.id())
            .map_err(|message| CollectionError::Save {
                entity: T::ENTITY_NAME,
                id: entity.id().to_string(),
                message,
            })?;
        self.lock_rows()?
            .insert(entity.id().to_string(), entity.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), CollectionError> {
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        self.check_failing(id)
            .map_err(|message| CollectionError::Delete {
                entity: T::ENTITY_NAME,
                id: id.to_string(),
                message,
            })?;
        match self.lock_rows()?.remove(id) {
            Some(_) => Ok(()),
            None => Err(CollectionError::NotFound {
                entity: T::ENTITY_NAME,
                id: id.to_string(),
            }),
        }
    }

    async fn insert_many(&self, entities: &[T]) -> Result<(), CollectionError> {
        self.bulk_insert_count.fetch_add(1, Ordering::SeqCst);
        if let Some(failing) = entities.iter().find(|e| self.check_failing(e.id()).is_err()) {
            return Err(CollectionError::Save {
                entity: T::ENTITY_NAME,
                id: failing.id().to_string(),
                message: String::from("bulk insert rejected by store"),
            });
        }
        let mut rows = self.lock_rows()?;
        for entity in entities.iter() {
            rows.insert(entity.id().to_string(), entity.clone());
        }
        Ok(())
    }
}

/// network held in memory, one [`EntityTable`] per collection. used by the
/// command line application with JSON snapshots, and by tests.
#[derive(Debug)]
pub struct MemoryNetworkStore {
    pub agencies: EntityTable<Agency>,
    pub lines: EntityTable<Line>,
    pub services: EntityTable<Service>,
    pub nodes: EntityTable<Node>,
    pub paths: EntityTable<Path>,
    pub schedules: EntityTable<Schedule>,
}

impl Default for MemoryNetworkStore {
    fn default() -> Self {
        Self::from_snapshot(NetworkSnapshot::default())
    }
}

impl MemoryNetworkStore {
    pub fn from_snapshot(snapshot: NetworkSnapshot) -> Self {
        Self {
            agencies: EntityTable::new(snapshot.agencies),
            lines: EntityTable::new(snapshot.lines),
            services: EntityTable::new(snapshot.services),
            nodes: EntityTable::new(snapshot.nodes),
            paths: EntityTable::new(snapshot.paths),
            schedules: EntityTable::new(snapshot.schedules),
        }
    }

    pub fn to_snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            agencies: self.agencies.rows(),
            lines: self.lines.rows(),
            services: self.services.rows(),
            nodes: self.nodes.rows(),
            paths: self.paths.rows(),
            schedules: self.schedules.rows(),
        }
    }
}

macro_rules! delegate_entity_store {
    ($entity:ty, $field:ident) => {
        impl EntityStore<$entity> for MemoryNetworkStore {
            async fn load_all(&self) -> Result<Vec<$entity>, CollectionError> {
                self.$field.load_all().await
            }

            async fn save(&self, entity: &$entity) -> Result<(), CollectionError> {
                self.$field.save(entity).await
            }

            async fn delete(&self, id: &str) -> Result<(), CollectionError> {
                EntityStore::<$entity>::delete(&self.$field, id).await
            }

            async fn insert_many(&self, entities: &[$entity]) -> Result<(), CollectionError> {
                self.$field.insert_many(entities).await
            }
        }
    };
}

delegate_entity_store!(Agency, agencies);
delegate_entity_store!(Line, lines);
delegate_entity_store!(Service, services);
delegate_entity_store!(Node, nodes);
delegate_entity_store!(Path, paths);
delegate_entity_store!(Schedule, schedules);
