use std::collections::BTreeMap;

use super::{CollectionError, EntityStore};
use crate::model::NetworkEntity;

/// local, id-ordered copy of a network collection.
#[derive(Clone, Debug)]
pub struct NetworkCollection<T> {
    features: BTreeMap<String, T>,
}

impl<T: NetworkEntity> Default for NetworkCollection<T> {
    fn default() -> Self {
        Self {
            features: BTreeMap::new(),
        }
    }
}

impl<T: NetworkEntity> NetworkCollection<T> {
    pub fn new(features: Vec<T>) -> Self {
        Self {
            features: features
                .into_iter()
                .map(|f| (f.id().to_string(), f))
                .collect(),
        }
    }

    pub fn features(&self) -> impl Iterator<Item = &T> {
        self.features.values()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&T> {
        self.features.get(id)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.features.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// adds or replaces a feature with the same id.
    pub fn add(&mut self, feature: T) {
        self.features.insert(feature.id().to_string(), feature);
    }

    pub fn remove_by_id(&mut self, id: &str) -> Option<T> {
        self.features.remove(id)
    }

    /// replaces the local content with the store's content.
    pub async fn load_from_server<S: EntityStore<T>>(
        &mut self,
        store: &S,
    ) -> Result<(), CollectionError> {
        let features = store.load_all().await?;
        log::debug!("loaded {} {} features", features.len(), T::ENTITY_NAME);
        *self = Self::new(features);
        Ok(())
    }
}
