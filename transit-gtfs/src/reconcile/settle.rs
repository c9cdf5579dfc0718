use std::collections::HashMap;

use futures::future::join_all;
use transit_core::collection::EntityStore;
use transit_core::model::NetworkEntity;

use crate::import::ImportWarning;

/// an entity to persist. `replaces` is deleted first.
#[derive(Clone, Debug)]
pub struct PlannedSave<T> {
    pub entity: T,
    pub replaces: Option<String>,
}

/// entities a reconciler resolved, by feed id.
#[derive(Debug)]
pub struct Reconciled<T> {
    pub by_feed_id: HashMap<String, T>,
    pub warnings: Vec<ImportWarning>,
}

impl<T> Default for Reconciled<T> {
    fn default() -> Self {
        Self {
            by_feed_id: HashMap::new(),
            warnings: vec![],
        }
    }
}

/// runs every save concurrently and waits for all of them. a failed save
/// does not stop the others; it comes back as a warning at its position.
pub async fn settle_saves<T, S>(
    store: &S,
    saves: Vec<PlannedSave<T>>,
) -> Vec<Result<T, ImportWarning>>
where
    T: NetworkEntity,
    S: EntityStore<T>,
{
    let tasks = saves.into_iter().map(|planned| async move {
        let PlannedSave { entity, replaces } = planned;
        if let Some(replaced_id) = replaces.as_deref() {
            store
                .delete(replaced_id)
                .await
                .map_err(|e| save_warning(&entity, e.to_string()))?;
        }
        store
            .save(&entity)
            .await
            .map_err(|e| save_warning(&entity, e.to_string()))?;
        Ok::<T, ImportWarning>(entity)
    });
    let settled = join_all(tasks).await;
    for warning in settled.iter().filter_map(|r| r.as_ref().err()) {
        log::warn!("{warning}");
    }
    settled
}

fn save_warning<T: NetworkEntity>(entity: &T, message: String) -> ImportWarning {
    ImportWarning::EntitySaveFailed {
        entity: T::ENTITY_NAME.to_string(),
        id: entity.id().to_string(),
        message,
    }
}

#[cfg(test)]
mod test {
    use transit_core::collection::MemoryNetworkStore;
    use transit_core::model::Agency;

    use super::{settle_saves, PlannedSave};

    fn agency(id: &str) -> Agency {
        Agency {
            id: id.to_string(),
            acronym: id.to_string(),
            name: id.to_string(),
            description: None,
            color: String::from("#0086FF"),
            gtfs: None,
        }
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let store = MemoryNetworkStore::default();
        store.agencies.fail_saves_for("b");
        let saves = ["a", "b", "c"]
            .iter()
            .map(|id| PlannedSave {
                entity: agency(id),
                replaces: None,
            })
            .collect::<Vec<_>>();
        let settled = settle_saves(&store, saves).await;
        assert_eq!(settled.len(), 3);
        assert!(settled[0].is_ok());
        assert!(settled[1].is_err());
        assert!(settled[2].is_ok());
        assert_eq!(store.agencies.rows().len(), 2);
    }
}
