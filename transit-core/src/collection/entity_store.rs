use super::CollectionError;
use crate::model::{Agency, Line, NetworkEntity, Node, Path, Schedule, Service};

/// persistence collaborator for one network collection. implementations
/// talk to the server or database; the import pipeline never writes storage
/// except through this trait.
#[allow(async_fn_in_trait)]
pub trait EntityStore<T: NetworkEntity> {
    /// current content of the collection on the server
    async fn load_all(&self) -> Result<Vec<T>, CollectionError>;

    /// create or update one entity
    async fn save(&self, entity: &T) -> Result<(), CollectionError>;

    async fn delete(&self, id: &str) -> Result<(), CollectionError>;

    /// bulk creation in a single round trip. the default implementation
    /// saves one entity at a time.
    async fn insert_many(&self, entities: &[T]) -> Result<(), CollectionError> {
        for entity in entities.iter() {
            self.save(entity).await?;
        }
        Ok(())
    }
}

/// every store an import run needs.
pub trait NetworkStore:
    EntityStore<Agency>
    + EntityStore<Line>
    + EntityStore<Service>
    + EntityStore<Node>
    + EntityStore<Path>
    + EntityStore<Schedule>
{
}

impl<S> NetworkStore for S where
    S: EntityStore<Agency>
        + EntityStore<Line>
        + EntityStore<Service>
        + EntityStore<Node>
        + EntityStore<Path>
        + EntityStore<Schedule>
{
}
