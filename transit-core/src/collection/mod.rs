mod collection_error;
mod entity_store;
mod memory_store;
mod network_collection;
mod network_snapshot;

pub use collection_error::CollectionError;
pub use entity_store::{EntityStore, NetworkStore};
pub use memory_store::{EntityTable, MemoryNetworkStore};
pub use network_collection::NetworkCollection;
pub use network_snapshot::NetworkSnapshot;
