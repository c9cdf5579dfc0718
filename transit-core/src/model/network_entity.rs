/// an entity persisted in one of the network collections, addressable by a
/// string identifier unique within its collection.
pub trait NetworkEntity: Clone {
    /// collection name used in log and error messages
    const ENTITY_NAME: &'static str;

    fn id(&self) -> &str;
}
