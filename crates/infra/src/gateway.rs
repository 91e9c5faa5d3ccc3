use std::sync::Arc;

use toolrent_core::{ActorId, BucketId, DomainResult};
use toolrent_inventory::{BucketStore, InventoryBucketEngine, ToolState};
use toolrent_loans::{InventoryCollaborator, ToolSnapshot};

/// In-process inventory collaborator: calls the engine directly.
///
/// A remote client would implement the same trait and map transport failures
/// to `DomainError::Unavailable`; here there is no transport, so engine errors
/// pass through unchanged.
pub struct LocalInventoryGateway<S> {
    engine: Arc<InventoryBucketEngine<S>>,
}

impl<S> LocalInventoryGateway<S> {
    pub fn new(engine: Arc<InventoryBucketEngine<S>>) -> Self {
        Self { engine }
    }
}

impl<S> Clone for LocalInventoryGateway<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<S: BucketStore> InventoryCollaborator for LocalInventoryGateway<S> {
    fn get_tool(&self, tool_id: BucketId) -> DomainResult<ToolSnapshot> {
        self.engine.get(tool_id).map(ToolSnapshot::from)
    }

    fn move_tool_state(&self, tool_id: BucketId, state: ToolState, actor: &ActorId) -> DomainResult<ToolSnapshot> {
        tracing::debug!(tool_id = %tool_id, to = %state, actor = %actor, "inventory move requested");
        self.engine.move_unit(tool_id, state, actor).map(ToolSnapshot::from)
    }

    fn find_ids_by_triple(&self, name: &str, category: &str, state: ToolState) -> DomainResult<Vec<BucketId>> {
        self.engine.find_ids(name, category, state)
    }
}
