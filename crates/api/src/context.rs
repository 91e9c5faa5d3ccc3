use toolrent_core::ActorId;

/// Who is acting on this request (recorded on inventory movements).
///
/// Identity is established upstream; this service trusts the `X-Actor` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: ActorId,
}

impl ActorContext {
    pub fn new(actor: ActorId) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }
}
