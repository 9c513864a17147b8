//! Narrow seam for resolving the `meet_code` a joining session names to the
//! `meet_id` its channel is keyed by. Kept separate from `engine::ports::
//! CatalogPort` because it is purely a broker-session concern; the
//! composition root (`server` crate) wires in a `storage`-backed adapter.

use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait MeetLookup: Send + Sync {
    async fn meet_id_for_code(&self, meet_code: &str) -> Option<Uuid>;
}
