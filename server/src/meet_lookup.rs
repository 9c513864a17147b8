//! Adapter satisfying `broker::MeetLookup` over `storage::Database` --
//! kept here, not in `storage` or `broker`, because it is the composition
//! root's job to wire a concrete backend into a downstream crate's trait
//! (the orphan rule forbids `storage` from implementing a `broker` trait
//! for its own `Database` type).

use async_trait::async_trait;
use broker::MeetLookup;
use storage::repository::meet::MeetRepository;
use storage::Database;
use uuid::Uuid;

pub struct StorageMeetLookup {
    db: Database,
}

impl StorageMeetLookup {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MeetLookup for StorageMeetLookup {
    async fn meet_id_for_code(&self, meet_code: &str) -> Option<Uuid> {
        MeetRepository::new(self.db.pool())
            .find_by_code(meet_code)
            .await
            .ok()
            .map(|meet| meet.meet_id)
    }
}
