//! Sync Resolver (C7): uploads a finished meet from the local archive into
//! a remote one, matching identities by logical key only (CF, meet_code,
//! category name) and never propagating local UUID primary keys.

pub mod error;
pub mod pg;
pub mod ports;
pub mod resolver;
pub mod rules;

pub use error::{Result, SyncError};
pub use pg::{PgLocalSource, PgRemoteArchive};
pub use ports::{LocalSource, RemoteArchive};
pub use resolver::{sync_meet, SyncReport};
