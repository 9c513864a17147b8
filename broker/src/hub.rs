//! Per-meet channel fanout: meet-wide, judges-only, director-only, and
//! viewers-only channels. Sessions join and leave independently of command
//! dispatch; delivery to each session is independent so a slow viewer
//! never blocks a judge.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::session::{Role, SessionId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelTarget {
    Meet,
    JudgesOnly,
    DirectorOnly,
    ViewersOnly,
}

impl ChannelTarget {
    fn admits(self, role: &Role) -> bool {
        match self {
            ChannelTarget::Meet => true,
            ChannelTarget::JudgesOnly => matches!(role, Role::Judge { .. }),
            ChannelTarget::DirectorOnly => role.is_director(),
            ChannelTarget::ViewersOnly => matches!(role, Role::Viewer),
        }
    }
}

struct Subscriber {
    role: Role,
    tx: mpsc::Sender<String>,
}

#[derive(Default)]
struct MeetChannels {
    sessions: HashMap<SessionId, Subscriber>,
}

#[derive(Default)]
pub struct Hub {
    meets: RwLock<HashMap<Uuid, MeetChannels>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, meet_id: Uuid, session_id: SessionId, role: Role, tx: mpsc::Sender<String>) {
        let mut meets = self.meets.write().await;
        meets
            .entry(meet_id)
            .or_default()
            .sessions
            .insert(session_id, Subscriber { role, tx });
    }

    /// Removes a session from every channel. In-flight commands already
    /// accepted from this session are unaffected.
    pub async fn leave(&self, meet_id: Uuid, session_id: SessionId) {
        let mut meets = self.meets.write().await;
        if let Some(channels) = meets.get_mut(&meet_id) {
            channels.sessions.remove(&session_id);
            if channels.sessions.is_empty() {
                meets.remove(&meet_id);
            }
        }
    }

    /// Sends `payload` to every session in `meet_id` matching `target`.
    ///
    /// `critical` distinguishes correctness-bearing events (state/vote/
    /// ranking updates) from purely informational ones (nothing in this
    /// system is send-and-forget besides a future per-tick timer, which
    /// this system deliberately rules out in favor of start/stop only --
    /// so in practice every broadcast here is critical). A subscriber whose
    /// buffer is full is dropped rather than left to see stale state.
    pub async fn broadcast(&self, meet_id: Uuid, target: ChannelTarget, payload: String, critical: bool) {
        let mut meets = self.meets.write().await;
        let Some(channels) = meets.get_mut(&meet_id) else {
            return;
        };

        let mut dead = Vec::new();
        for (id, sub) in channels.sessions.iter() {
            if !target.admits(&sub.role) {
                continue;
            }
            match sub.tx.try_send(payload.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if critical {
                        dead.push(*id);
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(*id),
            }
        }
        for id in dead {
            channels.sessions.remove(&id);
        }
    }

    /// Sends `payload` to exactly one session (a command acknowledgement).
    pub async fn send_to(&self, meet_id: Uuid, session_id: SessionId, payload: String) {
        let meets = self.meets.read().await;
        if let Some(channels) = meets.get(&meet_id) {
            if let Some(sub) = channels.sessions.get(&session_id) {
                let _ = sub.tx.try_send(payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::tally::JudgeRole as TallyJudgeRole;

    #[tokio::test]
    async fn judges_only_channel_excludes_viewers() {
        let hub = Hub::new();
        let meet_id = Uuid::new_v4();

        let (judge_tx, mut judge_rx) = mpsc::channel(8);
        let (viewer_tx, mut viewer_rx) = mpsc::channel(8);

        hub.join(
            meet_id,
            Uuid::new_v4(),
            Role::Judge { judge_id: "j1".to_string(), role: TallyJudgeRole::Head },
            judge_tx,
        )
        .await;
        hub.join(meet_id, Uuid::new_v4(), Role::Viewer, viewer_tx).await;

        hub.broadcast(meet_id, ChannelTarget::JudgesOnly, "hello".to_string(), true)
            .await;

        assert_eq!(judge_rx.try_recv().unwrap(), "hello");
        assert!(viewer_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn leave_removes_session_from_future_broadcasts() {
        let hub = Hub::new();
        let meet_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(8);

        hub.join(meet_id, session_id, Role::Viewer, tx).await;
        hub.leave(meet_id, session_id).await;
        hub.broadcast(meet_id, ChannelTarget::Meet, "x".to_string(), true).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_buffer_drops_critical_subscriber() {
        let hub = Hub::new();
        let meet_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(1);

        hub.join(meet_id, session_id, Role::Viewer, tx).await;
        hub.broadcast(meet_id, ChannelTarget::Meet, "first".to_string(), true).await;
        hub.broadcast(meet_id, ChannelTarget::Meet, "second".to_string(), true).await;

        // The buffer (capacity 1) was already full of "first" when "second"
        // arrived, so the subscriber should have been dropped.
        drop(rx);
        hub.broadcast(meet_id, ChannelTarget::Meet, "third".to_string(), true).await;
    }
}
