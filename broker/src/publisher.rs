//! Implements `engine::ports::Publisher` by fanning each `EngineEvent` out
//! through the `Hub` to the channel(s) it targets. The engine never imports
//! this module; it depends only on the trait.

use std::sync::Arc;

use async_trait::async_trait;
use engine::ports::{EngineEvent, Publisher};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::hub::{ChannelTarget, Hub};
use crate::protocol::ServerEvent;

pub struct BrokerPublisher {
    hub: Arc<Hub>,
    /// The meet the most recent `StateUpdate` carried. Needed because most
    /// `EngineEvent` variants don't repeat `meet_id` themselves -- the
    /// singleton state machine (engine::state_machine OQ-3) means there is
    /// only ever one live meet to route to.
    current_meet_id: RwLock<Option<Uuid>>,
}

impl BrokerPublisher {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub, current_meet_id: RwLock::new(None) }
    }
}

#[async_trait]
impl Publisher for BrokerPublisher {
    async fn publish(&self, event: EngineEvent) {
        if let EngineEvent::StateUpdate(state) = &event {
            *self.current_meet_id.write().await = state.meet_id;
        }

        let Some(meet_id) = *self.current_meet_id.read().await else {
            tracing::warn!("dropping engine event published before any meet was initialized");
            return;
        };

        let (target, wire, critical): (ChannelTarget, ServerEvent, bool) = match event {
            EngineEvent::StateUpdate(current) => {
                (ChannelTarget::Meet, ServerEvent::StateUpdate { current }, true)
            }
            EngineEvent::QueueUpdate { group_id, lift_id, round, queue } => (
                ChannelTarget::DirectorOnly,
                ServerEvent::QueueUpdate { group_id, lift_id, round, queue },
                true,
            ),
            EngineEvent::WeightUpdated { registration_id, lift_id, attempt_no, kg } => (
                ChannelTarget::Meet,
                ServerEvent::WeightUpdated { registration_id, lift_id, attempt_no, kg },
                true,
            ),
            EngineEvent::AttemptResult { attempt_id, registration_id, outcome, votes } => (
                ChannelTarget::Meet,
                ServerEvent::AttemptResult { attempt_id, registration_id, outcome, votes },
                true,
            ),
            EngineEvent::RankingUpdate(rankings) => {
                (ChannelTarget::Meet, ServerEvent::RankingUpdate { rankings }, true)
            }
            EngineEvent::TimerStarted { start_epoch_ms, duration_s } => (
                ChannelTarget::Meet,
                ServerEvent::TimerStarted { start_ts: start_epoch_ms, duration_s },
                false,
            ),
            EngineEvent::TimerStopped => (ChannelTarget::Meet, ServerEvent::TimerStopped, false),
            EngineEvent::MeetFinished { reason } => {
                (ChannelTarget::Meet, ServerEvent::MeetFinished { reason }, true)
            }
        };

        self.hub.broadcast(meet_id, target, wire.to_json(), critical).await;
    }
}
