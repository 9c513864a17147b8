//! Vote Tally (C2): a purely in-memory, process-local accumulator of
//! judge votes. Never persisted — a process restart loses in-flight
//! ballots by design.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JudgeRole {
    Head,
    Left,
    Right,
}

impl JudgeRole {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "HEAD" => Ok(Self::Head),
            "LEFT" => Ok(Self::Left),
            "RIGHT" => Ok(Self::Right),
            other => Err(EngineError::BadInput(format!("unknown judge role: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vote {
    White,
    Red,
}

impl Vote {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "WHITE" => Ok(Self::White),
            "RED" => Ok(Self::Red),
            other => Err(EngineError::BadInput(format!("unknown vote: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Valid,
    Invalid,
}

/// A snapshot of the three judges' votes at the moment the tally either
/// completed or was read, for inclusion in `attempt.result` broadcasts.
pub type VoteSnapshot = HashMap<JudgeRole, Vote>;

#[derive(Debug, Clone)]
pub struct RegisterVoteResult {
    pub complete: bool,
    pub outcome: Option<Outcome>,
    pub snapshot: VoteSnapshot,
}

#[derive(Default)]
struct TallyState {
    votes: HashMap<Uuid, VoteSnapshot>,
}

/// Guarded by a single mutex: the critical section is a
/// hash-map update plus a 3-entry majority check, short enough that a
/// single lock never becomes a bottleneck even with many concurrent
/// judge sessions across different meets.
pub struct VoteTally {
    state: Mutex<TallyState>,
}

impl Default for VoteTally {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteTally {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TallyState::default()),
        }
    }

    pub fn register_vote(
        &self,
        attempt_id: Uuid,
        role: JudgeRole,
        vote: Vote,
    ) -> RegisterVoteResult {
        let mut state = self.state.lock().expect("vote tally mutex poisoned");
        let entry = state.votes.entry(attempt_id).or_default();
        entry.insert(role, vote);

        let snapshot = entry.clone();
        let complete = snapshot.len() == 3;
        let outcome = complete.then(|| majority(&snapshot));

        RegisterVoteResult {
            complete,
            outcome,
            snapshot,
        }
    }

    pub fn has_voted(&self, attempt_id: Uuid, role: JudgeRole) -> bool {
        let state = self.state.lock().expect("vote tally mutex poisoned");
        state
            .votes
            .get(&attempt_id)
            .is_some_and(|v| v.contains_key(&role))
    }

    pub fn vote_count(&self, attempt_id: Uuid) -> usize {
        let state = self.state.lock().expect("vote tally mutex poisoned");
        state.votes.get(&attempt_id).map_or(0, |v| v.len())
    }

    pub fn clear(&self, attempt_id: Uuid) {
        let mut state = self.state.lock().expect("vote tally mutex poisoned");
        state.votes.remove(&attempt_id);
    }

    pub fn clear_all(&self) {
        let mut state = self.state.lock().expect("vote tally mutex poisoned");
        state.votes.clear();
    }
}

/// At least two WHITE -> VALID; at least two RED -> INVALID. With exactly
/// three roles represented this is total.
fn majority(snapshot: &VoteSnapshot) -> Outcome {
    let white = snapshot.values().filter(|v| **v == Vote::White).count();
    let red = snapshot.values().filter(|v| **v == Vote::Red).count();

    if white >= 2 {
        Outcome::Valid
    } else if red >= 2 {
        Outcome::Invalid
    } else {
        // Unreachable with 3 roles and a binary vote, but defined for
        // completeness rather than left to panic.
        if white > red { Outcome::Valid } else { Outcome::Invalid }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aid() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn completes_after_three_distinct_roles() {
        let tally = VoteTally::new();
        let attempt = aid();

        let r1 = tally.register_vote(attempt, JudgeRole::Head, Vote::White);
        assert!(!r1.complete);
        let r2 = tally.register_vote(attempt, JudgeRole::Left, Vote::White);
        assert!(!r2.complete);
        let r3 = tally.register_vote(attempt, JudgeRole::Right, Vote::Red);
        assert!(r3.complete);
        assert_eq!(r3.outcome, Some(Outcome::Valid));
    }

    #[test]
    fn majority_rule_two_red_is_invalid() {
        let tally = VoteTally::new();
        let attempt = aid();
        tally.register_vote(attempt, JudgeRole::Head, Vote::Red);
        tally.register_vote(attempt, JudgeRole::Left, Vote::Red);
        let result = tally.register_vote(attempt, JudgeRole::Right, Vote::White);
        assert_eq!(result.outcome, Some(Outcome::Invalid));
    }

    #[test]
    fn overwrite_does_not_double_count() {
        let tally = VoteTally::new();
        let attempt = aid();
        tally.register_vote(attempt, JudgeRole::Head, Vote::White);
        tally.register_vote(attempt, JudgeRole::Head, Vote::Red);
        assert_eq!(tally.vote_count(attempt), 1);
        assert!(tally.has_voted(attempt, JudgeRole::Head));
        assert!(!tally.has_voted(attempt, JudgeRole::Left));
    }

    #[test]
    fn clear_removes_entry() {
        let tally = VoteTally::new();
        let attempt = aid();
        tally.register_vote(attempt, JudgeRole::Head, Vote::White);
        tally.clear(attempt);
        assert_eq!(tally.vote_count(attempt), 0);
    }

    #[test]
    fn scenario_majority_outcome_42() {
        // End-to-end scenario 1: H=WHITE, L=WHITE, R=RED -> VALID.
        let tally = VoteTally::new();
        let attempt = aid();
        tally.register_vote(attempt, JudgeRole::Head, Vote::White);
        tally.register_vote(attempt, JudgeRole::Left, Vote::White);
        let result = tally.register_vote(attempt, JudgeRole::Right, Vote::Red);
        assert!(result.complete);
        assert_eq!(result.outcome, Some(Outcome::Valid));
        assert_eq!(result.snapshot.len(), 3);
    }
}
