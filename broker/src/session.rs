use engine::tally::JudgeRole;
use uuid::Uuid;

pub type SessionId = Uuid;

/// The three session kinds. A judge session additionally
/// carries the judge-role its token was signed for; only that role's votes
/// are accepted over this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Judge { judge_id: String, role: JudgeRole },
    Director,
    Viewer,
}

impl Role {
    pub fn is_director(&self) -> bool {
        matches!(self, Role::Director)
    }

    pub fn judge_role(&self) -> Option<JudgeRole> {
        match self {
            Role::Judge { role, .. } => Some(*role),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Judge { .. } => "judge",
            Role::Director => "director",
            Role::Viewer => "viewer",
        }
    }
}
