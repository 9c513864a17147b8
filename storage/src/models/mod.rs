mod athlete;
mod attempt;
mod category;
mod current_state;
mod flight;
mod group;
mod lift;
mod meet;
mod meet_type;
mod record;
mod registration;
mod result;

pub use athlete::Athlete;
pub use attempt::{Attempt, AttemptStatus};
pub use category::{AgeCategory, WeightCategory};
pub use current_state::CurrentStateRow;
pub use flight::Flight;
pub use group::{Group, GroupEntry};
pub use lift::Lift;
pub use meet::Meet;
pub use meet_type::MeetType;
pub use record::Record;
pub use registration::{DeclaredOpener, Registration};
pub use result::{MeetResult, ResultLift};
