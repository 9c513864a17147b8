pub mod athlete;
pub mod attempt;
pub mod category;
pub mod current_state;
pub mod flight;
pub mod meet;
pub mod ranking;
pub mod record;
pub mod registration;
pub mod result;
