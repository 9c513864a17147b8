pub mod athlete;
pub mod attempt;
pub mod registration;
