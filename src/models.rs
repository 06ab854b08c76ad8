pub mod dashboard;
pub mod livestock;
