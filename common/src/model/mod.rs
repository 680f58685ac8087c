pub mod conflict;
pub mod participant;
pub mod requirement;
pub mod submission;
pub mod workspace;
