//! BDD step definitions for the vitals service

pub mod aggregation_steps;
pub mod buffer_steps;
pub mod session_steps;
