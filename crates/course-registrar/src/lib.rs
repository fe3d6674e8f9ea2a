//! Course registration decision engine.
//!
//! Students enroll in and drop courses subject to capacity, schedule, and prerequisite
//! rules. Enrollments blocked by capacity can be escalated into special-registration
//! requests that staff approve or deny.

pub mod config;
pub mod error;
pub mod registration;
pub mod telemetry;
