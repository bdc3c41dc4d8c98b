pub mod config;
pub mod enrollment_status;
pub mod filename;
pub mod grading;
pub mod role;
pub mod storage;
pub mod target_level;

pub use enrollment_status::{EnrollmentDecision, EnrollmentStatus};
pub use grading::AnswerOption;
pub use role::Role;
pub use target_level::TargetLevel;
