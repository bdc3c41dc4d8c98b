pub mod admin;
pub mod auth;
pub mod course;
pub mod curriculum;
pub mod dashboard;
pub mod discussion;
pub mod enrollment;
pub mod essay;
pub mod grades;
pub mod library;
pub mod live_class;
pub mod notification;
pub mod quiz;
pub mod upload;
