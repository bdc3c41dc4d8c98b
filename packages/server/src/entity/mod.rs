pub mod course;
pub mod discussion;
pub mod enrollment;
pub mod essay;
pub mod essay_submission;
pub mod lesson;
pub mod library_resource;
pub mod live_class;
pub mod module;
pub mod notification;
pub mod quiz;
pub mod quiz_answer;
pub mod quiz_question;
pub mod quiz_submission;
pub mod reply;
pub mod topic;
pub mod user;
