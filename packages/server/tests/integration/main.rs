
mod assessments;
mod community;
mod courses;
mod curriculum;
mod library;
