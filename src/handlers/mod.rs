pub mod admin;
pub mod analytics;
pub mod forms;
pub mod newsletter;
pub mod reviews;
pub mod storage;
