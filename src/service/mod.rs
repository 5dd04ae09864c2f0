pub mod admin;
pub mod analytics;
pub mod auth;
pub mod crypto;
pub mod log;
pub mod mail;
pub mod newsletter;
pub mod review;
pub mod storage;
