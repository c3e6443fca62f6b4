pub mod comment;
pub mod config;
pub mod init;
pub mod projects;
pub mod report;
pub mod send;
