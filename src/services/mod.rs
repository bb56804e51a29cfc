pub mod browser;
pub mod delete;
pub mod download;
pub mod folders;
pub mod listing;
pub mod path;
pub mod upload;
