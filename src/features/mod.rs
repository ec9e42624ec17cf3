pub mod activities;
pub mod admin;
pub mod analysis;
pub mod auth;
pub mod dashboard;
pub mod downloads;
pub mod files;
pub mod history;
pub mod users;
