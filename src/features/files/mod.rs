//! Workbook upload and management.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/upload` | Upload and parse a workbook (multipart field `file`) |
//! | GET | `/api/upload/files` | Caller's files, newest first |
//! | GET | `/api/upload/file/{id}` | Parsed sheets, saved charts and stats |
//! | POST | `/api/upload/file/{id}/reparse` | Parse the stored copy again |
//! | DELETE | `/api/upload/file/{id}` | Remove the file and its stored copy |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::FileService;
