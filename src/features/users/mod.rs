//! Account settings for the signed-in user.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/auth/profile` | Current profile |
//! | PUT | `/api/auth/profile` | Update name or email |
//! | PUT | `/api/auth/password` | Change password |
//! | DELETE | `/api/auth/account` | Delete the account and its files |

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::UserProfileService;
