mod user;

pub use user::{User, UserRole, UserStatus, USER_COLUMNS};
