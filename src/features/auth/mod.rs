mod jwt;

pub mod dtos;
pub mod guards;
pub mod handlers;
pub mod model;
pub mod models;
pub mod password;
pub mod routes;
pub mod services;

pub use jwt::JwtService;
pub use services::AuthService;
