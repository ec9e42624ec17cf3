use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::models::UserRole;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

pub fn create_test_user(role: UserRole) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: Uuid::new_v4(),
        email: format!("{}@example.com", role),
        role,
    }
}

/// Pool that never connects until a query runs; handlers that fail before
/// touching the database can be tested without PostgreSQL.
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://postgres@localhost/sheetlytics_test")
        .unwrap()
}

async fn inject_user_middleware(mut request: Request, next: Next) -> Response {
    request
        .extensions_mut()
        .insert(create_test_user(UserRole::User));
    next.run(request).await
}

async fn inject_admin_middleware(mut request: Request, next: Next) -> Response {
    request
        .extensions_mut()
        .insert(create_test_user(UserRole::Admin));
    next.run(request).await
}

pub fn with_user_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_user_middleware))
}

pub fn with_admin_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_admin_middleware))
}

/// Insert an active account directly; the hash is never verified in these tests
pub async fn insert_account(pool: &PgPool, email: &str) -> Uuid {
    sqlx::query_scalar("INSERT INTO users (email, password_hash) VALUES ($1, 'unused') RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Two-column xlsx with a header row and three data rows
pub fn sample_workbook() -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Month").unwrap();
    sheet.write_string(0, 1, "Revenue").unwrap();
    for (i, (month, revenue)) in [("Jan", 120.0), ("Feb", 98.5), ("Mar", 143.0)]
        .into_iter()
        .enumerate()
    {
        sheet.write_string(i as u32 + 1, 0, month).unwrap();
        sheet.write_number(i as u32 + 1, 1, revenue).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}
