pub mod admin;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

use axum::http::StatusCode;

pub async fn health() -> StatusCode {
    StatusCode::OK
}
