pub mod api;
pub mod checkout;
pub mod db;
pub mod docs;
pub mod flights;
pub mod models;
pub mod stripe;

use std::sync::Arc;

use sqlx::PgPool;

use crate::stripe::CheckoutProvider;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub checkout: Arc<dyn CheckoutProvider>,
}
