// src/models.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// One row of the `flight_searches` analytics log. Written once per search,
/// never mutated.
#[derive(Debug, Serialize)]
pub struct SearchRecord {
    pub id: Uuid,
    pub from_city: String,
    pub to_city: String,
    pub departure_date: String,
    pub passengers: i32,
    pub premium: bool,
    pub results_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub premium_activated_at: Option<DateTime<Utc>>,
    pub subscription_type: Option<String>,
}

impl User {
    pub fn new(email: String, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            is_premium: false,
            created_at: Utc::now(),
            premium_activated_at: None,
            subscription_type: None,
        }
    }
}

/// Local ledger entry for one checkout attempt, keyed by the provider
/// session id. `email` is None for anonymous checkouts; `amount` is kept
/// as the numeric's text rendering (e.g. "9.99").
#[derive(Debug, Serialize)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub email: Option<String>,
    pub package_id: String,
    pub amount: String,
    pub currency: String,
    pub session_id: String,
    pub payment_status: String, // pending | completed
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCheck {
    pub id: Uuid,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}
