// src/checkout.rs
//
// Bridges the local transaction ledger with the payment provider's hosted
// checkout flow. A transaction moves pending -> completed exactly once, via
// whichever of the three paths (status poll, webhook, legacy verify) sees
// the payment first; the other paths then hit the completed-guard and do
// nothing.

use std::fmt;

use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::PaymentTransaction;
use crate::stripe::{
    CheckoutProvider, CheckoutSession, CheckoutStatus, CreateSessionRequest, ProviderError,
    WebhookEvent,
};

#[derive(Debug, Clone, Copy)]
pub struct PremiumPackage {
    pub id: &'static str,
    pub price: f64,
    pub currency: &'static str,
    pub description: &'static str,
}

pub const PREMIUM_PACKAGES: [PremiumPackage; 2] = [
    PremiumPackage {
        id: "monthly",
        price: 9.99,
        currency: "usd",
        description: "Monthly Premium Subscription",
    },
    PremiumPackage {
        id: "yearly",
        price: 99.99,
        currency: "usd",
        description: "Yearly Premium Subscription (Save 20%)",
    },
];

pub fn premium_package(package_id: &str) -> Option<&'static PremiumPackage> {
    PREMIUM_PACKAGES.iter().find(|p| p.id == package_id)
}

impl PremiumPackage {
    /// Minor units for the provider (9.99 -> 999).
    pub fn amount_minor(&self) -> i64 {
        (self.price * 100.0).round() as i64
    }

    pub fn amount_text(&self) -> String {
        format!("{:.2}", self.price)
    }
}

#[derive(Debug)]
pub enum CheckoutError {
    InvalidPackage(String),
    SessionNotFound(String),
    MissingSignature,
    Provider(ProviderError),
    Store(sqlx::Error),
}

impl fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutError::InvalidPackage(id) => write!(f, "invalid package id: {id}"),
            CheckoutError::SessionNotFound(id) => write!(f, "unknown session: {id}"),
            CheckoutError::MissingSignature => write!(f, "missing webhook signature"),
            CheckoutError::Provider(e) => write!(f, "provider error: {e}"),
            CheckoutError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl From<ProviderError> for CheckoutError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}

impl From<sqlx::Error> for CheckoutError {
    fn from(value: sqlx::Error) -> Self {
        Self::Store(value)
    }
}

/// Validate the package, open a hosted session with the provider, and record
/// a pending ledger entry. The package check runs before any provider or
/// store call.
pub async fn initiate_checkout(
    provider: &dyn CheckoutProvider,
    pool: &PgPool,
    origin: &str,
    package_id: &str,
    email: Option<String>,
) -> Result<CheckoutSession, CheckoutError> {
    let package = premium_package(package_id)
        .ok_or_else(|| CheckoutError::InvalidPackage(package_id.to_string()))?;

    let origin = origin.trim_end_matches('/');
    let success_url = format!("{origin}/success.html?session_id={{CHECKOUT_SESSION_ID}}");
    let cancel_url = format!("{origin}/premium.html");

    let mut metadata = vec![
        ("package_id".to_string(), package.id.to_string()),
        ("description".to_string(), package.description.to_string()),
    ];
    if let Some(email) = &email {
        metadata.push(("email".to_string(), email.clone()));
    }

    let session = provider
        .create_session(CreateSessionRequest {
            amount_minor: package.amount_minor(),
            currency: package.currency.to_string(),
            product_name: package.description.to_string(),
            success_url,
            cancel_url,
            metadata: metadata.clone(),
        })
        .await?;

    let now = Utc::now();
    let metadata_json = serde_json::Value::Object(
        metadata
            .into_iter()
            .map(|(k, v)| (k, json!(v)))
            .collect(),
    );
    db::insert_transaction(
        pool,
        &PaymentTransaction {
            id: Uuid::new_v4(),
            email,
            package_id: package.id.to_string(),
            amount: package.amount_text(),
            currency: package.currency.to_string(),
            session_id: session.session_id.clone(),
            payment_status: "pending".to_string(),
            metadata: Some(metadata_json),
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    Ok(session)
}

/// Ask the provider for the session's current state and, when it reports a
/// paid session, apply the completion side effect. Safe to call repeatedly:
/// a completed ledger entry is never touched again, though the provider is
/// queried on every call.
pub async fn reconcile_status(
    provider: &dyn CheckoutProvider,
    pool: &PgPool,
    session_id: &str,
) -> Result<CheckoutStatus, CheckoutError> {
    let status = provider.query_status(session_id).await?;

    if status.payment_status == "paid" {
        complete_session(pool, session_id).await?;
    }

    Ok(status)
}

/// Asynchronous counterpart of reconcile_status: the provider pushes the
/// payment event. Unknown event types are acknowledged and ignored so the
/// provider does not retry them.
pub async fn handle_webhook(
    provider: &dyn CheckoutProvider,
    pool: &PgPool,
    body: &[u8],
    signature: Option<&str>,
) -> Result<WebhookEvent, CheckoutError> {
    let signature = signature.ok_or(CheckoutError::MissingSignature)?;
    let event = provider.verify_webhook(body, signature)?;

    if event.event_type == "checkout.session.completed" {
        if let Some(session_id) = &event.session_id {
            complete_session(pool, session_id).await?;
        }
    }

    Ok(event)
}

#[derive(Debug)]
pub struct LegacyVerification {
    pub status: &'static str,
    pub email: Option<String>,
}

/// Legacy demo path kept for the old success page: trusts the session id
/// without consulting the provider.
pub async fn verify_session_legacy(
    pool: &PgPool,
    session_id: &str,
) -> Result<LegacyVerification, CheckoutError> {
    let tx = db::find_transaction_by_session(pool, session_id)
        .await?
        .ok_or_else(|| CheckoutError::SessionNotFound(session_id.to_string()))?;

    if tx.payment_status == "completed" {
        return Ok(LegacyVerification {
            status: "already_processed",
            email: tx.email,
        });
    }

    complete_session(pool, session_id).await?;

    Ok(LegacyVerification {
        status: "success",
        email: tx.email,
    })
}

/// Shared terminal transition: mark the ledger entry completed and upgrade
/// the buyer's account. The pending-guard makes the whole thing a no-op on
/// repeat calls, so both reconciliation paths can race safely.
async fn complete_session(pool: &PgPool, session_id: &str) -> Result<(), sqlx::Error> {
    let Some(tx) = db::find_transaction_by_session(pool, session_id).await? else {
        // A session we never issued; nothing to reconcile.
        return Ok(());
    };

    if tx.payment_status == "completed" {
        return Ok(());
    }

    db::mark_transaction_completed(pool, session_id).await?;

    if let Some(email) = &tx.email {
        db::upgrade_user_to_premium(pool, email, &tx.package_id).await?;
    }

    Ok(())
}
