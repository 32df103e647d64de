// src/db.rs
//
// All persistence goes through here. Runtime queries with manual row
// mapping, so the build does not depend on a live database.

use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{PaymentTransaction, SearchRecord, StatusCheck, User};

pub async fn insert_search_record(pool: &PgPool, record: &SearchRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO flight_searches
           (id, from_city, to_city, departure_date, passengers, premium, results_count, created_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(record.id)
    .bind(&record.from_city)
    .bind(&record.to_city)
    .bind(&record.departure_date)
    .bind(record.passengers)
    .bind(record.premium)
    .bind(record.results_count)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

fn user_from_row(row: sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        is_premium: row.get("is_premium"),
        created_at: row.get("created_at"),
        premium_activated_at: row.get("premium_activated_at"),
        subscription_type: row.get("subscription_type"),
    }
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, email, name, is_premium, created_at, premium_activated_at, subscription_type
           FROM users
           WHERE email = $1"#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(user_from_row))
}

pub async fn insert_user(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO users (id, email, name, is_premium, created_at)
           VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(user.name.as_deref())
    .bind(user.is_premium)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Premium activation is an upsert: a payment can arrive for an email the
/// service has never seen (checkout does not require a prior account).
pub async fn upgrade_user_to_premium(
    pool: &PgPool,
    email: &str,
    subscription_type: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO users (id, email, is_premium, created_at, premium_activated_at, subscription_type)
           VALUES ($1, $2, TRUE, now(), now(), $3)
           ON CONFLICT (email) DO UPDATE
           SET is_premium = TRUE,
               premium_activated_at = now(),
               subscription_type = EXCLUDED.subscription_type"#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(subscription_type)
    .execute(pool)
    .await?;

    Ok(())
}

fn transaction_from_row(row: sqlx::postgres::PgRow) -> PaymentTransaction {
    PaymentTransaction {
        id: row.get("id"),
        email: row.get("email"),
        package_id: row.get("package_id"),
        amount: row.get("amount"),
        currency: row.get("currency"),
        session_id: row.get("session_id"),
        payment_status: row.get("payment_status"),
        metadata: row.get("metadata"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub async fn insert_transaction(
    pool: &PgPool,
    tx: &PaymentTransaction,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO payment_transactions
           (id, email, package_id, amount, currency, session_id, payment_status, metadata, created_at, updated_at)
           VALUES ($1, $2, $3, $4::numeric, $5, $6, $7, $8, $9, $10)"#,
    )
    .bind(tx.id)
    .bind(tx.email.as_deref())
    .bind(&tx.package_id)
    .bind(&tx.amount)
    .bind(&tx.currency)
    .bind(&tx.session_id)
    .bind(&tx.payment_status)
    .bind(tx.metadata.as_ref())
    .bind(tx.created_at)
    .bind(tx.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_transaction_by_session(
    pool: &PgPool,
    session_id: &str,
) -> Result<Option<PaymentTransaction>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, email, package_id, amount::text as amount, currency, session_id,
                  payment_status, metadata, created_at, updated_at
           FROM payment_transactions
           WHERE session_id = $1"#,
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(transaction_from_row))
}

pub async fn mark_transaction_completed(
    pool: &PgPool,
    session_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE payment_transactions
           SET payment_status = 'completed', updated_at = now()
           WHERE session_id = $1 AND payment_status <> 'completed'"#,
    )
    .bind(session_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_status_check(pool: &PgPool, check: &StatusCheck) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO status_checks (id, client_name, created_at)
           VALUES ($1, $2, $3)"#,
    )
    .bind(check.id)
    .bind(&check.client_name)
    .bind(check.timestamp)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_status_checks(pool: &PgPool) -> Result<Vec<StatusCheck>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, client_name, created_at
           FROM status_checks
           ORDER BY created_at
           LIMIT 1000"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| StatusCheck {
            id: r.get("id"),
            client_name: r.get("client_name"),
            timestamp: r.get("created_at"),
        })
        .collect())
}
