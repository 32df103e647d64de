use std::env;
use std::sync::{Arc, OnceLock};

use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};

use flysnipe::stripe::MockCheckout;
use flysnipe::{api, AppState};

fn split_db_url(url: &str) -> Result<(String, String), String> {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base.to_string(), Some(query)),
        None => (url.to_string(), None),
    };

    let db_start = base
        .rfind('/')
        .ok_or_else(|| "invalid database url".to_string())?;
    if db_start + 1 >= base.len() {
        return Err("database name is empty".to_string());
    }

    let db_name = base[db_start + 1..].to_string();
    let mut admin_url = format!("{}postgres", &base[..db_start + 1]);
    if let Some(query) = query {
        admin_url = format!("{admin_url}?{query}");
    }

    Ok((admin_url, db_name))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Provision a throwaway database from TEST_DATABASE_URL and run migrations.
/// Returns None when the variable is unset so DB-backed tests can skip
/// instead of failing on machines without Postgres.
pub async fn init_test_db() -> Option<TestDb> {
    dotenvy::dotenv().ok();
    let test_url = match env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set; skipping DB-backed test");
            return None;
        }
    };
    let (admin_url, db_name) = split_db_url(&test_url).expect("invalid TEST_DATABASE_URL format");

    let lock = TEST_DB_LOCK.get_or_init(|| Mutex::new(()));
    let guard = lock.lock().await;

    let admin_pool = PgPool::connect(&admin_url).await.expect("connect admin db");

    let _ = sqlx::query("SELECT pg_advisory_lock(424242)")
        .execute(&admin_pool)
        .await;

    let quoted_name = quote_identifier(&db_name);
    let drop_sql = format!("DROP DATABASE IF EXISTS {quoted_name} WITH (FORCE)");
    let create_sql = format!("CREATE DATABASE {quoted_name}");

    let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
    let create_result = sqlx::query(&create_sql).execute(&admin_pool).await;
    if let Err(e) = create_result {
        eprintln!("create test db error: {e}");
        let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
        sqlx::query(&create_sql)
            .execute(&admin_pool)
            .await
            .expect("create test db retry");
    }

    let _ = sqlx::query("SELECT pg_advisory_unlock(424242)")
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;

    let pool = PgPool::connect(&test_url).await.expect("connect test db");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    Some(TestDb {
        pool,
        _guard: guard,
    })
}

pub fn build_state(pool: PgPool) -> AppState {
    AppState {
        pool,
        checkout: Arc::new(MockCheckout),
    }
}

/// The full /api scope as main mounts it, minus swagger.
pub fn api_scope() -> actix_web::Scope {
    actix_web::web::scope("/api")
        .service(api::flights::root)
        .service(api::flights::search_flights)
        .service(api::auth::google_auth)
        .service(api::auth::check_premium)
        .service(api::payments::create_checkout_session)
        .service(api::payments::get_checkout_status)
        .service(api::payments::verify_session)
        .service(api::webhooks::stripe_webhook)
        .service(api::status::create_status_check)
        .service(api::status::get_status_checks)
}
