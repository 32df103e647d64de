// src/main.rs

use std::env;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenvy::dotenv;
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use flysnipe::stripe::{CheckoutProvider, MockCheckout, StripeCheckout};
use flysnipe::{api, docs, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let checkout: Arc<dyn CheckoutProvider> = match (
        env::var("STRIPE_API_KEY"),
        env::var("STRIPE_WEBHOOK_SECRET"),
    ) {
        (Ok(api_key), Ok(webhook_secret)) => {
            log::info!("using Stripe checkout provider");
            Arc::new(StripeCheckout::new(api_key, webhook_secret))
        }
        _ => {
            log::warn!(
                "STRIPE_API_KEY/STRIPE_WEBHOOK_SECRET not set, using mock checkout provider"
            );
            Arc::new(MockCheckout)
        }
    };

    let state = web::Data::new(AppState { pool, checkout });

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8001);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            .service(
                web::scope("/api")
                    .service(api::flights::root)
                    .service(api::flights::search_flights)
                    .service(api::auth::google_auth)
                    .service(api::auth::check_premium)
                    .service(api::payments::create_checkout_session)
                    .service(api::payments::get_checkout_status)
                    .service(api::payments::verify_session)
                    .service(api::webhooks::stripe_webhook)
                    .service(api::status::create_status_check)
                    .service(api::status::get_status_checks),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
