// src/api/payments.rs

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::checkout::{self, CheckoutError};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub package_id: String,
    pub email: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/create-checkout-session",
    tag = "payments",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Hosted checkout session created"),
        (status = 400, description = "Invalid package ID"),
        (status = 500, description = "Provider or store error")
    )
)]
#[post("/create-checkout-session")]
pub async fn create_checkout_session(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<CheckoutRequest>,
) -> impl Responder {
    let payload = payload.into_inner();

    // Redirect URLs come from the serving origin, same as the webhook
    // callback the provider is configured with.
    let origin = {
        let conn = req.connection_info();
        format!("{}://{}", conn.scheme(), conn.host())
    };

    match checkout::initiate_checkout(
        state.checkout.as_ref(),
        &state.pool,
        &origin,
        &payload.package_id,
        payload.email,
    )
    .await
    {
        Ok(session) => HttpResponse::Ok().json(json!({
            "url": session.url,
            "session_id": session.session_id
        })),
        Err(CheckoutError::InvalidPackage(_)) => {
            HttpResponse::BadRequest().json(json!({"error": "Invalid package ID"}))
        }
        Err(e) => {
            log::error!("checkout session creation error: {e}");
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to create checkout session"
            }))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/payments/checkout/status/{session_id}",
    tag = "payments",
    params(("session_id" = String, Path, description = "Provider session id")),
    responses(
        (status = 200, description = "Provider-reported session status"),
        (status = 500, description = "Provider or store error")
    )
)]
#[get("/payments/checkout/status/{session_id}")]
pub async fn get_checkout_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let session_id = path.into_inner();

    match checkout::reconcile_status(state.checkout.as_ref(), &state.pool, &session_id).await {
        Ok(status) => HttpResponse::Ok().json(json!({
            "status": status.status,
            "payment_status": status.payment_status,
            "amount_total": status.amount_total,
            "currency": status.currency,
            "session_id": session_id
        })),
        Err(e) => {
            log::error!("checkout status error: {e}");
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to get checkout status"
            }))
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifySessionQuery {
    pub session_id: String,
}

#[utoipa::path(
    get,
    path = "/api/verify-session",
    tag = "payments",
    params(VerifySessionQuery),
    responses(
        (status = 200, description = "Session verified"),
        (status = 404, description = "Session not found")
    )
)]
#[get("/verify-session")]
pub async fn verify_session(
    state: web::Data<AppState>,
    query: web::Query<VerifySessionQuery>,
) -> impl Responder {
    match checkout::verify_session_legacy(&state.pool, &query.session_id).await {
        Ok(verification) => HttpResponse::Ok().json(json!({
            "status": verification.status,
            "email": verification.email
        })),
        Err(CheckoutError::SessionNotFound(_)) => {
            HttpResponse::NotFound().json(json!({"error": "Session not found"}))
        }
        Err(e) => {
            log::error!("verify session error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
