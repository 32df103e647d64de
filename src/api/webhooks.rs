// src/api/webhooks.rs

use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

use crate::checkout::{self, CheckoutError};
use crate::stripe::ProviderError;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/webhook/stripe",
    tag = "webhooks",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Event processed or ignored"),
        (status = 400, description = "Missing or invalid signature"),
        (status = 500, description = "Server error")
    )
)]
#[post("/webhook/stripe")]
pub async fn stripe_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    let signature = req
        .headers()
        .get("stripe-signature")
        .and_then(|h| h.to_str().ok());

    match checkout::handle_webhook(state.checkout.as_ref(), &state.pool, &body, signature).await {
        Ok(event) => HttpResponse::Ok().json(json!({
            "status": "success",
            "event_type": event.event_type
        })),
        Err(CheckoutError::MissingSignature) => {
            HttpResponse::BadRequest().json(json!({"error": "Missing Stripe signature"}))
        }
        Err(CheckoutError::Provider(ProviderError::BadSignature(e))) => {
            log::warn!("stripe webhook signature rejected: {e}");
            HttpResponse::BadRequest().json(json!({"error": "Invalid signature"}))
        }
        Err(e) => {
            log::error!("stripe webhook error: {e}");
            HttpResponse::InternalServerError().json(json!({
                "error": "Webhook processing failed"
            }))
        }
    }
}
