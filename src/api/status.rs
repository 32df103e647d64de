// src/api/status.rs
//
// Diagnostic heartbeat records; unrelated to the flight/payment domain.

use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::StatusCheck;
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

#[utoipa::path(
    post,
    path = "/api/status",
    tag = "status",
    request_body = StatusCheckCreate,
    responses(
        (status = 200, description = "Status check recorded", body = StatusCheck),
        (status = 500, description = "Server error")
    )
)]
#[post("/status")]
pub async fn create_status_check(
    state: web::Data<AppState>,
    payload: web::Json<StatusCheckCreate>,
) -> impl Responder {
    let check = StatusCheck {
        id: Uuid::new_v4(),
        client_name: payload.into_inner().client_name,
        timestamp: Utc::now(),
    };

    match db::insert_status_check(&state.pool, &check).await {
        Ok(()) => HttpResponse::Ok().json(check),
        Err(e) => {
            log::error!("status check insert error: {e}");
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to record status check"
            }))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/status",
    tag = "status",
    responses(
        (status = 200, description = "Recorded status checks", body = [StatusCheck]),
        (status = 500, description = "Server error")
    )
)]
#[get("/status")]
pub async fn get_status_checks(state: web::Data<AppState>) -> impl Responder {
    match db::list_status_checks(&state.pool).await {
        Ok(checks) => HttpResponse::Ok().json(checks),
        Err(e) => {
            log::error!("status check list error: {e}");
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to list status checks"
            }))
        }
    }
}
