// src/api/auth.rs
//
// Authentication is mocked: every id_token resolves to the same identity.
// A real deployment must verify the token's signature and claims against
// Google before trusting the email.

use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::models::User;
use crate::{db, AppState};

const MOCK_EMAIL: &str = "user@example.com";
const MOCK_NAME: &str = "Mock User";

#[derive(Debug, Deserialize, ToSchema)]
pub struct GoogleAuthRequest {
    pub id_token: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/auth/google",
    tag = "auth",
    request_body = GoogleAuthRequest,
    responses(
        (status = 200, description = "Authenticated"),
        (status = 400, description = "Missing id_token"),
        (status = 500, description = "Server error")
    )
)]
#[post("/auth/google")]
pub async fn google_auth(
    state: web::Data<AppState>,
    payload: web::Json<GoogleAuthRequest>,
) -> impl Responder {
    let token = payload.into_inner().id_token;
    if token.as_deref().unwrap_or("").is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "Missing id_token"}));
    }

    let user = match db::find_user_by_email(&state.pool, MOCK_EMAIL).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            let user = User::new(MOCK_EMAIL.to_string(), Some(MOCK_NAME.to_string()));
            if let Err(e) = db::insert_user(&state.pool, &user).await {
                log::error!("auth user insert error: {e}");
                return HttpResponse::InternalServerError().finish();
            }
            user
        }
        Err(e) => {
            log::error!("auth user lookup error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok().json(json!({
        "email": user.email,
        "name": user.name.as_deref().unwrap_or("User")
    }))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CheckPremiumQuery {
    pub email: String,
}

#[utoipa::path(
    get,
    path = "/api/check-premium",
    tag = "auth",
    params(CheckPremiumQuery),
    responses(
        (status = 200, description = "Premium status"),
        (status = 404, description = "User not found")
    )
)]
#[get("/check-premium")]
pub async fn check_premium(
    state: web::Data<AppState>,
    query: web::Query<CheckPremiumQuery>,
) -> impl Responder {
    match db::find_user_by_email(&state.pool, &query.email).await {
        Ok(Some(user)) => HttpResponse::Ok().json(json!({
            "email": user.email,
            "is_premium": user.is_premium
        })),
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "User not found"})),
        Err(e) => {
            log::error!("check premium lookup error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
