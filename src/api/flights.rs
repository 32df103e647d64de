// src/api/flights.rs

use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::flights::{generate_mock_flights, Flight};
use crate::models::SearchRecord;
use crate::{db, AppState};

#[utoipa::path(
    get,
    path = "/api/",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
#[get("/")]
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "FlySnipe API is running",
        "status": "OK"
    }))
}

fn default_passengers() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FlightSearchRequest {
    #[serde(rename = "from")]
    pub from_city: String,
    #[serde(rename = "to")]
    pub to_city: String,
    #[serde(rename = "departureDate")]
    pub departure_date: String,
    #[serde(default = "default_passengers")]
    pub passengers: i32,
    #[serde(default)]
    pub premium: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FlightSearchResponse {
    pub flights: Vec<Flight>,
    pub total_results: usize,
    pub search_params: serde_json::Value,
    pub premium_features_used: bool,
}

#[utoipa::path(
    post,
    path = "/api/flights/search",
    tag = "flights",
    request_body = FlightSearchRequest,
    responses(
        (status = 200, description = "Generated offers", body = FlightSearchResponse),
        (status = 400, description = "Invalid search parameters"),
        (status = 500, description = "Server error")
    )
)]
#[post("/flights/search")]
pub async fn search_flights(
    state: web::Data<AppState>,
    payload: web::Json<FlightSearchRequest>,
) -> impl Responder {
    let request = payload.into_inner();

    if request.from_city.trim().is_empty() || request.to_city.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "error": "from and to cities are required"
        }));
    }

    let departure_date = match NaiveDate::parse_from_str(&request.departure_date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            return HttpResponse::BadRequest().json(json!({
                "error": "departureDate must be YYYY-MM-DD"
            }));
        }
    };

    let flights = generate_mock_flights(
        &mut rand::thread_rng(),
        &request.from_city,
        &request.to_city,
        departure_date,
        request.premium,
    );

    // Search analytics; one append-only record per request.
    let record = SearchRecord {
        id: Uuid::new_v4(),
        from_city: request.from_city.clone(),
        to_city: request.to_city.clone(),
        departure_date: request.departure_date.clone(),
        passengers: request.passengers,
        premium: request.premium,
        results_count: flights.len() as i32,
        created_at: Utc::now(),
    };
    if let Err(e) = db::insert_search_record(&state.pool, &record).await {
        log::error!("flight search insert error: {e}");
        return HttpResponse::InternalServerError().json(json!({
            "error": "Failed to search flights"
        }));
    }

    let total_results = flights.len();
    HttpResponse::Ok().json(FlightSearchResponse {
        flights,
        total_results,
        search_params: json!({
            "from": request.from_city,
            "to": request.to_city,
            "date": request.departure_date,
            "passengers": request.passengers
        }),
        premium_features_used: request.premium,
    })
}
