use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::flights::root,
        crate::api::flights::search_flights,
        crate::api::auth::google_auth,
        crate::api::auth::check_premium,
        crate::api::payments::create_checkout_session,
        crate::api::payments::get_checkout_status,
        crate::api::payments::verify_session,
        crate::api::webhooks::stripe_webhook,
        crate::api::status::create_status_check,
        crate::api::status::get_status_checks
    ),
    components(
        schemas(
            crate::api::flights::FlightSearchRequest,
            crate::api::flights::FlightSearchResponse,
            crate::flights::Flight,
            crate::flights::FlightLeg,
            crate::api::auth::GoogleAuthRequest,
            crate::api::payments::CheckoutRequest,
            crate::api::status::StatusCheckCreate,
            crate::models::StatusCheck
        )
    ),
    tags(
        (name = "flights", description = "Mock flight search"),
        (name = "auth", description = "Mock authentication and premium status"),
        (name = "payments", description = "Premium checkout sessions"),
        (name = "webhooks", description = "Payment provider callbacks"),
        (name = "status", description = "Diagnostic status checks")
    )
)]
pub struct ApiDoc;
