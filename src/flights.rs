// src/flights.rs
//
// Mock flight inventory. There is no real airline data behind this: every
// search fabricates a fresh batch of plausible offers. Premium searches get
// a bigger batch from the same fake inventory.

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const AIRLINES: [(&str, &str); 8] = [
    ("AA", "American Airlines"),
    ("DL", "Delta Airlines"),
    ("UA", "United Airlines"),
    ("LH", "Lufthansa"),
    ("BA", "British Airways"),
    ("AF", "Air France"),
    ("KL", "KLM"),
    ("LX", "Swiss International"),
];

pub const AIRCRAFT_TYPES: [&str; 6] = [
    "Boeing 777",
    "Airbus A350",
    "Boeing 787",
    "Airbus A380",
    "Boeing 737",
    "Airbus A320",
];

pub const CABIN_CLASSES: [&str; 4] = ["Economy", "Premium Economy", "Business", "First Class"];

// Weighted toward nonstop: 50% direct, ~33% one stop, ~17% two stops.
const STOP_CHOICES: [u8; 6] = [0, 0, 0, 1, 1, 2];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FlightLeg {
    pub airport: String,
    pub city: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Flight {
    pub id: Uuid,
    pub airline: String,
    pub flight_number: String,
    pub aircraft: String,
    pub departure: FlightLeg,
    pub arrival: FlightLeg,
    pub duration: String,
    pub duration_minutes: i64,
    pub price: i32,
    pub currency: String,
    #[serde(rename = "class")]
    pub class_type: String,
    pub stops: u8,
    pub baggage: Option<String>,
    pub booking_url: Option<String>,
}

/// First three characters of the city name, uppercased. This is a derivation,
/// not an IATA lookup; a one or two letter city yields a shorter code.
pub fn airport_code(city: &str) -> String {
    city.chars().take(3).collect::<String>().to_uppercase()
}

/// Clock shown for arrival: departure time plus duration, computed naively
/// against the departure date. Long flights roll into the next calendar day
/// silently since only HH:MM is surfaced.
pub fn arrival_clock(date: NaiveDate, hour: u32, minute: u32, duration_minutes: i64) -> String {
    let departure = date
        .and_hms_opt(hour, minute, 0)
        .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).expect("midnight is valid"));
    let arrival = departure + Duration::minutes(duration_minutes);
    arrival.format("%H:%M").to_string()
}

/// Fabricate a price-sorted batch of offers for a city pair and date.
///
/// Premium searches draw a count in [8, 15]; free searches always get 3.
/// The sort is stable, so equal-priced offers keep their generation order.
pub fn generate_mock_flights<R: Rng>(
    rng: &mut R,
    from_city: &str,
    to_city: &str,
    departure_date: NaiveDate,
    premium: bool,
) -> Vec<Flight> {
    let from_code = airport_code(from_city);
    let to_code = airport_code(to_city);

    let num_flights = if premium { rng.gen_range(8..=15) } else { 3 };

    let mut flights = Vec::with_capacity(num_flights);
    for _ in 0..num_flights {
        let (airline_code, _airline_name) = AIRLINES.choose(rng).expect("catalog is non-empty");
        let price: i32 = rng.gen_range(300..=2000);
        let departure_hour: u32 = rng.gen_range(6..=22);
        let departure_minute: u32 = rng.gen_range(0..=59);
        let duration_minutes: i64 = rng.gen_range(120..=720);

        flights.push(Flight {
            id: Uuid::new_v4(),
            airline: (*airline_code).to_string(),
            flight_number: format!("{}{}", airline_code, rng.gen_range(100..=9999)),
            aircraft: (*AIRCRAFT_TYPES.choose(rng).expect("catalog is non-empty")).to_string(),
            departure: FlightLeg {
                airport: from_code.clone(),
                city: from_city.to_string(),
                time: format!("{departure_hour:02}:{departure_minute:02}"),
            },
            arrival: FlightLeg {
                airport: to_code.clone(),
                city: to_city.to_string(),
                time: arrival_clock(departure_date, departure_hour, departure_minute, duration_minutes),
            },
            duration: format!("{}h {}m", duration_minutes / 60, duration_minutes % 60),
            duration_minutes,
            price,
            currency: "USD".to_string(),
            class_type: (*CABIN_CLASSES.choose(rng).expect("catalog is non-empty")).to_string(),
            stops: *STOP_CHOICES.choose(rng).expect("catalog is non-empty"),
            baggage: if rng.gen_bool(0.5) {
                Some("1 checked bag included".to_string())
            } else {
                None
            },
            booking_url: Some(format!(
                "https://www.example-airline.com/book/{}",
                Uuid::new_v4()
            )),
        });
    }

    flights.sort_by_key(|f| f.price);
    flights
}
