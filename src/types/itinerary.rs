use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{lenient, trip_request::Currency};

string_enum! {
    /// The three variants every document carries.
    pub enum ItineraryType {
        Balanced => "balanced",
        Budget => "budget",
        Experience => "experience",
    }
}

string_enum! {
    pub enum ActivityCategory {
        Sightseeing => "sightseeing",
        Adventure => "adventure",
        Cultural => "cultural",
        Food => "food",
        Shopping => "shopping",
        Relaxation => "relaxation",
        Transport => "transport",
        #[serde(other)]
        Other => "other",
    }
}

impl ActivityCategory {
    /// Map a free-form theme tag onto the closest category.
    pub fn from_theme(theme: &str) -> Self {
        match theme.trim().to_lowercase().as_str() {
            "culture" | "cultural" | "history" | "art" | "museums" | "heritage" => {
                ActivityCategory::Cultural
            }
            "food" | "cuisine" | "culinary" | "foodie" => ActivityCategory::Food,
            "adventure" | "hiking" | "outdoors" | "trekking" => ActivityCategory::Adventure,
            "shopping" | "markets" => ActivityCategory::Shopping,
            "relaxation" | "beach" | "wellness" | "spa" => ActivityCategory::Relaxation,
            "nature" | "sightseeing" | "landmarks" | "photography" => {
                ActivityCategory::Sightseeing
            }
            _ => ActivityCategory::Cultural,
        }
    }
}

impl Default for ActivityCategory {
    fn default() -> Self {
        ActivityCategory::Other
    }
}

string_enum! {
    pub enum AccommodationKind {
        Hotel => "hotel",
        Hostel => "hostel",
        Resort => "resort",
        Guesthouse => "guesthouse",
        Apartment => "apartment",
        #[serde(other)]
        Other => "other",
    }
}

impl Default for AccommodationKind {
    fn default() -> Self {
        AccommodationKind::Other
    }
}

string_enum! {
    pub enum MealKind {
        Breakfast => "breakfast",
        Lunch => "lunch",
        Dinner => "dinner",
        Snack => "snack",
        #[serde(other)]
        Other => "other",
    }
}

impl Default for MealKind {
    fn default() -> Self {
        MealKind::Other
    }
}

string_enum! {
    pub enum TransportMode {
        Flight => "flight",
        Train => "train",
        Bus => "bus",
        Taxi => "taxi",
        RentalCar => "rental_car",
        Walking => "walking",
        #[serde(other)]
        Other => "other",
    }
}

impl Default for TransportMode {
    fn default() -> Self {
        TransportMode::Other
    }
}

/// Amount plus currency code; every cost field in a document uses this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Money {
    pub amount: f64,
    #[serde(default)]
    pub currency: String,
}

impl Money {
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount,
            currency: currency.as_str().to_string(),
        }
    }

    fn fill_currency(&mut self, currency: Currency) {
        if self.currency.trim().is_empty() {
            self.currency = currency.as_str().to_string();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub lat: f64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BookingInfo {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub bookable: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub provider: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub booking_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Activity {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::or_default")]
    pub category: ActivityCategory,
    /// Human readable, e.g. "3 hours"
    #[serde(default, deserialize_with = "lenient::text")]
    pub duration: String,
    #[serde(default)]
    pub cost: Money,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub location: Location,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub booking_info: BookingInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Accommodation {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::or_default")]
    pub kind: AccommodationKind,
    #[serde(default)]
    pub cost: Money,
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub location: Option<Location>,
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub booking_info: Option<BookingInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Meal {
    #[serde(rename = "type", default, deserialize_with = "lenient::or_default")]
    pub kind: MealKind,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default)]
    pub cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transportation {
    #[serde(rename = "type", default, deserialize_with = "lenient::or_default")]
    pub mode: TransportMode,
    #[serde(default)]
    pub cost: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Day {
    /// 1-based position within the trip
    #[serde(deserialize_with = "lenient::day_number")]
    pub day: u32,
    /// Dropped when the model writes something that is not a calendar date
    #[serde(
        default,
        deserialize_with = "lenient::or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation: Option<Accommodation>,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transportation: Option<Transportation>,
    #[serde(default)]
    pub daily_cost: Money,
}

impl Day {
    fn fill_currency(&mut self, currency: Currency) {
        for activity in &mut self.activities {
            activity.cost.fill_currency(currency);
        }
        if let Some(accommodation) = self.accommodation.as_mut() {
            accommodation.cost.fill_currency(currency);
        }
        for meal in &mut self.meals {
            meal.cost.fill_currency(currency);
        }
        if let Some(transportation) = self.transportation.as_mut() {
            transportation.cost.fill_currency(currency);
        }
        self.daily_cost.fill_currency(currency);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Itinerary {
    /// Unique id prefixed by the itinerary type
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItineraryType,
    pub title: String,
    pub description: String,
    pub total_cost: Money,
    pub days: Vec<Day>,
    pub highlights: Vec<String>,
    pub best_for: Vec<String>,
}

impl Itinerary {
    /// Sum of every day's `daily_cost`. Same order as `total_cost`, not equal to it.
    pub fn daily_cost_sum(&self) -> f64 {
        self.days.iter().map(|day| day.daily_cost.amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Metadata {
    pub generated_at: DateTime<Utc>,
    /// Trust signal in [0, 1]; lower for synthesized documents
    pub confidence_score: f64,
    pub request_id: String,
    /// Real model name, or `mock-generator-v1` for synthesized documents
    pub model_version: String,
}

/// Three tiered itineraries plus generation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItineraryDocument {
    pub itineraries: Vec<Itinerary>,
    pub metadata: Metadata,
}

impl ItineraryDocument {
    pub fn itinerary(&self, kind: ItineraryType) -> Option<&Itinerary> {
        self.itineraries
            .iter()
            .find(|itinerary| itinerary.kind == kind)
    }

    /// Give every blank Money currency the request currency.
    pub fn fill_missing_currency(&mut self, currency: Currency) {
        for itinerary in &mut self.itineraries {
            itinerary.total_cost.fill_currency(currency);
            for day in &mut itinerary.days {
                day.fill_currency(currency);
            }
        }
    }

    /// Every currency code used anywhere in the document.
    pub fn currencies(&self) -> Vec<&str> {
        let mut codes = Vec::new();
        for itinerary in &self.itineraries {
            codes.push(itinerary.total_cost.currency.as_str());
            for day in &itinerary.days {
                codes.extend(day.activities.iter().map(|a| a.cost.currency.as_str()));
                codes.extend(day.accommodation.iter().map(|a| a.cost.currency.as_str()));
                codes.extend(day.meals.iter().map(|m| m.cost.currency.as_str()));
                codes.extend(day.transportation.iter().map(|t| t.cost.currency.as_str()));
                codes.push(day.daily_cost.currency.as_str());
            }
        }
        codes.sort_unstable();
        codes.dedup();
        codes
    }
}
