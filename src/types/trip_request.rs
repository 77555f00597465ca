use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::{error::ValidationErrors, schemas::request::validate_trip_request};

string_enum! {
    /// Currencies a trip budget may be expressed in.
    pub enum Currency {
        Usd => "USD",
        Inr => "INR",
        Eur => "EUR",
        Gbp => "GBP",
    }
}

impl Currency {
    /// Approximate units of this currency per US dollar.
    ///
    /// Static table, no live exchange-rate source.
    pub fn usd_rate(&self) -> f64 {
        match self {
            Currency::Usd => 1.0,
            Currency::Inr => 83.0,
            Currency::Eur => 0.85,
            Currency::Gbp => 0.75,
        }
    }
}

string_enum! {
    pub enum AccommodationPreference {
        Budget => "budget",
        MidRange => "mid-range",
        Luxury => "luxury",
        Any => "any",
    }
}

string_enum! {
    pub enum TransportationPreference {
        Public => "public",
        Private => "private",
        Rental => "rental",
        Mixed => "mixed",
        Any => "any",
    }
}

string_enum! {
    pub enum MealPreference {
        Local => "local",
        International => "international",
        Vegetarian => "vegetarian",
        Vegan => "vegan",
        Any => "any",
    }
}

string_enum! {
    pub enum ActivityLevel {
        Relaxed => "relaxed",
        Moderate => "moderate",
        Active => "active",
        VeryActive => "very-active",
    }
}

string_enum! {
    pub enum GroupType {
        Solo => "solo",
        Couple => "couple",
        Family => "family",
        Friends => "friends",
        Business => "business",
    }
}

/// A validated trip request.
///
/// Only the request validator constructs this type, so every instance satisfies
/// `end_date > start_date`, a positive budget and at least one traveler and theme.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRequest {
    pub(crate) origin: String,
    pub(crate) destination: String,
    pub(crate) start_date: NaiveDate,
    pub(crate) end_date: NaiveDate,
    pub(crate) budget_total: f64,
    pub(crate) currency: Currency,
    pub(crate) num_travelers: u32,
    pub(crate) preferred_themes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) accommodation_type: Option<AccommodationPreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) transportation_preference: Option<TransportationPreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) meal_preference: Option<MealPreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) activity_level: Option<ActivityLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) group_type: Option<GroupType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) special_occasions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) accessibility_needs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) additional_info: Option<String>,
}

impl TripRequest {
    /// Validate an untyped request body.
    pub fn from_value(raw: &Value) -> Result<Self, ValidationErrors> {
        validate_trip_request(raw)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn budget_total(&self) -> f64 {
        self.budget_total
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn num_travelers(&self) -> u32 {
        self.num_travelers
    }

    pub fn preferred_themes(&self) -> &[String] {
        &self.preferred_themes
    }

    pub fn accommodation_type(&self) -> Option<AccommodationPreference> {
        self.accommodation_type
    }

    pub fn transportation_preference(&self) -> Option<TransportationPreference> {
        self.transportation_preference
    }

    pub fn meal_preference(&self) -> Option<MealPreference> {
        self.meal_preference
    }

    pub fn activity_level(&self) -> Option<ActivityLevel> {
        self.activity_level
    }

    pub fn group_type(&self) -> Option<GroupType> {
        self.group_type
    }

    pub fn special_occasions(&self) -> Option<&str> {
        self.special_occasions.as_deref()
    }

    pub fn accessibility_needs(&self) -> Option<&str> {
        self.accessibility_needs.as_deref()
    }

    pub fn additional_info(&self) -> Option<&str> {
        self.additional_info.as_deref()
    }

    /// Whole days between the two dates, never less than one.
    pub fn duration_days(&self) -> u32 {
        let days = (self.end_date - self.start_date).num_days().unsigned_abs();
        u32::try_from(days).unwrap_or(u32::MAX).max(1)
    }
}

impl TryFrom<&Value> for TripRequest {
    type Error = ValidationErrors;

    fn try_from(raw: &Value) -> Result<Self, Self::Error> {
        Self::from_value(raw)
    }
}
