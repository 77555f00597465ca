//! Validation and normalization of raw trip requests.
//!
//! Field shapes are checked by a Draft 7 schema; calendar validity and date
//! ordering are checked by hand. A non-object body fails immediately, otherwise
//! every problem is returned together.

use std::{str::FromStr, sync::OnceLock};

use chrono::NaiveDate;
use jsonschema::{
    error::{ValidationError, ValidationErrorKind},
    JSONSchema,
};
use serde_json::{json, Map, Value};

use crate::{
    error::{FieldError, ValidationErrors},
    schemas::validation::{compiled, violations},
    types::trip_request::{
        AccommodationPreference, ActivityLevel, Currency, GroupType, MealPreference,
        TransportationPreference, TripRequest,
    },
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_REQUEST_ERRORS: usize = 20;

/// Longest trip a request may ask for, in days between start and end.
pub const MAX_TRIP_DAYS: i64 = 365;

fn spellings(values: impl Iterator<Item = &'static str>) -> Vec<Value> {
    values.map(Value::from).collect()
}

/// Accepted spellings plus `null`, which means "no preference".
fn optional_choice(values: impl Iterator<Item = &'static str>) -> Value {
    let mut choices = spellings(values);
    choices.push(Value::Null);
    json!({ "enum": choices })
}

/// Shape contract for an incoming trip request.
pub fn request_schema() -> &'static Value {
    static SCHEMA: OnceLock<Value> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "TripRequest",
            "type": "object",
            "required": [
                "origin", "destination", "start_date", "end_date",
                "budget_total", "currency", "num_travelers", "preferred_themes"
            ],
            "properties": {
                "origin": { "$ref": "#/definitions/text" },
                "destination": { "$ref": "#/definitions/text" },
                "start_date": { "$ref": "#/definitions/date" },
                "end_date": { "$ref": "#/definitions/date" },
                "budget_total": { "type": "number", "exclusiveMinimum": 0 },
                "currency": { "enum": spellings(Currency::ALL.iter().map(Currency::as_str)) },
                "num_travelers": { "type": "integer", "minimum": 1, "maximum": u32::MAX },
                "preferred_themes": {
                    "type": "array",
                    "minItems": 1,
                    "items": { "$ref": "#/definitions/text" }
                },
                "accommodation_type": optional_choice(
                    AccommodationPreference::ALL.iter().map(AccommodationPreference::as_str)
                ),
                "transportation_preference": optional_choice(
                    TransportationPreference::ALL.iter().map(TransportationPreference::as_str)
                ),
                "meal_preference": optional_choice(
                    MealPreference::ALL.iter().map(MealPreference::as_str)
                ),
                "activity_level": optional_choice(
                    ActivityLevel::ALL.iter().map(ActivityLevel::as_str)
                ),
                "group_type": optional_choice(GroupType::ALL.iter().map(GroupType::as_str)),
                "special_occasions": { "type": ["string", "null"] },
                "accessibility_needs": { "type": ["string", "null"] },
                "additional_info": { "type": ["string", "null"] }
            },
            "definitions": {
                "text": { "type": "string", "pattern": "\\S" },
                "date": { "type": "string", "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2}$" }
            }
        })
    })
}

/// Validate an untyped request record into a [`TripRequest`].
pub fn validate_trip_request(raw: &Value) -> Result<TripRequest, ValidationErrors> {
    let Some(object) = raw.as_object() else {
        return Err(ValidationErrors::single(
            "",
            "Trip request must be a JSON object",
        ));
    };

    static VALIDATOR: OnceLock<Result<JSONSchema, String>> = OnceLock::new();
    let validator = compiled(&VALIDATOR, request_schema()).map_err(|err| {
        ValidationErrors::single("", format!("Failed to prepare request schema: {err}"))
    })?;

    let mut errors: Vec<FieldError> = Vec::new();
    for error in violations(validator, raw, MAX_REQUEST_ERRORS, describe) {
        if !errors.iter().any(|seen| seen.path == error.path) {
            errors.push(error);
        }
    }

    let start_date = calendar_date(object, "start_date", &mut errors);
    let end_date = calendar_date(object, "end_date", &mut errors);
    if let (Some(start), Some(end)) = (start_date, end_date) {
        let days = (end - start).num_days();
        if days <= 0 {
            errors.push(FieldError::new("end_date", "End date must be after start date"));
        } else if days > MAX_TRIP_DAYS {
            errors.push(FieldError::new(
                "end_date",
                format!("Trip must not be longer than {MAX_TRIP_DAYS} days"),
            ));
        }
    }

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    start_date
        .zip(end_date)
        .and_then(|(start_date, end_date)| normalize(object, start_date, end_date))
        .ok_or_else(|| ValidationErrors::single("", "Validation failed"))
}

/// User-facing message for one schema violation at a top-level field.
fn describe(path: &str, error: &ValidationError<'_>) -> String {
    let absent =
        matches!(error.kind, ValidationErrorKind::Required { .. }) || error.instance.is_null();
    if !absent && matches!(error.kind, ValidationErrorKind::Type { .. }) {
        return error.to_string();
    }

    let message = match path {
        "origin" => "Origin is required",
        "destination" => "Destination is required",
        "start_date" | "end_date" if absent => "Date is required",
        "start_date" | "end_date" => "Invalid date format. Use YYYY-MM-DD",
        "budget_total" if absent => "Budget is required",
        "budget_total" => "Budget must be greater than 0",
        "currency" if absent => "Currency is required",
        "currency" => "Invalid currency",
        "num_travelers" if absent => "Number of travelers is required",
        "num_travelers" if matches!(error.kind, ValidationErrorKind::Maximum { .. }) => {
            "Number of travelers is too large"
        }
        "num_travelers" => "Number of travelers must be at least 1",
        "preferred_themes" => "At least one preferred theme is required",
        _ if path.starts_with("preferred_themes.") => "Theme must not be empty",
        _ => return error.to_string(),
    };
    message.to_string()
}

/// A shape-valid date field that must also name a real day.
fn calendar_date(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<NaiveDate> {
    if errors.iter().any(|error| error.path == field) {
        return None;
    }
    let text = object.get(field)?.as_str()?;
    let date = NaiveDate::parse_from_str(text, DATE_FORMAT).ok();
    if date.is_none() {
        errors.push(FieldError::new(field, "Invalid date format. Use YYYY-MM-DD"));
    }
    date
}

/// Build the typed request from a record that already passed every rule.
fn normalize(
    object: &Map<String, Value>,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Option<TripRequest> {
    let preferred_themes = object
        .get("preferred_themes")?
        .as_array()?
        .iter()
        .map(|theme| theme.as_str().map(|theme| theme.trim().to_string()))
        .collect::<Option<Vec<_>>>()?;

    Some(TripRequest {
        origin: text(object, "origin")?,
        destination: text(object, "destination")?,
        start_date,
        end_date,
        budget_total: object.get("budget_total")?.as_f64()?,
        currency: choice(object, "currency")?,
        num_travelers: travelers(object.get("num_travelers")?)?,
        preferred_themes,
        accommodation_type: choice(object, "accommodation_type"),
        transportation_preference: choice(object, "transportation_preference"),
        meal_preference: choice(object, "meal_preference"),
        activity_level: choice(object, "activity_level"),
        group_type: choice(object, "group_type"),
        special_occasions: text(object, "special_occasions"),
        accessibility_needs: text(object, "accessibility_needs"),
        additional_info: text(object, "additional_info"),
    })
}

/// Trimmed, with blank treated as absent.
fn text(object: &Map<String, Value>, field: &str) -> Option<String> {
    let text = object.get(field)?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn choice<T: FromStr>(object: &Map<String, Value>, field: &str) -> Option<T> {
    object.get(field)?.as_str()?.parse().ok()
}

/// `2` and `2.0` are both two travelers.
fn travelers(value: &Value) -> Option<u32> {
    let count = value
        .as_u64()
        .or_else(|| value.as_f64().map(|count| count as u64))?;
    u32::try_from(count).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_request() -> Value {
        json!({
            "origin": "New York, USA",
            "destination": "Paris, France",
            "start_date": "2025-10-05",
            "end_date": "2025-10-08",
            "budget_total": 2000,
            "currency": "USD",
            "preferred_themes": ["culture", "food"],
            "num_travelers": 2
        })
    }

    #[test]
    fn test_valid_request() {
        let request = validate_trip_request(&valid_request()).unwrap();
        assert_eq!(request.origin(), "New York, USA");
        assert_eq!(request.currency(), Currency::Usd);
        assert_eq!(request.num_travelers(), 2);
        assert_eq!(request.preferred_themes(), ["culture", "food"]);
        assert_eq!(request.duration_days(), 3);
    }

    #[test]
    fn test_collects_all_field_errors() {
        let mut raw = valid_request();
        raw["origin"] = json!("");
        raw["budget_total"] = json!(-100);

        let errors = validate_trip_request(&raw).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_path("origin"));
        assert!(errors.contains_path("budget_total"));
    }

    #[test]
    fn test_missing_destination() {
        let mut raw = valid_request();
        raw.as_object_mut().unwrap().remove("destination");

        let errors = validate_trip_request(&raw).unwrap_err();
        assert!(errors.contains_path("destination"));
    }

    #[test]
    fn test_non_object_fails_fast() {
        let errors = validate_trip_request(&json!(["not", "a", "request"])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_path(""));
    }

    #[test]
    fn test_date_rules() {
        let mut raw = valid_request();
        raw["start_date"] = json!("10/05/2025");
        raw["end_date"] = json!("2025-02-30");
        let errors = validate_trip_request(&raw).unwrap_err();
        assert!(errors.contains_path("start_date"));
        assert!(errors.contains_path("end_date"));

        let mut raw = valid_request();
        raw["end_date"] = json!("2025-10-05");
        let errors = validate_trip_request(&raw).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.0[0].message, "End date must be after start date");
    }

    #[test]
    fn test_currency_travelers_and_themes() {
        let mut raw = valid_request();
        raw["currency"] = json!("JPY");
        raw["num_travelers"] = json!(0);
        raw["preferred_themes"] = json!(["culture", 7]);

        let errors = validate_trip_request(&raw).unwrap_err();
        assert!(errors.contains_path("currency"));
        assert!(errors.contains_path("num_travelers"));
        assert!(errors.contains_path("preferred_themes.1"));

        let mut raw = valid_request();
        raw["preferred_themes"] = json!([]);
        raw["num_travelers"] = json!(1.5);
        let errors = validate_trip_request(&raw).unwrap_err();
        assert!(errors.contains_path("preferred_themes"));
        assert!(errors.contains_path("num_travelers"));
    }

    #[test]
    fn test_optional_preferences() {
        let mut raw = valid_request();
        raw["accommodation_type"] = json!("mid-range");
        raw["activity_level"] = json!("very-active");
        raw["group_type"] = Value::Null;
        raw["additional_info"] = json!("  Vegetarian-friendly restaurants please ");

        let request = validate_trip_request(&raw).unwrap();
        assert_eq!(
            request.accommodation_type(),
            Some(AccommodationPreference::MidRange)
        );
        assert_eq!(request.activity_level(), Some(ActivityLevel::VeryActive));
        assert_eq!(request.group_type(), None);
        assert_eq!(
            request.additional_info(),
            Some("Vegetarian-friendly restaurants please")
        );

        raw["meal_preference"] = json!("carnivore");
        let errors = validate_trip_request(&raw).unwrap_err();
        assert!(errors.contains_path("meal_preference"));
    }

    #[test]
    fn test_trip_length_is_capped() {
        let mut raw = valid_request();
        raw["start_date"] = json!("2025-01-01");
        raw["end_date"] = json!("2025-12-31");
        assert_eq!(validate_trip_request(&raw).unwrap().duration_days(), 364);

        raw["end_date"] = json!("2026-01-01");
        assert_eq!(validate_trip_request(&raw).unwrap().duration_days(), 365);

        raw["start_date"] = json!("0001-01-01");
        raw["end_date"] = json!("9999-12-31");
        let errors = validate_trip_request(&raw).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_path("end_date"));
    }

    #[test]
    fn test_messages_for_missing_and_mistyped_fields() {
        let mut raw = valid_request();
        raw.as_object_mut().unwrap().remove("start_date");
        raw["origin"] = json!(42);
        raw["num_travelers"] = json!(2.0);
        raw["group_type"] = json!("crowd");

        let errors = validate_trip_request(&raw).unwrap_err();
        let message = |path: &str| {
            errors
                .iter()
                .find(|error| error.path == path)
                .map(|error| error.message.clone())
                .unwrap_or_default()
        };
        assert_eq!(message("start_date"), "Date is required");
        assert!(message("origin").contains("string"));
        assert!(message("group_type").contains("crowd"));
        assert!(!errors.contains_path("num_travelers"));
        assert!(!errors.contains_path("end_date"));
    }

    #[test]
    fn test_request_schema_is_draft7() {
        let schema = request_schema();
        assert_eq!(schema["$schema"], "http://json-schema.org/draft-07/schema#");
        assert_eq!(schema["required"].as_array().map(Vec::len), Some(8));
        assert_eq!(schema["properties"]["currency"]["enum"], json!(["USD", "INR", "EUR", "GBP"]));
    }
}
