use std::{collections::HashSet, sync::OnceLock};

use jsonschema::{
    error::{ValidationError, ValidationErrorKind},
    Draft, JSONSchema,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{FieldError, ValidationErrors};

const MAX_SCHEMA_ERRORS: usize = 10;

/// Structural contract for a generated itinerary document.
///
/// Deliberately loose below the day level: nested entries only need their Money
/// shapes to be right, so a missing `duration` on one activity is not a failure.
pub fn itinerary_schema() -> &'static Value {
    static SCHEMA: OnceLock<Value> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "title": "ItineraryDocument",
            "type": "object",
            "required": ["itineraries", "metadata"],
            "properties": {
                "itineraries": {
                    "type": "array",
                    "minItems": 3,
                    "maxItems": 3,
                    "items": { "$ref": "#/definitions/itinerary" }
                },
                "metadata": { "$ref": "#/definitions/metadata" }
            },
            "definitions": {
                "money": {
                    "type": "object",
                    "required": ["amount", "currency"],
                    "properties": {
                        "amount": { "type": "number", "minimum": 0 },
                        "currency": { "type": "string" }
                    }
                },
                "optional_money": {
                    "type": "object",
                    "properties": {
                        "amount": { "type": "number", "minimum": 0 },
                        "currency": { "type": "string" }
                    },
                    "required": ["amount"]
                },
                "costed": {
                    "type": "object",
                    "properties": {
                        "cost": { "$ref": "#/definitions/optional_money" }
                    }
                },
                "day": {
                    "type": "object",
                    "required": ["day"],
                    "properties": {
                        "day": { "type": "integer", "minimum": 1 },
                        "date": { "type": "string", "format": "date" },
                        "activities": {
                            "type": "array",
                            "items": { "$ref": "#/definitions/costed" }
                        },
                        "accommodation": { "$ref": "#/definitions/costed" },
                        "meals": {
                            "type": "array",
                            "items": { "$ref": "#/definitions/costed" }
                        },
                        "transportation": { "$ref": "#/definitions/costed" },
                        "daily_cost": { "$ref": "#/definitions/optional_money" }
                    }
                },
                "itinerary": {
                    "type": "object",
                    "required": [
                        "id", "type", "title", "description", "total_cost",
                        "days", "highlights", "best_for"
                    ],
                    "properties": {
                        "id": { "type": "string", "minLength": 1 },
                        "type": { "enum": ["balanced", "budget", "experience"] },
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "total_cost": { "$ref": "#/definitions/money" },
                        "days": {
                            "type": "array",
                            "items": { "$ref": "#/definitions/day" }
                        },
                        "highlights": { "type": "array", "items": { "type": "string" } },
                        "best_for": { "type": "array", "items": { "type": "string" } }
                    }
                },
                "metadata": {
                    "type": "object",
                    "required": ["generated_at", "confidence_score", "request_id"],
                    "properties": {
                        "generated_at": { "type": "string" },
                        "confidence_score": { "type": "number", "minimum": 0, "maximum": 1 },
                        "request_id": { "type": "string" },
                        "model_version": { "type": "string" }
                    }
                }
            }
        })
    })
}

/// Check a candidate document against the structural contract.
///
/// Type-level only: budget compliance and cost arithmetic are not re-checked.
pub fn validate_itinerary_document(candidate: &Value) -> Result<(), ValidationErrors> {
    static VALIDATOR: OnceLock<Result<JSONSchema, String>> = OnceLock::new();
    let validator = compiled(&VALIDATOR, itinerary_schema()).map_err(|err| {
        ValidationErrors::single("", format!("Failed to prepare itinerary schema: {err}"))
    })?;

    let mut details = violations(validator, candidate, MAX_SCHEMA_ERRORS, |_, error| {
        error.to_string()
    });

    if details.is_empty() {
        details.extend(duplicate_tiers(candidate));
    }

    if details.is_empty() {
        return Ok(());
    }

    debug!(
        target: "itinerary::schema",
        violations = details.len(),
        first = %details[0],
        "candidate document failed structural validation"
    );
    Err(ValidationErrors(details))
}

/// Compile a Draft 7 schema the first time it is needed and keep it for the process.
pub(crate) fn compiled(
    cell: &'static OnceLock<Result<JSONSchema, String>>,
    schema: &'static Value,
) -> Result<&'static JSONSchema, &'static str> {
    cell.get_or_init(|| {
        JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|err| err.to_string())
    })
    .as_ref()
    .map_err(String::as_str)
}

/// Up to `limit` violations, each at the dot path of the offending value and
/// worded by `describe`.
///
/// A missing property is reported at its own path rather than at its parent.
pub(crate) fn violations<F>(
    validator: &JSONSchema,
    instance: &Value,
    limit: usize,
    describe: F,
) -> Vec<FieldError>
where
    F: Fn(&str, &ValidationError<'_>) -> String,
{
    let Err(errors) = validator.validate(instance) else {
        return Vec::new();
    };

    errors
        .take(limit)
        .map(|error| {
            let mut path = pointer_to_path(&error.instance_path.to_string());
            if let ValidationErrorKind::Required { property } = &error.kind {
                let property = property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string());
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(&property);
            }
            let message = describe(&path, &error);
            FieldError::new(path, message)
        })
        .collect()
}

/// The three itineraries must be three different tiers.
fn duplicate_tiers(candidate: &Value) -> Option<FieldError> {
    let itineraries = candidate.get("itineraries")?.as_array()?;
    let mut seen = HashSet::new();
    itineraries.iter().enumerate().find_map(|(idx, itinerary)| {
        let kind = itinerary.get("type")?.as_str()?;
        (!seen.insert(kind)).then(|| {
            FieldError::new(
                format!("itineraries.{idx}.type"),
                format!("duplicate itinerary type `{kind}`"),
            )
        })
    })
}

/// `/itineraries/0/total_cost` becomes `itineraries.0.total_cost`.
pub(crate) fn pointer_to_path(pointer: &str) -> String {
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}
