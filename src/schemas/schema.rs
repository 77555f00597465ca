use schemars::{
    schema::{RootSchema, Schema, SchemaObject},
    schema_for,
};
use serde_json::Value;

use crate::{error::Result, types::itinerary::ItineraryDocument};

const CONTRACT_TITLE: &str = "ItineraryDocument";
const CONTRACT_DESCRIPTION: &str =
    "Three tiered itineraries (balanced, budget, experience) plus generation metadata. \
     Key names are the wire contract shared with persistence and UI consumers.";

/// Full JSON Schema of [`ItineraryDocument`] as derived from the Rust types.
///
/// Stricter than the generation gate in `validation`: this describes what the crate
/// emits, not what it tolerates from a model.
pub fn document_contract() -> Result<Value> {
    let mut root = schema_for!(ItineraryDocument);
    apply_contract_metadata(&mut root);
    Ok(serde_json::to_value(root)?)
}

fn apply_contract_metadata(root: &mut RootSchema) {
    let metadata = root.schema.metadata();
    metadata.title = Some(CONTRACT_TITLE.to_string());
    if metadata.description.is_none() {
        metadata.description = Some(CONTRACT_DESCRIPTION.to_string());
    }

    if let Some(Schema::Object(itineraries)) = root
        .schema
        .object
        .as_mut()
        .and_then(|object| object.properties.get_mut("itineraries"))
    {
        pin_array_length(itineraries, 3);
    }
}

fn pin_array_length(schema: &mut SchemaObject, len: u32) {
    let array = schema.array();
    array.min_items = Some(len);
    array.max_items = Some(len);
}
