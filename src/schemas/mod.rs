pub mod request;
pub mod schema;
pub mod validation;

pub use request::validate_trip_request;
pub use schema::document_contract;
pub use validation::{itinerary_schema, validate_itinerary_document};
