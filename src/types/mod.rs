/// Declares a closed set of string-valued options with a fixed wire spelling.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Comma-separated list of accepted spellings.
            pub fn expected() -> String {
                Self::ALL
                    .iter()
                    .map(|value| value.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($wire => Ok($name::$variant),)+
                    other => Err(format!(
                        "invalid {} `{}`, expected one of: {}",
                        stringify!($name),
                        other,
                        Self::expected()
                    )),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use string_enum;

pub mod itinerary;
pub(crate) mod lenient;
pub mod response;
pub mod result;
pub mod trip_request;

pub use itinerary::{
    Accommodation, AccommodationKind, Activity, ActivityCategory, BookingInfo, Coordinates, Day,
    Itinerary, ItineraryDocument, ItineraryType, Location, Meal, MealKind, Metadata, Money,
    TransportMode, Transportation,
};
pub use response::{decode_candidate, CandidateDocument};
pub use result::{ApiResponse, FallbackReason, GenerationPath, GenerationResult};
pub use trip_request::{
    AccommodationPreference, ActivityLevel, Currency, GroupType, MealPreference,
    TransportationPreference, TripRequest,
};
