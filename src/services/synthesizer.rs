//! Deterministic, budget-aware itinerary synthesis.
//!
//! Used whenever the model path is unavailable. Only ids and coordinates are random;
//! every amount is a floored share of the request budget, so each tier's
//! `total_cost` stays within `budget_total` by construction.

use chrono::{Days, Utc};
use tracing::debug;

use crate::{
    services::entropy::Entropy,
    types::{
        itinerary::{
            Accommodation, AccommodationKind, Activity, ActivityCategory, BookingInfo,
            Coordinates, Day, Itinerary, ItineraryDocument, ItineraryType, Location, Meal,
            MealKind, Metadata, Money, TransportMode, Transportation,
        },
        TripRequest,
    },
};

pub const MOCK_MODEL_VERSION: &str = "mock-generator-v1";
pub const MOCK_CONFIDENCE: f64 = 0.75;

const BOOKING_PROVIDER: &str = "EaseMyTrip";
const BOOKING_BASE_URL: &str = "https://easemytrip.com";
const BASE_POINT: Coordinates = Coordinates {
    lat: 40.7128,
    lng: -74.006,
};
const ACTIVITY_SPREAD: f64 = 0.1;
const ACCOMMODATION_SPREAD: f64 = 0.05;

const RESERVE_PERCENT: u32 = 20;
const BREAKFAST_PERCENT: u32 = 5;
const LUNCH_PERCENT: u32 = 8;
const TRANSPORT_PERCENT: u32 = 5;
const SIGHTSEEING_PERCENT: u32 = 60;
const THEMED_PERCENT: u32 = 40;

/// Cost shape and labels for one tier.
#[derive(Debug, Clone, Copy)]
struct TierProfile {
    kind: ItineraryType,
    total_percent: u32,
    accommodation_percent: u32,
    dinner_percent: u32,
    accommodation_kind: AccommodationKind,
    accommodation_label: &'static str,
    dinner_name: &'static str,
    transport: TransportMode,
}

impl TierProfile {
    fn for_kind(kind: ItineraryType) -> Self {
        match kind {
            ItineraryType::Experience => Self {
                kind,
                total_percent: 100,
                accommodation_percent: 40,
                dinner_percent: 15,
                accommodation_kind: AccommodationKind::Resort,
                accommodation_label: "Luxury Hotel",
                dinner_name: "Fine Dining Restaurant",
                transport: TransportMode::Taxi,
            },
            ItineraryType::Balanced => Self {
                kind,
                total_percent: 90,
                accommodation_percent: 35,
                dinner_percent: 7,
                accommodation_kind: AccommodationKind::Hotel,
                accommodation_label: "Comfort Hotel",
                dinner_name: "Local Eatery",
                transport: TransportMode::Train,
            },
            ItineraryType::Budget => Self {
                kind,
                total_percent: 70,
                accommodation_percent: 30,
                dinner_percent: 7,
                accommodation_kind: AccommodationKind::Hostel,
                accommodation_label: "Budget Inn",
                dinner_name: "Local Eatery",
                transport: TransportMode::Bus,
            },
        }
    }

    fn title(&self, destination: &str) -> String {
        match self.kind {
            ItineraryType::Balanced => format!("Balanced {destination} Adventure"),
            ItineraryType::Budget => format!("Budget-Friendly {destination} Explorer"),
            ItineraryType::Experience => format!("Premium {destination} Experience"),
        }
    }

    fn description(&self, destination: &str) -> String {
        match self.kind {
            ItineraryType::Balanced => format!(
                "A perfect mix of must-see attractions and local experiences in {destination}"
            ),
            ItineraryType::Budget => {
                format!("Maximum value with smart savings and local gems in {destination}")
            }
            ItineraryType::Experience => {
                format!("Luxury experiences and exclusive access in {destination}")
            }
        }
    }

    fn highlights(&self, destination: &str) -> Vec<String> {
        match self.kind {
            ItineraryType::Balanced => vec![
                format!("Explore the iconic landmarks of {destination}"),
                "Experience authentic local cuisine".to_string(),
                "Visit hidden gems recommended by locals".to_string(),
                "Perfect balance of culture and relaxation".to_string(),
            ],
            ItineraryType::Budget => strings(&[
                "Affordable local transportation options",
                "Budget-friendly accommodations with great reviews",
                "Free walking tours and public attractions",
                "Local street food and markets",
            ]),
            ItineraryType::Experience => strings(&[
                "Luxury accommodations with premium amenities",
                "Private guided tours and exclusive access",
                "Fine dining at renowned restaurants",
                "Premium transportation and comfort",
            ]),
        }
    }

    fn best_for(&self) -> Vec<String> {
        match self.kind {
            ItineraryType::Balanced => {
                strings(&["First-time visitors", "Culture enthusiasts", "Balanced travelers"])
            }
            ItineraryType::Budget => strings(&["Budget travelers", "Backpackers", "Students"]),
            ItineraryType::Experience => {
                strings(&["Luxury travelers", "Special occasions", "Comfort seekers"])
            }
        }
    }
}

/// Tier order in synthesized documents.
const TIER_ORDER: [ItineraryType; 3] = [
    ItineraryType::Balanced,
    ItineraryType::Budget,
    ItineraryType::Experience,
];

/// Build a complete three-tier document without any model call. Never fails.
///
/// One day per trip day for each tier; request validation caps trips at
/// [`MAX_TRIP_DAYS`](crate::schemas::request::MAX_TRIP_DAYS).
pub fn synthesize(request: &TripRequest, entropy: &dyn Entropy) -> ItineraryDocument {
    let duration = request.duration_days();
    let daily_budget = (request.budget_total() / f64::from(duration)).floor();

    debug!(
        target: "itinerary::synthesizer",
        destination = request.destination(),
        duration,
        daily_budget,
        "synthesizing fallback itineraries"
    );

    let itineraries = TIER_ORDER
        .iter()
        .map(|kind| synthesize_tier(request, TierProfile::for_kind(*kind), daily_budget, entropy))
        .collect();

    ItineraryDocument {
        itineraries,
        metadata: Metadata {
            generated_at: Utc::now(),
            confidence_score: MOCK_CONFIDENCE,
            request_id: entropy.token(),
            model_version: MOCK_MODEL_VERSION.to_string(),
        },
    }
}

fn synthesize_tier(
    request: &TripRequest,
    profile: TierProfile,
    daily_budget: f64,
    entropy: &dyn Entropy,
) -> Itinerary {
    let destination = request.destination();
    let tier_daily = daily_budget * f64::from(profile.total_percent) / 100.0;

    let days = (0..request.duration_days())
        .map(|index| synthesize_day(request, &profile, index, tier_daily, entropy))
        .collect();

    Itinerary {
        id: format!("{}_{}", profile.kind, entropy.token()),
        kind: profile.kind,
        title: profile.title(destination),
        description: profile.description(destination),
        total_cost: Money::new(
            share(request.budget_total(), profile.total_percent),
            request.currency(),
        ),
        days,
        highlights: profile.highlights(destination),
        best_for: profile.best_for(),
    }
}

fn synthesize_day(
    request: &TripRequest,
    profile: &TierProfile,
    index: u32,
    tier_daily: f64,
    entropy: &dyn Entropy,
) -> Day {
    let currency = request.currency();
    let destination = request.destination();
    let slug = slugify(destination);

    let accommodation_budget = tier_daily * f64::from(profile.accommodation_percent) / 100.0;
    let reserve = tier_daily * f64::from(RESERVE_PERCENT) / 100.0;
    let activity_budget = (tier_daily - accommodation_budget - reserve).max(0.0);

    let theme = request
        .preferred_themes()
        .first()
        .map(String::as_str)
        .unwrap_or("cultural");

    let activities = vec![
        Activity {
            name: format!("Explore {destination} City Center"),
            category: ActivityCategory::Sightseeing,
            duration: "3 hours".to_string(),
            cost: Money::new(share(activity_budget, SIGHTSEEING_PERCENT), currency),
            location: Location {
                name: format!("{destination} City Center"),
                coordinates: jittered(entropy, ACTIVITY_SPREAD),
            },
            booking_info: booking("activities", &slug),
        },
        Activity {
            name: format!("Local {theme} Experience"),
            category: ActivityCategory::from_theme(theme),
            duration: "2 hours".to_string(),
            cost: Money::new(share(activity_budget, THEMED_PERCENT), currency),
            location: Location {
                name: format!("{destination} Cultural District"),
                coordinates: jittered(entropy, ACTIVITY_SPREAD),
            },
            booking_info: booking("experiences", &slug),
        },
    ];

    let accommodation = Accommodation {
        name: format!("{} {destination}", profile.accommodation_label),
        kind: profile.accommodation_kind,
        cost: Money::new(accommodation_budget.floor(), currency),
        location: Some(Location {
            name: format!("{destination} Downtown"),
            coordinates: jittered(entropy, ACCOMMODATION_SPREAD),
        }),
        booking_info: Some(booking("hotels", &slug)),
    };

    let meals = vec![
        Meal {
            kind: MealKind::Breakfast,
            name: "Local Breakfast Spot".to_string(),
            cost: Money::new(share(tier_daily, BREAKFAST_PERCENT), currency),
        },
        Meal {
            kind: MealKind::Lunch,
            name: "Traditional Restaurant".to_string(),
            cost: Money::new(share(tier_daily, LUNCH_PERCENT), currency),
        },
        Meal {
            kind: MealKind::Dinner,
            name: profile.dinner_name.to_string(),
            cost: Money::new(share(tier_daily, profile.dinner_percent), currency),
        },
    ];

    Day {
        day: index + 1,
        date: request
            .start_date()
            .checked_add_days(Days::new(u64::from(index))),
        activities,
        accommodation: Some(accommodation),
        meals,
        transportation: Some(Transportation {
            mode: profile.transport,
            cost: Money::new(share(tier_daily, TRANSPORT_PERCENT), currency),
        }),
        daily_cost: Money::new(tier_daily.floor(), currency),
    }
}

/// `floor(amount * percent / 100)`; exact for integer amounts.
fn share(amount: f64, percent: u32) -> f64 {
    (amount * f64::from(percent) / 100.0).floor()
}

fn jittered(entropy: &dyn Entropy, spread: f64) -> Coordinates {
    Coordinates {
        lat: BASE_POINT.lat + entropy.jitter(spread),
        lng: BASE_POINT.lng + entropy.jitter(spread),
    }
}

fn booking(section: &str, slug: &str) -> BookingInfo {
    BookingInfo {
        bookable: true,
        provider: BOOKING_PROVIDER.to_string(),
        booking_url: format!("{BOOKING_BASE_URL}/{section}/{slug}"),
    }
}

/// Lower-case, with each run of non-alphanumerics collapsed to one `-`.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::entropy::SeededEntropy;
    use chrono::NaiveDate;
    use serde_json::json;

    fn request(budget: f64, end_date: &str) -> TripRequest {
        TripRequest::from_value(&json!({
            "origin": "New York, USA",
            "destination": "Paris, France",
            "start_date": "2025-10-05",
            "end_date": end_date,
            "budget_total": budget,
            "currency": "EUR",
            "preferred_themes": ["food", "culture"],
            "num_travelers": 2
        }))
        .unwrap()
    }

    #[test]
    fn test_tier_totals() {
        let doc = synthesize(&request(2000.0, "2025-10-08"), &SeededEntropy::new(1));
        let total = |kind| doc.itinerary(kind).unwrap().total_cost.amount;
        assert_eq!(total(ItineraryType::Experience), 2000.0);
        assert_eq!(total(ItineraryType::Balanced), 1800.0);
        assert_eq!(total(ItineraryType::Budget), 1400.0);
    }

    #[test]
    fn test_day_breakdown_for_experience_tier() {
        // 2000 over 3 days: 666 per day at 100%.
        let doc = synthesize(&request(2000.0, "2025-10-08"), &SeededEntropy::new(1));
        let itinerary = doc.itinerary(ItineraryType::Experience).unwrap();
        let day = &itinerary.days[0];

        assert_eq!(day.daily_cost.amount, 666.0);
        let accommodation = day.accommodation.as_ref().unwrap();
        assert_eq!(accommodation.cost.amount, 266.0);
        assert_eq!(accommodation.kind, AccommodationKind::Resort);
        // activity budget = 666 - 266.4 - 133.2 = 266.4
        assert_eq!(day.activities[0].cost.amount, 159.0);
        assert_eq!(day.activities[1].cost.amount, 106.0);
        assert_eq!(day.activities[1].category, ActivityCategory::Food);
        assert_eq!(day.activities[1].name, "Local food Experience");

        let meal_costs: Vec<f64> = day.meals.iter().map(|m| m.cost.amount).collect();
        assert_eq!(meal_costs, vec![33.0, 53.0, 99.0]);
        let transport = day.transportation.as_ref().unwrap();
        assert_eq!(transport.mode, TransportMode::Taxi);
        assert_eq!(transport.cost.amount, 33.0);
    }

    #[test]
    fn test_days_follow_calendar() {
        let doc = synthesize(&request(900.0, "2025-10-08"), &SeededEntropy::new(2));
        for itinerary in &doc.itineraries {
            assert_eq!(itinerary.days.len(), 3);
            for (idx, day) in itinerary.days.iter().enumerate() {
                assert_eq!(day.day as usize, idx + 1);
                assert_eq!(
                    day.date,
                    NaiveDate::from_ymd_opt(2025, 10, 5 + idx as u32)
                );
            }
        }
    }

    #[test]
    fn test_tier_transport_and_lodging() {
        let doc = synthesize(&request(900.0, "2025-10-06"), &SeededEntropy::new(3));
        let day = |kind| doc.itinerary(kind).unwrap().days[0].clone();
        assert_eq!(
            day(ItineraryType::Budget).transportation.unwrap().mode,
            TransportMode::Bus
        );
        assert_eq!(
            day(ItineraryType::Balanced).transportation.unwrap().mode,
            TransportMode::Train
        );
        assert_eq!(
            day(ItineraryType::Budget).accommodation.unwrap().name,
            "Budget Inn Paris, France"
        );
    }

    #[test]
    fn test_budget_respected_for_awkward_amounts() {
        for budget in [1.0, 7.0, 99.99, 1234.56, 100000.0] {
            let doc = synthesize(&request(budget, "2025-10-12"), &SeededEntropy::new(9));
            for itinerary in &doc.itineraries {
                assert!(itinerary.total_cost.amount <= budget);
                assert!(itinerary.daily_cost_sum() <= itinerary.total_cost.amount);
                assert_eq!(itinerary.total_cost.amount.fract(), 0.0);
            }
        }
    }

    #[test]
    fn test_metadata_and_currency() {
        let doc = synthesize(&request(2000.0, "2025-10-08"), &SeededEntropy::new(4));
        assert_eq!(doc.metadata.model_version, MOCK_MODEL_VERSION);
        assert_eq!(doc.metadata.confidence_score, MOCK_CONFIDENCE);
        assert_eq!(doc.currencies(), vec!["EUR"]);
        assert!(doc.itineraries[0].id.starts_with("balanced_"));
        assert!(doc.itineraries[1].id.starts_with("budget_"));
        assert!(doc.itineraries[2].id.starts_with("experience_"));
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let trip = request(2000.0, "2025-10-08");
        let first = synthesize(&trip, &SeededEntropy::new(5));
        let mut second = synthesize(&trip, &SeededEntropy::new(5));
        second.metadata.generated_at = first.metadata.generated_at;
        assert_eq!(first, second);

        let other = synthesize(&trip, &SeededEntropy::new(6));
        assert_ne!(first.itineraries[0].id, other.itineraries[0].id);
    }

    #[test]
    fn test_coordinates_stay_near_base_point() {
        let doc = synthesize(&request(2000.0, "2025-10-08"), &SeededEntropy::new(8));
        for day in &doc.itineraries[0].days {
            for activity in &day.activities {
                assert!((activity.location.coordinates.lat - 40.7128).abs() <= 0.051);
                assert!((activity.location.coordinates.lng + 74.006).abs() <= 0.051);
            }
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Paris, France"), "paris-france");
        assert_eq!(slugify("  São Paulo!! "), "são-paulo");
        assert_eq!(
            booking("hotels", &slugify("Paris, France")).booking_url,
            "https://easemytrip.com/hotels/paris-france"
        );
    }
}
