use std::fmt::Write as _;

use crate::types::{trip_request::Currency, ItineraryType, TripRequest};

/// Structural contract shown to the model. Mirrors the document wire format.
const SCHEMA_CONTRACT: &str = r#"{
  "itineraries": [
    {
      "id": "unique_string_id",
      "type": "balanced|budget|experience",
      "title": "Catchy itinerary title",
      "description": "Brief description",
      "total_cost": { "amount": number, "currency": "string" },
      "days": [
        {
          "day": 1,
          "date": "YYYY-MM-DD",
          "activities": [
            {
              "name": "Activity name",
              "type": "sightseeing|adventure|cultural|food|shopping|relaxation|transport",
              "duration": "2 hours",
              "cost": { "amount": number, "currency": "string" },
              "location": {
                "name": "Location name",
                "coordinates": { "lat": number, "lng": number }
              },
              "booking_info": {
                "bookable": boolean,
                "provider": "string",
                "booking_url": "string"
              }
            }
          ],
          "accommodation": {
            "name": "Hotel name",
            "type": "hotel|hostel|resort|guesthouse|apartment",
            "cost": { "amount": number, "currency": "string" },
            "location": {
              "name": "Location name",
              "coordinates": { "lat": number, "lng": number }
            },
            "booking_info": {
              "bookable": boolean,
              "provider": "string",
              "booking_url": "string"
            }
          },
          "meals": [
            {
              "type": "breakfast|lunch|dinner|snack",
              "name": "Restaurant or meal name",
              "cost": { "amount": number, "currency": "string" }
            }
          ],
          "transportation": {
            "type": "flight|train|bus|taxi|rental_car|walking",
            "cost": { "amount": number, "currency": "string" }
          },
          "daily_cost": { "amount": number, "currency": "string" }
        }
      ],
      "highlights": ["string"],
      "best_for": ["string"]
    }
  ],
  "metadata": {
    "generated_at": "ISO-8601 datetime",
    "confidence_score": number between 0.0 and 1.0,
    "request_id": "string"
  }
}"#;

const FIXUP_INSTRUCTION: &str = "IMPORTANT: The previous response had schema validation errors. \
Please ensure your JSON response strictly follows the provided schema format. \
Double-check all required fields and data types. \
Return ONLY valid JSON without any markdown formatting.";

/// USD price band for one spending category.
struct PriceBand {
    label: &'static str,
    low: f64,
    high: f64,
    unit: &'static str,
    open_ended: bool,
}

const PRICE_BANDS: &[PriceBand] = &[
    PriceBand {
        label: "Budget accommodation",
        low: 20.0,
        high: 50.0,
        unit: "per night",
        open_ended: false,
    },
    PriceBand {
        label: "Mid-range accommodation",
        low: 80.0,
        high: 150.0,
        unit: "per night",
        open_ended: false,
    },
    PriceBand {
        label: "Luxury accommodation",
        low: 200.0,
        high: 500.0,
        unit: "per night",
        open_ended: true,
    },
    PriceBand {
        label: "Street food/cheap meals",
        low: 5.0,
        high: 15.0,
        unit: "per meal",
        open_ended: false,
    },
    PriceBand {
        label: "Mid-range restaurant",
        low: 20.0,
        high: 40.0,
        unit: "per meal",
        open_ended: false,
    },
    PriceBand {
        label: "Fine dining",
        low: 60.0,
        high: 150.0,
        unit: "per meal",
        open_ended: true,
    },
    PriceBand {
        label: "Public transport",
        low: 2.0,
        high: 10.0,
        unit: "per trip",
        open_ended: false,
    },
    PriceBand {
        label: "Taxi/private transport",
        low: 15.0,
        high: 50.0,
        unit: "per trip",
        open_ended: false,
    },
    PriceBand {
        label: "Budget activities",
        low: 10.0,
        high: 30.0,
        unit: "per activity",
        open_ended: false,
    },
    PriceBand {
        label: "Mid-range activities",
        low: 30.0,
        high: 80.0,
        unit: "per activity",
        open_ended: false,
    },
    PriceBand {
        label: "Premium activities",
        low: 100.0,
        high: 300.0,
        unit: "per activity",
        open_ended: true,
    },
];

/// Render the canonical generation prompt for a request.
///
/// Pure: identical requests produce byte-identical prompts.
pub fn build_prompt(request: &TripRequest) -> String {
    let currency = request.currency();
    let budget = format!("{} {}", currency, format_amount(request.budget_total()));
    let mut prompt = String::new();

    prompt.push_str(
        "You are an expert travel planner AI. Create exactly 3 distinct travel itineraries for the following trip request:\n\n",
    );

    prompt.push_str("**Trip Details:**\n");
    let _ = writeln!(prompt, "- Origin: {}", request.origin());
    let _ = writeln!(prompt, "- Destination: {}", request.destination());
    let _ = writeln!(prompt, "- Start Date: {}", request.start_date());
    let _ = writeln!(prompt, "- End Date: {}", request.end_date());
    let _ = writeln!(prompt, "- Duration: {} days", request.duration_days());
    let _ = writeln!(prompt, "- Total Budget: {budget}");
    let _ = writeln!(prompt, "- Number of Travelers: {}", request.num_travelers());
    let _ = writeln!(
        prompt,
        "- Preferred Themes: {}",
        request.preferred_themes().join(", ")
    );
    push_preferences(&mut prompt, request);
    if let Some(info) = request.additional_info() {
        let _ = write!(prompt, "\nAdditional Requirements: {info}\n");
    }

    prompt.push_str("\n**Requirements:**\n");
    prompt.push_str("1. Generate exactly 3 itineraries, one of each type:\n");
    for kind in ItineraryType::ALL {
        let _ = writeln!(prompt, "   - \"{}\": {}", kind, tier_definition(*kind));
    }
    prompt.push_str(
        "\n2. Each itinerary must include:\n\
         \x20  - Day-by-day plans covering every day of the trip\n\
         \x20  - Specific activities with locations and coordinates\n\
         \x20  - Accommodation recommendations\n\
         \x20  - Meal suggestions\n\
         \x20  - Transportation options\n\
         \x20  - Realistic cost breakdowns for every item\n\
         \x20  - Booking information where applicable\n",
    );

    prompt.push_str("\n3. **Pricing Requirements:**\n");
    let _ = writeln!(
        prompt,
        "   - Provide specific, realistic prices for all activities, meals, accommodation and transportation in {currency}"
    );
    prompt.push_str(
        "   - Budget itinerary: budget-friendly options (hostels, street food, public transport)\n\
         \x20  - Balanced itinerary: mix of mid-range and some premium options\n\
         \x20  - Experience itinerary: premium accommodation, fine dining, private tours\n\
         \x20  - Include daily cost totals that add up to a realistic total_cost\n",
    );
    let _ = writeln!(
        prompt,
        "   - Every itinerary's total_cost must not exceed the total budget of {budget}"
    );
    prompt.push_str("   - Add booking URLs for bookable items (use EaseMyTrip.com for hotels and transport)\n");

    prompt.push_str(
        "\n4. Include local cultural insights and hidden gems\n\
         5. Reflect the travel themes and preferences above\n\
         6. Provide accurate location coordinates for mapping\n\
         7. Include a confidence score based on data availability\n",
    );

    prompt.push_str("\n**Output Schema:**\n");
    prompt.push_str("Return a single JSON object that strictly follows this structure:\n\n");
    prompt.push_str(SCHEMA_CONTRACT);
    prompt.push('\n');

    prompt.push_str("\n**Important Notes:**\n");
    let _ = writeln!(prompt, "- All costs must be in {currency}; every \"currency\" field must be \"{currency}\"");
    let _ = writeln!(prompt, "- Total costs must respect the budget of {budget}");
    prompt.push_str(
        "- Confidence score must reflect data availability and accuracy (0.0 to 1.0)\n\
         - Ensure all required fields are present and properly typed\n",
    );

    let _ = writeln!(prompt, "\n**Pricing Guidance ({currency}):**");
    for band in PRICE_BANDS {
        let _ = writeln!(
            prompt,
            "- {}: {} {}-{}{} {}",
            band.label,
            currency,
            format_amount(convert(band.low, currency)),
            format_amount(convert(band.high, currency)),
            if band.open_ended { "+" } else { "" },
            band.unit
        );
    }

    prompt.push_str("\n**Currency Conversion (approximate, from USD):**\n");
    for other in Currency::ALL {
        let _ = writeln!(
            prompt,
            "- {}: multiply USD prices by ~{}",
            other,
            format_amount(other.usd_rate())
        );
    }

    prompt.push_str(
        "\nRespond with strictly valid JSON only: no prose before or after it and no markdown code fences.\n\
         Generate the complete JSON response now:",
    );

    prompt
}

/// The corrective variant used for the single retry.
pub fn build_fixup_prompt(prompt: &str) -> String {
    format!("{prompt}\n\n{FIXUP_INSTRUCTION}")
}

pub fn tier_definition(kind: ItineraryType) -> &'static str {
    match kind {
        ItineraryType::Balanced => "Perfect mix of must-see attractions and local experiences",
        ItineraryType::Budget => "Maximum value with smart savings and local gems",
        ItineraryType::Experience => "Premium experiences and exclusive access",
    }
}

fn push_preferences(prompt: &mut String, request: &TripRequest) {
    let lines = [
        ("Accommodation Type", request.accommodation_type().map(|v| v.as_str())),
        (
            "Transportation Preference",
            request.transportation_preference().map(|v| v.as_str()),
        ),
        ("Meal Preference", request.meal_preference().map(|v| v.as_str())),
        ("Activity Level", request.activity_level().map(|v| v.as_str())),
        ("Group Type", request.group_type().map(|v| v.as_str())),
        ("Special Occasions", request.special_occasions()),
        ("Accessibility Needs", request.accessibility_needs()),
    ];

    for (label, value) in lines {
        if let Some(value) = value {
            let _ = writeln!(prompt, "- {label}: {value}");
        }
    }
}

fn convert(usd: f64, currency: Currency) -> f64 {
    (usd * currency.usd_rate()).round()
}

/// Thousands-separated amount, with up to two decimals when fractional.
pub(crate) fn format_amount(amount: f64) -> String {
    let rendered = format!("{:.2}", amount.abs());
    let (digits, fraction) = rendered
        .split_once('.')
        .unwrap_or((rendered.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let nonzero = rendered.bytes().any(|byte| matches!(byte, b'1'..=b'9'));
    let sign = if amount < 0.0 && nonzero { "-" } else { "" };
    if fraction.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{fraction}")
    }
}
