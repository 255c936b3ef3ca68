use crate::core::distance::{haversine_miles, valid_coordinates};
use crate::core::zip::is_in_preferred_zip;
use crate::models::{BuyerPreferences, MatchScore, PropertyAttributes};

/// Sub-score ceilings. The four bands sum to exactly 100 at their maxima.
pub const LOCATION_MAX: u8 = 40;
pub const BEDS_MAX: u8 = 25;
pub const BATHS_MAX: u8 = 15;
pub const BUDGET_MAX: u8 = 20;

/// Score a buyer against a property (0-100)
///
/// Scoring bands:
/// - location (0-40): preferred ZIP membership wins outright, then
///   distance banding, then ZIP-preference-without-signal, then neutral
/// - bedrooms (0-25): exact, off-by-one, extra, fewer
/// - bathrooms (0-15): meets the requirement or not
/// - budget (0-20): down payment as a percentage of the listing price
///
/// Pure and deterministic. Absent or malformed fields fall back to each
/// band's neutral rule; this function never fails.
pub fn score_match(buyer: &BuyerPreferences, property: &PropertyAttributes) -> MatchScore {
    let mut highlights = Vec::new();
    let mut concerns = Vec::new();

    let distance_miles = distance_between(buyer, property);

    let (location_score, is_priority, location_reason) =
        score_location(buyer, property, distance_miles, &mut highlights, &mut concerns);
    let (beds_score, beds_reason) =
        score_beds(buyer.desired_beds, property.beds, &mut highlights, &mut concerns);
    let (baths_score, baths_reason) =
        score_baths(buyer.desired_baths, property.baths, &mut concerns);
    let (budget_score, budget_reason) =
        score_budget(buyer.down_payment, property.price, &mut highlights, &mut concerns);

    // The bands sum to 100 at their theoretical maxima; the clamp is a
    // guard, not a normal code path.
    let score = (location_score as u16 + beds_score as u16 + baths_score as u16 + budget_score as u16)
        .min(100) as u8;

    let reasoning = build_reasoning(
        score,
        is_priority,
        (location_score, &location_reason),
        (beds_score, &beds_reason),
        (baths_score, &baths_reason),
        (budget_score, &budget_reason),
    );

    MatchScore {
        score,
        location_score,
        beds_score,
        baths_score,
        budget_score,
        is_priority,
        distance_miles,
        reasoning,
        highlights,
        concerns,
    }
}

/// Great-circle distance between buyer and property, when both sides carry
/// usable coordinates.
fn distance_between(buyer: &BuyerPreferences, property: &PropertyAttributes) -> Option<f64> {
    let (blat, blng) = valid_coordinates(buyer.latitude, buyer.longitude)?;
    let (plat, plng) = valid_coordinates(property.latitude, property.longitude)?;
    Some(haversine_miles(blat, blng, plat, plng))
}

/// Location band (0-40), evaluated in strict priority order: ZIP membership
/// beats any computed distance, distance beats the no-signal fallbacks.
fn score_location(
    buyer: &BuyerPreferences,
    property: &PropertyAttributes,
    distance_miles: Option<f64>,
    highlights: &mut Vec<String>,
    concerns: &mut Vec<String>,
) -> (u8, bool, String) {
    if is_in_preferred_zip(
        property.zip_code.as_deref(),
        property.address.as_deref(),
        &buyer.preferred_zip_codes,
    ) {
        highlights.push("In preferred ZIP code".to_string());
        return (LOCATION_MAX, true, "in preferred ZIP code".to_string());
    }

    if let Some(d) = distance_miles {
        let (points, priority) = distance_band(d);
        if d <= 10.0 {
            highlights.push(format!("Close to preferred area: {:.1} miles", d));
        } else if !priority {
            concerns.push(format!("Far from preferred area: {:.1} miles", d));
        }
        return (points, priority, format!("{:.1} miles from preferred area", d));
    }

    if !buyer.preferred_zip_codes.is_empty() {
        concerns.push("Not in preferred ZIP codes".to_string());
        return (10, false, "not in preferred ZIP codes".to_string());
    }

    (20, false, "no location preference to compare".to_string())
}

/// Banded distance score: flat steps out to 50 miles, then a monotone
/// decay with a floor of 5 points.
fn distance_band(distance_miles: f64) -> (u8, bool) {
    if distance_miles <= 5.0 {
        (38, true)
    } else if distance_miles <= 10.0 {
        (35, true)
    } else if distance_miles <= 25.0 {
        (28, true)
    } else if distance_miles <= 50.0 {
        (20, true)
    } else {
        let decayed = 15i64 - (distance_miles / 20.0).floor() as i64;
        (decayed.max(5) as u8, false)
    }
}

/// Bedroom band (0-25). Only judged when the buyer stated a positive
/// preference and the property has a count; otherwise informational 12.
fn score_beds(
    desired: Option<f64>,
    actual: Option<f64>,
    highlights: &mut Vec<String>,
    concerns: &mut Vec<String>,
) -> (u8, String) {
    match (desired, actual) {
        (Some(desired), Some(actual)) if desired > 0.0 && actual.is_finite() => {
            let diff = actual - desired;
            if diff == 0.0 {
                highlights.push(format!("Exact bed count: {} beds", fmt_count(actual)));
                (BEDS_MAX, format!("exact match on {} beds", fmt_count(actual)))
            } else if diff.abs() <= 1.0 {
                (15, "within one bedroom of preference".to_string())
            } else if diff > 0.0 {
                (10, "more bedrooms than requested".to_string())
            } else {
                concerns.push(format!(
                    "Fewer bedrooms than desired: {} vs {}",
                    fmt_count(actual),
                    fmt_count(desired)
                ));
                (5, "fewer bedrooms than requested".to_string())
            }
        }
        _ => (12, "no bedroom preference stated".to_string()),
    }
}

/// Bathroom band (0-15). Meeting or exceeding the desired count is all
/// that matters.
fn score_baths(
    desired: Option<f64>,
    actual: Option<f64>,
    concerns: &mut Vec<String>,
) -> (u8, String) {
    match (desired, actual) {
        (Some(desired), Some(actual)) if desired > 0.0 && actual.is_finite() => {
            if actual >= desired {
                (
                    BATHS_MAX,
                    format!("meets the {} bath requirement", fmt_count(desired)),
                )
            } else {
                concerns.push("Fewer bathrooms than desired".to_string());
                (5, "fewer bathrooms than requested".to_string())
            }
        }
        _ => (8, "no bathroom preference stated".to_string()),
    }
}

/// Budget band (0-20): down payment as a percentage of the listing price.
fn score_budget(
    down_payment: Option<f64>,
    price: Option<f64>,
    highlights: &mut Vec<String>,
    concerns: &mut Vec<String>,
) -> (u8, String) {
    match (down_payment, price) {
        (Some(dp), Some(price)) if dp >= 0.0 && price > 0.0 => {
            let ratio = dp / price * 100.0;
            if ratio >= 20.0 {
                highlights.push(format!("Strong down payment: {:.0}% of price", ratio));
                (BUDGET_MAX, format!("{:.0}% down payment", ratio))
            } else if ratio >= 10.0 {
                (15, format!("{:.0}% down payment", ratio))
            } else if ratio >= 5.0 {
                (10, format!("{:.0}% down payment", ratio))
            } else {
                concerns.push(format!("Low down payment ratio: {:.1}%", ratio));
                (5, format!("{:.1}% down payment", ratio))
            }
        }
        (Some(_), _) => (10, "no listing price to compare against".to_string()),
        _ => (10, "no down payment on file".to_string()),
    }
}

fn quality_label(total: u8) -> &'static str {
    if total >= 80 {
        "Excellent Match"
    } else if total >= 60 {
        "Good Match"
    } else if total >= 40 {
        "Fair Match"
    } else {
        "Limited Match"
    }
}

/// Render the per-category breakdown. The dashboard parses these lines
/// back out, so the `<Category>: <pts>/<max> pts (<reason>)` shape is a
/// wire format in practice.
fn build_reasoning(
    total: u8,
    is_priority: bool,
    location: (u8, &str),
    beds: (u8, &str),
    baths: (u8, &str),
    budget: (u8, &str),
) -> String {
    let label = quality_label(total);
    let headline = if is_priority {
        format!("PRIORITY MATCH - {}", label)
    } else {
        label.to_string()
    };

    [
        headline,
        format!("Location: {}/{} pts ({})", location.0, LOCATION_MAX, location.1),
        format!("Bedrooms: {}/{} pts ({})", beds.0, BEDS_MAX, beds.1),
        format!("Bathrooms: {}/{} pts ({})", baths.0, BATHS_MAX, baths.1),
        format!("Budget: {}/{} pts ({})", budget.0, BUDGET_MAX, budget.1),
    ]
    .join("\n")
}

/// Whole counts render without a trailing ".0"; half-baths keep it.
fn fmt_count(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn buyer_with_zips(zips: &[&str]) -> BuyerPreferences {
        BuyerPreferences {
            preferred_zip_codes: zips.iter().map(|z| z.to_string()).collect::<HashSet<_>>(),
            ..Default::default()
        }
    }

    fn property_at(lat: f64, lng: f64) -> PropertyAttributes {
        PropertyAttributes {
            latitude: Some(lat),
            longitude: Some(lng),
            ..Default::default()
        }
    }

    #[test]
    fn test_perfect_match_scores_100() {
        let buyer = BuyerPreferences {
            preferred_zip_codes: ["70062".to_string()].into_iter().collect(),
            desired_beds: Some(3.0),
            desired_baths: Some(2.0),
            down_payment: Some(20_000.0),
            ..Default::default()
        };
        let property = PropertyAttributes {
            zip_code: Some("70062".to_string()),
            beds: Some(3.0),
            baths: Some(2.0),
            price: Some(100_000.0),
            ..Default::default()
        };

        let score = score_match(&buyer, &property);
        assert_eq!(score.location_score, 40);
        assert_eq!(score.beds_score, 25);
        assert_eq!(score.baths_score, 15);
        assert_eq!(score.budget_score, 20);
        assert_eq!(score.score, 100);
        assert!(score.is_priority);
        // 40+25+15+20 is exactly 100, so the clamp in score_match never
        // actually trims a real total; this scenario is the ceiling.
    }

    #[test]
    fn test_no_signal_is_neutral() {
        let score = score_match(&BuyerPreferences::default(), &PropertyAttributes::default());
        assert_eq!(score.location_score, 20);
        assert_eq!(score.beds_score, 12);
        assert_eq!(score.baths_score, 8);
        assert_eq!(score.budget_score, 10);
        assert!(!score.is_priority);
        assert_eq!(score.distance_miles, None);
    }

    #[test]
    fn test_zip_match_beats_distance() {
        // Buyer in New Orleans, property near Baton Rouge (~70mi) but in a
        // preferred ZIP: membership wins outright.
        let mut buyer = buyer_with_zips(&["70802"]);
        buyer.latitude = Some(29.9511);
        buyer.longitude = Some(-90.0715);
        let mut property = property_at(30.4515, -91.1871);
        property.zip_code = Some("70802".to_string());

        let score = score_match(&buyer, &property);
        assert_eq!(score.location_score, 40);
        assert!(score.is_priority);
        // Distance is still reported for display
        let d = score.distance_miles.unwrap();
        assert!(d > 50.0);
    }

    #[test]
    fn test_zip_parsed_from_address() {
        let buyer = buyer_with_zips(&["70062"]);
        let property = PropertyAttributes {
            address: Some("123 Main St, Kenner, LA 70062".to_string()),
            ..Default::default()
        };
        let score = score_match(&buyer, &property);
        assert_eq!(score.location_score, 40);
        assert!(score.is_priority);
        assert!(score.highlights.contains(&"In preferred ZIP code".to_string()));
    }

    #[test]
    fn test_distance_bands() {
        assert_eq!(distance_band(3.0), (38, true));
        assert_eq!(distance_band(5.0), (38, true));
        assert_eq!(distance_band(7.0), (35, true));
        assert_eq!(distance_band(10.0), (35, true));
        assert_eq!(distance_band(25.0), (28, true));
        assert_eq!(distance_band(50.0), (20, true));
        // Decay past 50 miles: max(5, 15 - floor(d/20))
        assert_eq!(distance_band(60.0), (12, false));
        assert_eq!(distance_band(100.0), (10, false));
        assert_eq!(distance_band(400.0), (5, false));
    }

    #[test]
    fn test_distance_band_monotonic() {
        let mut last = u8::MAX;
        for d in [1.0, 5.0, 6.0, 10.0, 11.0, 25.0, 26.0, 50.0, 51.0, 80.0, 150.0, 500.0] {
            let (points, _) = distance_band(d);
            assert!(points <= last, "score increased at {} miles", d);
            last = points;
        }
    }

    #[test]
    fn test_seven_miles_is_priority_band() {
        // ~7 miles apart, no ZIP preference
        let buyer = BuyerPreferences {
            latitude: Some(29.9511),
            longitude: Some(-90.0715),
            ..Default::default()
        };
        let property = property_at(29.9511, -90.1885);
        let score = score_match(&buyer, &property);
        let d = score.distance_miles.unwrap();
        assert!(d > 5.0 && d <= 10.0, "expected ~7mi, got {}", d);
        assert_eq!(score.location_score, 35);
        assert!(score.is_priority);
    }

    #[test]
    fn test_zip_preference_without_any_signal() {
        let buyer = buyer_with_zips(&["70062"]);
        let property = PropertyAttributes {
            address: Some("456 Oak Ave, Metairie, LA 70003".to_string()),
            ..Default::default()
        };
        let score = score_match(&buyer, &property);
        assert_eq!(score.location_score, 10);
        assert!(!score.is_priority);
        assert!(score.concerns.contains(&"Not in preferred ZIP codes".to_string()));
    }

    #[test]
    fn test_beds_bands() {
        let mut h = Vec::new();
        let mut c = Vec::new();
        assert_eq!(score_beds(Some(3.0), Some(3.0), &mut h, &mut c).0, 25);
        assert_eq!(score_beds(Some(3.0), Some(4.0), &mut h, &mut c).0, 15);
        assert_eq!(score_beds(Some(3.0), Some(2.0), &mut h, &mut c).0, 15);
        assert_eq!(score_beds(Some(3.0), Some(5.0), &mut h, &mut c).0, 10);
        assert_eq!(score_beds(Some(4.0), Some(2.0), &mut h, &mut c).0, 5);
        assert_eq!(score_beds(None, Some(3.0), &mut h, &mut c).0, 12);
        assert_eq!(score_beds(Some(3.0), None, &mut h, &mut c).0, 12);
        assert_eq!(score_beds(None, None, &mut h, &mut c).0, 12);
        assert!(h.contains(&"Exact bed count: 3 beds".to_string()));
    }

    #[test]
    fn test_baths_bands() {
        let mut c = Vec::new();
        assert_eq!(score_baths(Some(2.0), Some(2.0), &mut c).0, 15);
        assert_eq!(score_baths(Some(2.0), Some(3.5), &mut c).0, 15);
        assert_eq!(score_baths(Some(2.0), Some(1.5), &mut c).0, 5);
        assert_eq!(score_baths(None, Some(2.0), &mut c).0, 8);
        assert_eq!(score_baths(Some(2.0), None, &mut c).0, 8);
        assert!(c.contains(&"Fewer bathrooms than desired".to_string()));
    }

    #[test]
    fn test_budget_bands() {
        let mut h = Vec::new();
        let mut c = Vec::new();
        assert_eq!(score_budget(Some(20_000.0), Some(100_000.0), &mut h, &mut c).0, 20);
        assert_eq!(score_budget(Some(15_000.0), Some(100_000.0), &mut h, &mut c).0, 15);
        assert_eq!(score_budget(Some(5_000.0), Some(100_000.0), &mut h, &mut c).0, 10);
        assert_eq!(score_budget(Some(2_000.0), Some(100_000.0), &mut h, &mut c).0, 5);
        assert_eq!(score_budget(Some(20_000.0), None, &mut h, &mut c).0, 10);
        assert_eq!(score_budget(None, Some(100_000.0), &mut h, &mut c).0, 10);
        assert!(c.iter().any(|s| s.starts_with("Low down payment ratio")));
    }

    #[test]
    fn test_malformed_numbers_treated_as_absent() {
        let buyer = BuyerPreferences {
            desired_beds: Some(3.0),
            down_payment: Some(10_000.0),
            latitude: Some(f64::NAN),
            longitude: Some(-90.0),
            ..Default::default()
        };
        let property = PropertyAttributes {
            beds: Some(f64::NAN),
            price: Some(-5.0),
            ..Default::default()
        };
        let score = score_match(&buyer, &property);
        assert_eq!(score.beds_score, 12);
        assert_eq!(score.budget_score, 10);
        assert_eq!(score.location_score, 20);
        assert_eq!(score.distance_miles, None);
    }

    #[test]
    fn test_reasoning_line_shape() {
        let buyer = BuyerPreferences {
            preferred_zip_codes: ["70062".to_string()].into_iter().collect(),
            desired_beds: Some(3.0),
            ..Default::default()
        };
        let property = PropertyAttributes {
            zip_code: Some("70062".to_string()),
            beds: Some(3.0),
            ..Default::default()
        };
        let score = score_match(&buyer, &property);
        let lines: Vec<&str> = score.reasoning.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("PRIORITY MATCH - "));
        assert_eq!(lines[1], "Location: 40/40 pts (in preferred ZIP code)");
        assert_eq!(lines[2], "Bedrooms: 25/25 pts (exact match on 3 beds)");
        assert!(lines[3].starts_with("Bathrooms: 8/15 pts ("));
        assert!(lines[4].starts_with("Budget: 10/20 pts ("));
    }

    #[test]
    fn test_quality_labels() {
        assert_eq!(quality_label(100), "Excellent Match");
        assert_eq!(quality_label(80), "Excellent Match");
        assert_eq!(quality_label(79), "Good Match");
        assert_eq!(quality_label(60), "Good Match");
        assert_eq!(quality_label(59), "Fair Match");
        assert_eq!(quality_label(40), "Fair Match");
        assert_eq!(quality_label(39), "Limited Match");
    }

    #[test]
    fn test_deterministic() {
        let buyer = BuyerPreferences {
            preferred_zip_codes: ["70062".to_string(), "70003".to_string()]
                .into_iter()
                .collect(),
            desired_beds: Some(3.0),
            desired_baths: Some(2.0),
            down_payment: Some(15_000.0),
            latitude: Some(29.99),
            longitude: Some(-90.24),
            ..Default::default()
        };
        let property = PropertyAttributes {
            address: Some("789 Pine St, Kenner, LA 70065".to_string()),
            price: Some(180_000.0),
            beds: Some(4.0),
            baths: Some(2.5),
            latitude: Some(30.02),
            longitude: Some(-90.18),
            ..Default::default()
        };
        let first = score_match(&buyer, &property);
        for _ in 0..5 {
            assert_eq!(score_match(&buyer, &property), first);
        }
    }
}
