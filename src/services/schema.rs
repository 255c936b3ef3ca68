use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::core::zip::normalize_zip;
use crate::models::{
    BuyerPreferences, BuyerRecord, MatchRecord, MatchUpdate, NewMatch, PipelineStage,
    PropertyAttributes, PropertyRecord,
};

// The CRM schema drifted over time, so most fields have more than one
// spelling in the wild. First listed name wins.
const BUYER_NAME: &[&str] = &["Name", "Full Name"];
const BUYER_ZIPS: &[&str] = &["Preferred Zip Codes", "Preferred ZIP Codes"];
const BUYER_BEDS: &[&str] = &["No. of Bedrooms", "Bedrooms"];
const BUYER_BATHS: &[&str] = &["No. of Bath", "Bathrooms"];
const BUYER_DOWN_PAYMENT: &[&str] = &["Downpayment", "Down Payment"];
const BUYER_LOCATION: &[&str] = &["Location"];
const BUYER_CITY: &[&str] = &["City"];
const BUYER_PREFERRED_LOCATION: &[&str] = &["Preferred Location"];

const PROPERTY_ADDRESS: &[&str] = &["Address", "Property Address"];
const PROPERTY_ZIP: &[&str] = &["Zip Code", "ZIP Code"];
const PROPERTY_PRICE: &[&str] = &["Price", "Property Total Price"];
const PROPERTY_BEDS: &[&str] = &["Beds"];
const PROPERTY_BATHS: &[&str] = &["Baths"];

const LATITUDE: &[&str] = &["Latitude"];
const LONGITUDE: &[&str] = &["Longitude"];

const MATCH_BUYER: &str = "Buyer";
const MATCH_PROPERTY: &str = "Property";
const MATCH_SCORE: &str = "Match Score";
const MATCH_PRIORITY: &str = "Priority";
const MATCH_STAGE: &str = "Stage";
const MATCH_NOTES: &str = "Notes";
const MATCH_DISTANCE: &str = "Distance (miles)";
const MATCH_MATCHED_AT: &str = "Matched At";

/// First non-blank string under any of the candidate field names.
pub fn text_field(fields: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First usable number under any of the candidate field names. The store
/// hands back numbers as strings often enough that both are accepted;
/// anything non-finite is treated as absent.
pub fn number_field(fields: &Value, names: &[&str]) -> Option<f64> {
    names
        .iter()
        .filter_map(|name| fields.get(*name))
        .filter_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace([',', '$'], "").parse::<f64>().ok(),
            _ => None,
        })
        .find(|n| n.is_finite())
}

fn bool_field(fields: &Value, name: &str) -> bool {
    match fields.get(name) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("checked"),
        _ => false,
    }
}

/// Parse the preferred-ZIP field into a uniqued, normalized set. The field
/// arrives either as one comma-delimited string or as an array of strings;
/// entries that don't survive normalization are dropped.
pub fn zip_set_field(fields: &Value, names: &[&str]) -> HashSet<String> {
    let raw = names.iter().find_map(|name| fields.get(*name));

    match raw {
        Some(Value::String(s)) => s.split(',').filter_map(normalize_zip).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .flat_map(|s| s.split(','))
            .filter_map(normalize_zip)
            .collect(),
        _ => HashSet::new(),
    }
}

/// Linked-record fields come back as arrays of record ids.
fn linked_id(fields: &Value, name: &str) -> Option<String> {
    match fields.get(name) {
        Some(Value::Array(items)) => items.first().and_then(|v| v.as_str()).map(str::to_string),
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Normalize a raw buyer row into the typed record the scorer consumes.
pub fn buyer_from_record(id: &str, fields: &Value) -> BuyerRecord {
    BuyerRecord {
        id: id.to_string(),
        name: text_field(fields, BUYER_NAME),
        preferences: BuyerPreferences {
            preferred_zip_codes: zip_set_field(fields, BUYER_ZIPS),
            desired_beds: number_field(fields, BUYER_BEDS),
            desired_baths: number_field(fields, BUYER_BATHS),
            down_payment: number_field(fields, BUYER_DOWN_PAYMENT),
            location: text_field(fields, BUYER_LOCATION),
            city: text_field(fields, BUYER_CITY),
            preferred_location: text_field(fields, BUYER_PREFERRED_LOCATION),
            latitude: number_field(fields, LATITUDE),
            longitude: number_field(fields, LONGITUDE),
        },
    }
}

/// Normalize a raw property row.
pub fn property_from_record(id: &str, fields: &Value) -> PropertyRecord {
    PropertyRecord {
        id: id.to_string(),
        attributes: PropertyAttributes {
            address: text_field(fields, PROPERTY_ADDRESS),
            zip_code: text_field(fields, PROPERTY_ZIP),
            price: number_field(fields, PROPERTY_PRICE),
            beds: number_field(fields, PROPERTY_BEDS),
            baths: number_field(fields, PROPERTY_BATHS),
            latitude: number_field(fields, LATITUDE),
            longitude: number_field(fields, LONGITUDE),
        },
    }
}

/// Normalize a raw match row. Rows missing either linked id are unusable
/// for deduplication and are dropped by the caller.
pub fn match_from_record(id: &str, fields: &Value) -> Option<MatchRecord> {
    let buyer_id = linked_id(fields, MATCH_BUYER)?;
    let property_id = linked_id(fields, MATCH_PROPERTY)?;

    let matched_at = text_field(fields, &[MATCH_MATCHED_AT])
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH);

    Some(MatchRecord {
        id: id.to_string(),
        buyer_id,
        property_id,
        score: number_field(fields, &[MATCH_SCORE]).unwrap_or(0.0).clamp(0.0, 100.0) as u8,
        is_priority: bool_field(fields, MATCH_PRIORITY),
        stage: text_field(fields, &[MATCH_STAGE])
            .and_then(|s| PipelineStage::parse(&s))
            .unwrap_or_default(),
        notes: text_field(fields, &[MATCH_NOTES]).unwrap_or_default(),
        distance_miles: number_field(fields, &[MATCH_DISTANCE]),
        matched_at,
    })
}

/// Store-side field map for a new match row.
pub fn new_match_fields(m: &NewMatch) -> Value {
    let mut fields = serde_json::Map::new();
    fields.insert(MATCH_BUYER.to_string(), json!([m.buyer_id]));
    fields.insert(MATCH_PROPERTY.to_string(), json!([m.property_id]));
    fields.insert(MATCH_SCORE.to_string(), json!(m.score.score));
    fields.insert(MATCH_PRIORITY.to_string(), json!(m.score.is_priority));
    fields.insert(MATCH_STAGE.to_string(), json!(m.stage.as_str()));
    fields.insert(MATCH_NOTES.to_string(), json!(m.score.reasoning));
    fields.insert(MATCH_MATCHED_AT.to_string(), json!(m.matched_at.to_rfc3339()));
    if let Some(d) = m.score.distance_miles {
        fields.insert(MATCH_DISTANCE.to_string(), json!((d * 10.0).round() / 10.0));
    }
    Value::Object(fields)
}

/// Store-side field map for a score refresh. Stage is intentionally not
/// part of this payload.
pub fn match_update_fields(m: &MatchUpdate) -> Value {
    let mut fields = serde_json::Map::new();
    fields.insert(MATCH_SCORE.to_string(), json!(m.score.score));
    fields.insert(MATCH_PRIORITY.to_string(), json!(m.score.is_priority));
    fields.insert(MATCH_NOTES.to_string(), json!(m.score.reasoning));
    fields.insert(MATCH_MATCHED_AT.to_string(), json!(m.matched_at.to_rfc3339()));
    if let Some(d) = m.score.distance_miles {
        fields.insert(MATCH_DISTANCE.to_string(), json!((d * 10.0).round() / 10.0));
    }
    Value::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buyer_from_record_full() {
        let fields = json!({
            "Name": "Dana Arnold",
            "Preferred Zip Codes": "70062, 70065,70003",
            "No. of Bedrooms": 3,
            "No. of Bath": "2",
            "Downpayment": "25,000",
            "City": "Kenner",
            "Latitude": 29.9941,
            "Longitude": -90.2417,
        });
        let buyer = buyer_from_record("recBuyer1", &fields);
        assert_eq!(buyer.id, "recBuyer1");
        assert_eq!(buyer.name.as_deref(), Some("Dana Arnold"));
        assert_eq!(buyer.preferences.preferred_zip_codes.len(), 3);
        assert!(buyer.preferences.preferred_zip_codes.contains("70065"));
        assert_eq!(buyer.preferences.desired_beds, Some(3.0));
        assert_eq!(buyer.preferences.desired_baths, Some(2.0));
        assert_eq!(buyer.preferences.down_payment, Some(25_000.0));
        assert_eq!(buyer.preferences.latitude, Some(29.9941));
    }

    #[test]
    fn test_buyer_from_record_sparse() {
        let buyer = buyer_from_record("recBuyer2", &json!({}));
        assert!(buyer.preferences.preferred_zip_codes.is_empty());
        assert_eq!(buyer.preferences.desired_beds, None);
        assert_eq!(buyer.preferences.down_payment, None);
    }

    #[test]
    fn test_zip_set_drops_junk_entries() {
        let fields = json!({"Preferred Zip Codes": "70062, , abcde, 70065-1234, 700"});
        let zips = zip_set_field(&fields, BUYER_ZIPS);
        assert_eq!(zips.len(), 2);
        assert!(zips.contains("70062"));
        assert!(zips.contains("70065"));
    }

    #[test]
    fn test_zip_set_from_array() {
        let fields = json!({"Preferred Zip Codes": ["70062", "70065, 70003"]});
        let zips = zip_set_field(&fields, BUYER_ZIPS);
        assert_eq!(zips.len(), 3);
    }

    #[test]
    fn test_property_price_fallback_spelling() {
        let fields = json!({
            "Address": "123 Main St, Kenner, LA 70062",
            "Property Total Price": 185000,
            "Beds": 3,
            "Baths": 2,
        });
        let property = property_from_record("recProp1", &fields);
        assert_eq!(property.attributes.price, Some(185_000.0));
        assert_eq!(property.attributes.zip_code, None);
        assert_eq!(
            property.attributes.address.as_deref(),
            Some("123 Main St, Kenner, LA 70062")
        );
    }

    #[test]
    fn test_property_zip_code_spellings() {
        let a = property_from_record("r1", &json!({"Zip Code": "70062"}));
        let b = property_from_record("r2", &json!({"ZIP Code": "70062"}));
        assert_eq!(a.attributes.zip_code.as_deref(), Some("70062"));
        assert_eq!(b.attributes.zip_code.as_deref(), Some("70062"));
    }

    #[test]
    fn test_number_field_rejects_garbage() {
        assert_eq!(number_field(&json!({"Price": "call for price"}), &["Price"]), None);
        assert_eq!(number_field(&json!({"Price": true}), &["Price"]), None);
        assert_eq!(number_field(&json!({"Price": "$185,000"}), &["Price"]), Some(185_000.0));
    }

    #[test]
    fn test_match_from_record() {
        let fields = json!({
            "Buyer": ["recBuyer1"],
            "Property": ["recProp1"],
            "Match Score": 87,
            "Priority": true,
            "Stage": "Sent to Buyer",
            "Notes": "PRIORITY MATCH - Excellent Match",
            "Distance (miles)": 3.2,
            "Matched At": "2024-11-05T16:20:00+00:00",
        });
        let record = match_from_record("recMatch1", &fields).unwrap();
        assert_eq!(record.buyer_id, "recBuyer1");
        assert_eq!(record.property_id, "recProp1");
        assert_eq!(record.score, 87);
        assert!(record.is_priority);
        assert_eq!(record.stage, PipelineStage::SentToBuyer);
        assert_eq!(record.distance_miles, Some(3.2));
    }

    #[test]
    fn test_match_from_record_missing_links_dropped() {
        assert!(match_from_record("recMatch2", &json!({"Match Score": 50})).is_none());
    }

    #[test]
    fn test_update_fields_never_write_stage() {
        let update = MatchUpdate {
            id: "recMatch1".to_string(),
            score: crate::core::scoring::score_match(&Default::default(), &Default::default()),
            matched_at: Utc::now(),
        };
        let fields = match_update_fields(&update);
        assert!(fields.get(MATCH_STAGE).is_none());
        assert!(fields.get(MATCH_SCORE).is_some());
    }
}
