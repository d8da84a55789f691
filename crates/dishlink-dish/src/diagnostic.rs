//! Tolerant parsing of the dish diagnostic payload.
//!
//! The dish firmware has shipped (at least) three shapes for location
//! data over the years:
//!
//! - flat: `{"lat": …, "lon": …, "alt": …}`
//! - nested GPS stats: `{"gpsStats": {"latitude": …, …}}`
//! - diagnostic document: `{"location": {"latitude": …, "longitude": …,
//!   "altitudeMeters": …}}`
//!
//! All three are accepted, with both snake_case and camelCase key
//! spellings, and numeric values given either as JSON numbers or as
//! numeric strings.

use serde_json::Value;

/// A position extracted from a diagnostic payload.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub speed_knots: f64,
    pub heading_deg: f64,
    pub fix_valid: bool,
}

/// First numeric value found under any of the given keys.
fn float_field(value: &Value, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|name| {
        let field = value.get(name)?;
        field
            .as_f64()
            .or_else(|| field.as_str().and_then(|s| s.trim().parse().ok()))
    })
}

/// First boolean value found under any of the given keys.
fn bool_field(value: &Value, names: &[&str]) -> Option<bool> {
    names.iter().find_map(|name| value.get(name)?.as_bool())
}

/// Try to read a full location from one JSON object.
fn location_from(value: &Value) -> Option<Location> {
    let latitude = float_field(value, &["lat", "latitude"])?;
    let longitude = float_field(value, &["lon", "longitude"])?;
    let altitude_m =
        float_field(value, &["alt", "altitude", "altitude_m", "altitudeMeters"]).unwrap_or(0.0);
    let speed_knots = float_field(value, &["speed_knots", "speedKnots"]).unwrap_or(0.0);
    let heading_deg = float_field(value, &["heading", "heading_deg", "headingDeg"]).unwrap_or(0.0);
    let fix_valid = bool_field(value, &["valid", "gps_valid", "gpsValid"]).unwrap_or(true);
    Some(Location {
        latitude,
        longitude,
        altitude_m,
        speed_knots,
        heading_deg,
        fix_valid,
    })
}

/// Extract a location from a raw response body.
///
/// The body is usually JSON, but some dish UI builds answer the root
/// path with HTML that has the diagnostic object embedded in a script
/// block; in that case the first balanced `{…}` is pulled out and
/// parsed instead.
pub(crate) fn extract_location_from_text(body: &str) -> Option<Location> {
    if let Ok(payload) = serde_json::from_str::<Value>(body) {
        return extract_location(&payload);
    }
    let payload: Value = serde_json::from_str(first_json_object(body)?).ok()?;
    extract_location(&payload)
}

/// The first balanced `{…}` substring, by plain brace counting.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, byte) in text[start..].bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract a location from any of the known payload shapes.
pub(crate) fn extract_location(payload: &Value) -> Option<Location> {
    location_from(payload)
        .or_else(|| {
            payload
                .get("gps_stats")
                .or_else(|| payload.get("gpsStats"))
                .and_then(location_from)
        })
        .or_else(|| {
            payload
                .get("location")
                .or_else(|| payload.get("position"))
                .and_then(location_from)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_payload() {
        let payload = json!({"lat": 37.7749, "lon": -122.4194, "alt": 30.25});
        let loc = extract_location(&payload).unwrap();
        assert_eq!(loc.latitude, 37.7749);
        assert_eq!(loc.longitude, -122.4194);
        assert_eq!(loc.altitude_m, 30.25);
        assert!(loc.fix_valid);
    }

    #[test]
    fn diagnostic_document_payload() {
        let payload = json!({
            "id": "ut01000000-00000000-12345678",
            "location": {
                "latitude": 48.8566,
                "longitude": 2.3522,
                "altitudeMeters": 35.0
            }
        });
        let loc = extract_location(&payload).unwrap();
        assert_eq!(loc.latitude, 48.8566);
        assert_eq!(loc.longitude, 2.3522);
        assert_eq!(loc.altitude_m, 35.0);
    }

    #[test]
    fn nested_gps_stats_payload() {
        let payload = json!({
            "gpsStats": {"latitude": -33.8688, "longitude": 151.2093, "gpsValid": false}
        });
        let loc = extract_location(&payload).unwrap();
        assert_eq!(loc.latitude, -33.8688);
        assert!(!loc.fix_valid);
        assert_eq!(loc.altitude_m, 0.0);
    }

    #[test]
    fn numeric_strings_accepted() {
        let payload = json!({"latitude": "37.7749", "longitude": " -122.4194 "});
        let loc = extract_location(&payload).unwrap();
        assert_eq!(loc.latitude, 37.7749);
        assert_eq!(loc.longitude, -122.4194);
    }

    #[test]
    fn missing_longitude_is_no_location() {
        let payload = json!({"location": {"latitude": 37.7749}});
        assert!(extract_location(&payload).is_none());
    }

    #[test]
    fn non_object_is_no_location() {
        assert!(extract_location(&json!(null)).is_none());
        assert!(extract_location(&json!([1, 2, 3])).is_none());
        assert!(extract_location(&json!("nope")).is_none());
    }

    #[test]
    fn plain_json_text() {
        let loc = extract_location_from_text(r#"{"lat": 1.5, "lon": 2.5}"#).unwrap();
        assert_eq!(loc.latitude, 1.5);
        assert_eq!(loc.longitude, 2.5);
    }

    #[test]
    fn html_with_embedded_json_object() {
        let body = concat!(
            "<html><head><title>Dish</title></head><body><script>",
            r#"var status = {"location": {"latitude": 37.7749, "longitude": -122.4194, "altitudeMeters": 30.25}};"#,
            "</script></body></html>"
        );
        let loc = extract_location_from_text(body).unwrap();
        assert_eq!(loc.latitude, 37.7749);
        assert_eq!(loc.longitude, -122.4194);
        assert_eq!(loc.altitude_m, 30.25);
    }

    #[test]
    fn html_without_a_balanced_object_is_no_location() {
        assert!(extract_location_from_text("<html>latitude: {broken").is_none());
        assert!(extract_location_from_text("<html>no json here</html>").is_none());
    }

    #[test]
    fn first_json_object_spans_nested_braces() {
        let text = "prefix {\"a\": {\"b\": 1}} suffix {\"c\": 2}";
        assert_eq!(first_json_object(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn speed_and_heading_default_to_zero() {
        let payload = json!({"lat": 1.0, "lon": 2.0});
        let loc = extract_location(&payload).unwrap();
        assert_eq!(loc.speed_knots, 0.0);
        assert_eq!(loc.heading_deg, 0.0);
    }
}
