//! ADS-B Exchange aircraft record and its mapping to a snapshot.

use jumprun_core::TelemetrySnapshot;
use serde::Deserialize;
use serde_json::Value;

/// Barometric altitude is either feet or the literal `"ground"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BaroAltitude {
    Feet(f64),
    Label(String),
}

/// Fields of an ADS-B Exchange v2 aircraft object that we use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdsbAircraft {
    pub hex: String,
    /// Aircraft type designator, e.g. "DHC6"
    #[serde(default)]
    pub t: Option<String>,
    #[serde(default)]
    pub alt_geom: Option<f64>,
    #[serde(default)]
    pub alt_baro: Option<BaroAltitude>,
    #[serde(default)]
    pub gs: Option<f64>,
    #[serde(default)]
    pub track: Option<f64>,
    #[serde(default)]
    pub geom_rate: Option<f64>,
    #[serde(default)]
    pub baro_rate: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// MCP/FCU selected altitude
    #[serde(default)]
    pub nav_altitude_mcp: Option<f64>,
}

impl AdsbAircraft {
    pub fn to_snapshot(&self) -> TelemetrySnapshot {
        let altitude_barometric = match &self.alt_baro {
            Some(BaroAltitude::Feet(feet)) => Some(*feet),
            Some(BaroAltitude::Label(label)) if label.eq_ignore_ascii_case("ground") => Some(0.0),
            _ => None,
        };

        TelemetrySnapshot {
            altitude: self.alt_geom,
            altitude_barometric,
            vertical_speed: self.geom_rate.or(self.baro_rate),
            ground_speed: self.gs,
            ground_track: self.track,
            latitude: self.lat,
            longitude: self.lon,
            aircraft_type: self.t.clone(),
            target_altitude: self.nav_altitude_mcp,
        }
    }
}

/// Pull the aircraft record out of a response body.
///
/// Accepts the list form (`{"ac": [..]}`, first entry wins) and the bare
/// single-aircraft form. A missing or empty `hex` means no aircraft.
pub fn parse_aircraft(payload: Value) -> Option<AdsbAircraft> {
    let record = match payload {
        Value::Object(mut map) => match map.remove("ac") {
            Some(Value::Array(list)) => list.into_iter().next()?,
            Some(_) => return None,
            None => Value::Object(map),
        },
        _ => return None,
    };

    let has_hex = record
        .get("hex")
        .and_then(Value::as_str)
        .is_some_and(|hex| !hex.trim().is_empty());
    if !has_hex {
        return None;
    }

    match serde_json::from_value::<AdsbAircraft>(record) {
        Ok(aircraft) => Some(aircraft),
        Err(err) => {
            tracing::debug!("Malformed aircraft record: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_response_maps_all_fields() {
        let payload = json!({
            "ac": [{
                "hex": "a06796",
                "t": "DHC6",
                "alt_baro": 11875,
                "alt_geom": 12300,
                "gs": 102.4,
                "track": 301.2,
                "geom_rate": 1088,
                "baro_rate": 960,
                "lat": 40.171,
                "lon": -105.201,
                "nav_altitude_mcp": 13008
            }],
            "msg": "No error",
            "total": 1
        });

        let snapshot = parse_aircraft(payload).unwrap().to_snapshot();
        assert_eq!(snapshot.altitude, Some(12300.0));
        assert_eq!(snapshot.altitude_barometric, Some(11875.0));
        assert_eq!(snapshot.vertical_speed, Some(1088.0));
        assert_eq!(snapshot.ground_speed, Some(102.4));
        assert_eq!(snapshot.ground_track, Some(301.2));
        assert_eq!(snapshot.latitude, Some(40.171));
        assert_eq!(snapshot.longitude, Some(-105.201));
        assert_eq!(snapshot.aircraft_type.as_deref(), Some("DHC6"));
        assert_eq!(snapshot.target_altitude, Some(13008.0));
    }

    #[test]
    fn test_baro_rate_is_fallback_for_vertical_speed() {
        let payload = json!({"hex": "ACBC30", "baro_rate": -640, "alt_baro": "ground"});

        let snapshot = parse_aircraft(payload).unwrap().to_snapshot();
        assert_eq!(snapshot.vertical_speed, Some(-640.0));
        assert_eq!(snapshot.altitude_barometric, Some(0.0));
        assert!(snapshot.altitude.is_none());
    }

    #[test]
    fn test_empty_results_are_no_data() {
        assert!(parse_aircraft(json!({"ac": [], "msg": "No error"})).is_none());
        assert!(parse_aircraft(json!({"ac": null})).is_none());
        assert!(parse_aircraft(json!({"msg": "No error"})).is_none());
        assert!(parse_aircraft(json!({"hex": ""})).is_none());
        assert!(parse_aircraft(json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_wrongly_typed_field_is_no_data() {
        assert!(parse_aircraft(json!({"hex": "ACBC30", "gs": "fast"})).is_none());
    }
}
