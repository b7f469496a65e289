//! Ayla cloud API wire format: paths, property mnemonics, request bodies
//! and tolerant response parsers.

use serde_json::{Value, json};

use crate::types::{DeviceInfo, Property, PropertyKey};

pub const DEFAULT_API_BASE: &str = "https://ads-field.aylanetworks.com/apiv1";
pub const DEFAULT_AUTH_BASE: &str = "https://user-field.aylanetworks.com";

// Vendor application identity the cloud expects at sign-in.
pub const APP_ID: &str = "JCI-iOS-Thermostat280-id";
pub const APP_SECRET: &str = "JCI-iOS-Thermostat280--II9aj3PKLxAckfmXBIDFWkWxVI";

// Property mnemonics. `PROP_MODE_WRITE` is not a typo: the vendor firmware
// applies mode changes written to the max-cool-setpoint datapoint, and a
// dedicated mode endpoint does not exist.
pub const PROP_TEMP_OVERRIDE: &str = "TmpOvr1";
pub const PROP_TEMP_OVERRIDE_STATUS: &str = "TmpOvrSt";
pub const PROP_MODE_WRITE: &str = "ClStptMax";
pub const PROP_MIN_SETPOINT: &str = "HtStptMin";
pub const PROP_MAX_SETPOINT: &str = "ClStptMax";
pub const PROP_INDOOR_TEMP: &str = "IDTmp1";
pub const PROP_OUTDOOR_TEMP: &str = "ODTmp";
pub const PROP_CURRENT_STATE: &str = "Con2ACS";
pub const PROP_HUMIDITY: &str = "Hum1";
pub const PROP_FAN_STAGE: &str = "FanStg1";

pub fn sign_in_path() -> &'static str {
    "/users/sign_in.json"
}

pub fn devices_path() -> &'static str {
    "/devices.json"
}

pub fn properties_path(dsn: &str) -> String {
    format!("/dsns/{dsn}/properties.json")
}

pub fn property_path(dsn: &str, name: &str) -> String {
    format!("/dsns/{dsn}/properties/{name}")
}

pub fn datapoints_path(dsn: &str, name: &str) -> String {
    format!("/dsns/{dsn}/properties/{name}/datapoints.json")
}

pub fn sign_in_body(email: &str, password: &str) -> Value {
    json!({
        "user": {
            "email": email,
            "password": password,
            "application": {
                "app_id": APP_ID,
                "app_secret": APP_SECRET
            }
        }
    })
}

pub fn datapoint_body(value: i64) -> Value {
    json!({
        "datapoint": {
            "value": value,
            "metadata": null
        }
    })
}

pub fn parse_sign_in_response(body: &Value) -> Option<String> {
    body.get("access_token")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

pub fn parse_devices_response(body: &Value) -> Vec<DeviceInfo> {
    let entries = match body {
        Value::Array(entries) => entries,
        _ => return vec![],
    };
    entries
        .iter()
        .filter_map(|entry| {
            let device = entry.get("device")?;
            let dsn = device.get("dsn")?.as_str()?.to_string();
            Some(DeviceInfo {
                dsn,
                product_name: string_field(device, "product_name"),
                model: string_field(device, "model"),
                sw_version: string_field(device, "sw_version"),
                hwsig: string_field(device, "hwsig"),
                online: device.get("connection_status").and_then(|v| v.as_str())
                    == Some("Online"),
            })
        })
        .collect()
}

pub fn parse_properties_response(body: &Value) -> Vec<Property> {
    let entries = match body {
        Value::Array(entries) => entries,
        _ => return vec![],
    };
    entries
        .iter()
        .filter_map(|entry| parse_property(entry.get("property")?))
        .collect()
}

pub fn parse_property_response(body: &Value) -> Option<Property> {
    parse_property(body.get("property")?)
}

pub fn parse_datapoint_response(body: &Value) -> Option<i64> {
    body.pointer("/datapoint/value")?.as_i64()
}

fn parse_property(property: &Value) -> Option<Property> {
    let name = property.get("name")?.as_str()?.to_string();
    Some(Property {
        name,
        value: property.get("value").cloned().unwrap_or(Value::Null),
        key: property
            .get("key")
            .and_then(|v| v.as_u64())
            .map(PropertyKey),
    })
}

fn string_field(obj: &Value, field: &str) -> String {
    obj.get(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datapoint_body_structure() {
        let body = datapoint_body(18506);
        assert_eq!(body["datapoint"]["value"], 18506);
        assert!(body["datapoint"]["metadata"].is_null());
    }

    #[test]
    fn sign_in_body_carries_app_identity() {
        let body = sign_in_body("me@example.com", "hunter2");
        assert_eq!(body["user"]["email"], "me@example.com");
        assert_eq!(body["user"]["application"]["app_id"], APP_ID);
        assert_eq!(body["user"]["application"]["app_secret"], APP_SECRET);
    }

    #[test]
    fn paths() {
        assert_eq!(
            properties_path("AC000W000000001"),
            "/dsns/AC000W000000001/properties.json"
        );
        assert_eq!(
            property_path("AC000W000000001", PROP_INDOOR_TEMP),
            "/dsns/AC000W000000001/properties/IDTmp1"
        );
        assert_eq!(
            datapoints_path("AC000W000000001", PROP_TEMP_OVERRIDE),
            "/dsns/AC000W000000001/properties/TmpOvr1/datapoints.json"
        );
    }

    #[test]
    fn parse_properties_with_keys() {
        let body = serde_json::json!([
            {"property": {"name": "TmpOvr1", "value": 18506, "key": 123}},
            {"property": {"name": "IDTmp1", "value": 71}},
            {"not_a_property": {}}
        ]);
        let props = parse_properties_response(&body);
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].name, "TmpOvr1");
        assert_eq!(props[0].value, serde_json::json!(18506));
        assert_eq!(props[0].key, Some(PropertyKey(123)));
        assert_eq!(props[1].key, None);
    }

    #[test]
    fn parse_properties_non_array() {
        assert!(parse_properties_response(&serde_json::json!({"error": "nope"})).is_empty());
    }

    #[test]
    fn parse_devices() {
        let body = serde_json::json!([
            {"device": {
                "dsn": "AC000W000000001",
                "product_name": "Hallway",
                "model": "Hx3",
                "sw_version": "2.8.0",
                "hwsig": "ABC123",
                "connection_status": "Online"
            }},
            {"device": {"dsn": "AC000W000000002", "connection_status": "Offline"}}
        ]);
        let devices = parse_devices_response(&body);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].dsn, "AC000W000000001");
        assert_eq!(devices[0].product_name, "Hallway");
        assert!(devices[0].online);
        assert!(!devices[1].online);
    }

    #[test]
    fn parse_datapoint_echo() {
        let body = serde_json::json!({"datapoint": {"value": 18506, "metadata": null}});
        assert_eq!(parse_datapoint_response(&body), Some(18506));
        assert_eq!(parse_datapoint_response(&serde_json::json!({})), None);
    }

    #[test]
    fn parse_sign_in() {
        let body = serde_json::json!({"access_token": "abc", "refresh_token": "def"});
        assert_eq!(parse_sign_in_response(&body).as_deref(), Some("abc"));
        assert_eq!(parse_sign_in_response(&serde_json::json!({})), None);
    }

    #[test]
    fn mode_write_targets_max_cool_setpoint() {
        assert_eq!(PROP_MODE_WRITE, PROP_MAX_SETPOINT);
    }
}
