use std::fmt;

use serde::Deserialize;
use uuid::Uuid;

/// Operating mode as reported by `Con2ACS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HvacMode {
    #[default]
    Off,
    Heat,
    Cool,
    Auto,
}

impl HvacMode {
    pub fn as_value(&self) -> i64 {
        match self {
            HvacMode::Off => 0,
            HvacMode::Heat => 1,
            HvacMode::Cool => 2,
            HvacMode::Auto => 3,
        }
    }

    pub fn from_value(v: i64) -> Option<Self> {
        match v {
            0 => Some(HvacMode::Off),
            1 => Some(HvacMode::Heat),
            2 => Some(HvacMode::Cool),
            3 => Some(HvacMode::Auto),
            _ => None,
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HvacMode::Off => "off",
            HvacMode::Heat => "heat",
            HvacMode::Cool => "cool",
            HvacMode::Auto => "auto",
        };
        write!(f, "{s}")
    }
}

/// Unit the thermostat reports temperatures in on the wire.
///
/// The characteristic host always takes Celsius, so Fahrenheit devices get
/// converted at that boundary and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum DisplayUnits {
    #[serde(rename = "C")]
    Celsius,
    #[default]
    #[serde(rename = "F")]
    Fahrenheit,
}

impl DisplayUnits {
    /// HomeKit display-units characteristic value (0 = C, 1 = F).
    pub fn as_value(&self) -> i64 {
        match self {
            DisplayUnits::Celsius => 0,
            DisplayUnits::Fahrenheit => 1,
        }
    }

    /// Convert a wire value to the host's Celsius.
    pub fn wire_to_host(&self, value: f64) -> f64 {
        match self {
            DisplayUnits::Celsius => value,
            DisplayUnits::Fahrenheit => (value - 32.0) / 1.8,
        }
    }

    /// Convert a host Celsius value to the wire unit.
    pub fn host_to_wire(&self, value: f64) -> f64 {
        match self {
            DisplayUnits::Celsius => value,
            DisplayUnits::Fahrenheit => value * 1.8 + 32.0,
        }
    }
}

/// Ayla key identifying a writable datapoint; reads report it alongside
/// each property value, and a write requires having seen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyKey(pub u64);

/// One entry from `GET /dsns/{dsn}/properties.json`.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub value: serde_json::Value,
    pub key: Option<PropertyKey>,
}

/// Echo of a datapoint write.
#[derive(Debug, Clone, Copy)]
pub struct RemoteWriteResult {
    pub confirmed_value: i64,
}

/// Device record from `GET /devices.json`.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub dsn: String,
    pub product_name: String,
    pub model: String,
    pub sw_version: String,
    pub hwsig: String,
    pub online: bool,
}

impl DeviceInfo {
    /// Stable accessory identifier derived from model + dsn.
    pub fn accessory_id(&self) -> Uuid {
        let name = format!("hx.{}.{}", self.model, self.dsn);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
    }
}

/// Normalized state of one thermostat, keyed by dsn.
///
/// `target_temperature` is derived: the heat setpoint in Heat mode, the
/// cool setpoint in Cool mode, the indoor reading otherwise. It is
/// recomputed on every decode and every confirmed write.
#[derive(Debug, Clone, Default)]
pub struct ThermostatState {
    pub dsn: String,
    pub indoor_temperature: i64,
    pub current_mode: HvacMode,
    pub target_mode: HvacMode,
    pub heat_setpoint: i64,
    pub cool_setpoint: i64,
    pub target_temperature: i64,
    pub display_units: DisplayUnits,
    pub min_setpoint: i64,
    pub max_setpoint: i64,
    pub humidity: Option<f64>,
    pub outdoor_temperature: Option<i64>,
    pub fan_stage: Option<i64>,
    pub override_active: bool,
    pub override_key: Option<PropertyKey>,
    pub override_status_key: Option<PropertyKey>,
    pub mode_key: Option<PropertyKey>,
}

impl ThermostatState {
    pub fn new(dsn: impl Into<String>, display_units: DisplayUnits) -> Self {
        Self {
            dsn: dsn.into(),
            display_units,
            ..Default::default()
        }
    }
}

/// Accessory attributes the bridge pushes to the characteristic host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Characteristic {
    CurrentTemperature,
    TargetTemperature,
    CurrentHeatingCoolingState,
    TargetHeatingCoolingState,
    TemperatureDisplayUnits,
}

/// Capability handle for the automation framework hosting the accessory.
///
/// Injected at construction so the core never touches framework globals.
/// Temperatures arrive in Celsius; mode and unit characteristics carry
/// their integer values.
pub trait CharacteristicHost: Send + Sync {
    fn update_value(&self, dsn: &str, characteristic: Characteristic, value: f64);
}
