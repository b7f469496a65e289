use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::HxClient;
use crate::protocol::{
    PROP_CURRENT_STATE, PROP_FAN_STAGE, PROP_HUMIDITY, PROP_INDOOR_TEMP, PROP_MAX_SETPOINT,
    PROP_MIN_SETPOINT, PROP_MODE_WRITE, PROP_OUTDOOR_TEMP, PROP_TEMP_OVERRIDE,
    PROP_TEMP_OVERRIDE_STATUS,
};
use crate::types::{
    Characteristic, CharacteristicHost, DeviceInfo, DisplayUnits, HvacMode, Property,
    ThermostatState,
};
use crate::{Error, Result, codec, mode};

#[derive(Debug, Clone, Copy)]
pub struct ThermostatOptions {
    pub display_units: DisplayUnits,
    /// Delay between temperature-write attempts; usually the poll interval.
    pub retry_interval: Duration,
    pub max_write_attempts: u32,
}

impl Default for ThermostatOptions {
    fn default() -> Self {
        Self {
            display_units: DisplayUnits::Fahrenheit,
            retry_interval: Duration::from_secs(10),
            max_write_attempts: 10,
        }
    }
}

/// One accessory: the sole owner of a dsn's state.
///
/// All methods take `&mut self`, so polls and commands for a device are
/// mutually exclusive once the thermostat sits behind a per-device mutex
/// (the bridge arranges that). Different devices never contend.
pub struct Thermostat {
    client: Arc<HxClient>,
    host: Arc<dyn CharacteristicHost>,
    info: DeviceInfo,
    state: ThermostatState,
    retry_interval: Duration,
    max_write_attempts: u32,
}

impl Thermostat {
    pub fn new(
        client: Arc<HxClient>,
        host: Arc<dyn CharacteristicHost>,
        info: DeviceInfo,
        options: ThermostatOptions,
    ) -> Self {
        let state = ThermostatState::new(info.dsn.clone(), options.display_units);
        Self {
            client,
            host,
            info,
            state,
            retry_interval: options.retry_interval,
            max_write_attempts: options.max_write_attempts,
        }
    }

    pub fn dsn(&self) -> &str {
        &self.state.dsn
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn accessory_id(&self) -> Uuid {
        self.info.accessory_id()
    }

    pub fn state(&self) -> &ThermostatState {
        &self.state
    }

    /// Host-facing setpoint range in Celsius, clamped to 0..=50.
    pub fn target_range(&self) -> (f64, f64) {
        let units = self.state.display_units;
        let min = units.wire_to_host(self.state.min_setpoint as f64).max(0.0);
        let max = units.wire_to_host(self.state.max_setpoint as f64).min(50.0);
        (min, max)
    }

    /// Pull a full property snapshot, decode it and push every
    /// characteristic to the host.
    ///
    /// A read failure leaves the state exactly as it was and pushes
    /// nothing; the next poll tick retries naturally. The snapshot is
    /// applied to a draft so a partial mapping can never be observed.
    pub async fn refresh(&mut self) -> Result<()> {
        debug!(dsn = %self.state.dsn, "refreshing thermostat state");
        let properties = self.client.read_all_properties(&self.state.dsn).await?;

        let mut next = self.state.clone();
        for property in &properties {
            apply_property(&mut next, property);
        }
        next.target_temperature = mode::effective_target(&next);
        next.target_mode = next.current_mode;
        self.state = next;

        self.push_all();
        Ok(())
    }

    /// Live read of the indoor temperature (`IDTmp1`), in host Celsius.
    pub async fn current_temperature(&mut self) -> Result<f64> {
        let property = self
            .client
            .read_property(&self.state.dsn, PROP_INDOOR_TEMP)
            .await?;
        if let Some(value) = property.value.as_i64() {
            self.state.indoor_temperature = value;
        }
        Ok(self
            .state
            .display_units
            .wire_to_host(self.state.indoor_temperature as f64))
    }

    /// Live read of the operating state (`Con2ACS`).
    pub async fn current_state(&mut self) -> Result<HvacMode> {
        let property = self
            .client
            .read_property(&self.state.dsn, PROP_CURRENT_STATE)
            .await?;
        if let Some(new_mode) = property.value.as_i64().and_then(HvacMode::from_value) {
            self.state.current_mode = new_mode;
            self.state.target_temperature = mode::effective_target(&self.state);
        }
        Ok(self.state.current_mode)
    }

    /// Derived target temperature in host Celsius, refreshed first so the
    /// host reports a current value.
    pub async fn target_temperature(&mut self) -> Result<f64> {
        self.refresh().await?;
        Ok(self
            .state
            .display_units
            .wire_to_host(self.state.target_temperature as f64))
    }

    /// Set the target temperature (host Celsius).
    ///
    /// A no-op success when the thermostat is off. Otherwise encodes the
    /// packed override, writes it, verifies the echo, and retries the
    /// whole attempt once per interval until confirmed or the attempt cap
    /// is hit. State changes only after a confirmed write.
    pub async fn set_target_temperature(&mut self, celsius: f64) -> Result<()> {
        if !mode::can_set_temperature(self.state.current_mode) {
            debug!(dsn = %self.state.dsn, "thermostat is off, ignoring temperature change");
            return Ok(());
        }
        if self.state.override_key.is_none() {
            return Err(Error::MissingPropertyKey(PROP_TEMP_OVERRIDE));
        }

        let requested = self.state.display_units.host_to_wire(celsius).round() as i64;
        let (heat, cool) = mode::apply_temperature_change(&self.state, requested);
        let packed = codec::encode(heat, cool)?;
        debug!(dsn = %self.state.dsn, heat, cool, packed, "setting target temperature");

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self
                .client
                .write_datapoint(&self.state.dsn, PROP_TEMP_OVERRIDE, packed)
                .await
            {
                Ok(result) if result.confirmed_value == packed => {
                    self.confirm_setpoints(heat, cool).await;
                    return Ok(());
                }
                Ok(result) => {
                    warn!(
                        dsn = %self.state.dsn,
                        requested = packed,
                        confirmed = result.confirmed_value,
                        attempt,
                        "setpoint write not confirmed, trying again"
                    );
                }
                Err(e) => {
                    warn!(dsn = %self.state.dsn, attempt, "setpoint write failed: {e}, trying again");
                }
            }

            if attempt >= self.max_write_attempts {
                return Err(Error::RetriesExhausted {
                    dsn: self.state.dsn.clone(),
                    attempts: attempt,
                });
            }
            tokio::time::sleep(self.retry_interval).await;
        }
    }

    /// Set the operating mode. Mode writes are verified but never retried;
    /// a mismatch or transport failure surfaces to the caller.
    pub async fn set_target_mode(&mut self, target: HvacMode) -> Result<()> {
        if self.state.mode_key.is_none() {
            return Err(Error::MissingPropertyKey(PROP_MODE_WRITE));
        }

        let value = target.as_value();
        debug!(dsn = %self.state.dsn, mode = %target, "setting mode");
        let result = self
            .client
            .write_datapoint(&self.state.dsn, PROP_MODE_WRITE, value)
            .await?;
        if result.confirmed_value != value {
            return Err(Error::VerificationMismatch {
                property: PROP_MODE_WRITE.to_string(),
                requested: value,
                confirmed: result.confirmed_value,
            });
        }

        self.state.current_mode = target;
        self.state.target_mode = target;
        self.state.target_temperature = mode::effective_target(&self.state);

        self.push(
            Characteristic::CurrentHeatingCoolingState,
            self.state.current_mode.as_value() as f64,
        );
        self.push(
            Characteristic::TargetHeatingCoolingState,
            self.state.target_mode.as_value() as f64,
        );
        Ok(())
    }

    async fn confirm_setpoints(&mut self, heat: i64, cool: i64) {
        // The override only takes effect once the status flag is raised.
        // The original discarded this result too, so a failure here is
        // logged but does not un-confirm the setpoint write.
        if let Err(e) = self
            .client
            .write_datapoint(&self.state.dsn, PROP_TEMP_OVERRIDE_STATUS, 1)
            .await
        {
            warn!(dsn = %self.state.dsn, "override status write failed: {e}");
        } else {
            self.state.override_active = true;
        }

        self.state.heat_setpoint = heat;
        self.state.cool_setpoint = cool;
        self.state.target_temperature = mode::effective_target(&self.state);

        self.push(
            Characteristic::TargetTemperature,
            self.state
                .display_units
                .wire_to_host(self.state.target_temperature as f64),
        );
    }

    fn push_all(&self) {
        let units = self.state.display_units;
        self.push(
            Characteristic::CurrentTemperature,
            units.wire_to_host(self.state.indoor_temperature as f64),
        );
        self.push(
            Characteristic::TargetTemperature,
            units.wire_to_host(self.state.target_temperature as f64),
        );
        self.push(
            Characteristic::CurrentHeatingCoolingState,
            self.state.current_mode.as_value() as f64,
        );
        self.push(
            Characteristic::TargetHeatingCoolingState,
            self.state.target_mode.as_value() as f64,
        );
        self.push(
            Characteristic::TemperatureDisplayUnits,
            units.as_value() as f64,
        );
    }

    fn push(&self, characteristic: Characteristic, value: f64) {
        self.host.update_value(&self.state.dsn, characteristic, value);
    }
}

fn apply_property(state: &mut ThermostatState, property: &Property) {
    match property.name.as_str() {
        PROP_INDOOR_TEMP => {
            if let Some(v) = property.value.as_i64() {
                state.indoor_temperature = v;
            }
        }
        PROP_CURRENT_STATE => {
            if let Some(m) = property.value.as_i64().and_then(HvacMode::from_value) {
                state.current_mode = m;
            }
        }
        PROP_TEMP_OVERRIDE => {
            if let Some(packed) = property.value.as_i64() {
                let (heat, cool) = codec::decode_with_fallback(packed);
                state.heat_setpoint = heat;
                state.cool_setpoint = cool;
            }
            state.override_key = property.key.or(state.override_key);
        }
        PROP_TEMP_OVERRIDE_STATUS => {
            state.override_active = property.value.as_i64().unwrap_or(0) != 0;
            state.override_status_key = property.key.or(state.override_status_key);
        }
        PROP_MIN_SETPOINT => {
            if let Some(v) = property.value.as_i64() {
                state.min_setpoint = v;
            }
        }
        // ClStptMax doubles as the mode-write target, so its key is kept.
        PROP_MAX_SETPOINT => {
            if let Some(v) = property.value.as_i64() {
                state.max_setpoint = v;
            }
            state.mode_key = property.key.or(state.mode_key);
        }
        PROP_HUMIDITY => {
            if let Some(v) = property.value.as_f64() {
                state.humidity = Some(v);
            }
        }
        PROP_OUTDOOR_TEMP => {
            if let Some(v) = property.value.as_i64() {
                state.outdoor_temperature = Some(v);
            }
        }
        PROP_FAN_STAGE => {
            if let Some(v) = property.value.as_i64() {
                state.fan_stage = Some(v);
            }
        }
        // Unknown properties are not errors; the device reports plenty the
        // accessory model has no use for.
        _ => {}
    }
}
