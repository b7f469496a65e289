//! Mode-dependent interpretation of setpoints.

use crate::types::{HvacMode, ThermostatState};

/// Target temperature implied by the current mode.
///
/// Off and Auto both fall back to the ambient reading; the device never
/// reports a distinct Auto setpoint.
pub fn effective_target(state: &ThermostatState) -> i64 {
    match state.current_mode {
        HvacMode::Heat => state.heat_setpoint,
        HvacMode::Cool => state.cool_setpoint,
        HvacMode::Off | HvacMode::Auto => state.indoor_temperature,
    }
}

/// Whether a temperature write is permitted. Callers short-circuit with a
/// no-op when this is false rather than raising an error.
pub fn can_set_temperature(mode: HvacMode) -> bool {
    mode != HvacMode::Off
}

/// New (heat, cool) pair for a requested target, leaving the setpoint not
/// selected by the current mode untouched.
pub fn apply_temperature_change(state: &ThermostatState, requested: i64) -> (i64, i64) {
    match state.current_mode {
        HvacMode::Heat => (requested, state.cool_setpoint),
        HvacMode::Cool => (state.heat_setpoint, requested),
        HvacMode::Off | HvacMode::Auto => (state.heat_setpoint, state.cool_setpoint),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DisplayUnits;

    fn sample_state(mode: HvacMode) -> ThermostatState {
        ThermostatState {
            current_mode: mode,
            indoor_temperature: 69,
            heat_setpoint: 72,
            cool_setpoint: 74,
            ..ThermostatState::new("AC000W000000001", DisplayUnits::Fahrenheit)
        }
    }

    #[test]
    fn effective_target_per_mode() {
        assert_eq!(effective_target(&sample_state(HvacMode::Heat)), 72);
        assert_eq!(effective_target(&sample_state(HvacMode::Cool)), 74);
        assert_eq!(effective_target(&sample_state(HvacMode::Off)), 69);
        assert_eq!(effective_target(&sample_state(HvacMode::Auto)), 69);
    }

    #[test]
    fn only_off_blocks_temperature_writes() {
        assert!(!can_set_temperature(HvacMode::Off));
        assert!(can_set_temperature(HvacMode::Heat));
        assert!(can_set_temperature(HvacMode::Cool));
        assert!(can_set_temperature(HvacMode::Auto));
    }

    #[test]
    fn heat_mode_changes_only_heat() {
        let state = sample_state(HvacMode::Heat);
        assert_eq!(apply_temperature_change(&state, 70), (70, 74));
    }

    #[test]
    fn cool_mode_changes_only_cool() {
        let state = sample_state(HvacMode::Cool);
        assert_eq!(apply_temperature_change(&state, 76), (72, 76));
    }

    #[test]
    fn other_modes_change_nothing() {
        for mode in [HvacMode::Off, HvacMode::Auto] {
            let state = sample_state(mode);
            assert_eq!(apply_temperature_change(&state, 70), (72, 74));
        }
    }
}
