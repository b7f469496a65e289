mod bridge;
mod client;
pub mod codec;
mod config;
mod error;
mod logger;
pub mod mode;
mod protocol;
mod thermostat;
mod types;

pub use bridge::{Bridge, BridgeBuilder};
pub use client::{HxClient, HxClientBuilder};
pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use thermostat::{Thermostat, ThermostatOptions};
pub use types::*;
