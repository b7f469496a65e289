use std::env;
use std::sync::Arc;

use hx_thermostat::{Bridge, BridgeConfig, Characteristic, CharacteristicHost, DisplayUnits};

struct ConsoleHost;

impl CharacteristicHost for ConsoleHost {
    fn update_value(&self, dsn: &str, characteristic: Characteristic, value: f64) {
        match characteristic {
            Characteristic::CurrentTemperature | Characteristic::TargetTemperature => {
                println!("[{dsn}] {characteristic:?} = {value:.1}\u{00b0}C");
            }
            _ => println!("[{dsn}] {characteristic:?} = {value}"),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let email = env::var("HX_EMAIL").expect("set HX_EMAIL");
    let password = env::var("HX_PASSWORD").expect("set HX_PASSWORD");
    let display_units = match env::var("HX_UNITS").as_deref() {
        Ok("C") => DisplayUnits::Celsius,
        _ => DisplayUnits::Fahrenheit,
    };

    let config = BridgeConfig {
        name: "Hx3 Thermostat".to_string(),
        email,
        password,
        interval_secs: 10,
        display_units,
    };

    let mut bridge = Bridge::builder(config, Arc::new(ConsoleHost)).build();
    println!("Discovering thermostats...");
    bridge.run().await;
}
