use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::client::HxClient;
use crate::config::BridgeConfig;
use crate::thermostat::{Thermostat, ThermostatOptions};
use crate::types::{CharacteristicHost, DeviceInfo, DisplayUnits};
use crate::{Error, Result};

const DEFAULT_DISCOVERY_INTERVAL: Duration = Duration::from_secs(600);
const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 10;

pub struct BridgeBuilder {
    config: BridgeConfig,
    host: Arc<dyn CharacteristicHost>,
    client: Option<Arc<HxClient>>,
    discovery_interval: Duration,
    max_write_attempts: u32,
}

impl BridgeBuilder {
    pub fn new(config: BridgeConfig, host: Arc<dyn CharacteristicHost>) -> Self {
        Self {
            config,
            host,
            client: None,
            discovery_interval: DEFAULT_DISCOVERY_INTERVAL,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }

    /// Use a pre-built API client instead of the default production one.
    pub fn client(mut self, client: Arc<HxClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn discovery_interval(mut self, interval: Duration) -> Self {
        self.discovery_interval = interval;
        self
    }

    pub fn max_write_attempts(mut self, attempts: u32) -> Self {
        self.max_write_attempts = attempts;
        self
    }

    pub fn build(self) -> Bridge {
        let client = self
            .client
            .unwrap_or_else(|| Arc::new(HxClient::builder().build()));
        Bridge {
            client,
            host: self.host,
            email: self.config.email,
            password: self.config.password,
            poll_interval: Duration::from_secs(self.config.interval_secs),
            display_units: self.config.display_units,
            discovery_interval: self.discovery_interval,
            max_write_attempts: self.max_write_attempts,
            thermostats: HashMap::new(),
        }
    }
}

struct Entry {
    thermostat: Arc<Mutex<Thermostat>>,
    product_name: String,
    poll_task: JoinHandle<()>,
}

/// Accessory registry and scheduler: discovers devices on the account,
/// keeps exactly one [`Thermostat`] per dsn, and runs one self-rescheduling
/// poll task per device.
pub struct Bridge {
    client: Arc<HxClient>,
    host: Arc<dyn CharacteristicHost>,
    email: String,
    password: String,
    poll_interval: Duration,
    display_units: DisplayUnits,
    discovery_interval: Duration,
    max_write_attempts: u32,
    thermostats: HashMap<String, Entry>,
}

impl Bridge {
    pub fn builder(config: BridgeConfig, host: Arc<dyn CharacteristicHost>) -> BridgeBuilder {
        BridgeBuilder::new(config, host)
    }

    /// Discovery and polling forever. Discovery failures are logged and
    /// retried on the next cycle; they never tear down existing accessories.
    pub async fn run(&mut self) {
        loop {
            if let Err(e) = self.discover().await {
                warn!("device discovery failed: {e}");
            }
            tokio::time::sleep(self.discovery_interval).await;
        }
    }

    /// One discovery pass: authenticate if needed, list devices, register
    /// new ones, replace renamed ones, drop ones the account lost.
    pub async fn discover(&mut self) -> Result<()> {
        if !self.client.is_authenticated() {
            info!("authenticating");
            self.client.login(&self.email, &self.password).await?;
        }

        debug!("fetching devices");
        let devices = self.client.devices().await?;
        for device in &devices {
            match self.thermostats.get(&device.dsn) {
                None => {
                    info!(dsn = %device.dsn, name = %device.product_name, "adding device");
                    self.add_device(device.clone()).await;
                }
                Some(entry) if entry.product_name != device.product_name => {
                    info!(dsn = %device.dsn, "device renamed, replacing accessory");
                    self.add_device(device.clone()).await;
                }
                Some(_) => trace!(dsn = %device.dsn, "device already registered"),
            }
        }

        // An empty device list is more likely a flaky backend than an
        // account with every thermostat deleted; keep what we have.
        if !devices.is_empty() {
            let stale: Vec<String> = self
                .thermostats
                .keys()
                .filter(|dsn| !devices.iter().any(|d| &d.dsn == *dsn))
                .cloned()
                .collect();
            for dsn in stale {
                info!(dsn = %dsn, "removing accessory that no longer exists");
                self.remove_device(&dsn);
            }
        }
        Ok(())
    }

    /// Register a thermostat for `info.dsn`, replacing (never duplicating)
    /// any existing accessory for the same dsn.
    pub async fn add_device(&mut self, info: DeviceInfo) {
        self.remove_device(&info.dsn);

        let options = ThermostatOptions {
            display_units: self.display_units,
            retry_interval: self.poll_interval,
            max_write_attempts: self.max_write_attempts,
        };
        let mut thermostat =
            Thermostat::new(self.client.clone(), self.host.clone(), info.clone(), options);
        if let Err(e) = thermostat.refresh().await {
            warn!(dsn = %info.dsn, "initial refresh failed: {e}");
        }

        let thermostat = Arc::new(Mutex::new(thermostat));
        let poll_task = self.spawn_poll_task(info.dsn.clone(), thermostat.clone());
        self.thermostats.insert(
            info.dsn.clone(),
            Entry {
                thermostat,
                product_name: info.product_name,
                poll_task,
            },
        );
    }

    pub fn remove_device(&mut self, dsn: &str) {
        if let Some(entry) = self.thermostats.remove(dsn) {
            debug!(dsn, "removing accessory");
            entry.poll_task.abort();
        }
    }

    pub fn thermostat(&self, dsn: &str) -> Option<Arc<Mutex<Thermostat>>> {
        self.thermostats
            .get(dsn)
            .map(|entry| entry.thermostat.clone())
    }

    pub fn dsns(&self) -> Vec<String> {
        self.thermostats.keys().cloned().collect()
    }

    pub async fn set_target_temperature(&self, dsn: &str, celsius: f64) -> Result<()> {
        let thermostat = self
            .thermostat(dsn)
            .ok_or_else(|| Error::UnknownDevice(dsn.to_string()))?;
        let mut thermostat = thermostat.lock().await;
        thermostat.set_target_temperature(celsius).await
    }

    pub async fn set_target_mode(&self, dsn: &str, mode: crate::types::HvacMode) -> Result<()> {
        let thermostat = self
            .thermostat(dsn)
            .ok_or_else(|| Error::UnknownDevice(dsn.to_string()))?;
        let mut thermostat = thermostat.lock().await;
        thermostat.set_target_mode(mode).await
    }

    fn spawn_poll_task(
        &self,
        dsn: String,
        thermostat: Arc<Mutex<Thermostat>>,
    ) -> JoinHandle<()> {
        let interval = self.poll_interval;
        tokio::spawn(async move {
            // Self-rescheduling: the next tick is only armed after this
            // one finishes, so a slow remote call delays but never
            // overlaps a poll for the same device.
            loop {
                tokio::time::sleep(interval).await;
                if let Err(e) = thermostat.lock().await.refresh().await {
                    warn!(dsn = %dsn, "poll failed: {e}");
                }
            }
        })
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        for entry in self.thermostats.values() {
            entry.poll_task.abort();
        }
    }
}
