use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use serde_json::Value;
use tracing::{debug, trace};

use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    DEFAULT_API_BASE, DEFAULT_AUTH_BASE, datapoint_body, datapoints_path, devices_path,
    parse_datapoint_response, parse_devices_response, parse_properties_response,
    parse_property_response, parse_sign_in_response, properties_path, property_path, sign_in_body,
    sign_in_path,
};
use crate::types::{DeviceInfo, Property, RemoteWriteResult};
use crate::{Error, Result};

pub struct HxClientBuilder {
    api_base: String,
    auth_base: String,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl HxClientBuilder {
    pub fn new() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            auth_base: DEFAULT_AUTH_BASE.to_string(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn auth_base(mut self, base: impl Into<String>) -> Self {
        self.auth_base = base.into();
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> HxClient {
        let http = reqwest::Client::builder()
            .build()
            .expect("failed to build HTTP client");

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(Mutex::new(
                MessageLogger::new(mode, &path).expect("failed to open log file"),
            )),
            _ => None,
        };

        HxClient {
            http,
            api_base: self.api_base,
            auth_base: self.auth_base,
            token: RwLock::new(None),
            logger,
        }
    }
}

impl Default for HxClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Ayla cloud API client: authentication, property reads and datapoint
/// writes. Shared across thermostats, so the session token sits behind a
/// lock and all methods take `&self`.
pub struct HxClient {
    http: reqwest::Client,
    api_base: String,
    auth_base: String,
    token: RwLock<Option<String>>,
    logger: Option<Mutex<MessageLogger>>,
}

impl HxClient {
    pub fn builder() -> HxClientBuilder {
        HxClientBuilder::new()
    }

    /// Sign in and store the session token for subsequent calls.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let url = format!("{}{}", self.auth_base, sign_in_path());
        debug!(url = %url, "signing in");
        // Credentials stay out of the message log.
        self.log_request("POST", sign_in_path(), None);

        let body = sign_in_body(email, password);
        let resp: Value = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let token = parse_sign_in_response(&resp).ok_or(Error::NotAuthenticated)?;
        *self.token.write().expect("token lock poisoned") = Some(token);
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    /// All registered devices on the account.
    pub async fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let body = self.get(devices_path()).await?;
        Ok(parse_devices_response(&body))
    }

    /// Full property snapshot for one device. Unknown properties come back
    /// too; callers ignore names they do not map.
    pub async fn read_all_properties(&self, dsn: &str) -> Result<Vec<Property>> {
        let body = self
            .get(&properties_path(dsn))
            .await
            .map_err(|e| read_error(dsn, e))?;
        let properties = parse_properties_response(&body);
        self.log_poll(dsn, &properties);
        trace!(dsn, count = properties.len(), "read properties");
        Ok(properties)
    }

    /// Single named property, for the live get handlers.
    pub async fn read_property(&self, dsn: &str, name: &str) -> Result<Property> {
        let body = self
            .get(&property_path(dsn, name))
            .await
            .map_err(|e| read_error(dsn, e))?;
        parse_property_response(&body).ok_or_else(|| Error::RemoteRead {
            dsn: dsn.to_string(),
            message: format!("malformed response for property {name}"),
        })
    }

    /// Write a datapoint and return the value the device echoed back.
    pub async fn write_datapoint(
        &self,
        dsn: &str,
        name: &str,
        value: i64,
    ) -> Result<RemoteWriteResult> {
        let body = datapoint_body(value);
        self.log_command(dsn, name, &body);

        let resp = self
            .post(&datapoints_path(dsn, name), &body)
            .await
            .map_err(|e| write_error(dsn, name, e))?;
        let confirmed = parse_datapoint_response(&resp).ok_or_else(|| Error::RemoteWrite {
            dsn: dsn.to_string(),
            property: name.to_string(),
            message: "malformed datapoint echo".to_string(),
        })?;

        trace!(dsn, property = name, value, confirmed, "datapoint written");
        Ok(RemoteWriteResult {
            confirmed_value: confirmed,
        })
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let token = self.token()?;
        let url = format!("{}{}", self.api_base, path);
        self.log_request("GET", path, None);
        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("auth_token {token}"))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let token = self.token()?;
        let url = format!("{}{}", self.api_base, path);
        self.log_request("POST", path, Some(body));
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("auth_token {token}"))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    fn token(&self) -> Result<String> {
        self.token
            .read()
            .expect("token lock poisoned")
            .clone()
            .ok_or(Error::NotAuthenticated)
    }

    fn log_request(&self, method: &str, path: &str, body: Option<&Value>) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_request(method, path, body);
        }
    }

    fn log_command(&self, dsn: &str, property: &str, body: &Value) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            logger.log_command(dsn, property, body);
        }
    }

    fn log_poll(&self, dsn: &str, properties: &[Property]) {
        if let Some(logger) = &self.logger
            && let Ok(mut logger) = logger.lock()
        {
            let snapshot: BTreeMap<String, Value> = properties
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect();
            logger.log_poll(dsn, &snapshot);
        }
    }
}

fn read_error(dsn: &str, e: Error) -> Error {
    match e {
        Error::NotAuthenticated => Error::NotAuthenticated,
        other => Error::RemoteRead {
            dsn: dsn.to_string(),
            message: other.to_string(),
        },
    }
}

fn write_error(dsn: &str, property: &str, e: Error) -> Error {
    match e {
        Error::NotAuthenticated => Error::NotAuthenticated,
        other => Error::RemoteWrite {
            dsn: dsn.to_string(),
            property: property.to_string(),
            message: other.to_string(),
        },
    }
}
