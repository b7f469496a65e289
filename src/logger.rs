use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

pub enum MessageLogMode {
    Full,
    Diffed,
}

/// NDJSON session log of API traffic: requests, datapoint commands and
/// property polls. Diffed mode records only properties that changed since
/// the previous poll for the same dsn.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous: HashMap<String, BTreeMap<String, Value>>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous: HashMap::new(),
        })
    }

    pub fn log_request(&mut self, method: &str, path: &str, body: Option<&Value>) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "path": path,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_command(&mut self, dsn: &str, property: &str, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "dsn": dsn,
            "property": property,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_poll(&mut self, dsn: &str, properties: &BTreeMap<String, Value>) {
        match self.mode {
            MessageLogMode::Full => {
                let entry = json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "poll",
                    "dsn": dsn,
                    "properties": properties,
                });
                self.write_line(&entry);
            }
            MessageLogMode::Diffed => match self.previous.get(dsn) {
                None => {
                    let entry = json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "poll",
                        "dsn": dsn,
                        "full": true,
                        "properties": properties,
                    });
                    self.write_line(&entry);
                    self.previous.insert(dsn.to_string(), properties.clone());
                }
                Some(prev) => {
                    let changes: Vec<Value> = properties
                        .iter()
                        .filter(|(name, value)| prev.get(*name) != Some(value))
                        .map(|(name, value)| {
                            json!({
                                "name": name,
                                "old": prev.get(name),
                                "new": value,
                            })
                        })
                        .collect();
                    let entry = json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "poll",
                        "dsn": dsn,
                        "changes": changes,
                    });
                    self.write_line(&entry);
                    self.previous.insert(dsn.to_string(), properties.clone());
                }
            },
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}
