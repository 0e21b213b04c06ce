/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PUBLISH_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 2_000;

/// Timeouts and message-chain settings shared by every client of a library.
///
/// Loadable from JSON5; missing keys fall back to defaults.
///
/// ```
/// use proxy_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::from_json5_str("{ connect_timeout_ms: 250 }").unwrap();
///
/// assert_eq!(config.connect_timeout(), Duration::from_millis(250));
/// assert_eq!(config.publish_timeout(), Duration::from_secs(5));
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ClientConfig {
    pub(crate) connect_timeout_ms: u64,
    pub(crate) publish_timeout_ms: u64,
    pub(crate) close_timeout_ms: u64,
    /// Pins the message chain id. Each client draws a random one otherwise.
    pub(crate) message_chain_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            publish_timeout_ms: DEFAULT_PUBLISH_TIMEOUT_MS,
            close_timeout_ms: DEFAULT_CLOSE_TIMEOUT_MS,
            message_chain_id: None,
        }
    }
}

impl ClientConfig {
    pub fn from_json5_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig =
            json5::from_str(contents).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.as_ref().display())))?;
        Self::from_json5_str(&contents)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = duration_to_ms(timeout);
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout_ms = duration_to_ms(timeout);
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout_ms = duration_to_ms(timeout);
        self
    }

    pub fn with_message_chain_id(mut self, message_chain_id: impl Into<String>) -> Self {
        self.message_chain_id = Some(message_chain_id.into());
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    pub fn message_chain_id(&self) -> Option<&str> {
        self.message_chain_id.as_deref()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("publish_timeout_ms", self.publish_timeout_ms),
            ("close_timeout_ms", self.close_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive")));
            }
        }

        if self.message_chain_id.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Invalid(
                "message_chain_id must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(reason) => write!(f, "failed to read config: {reason}"),
            ConfigError::Parse(reason) => write!(f, "failed to parse config: {reason}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl Error for ConfigError {}
