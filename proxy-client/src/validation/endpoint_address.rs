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

use crate::error::{ClientError, ErrorKind};
use std::fmt::{Display, Formatter};
use url::Url;

const TLS_PORT: u16 = 443;
const PLAIN_PORT: u16 = 80;

/// A parsed proxy URL with its effective host, port and TLS mode.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct EndpointAddress {
    url: Url,
    host: String,
    port: u16,
    tls: bool,
}

impl EndpointAddress {
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let invalid = |reason: String| {
            ClientError::new(
                ErrorKind::InvalidProxyUrl,
                format!("invalid proxy url {raw:?}: {reason}"),
            )
        };

        let url = Url::parse(raw).map_err(|err| invalid(err.to_string()))?;

        let tls = match url.scheme() {
            "wss" | "https" => true,
            "ws" | "http" => false,
            other => return Err(invalid(format!("unsupported scheme {other:?}"))),
        };

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| invalid("missing host".to_string()))?
            .to_string();

        let port = url
            .port()
            .unwrap_or(if tls { TLS_PORT } else { PLAIN_PORT });

        Ok(Self {
            url,
            host,
            port,
            tls,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_tls(&self) -> bool {
        self.tls
    }

    /// Canonical `ws[s]://host:port` form, independent of the scheme spelling the
    /// caller used.
    pub fn websocket_url(&self) -> String {
        let scheme = if self.tls { "wss" } else { "ws" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

impl Display for EndpointAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}
