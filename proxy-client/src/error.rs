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

//! Stable error taxonomy shared by every client operation.

use crate::proxy::Proxy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Error category with a stable, externally visible code string.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    InvalidEthereumAddress,
    InvalidStreamPartId,
    InvalidProxyUrl,
    NoProxiesDefined,
    ProxyConnectionFailed,
    ProxyBroadcastFailed,
    ProxyClientNotFound,
    /// The library was used before `init` or after `cleanup`.
    LibraryNotInitialized,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::InvalidEthereumAddress,
        ErrorKind::InvalidStreamPartId,
        ErrorKind::InvalidProxyUrl,
        ErrorKind::NoProxiesDefined,
        ErrorKind::ProxyConnectionFailed,
        ErrorKind::ProxyBroadcastFailed,
        ErrorKind::ProxyClientNotFound,
        ErrorKind::LibraryNotInitialized,
    ];

    /// Returns the stable code string for this kind.
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidEthereumAddress => "INVALID_ETHEREUM_ADDRESS",
            ErrorKind::InvalidStreamPartId => "INVALID_STREAM_PART_ID",
            ErrorKind::InvalidProxyUrl => "INVALID_PROXY_URL",
            ErrorKind::NoProxiesDefined => "NO_PROXIES_DEFINED",
            ErrorKind::ProxyConnectionFailed => "PROXY_CONNECTION_FAILED",
            ErrorKind::ProxyBroadcastFailed => "PROXY_BROADCAST_FAILED",
            ErrorKind::ProxyClientNotFound => "PROXY_CLIENT_NOT_FOUND",
            ErrorKind::LibraryNotInitialized => "LIBRARY_NOT_INITIALIZED",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Returned when a code string is not part of the taxonomy.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnknownErrorCode(pub String);

impl Display for UnknownErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown error code: {}", self.0)
    }
}

impl Error for UnknownErrorCode {}

impl FromStr for ErrorKind {
    type Err = UnknownErrorCode;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        ErrorKind::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or_else(|| UnknownErrorCode(code.to_string()))
    }
}

/// A failure reported by a client operation.
///
/// `proxy` is set when the failure is attributable to a single proxy (a failed dial or
/// a failed send) and left empty for client-scoped failures such as an invalid own
/// identity or a stale handle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientError {
    kind: ErrorKind,
    message: String,
    proxy: Option<Proxy>,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            proxy: None,
        }
    }

    /// Attributes this error to `proxy`.
    pub fn with_proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    pub fn is_client_scoped(&self) -> bool {
        self.proxy.is_none()
    }

    pub(crate) fn client_not_found() -> Self {
        Self::new(ErrorKind::ProxyClientNotFound, "proxy client not found")
    }

    pub(crate) fn library_not_initialized() -> Self {
        Self::new(
            ErrorKind::LibraryNotInitialized,
            "proxy client library is not initialized",
        )
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(proxy) = &self.proxy {
            write!(f, " (proxy {proxy})")?;
        }
        Ok(())
    }
}

impl Error for ClientError {}

#[cfg(test)]
mod tests {
    use super::{ClientError, ErrorKind};
    use crate::proxy::Proxy;

    #[test]
    fn codes_round_trip_through_from_str() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.code().parse::<ErrorKind>(), Ok(kind));
        }
        assert!("NOT_A_CODE".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn display_includes_code_message_and_proxy() {
        let proxy = Proxy::new(
            "ws://proxy.example.com:8080",
            "0x1234567890123456789012345678901234567890",
        );
        let error = ClientError::new(ErrorKind::ProxyConnectionFailed, "dial timed out")
            .with_proxy(proxy);

        assert_eq!(
            error.to_string(),
            "PROXY_CONNECTION_FAILED: dial timed out (proxy ws://proxy.example.com:8080 \
             0x1234567890123456789012345678901234567890)"
        );
        assert!(!error.is_client_scoped());
    }

    #[test]
    fn client_scoped_errors_have_no_proxy() {
        let error = ClientError::client_not_found();

        assert_eq!(error.code(), "PROXY_CLIENT_NOT_FOUND");
        assert!(error.proxy().is_none());
        assert!(error.is_client_scoped());
    }
}
