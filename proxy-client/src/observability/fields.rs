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

//! Canonical structured field keys and value-format helpers.

use crate::error::ClientError;
use crate::result::OperationResult;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const CLIENT_HANDLE: &str = "client_handle";
pub const STREAM_PART: &str = "stream_part";

pub const PROXY_URL: &str = "proxy_url";
pub const PROXY_ID: &str = "proxy_id";
pub const SEQUENCE_NUMBER: &str = "sequence_number";
pub const SIGNED: &str = "signed";

pub const SUCCEEDED: &str = "succeeded";
pub const FAILED: &str = "failed";
pub const CODE: &str = "code";
pub const ERR: &str = "err";

pub const NONE: &str = "none";

/// Renders failure codes as a stable `CODE,CODE` list for summary events.
pub fn format_failure_codes(result: &OperationResult) -> String {
    if result.failed().is_empty() {
        return NONE.to_string();
    }

    result
        .failed()
        .iter()
        .map(ClientError::code)
        .collect::<Vec<_>>()
        .join(",")
}
