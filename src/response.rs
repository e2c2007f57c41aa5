// SPDX-License-Identifier: MIT
// Copyright 2026 Vitatrack Authors

//! Uniform success envelope for API responses.
//!
//! Success and failure share one shape (`error.rs` owns the failure side):
//! `{ "success": true, "message": ..., "data"? }`.

use axum::{response::IntoResponse, Json};
use serde::Serialize;

/// JSON success envelope. `data` is omitted for plain acknowledgements.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Envelope with a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Payload-free acknowledgement.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}
