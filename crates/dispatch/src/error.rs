// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed errors for the dispatch service, mapped to HTTP status and a
//! structured JSON body at the transport boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Bad coordinates, missing fields, role mismatch, duplicate request.
    Validation(String),
    /// Accept/decline of a non-offering ride, wrong driver, expired offer, cancel of terminal ride.
    StateConflict(String),
    /// Unknown ride or user id.
    NotFound(String),
    /// Transaction aborted, connection lost, or other store-level failure.
    StoreFailure(String),
}

impl DispatchError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::StateConflict(_) => 409,
            Self::NotFound(_) => 404,
            Self::StoreFailure(_) => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::StateConflict(_) => "state_conflict",
            Self::NotFound(_) => "not_found",
            Self::StoreFailure(_) => "store_failure",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::StateConflict(m)
            | Self::NotFound(m)
            | Self::StoreFailure(m) => m,
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: self.message().to_owned() }
    }
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.as_str(), self.message())
    }
}

impl std::error::Error for DispatchError {}

impl From<sqlx::Error> for DispatchError {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreFailure(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body() };
        (status, Json(body)).into_response()
    }
}
