use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::{cache::LookupError, domain::components, infra::error::InfraError};

const CAPACITY_MESSAGE: &str = "server is at capacity, please try again later";

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// JSON error response carrying an [`ErrorReport`] for the logging middleware.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    body: Value,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            body: json!({ "error": public_message }),
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        body: Value,
        error: &dyn StdError,
    ) -> Self {
        Self {
            status,
            body,
            report: ErrorReport::from_error(source, status, error),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<LookupError> for HttpError {
    fn from(error: LookupError) -> Self {
        match &error {
            LookupError::CapacityExceeded(_) => HttpError::from_error(
                "application::error::lookup_error_to_http_error",
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": CAPACITY_MESSAGE }),
                &error,
            ),
            LookupError::NotFound(_) => HttpError::from_error(
                "application::error::lookup_error_to_http_error",
                StatusCode::NOT_FOUND,
                json!({
                    "error": error.to_string(),
                    "available_components": components::component_types(),
                }),
                &error,
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
