//! # Errors (Feathers-style)
//!
//! reel carries a small set of structured, transport-agnostic errors.
//! Every error knows its status code, its `name` and its kebab-cased
//! `className`, and can render itself as the JSON payload clients see:
//!
//! ```json
//! { "name": "NotFound", "message": "Blob not found", "code": 404, "className": "not-found" }
//! ```
//!
//! The HTTP crate decides when to use the JSON body; some statuses
//! (416, 304) are answered with headers only.

use std::fmt;

/// Error class names + status codes used across the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,          // 400
    NotFound,            // 404
    PayloadTooLarge,     // 413
    RangeNotSatisfiable, // 416
    GeneralError,        // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::RangeNotSatisfiable => 416,
            ErrorKind::GeneralError => 500,
        }
    }

    /// Error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::PayloadTooLarge => "PayloadTooLarge",
            ErrorKind::RangeNotSatisfiable => "RangeNotSatisfiable",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    /// Error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::PayloadTooLarge => "payload-too-large",
            ErrorKind::RangeNotSatisfiable => "range-not-satisfiable",
            ErrorKind::GeneralError => "general-error",
        }
    }

    /// Server-side kinds whose message may leak backend details.
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

/// A structured error with a client-facing message and optional data.
#[derive(Debug, Clone)]
pub struct ReelError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ReelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// A version safe to hand to clients: server errors lose their
    /// message and data, everything else is kept as is.
    pub fn sanitize_for_client(&self) -> ReelError {
        if self.kind.is_server_error() {
            return ReelError::new(self.kind, "Internal error");
        }
        self.clone()
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        base
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, msg)
    }
    pub fn range_not_satisfiable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeNotSatisfiable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
}

impl fmt::Display for ReelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for ReelError {}
