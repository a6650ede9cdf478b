//! Relay error types.

use thiserror::Error;

/// JSON-RPC 2.0 standard error codes.
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("HTTP error calling {method} at {url}: {source}")]
    Http {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} calling {method} at {url}: {body}")]
    HttpStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("relay error {code} in {method}: {message}")]
    Rpc {
        code: i64,
        message: String,
        method: String,
    },

    #[error("no result in response to {context}")]
    NoResult { context: String },

    #[error("authentication failed at {url}")]
    AuthFailed { url: String },

    #[error("relay busy while handling {context}")]
    Busy { context: String },

    #[error("{0}")]
    Other(String),
}

impl RelayError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_timeout() || source.is_connect(),
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::Busy { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let busy = RelayError::Busy { context: "wc_modalState".into() };
        assert!(busy.is_transient());

        let server = RelayError::HttpStatus {
            method: "wc_open".into(),
            url: "http://relay".into(),
            status: 503,
            body: String::new(),
        };
        assert!(server.is_transient());

        let client = RelayError::HttpStatus {
            method: "wc_open".into(),
            url: "http://relay".into(),
            status: 404,
            body: String::new(),
        };
        assert!(!client.is_transient());

        let rpc = RelayError::Rpc {
            code: codes::INVALID_PARAMS,
            message: "bad ticket".into(),
            method: "wc_account".into(),
        };
        assert!(!rpc.is_transient());
    }
}
