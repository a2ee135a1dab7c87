//! Error kinds produced by this crate
//!
//! Source traits return `Box<dyn Error>`; the errors they box are usually one of these.

use reqwest::{Method, StatusCode};
use thiserror::Error;

use crate::todo::TodoId;
use crate::tag::TagId;

#[derive(Error, Debug)]
pub enum AgendaError {
    /// The server answered with a non-2xx status
    #[error("unexpected HTTP status {status} for {method} {url}")]
    HttpStatus {
        method: Method,
        url: String,
        status: StatusCode,
    },

    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid time {0:?} (expected HH:MM or HH:MM:SS)")]
    InvalidTime(String),

    #[error("invalid todo: {0}")]
    InvalidTodo(String),

    #[error("todo {0} not found")]
    TodoNotFound(TodoId),

    #[error("tag {0} not found")]
    TagNotFound(TagId),

    /// Failure injected by a [`MockBehaviour`](crate::mock_behaviour::MockBehaviour)
    #[error("mocked failure of {0}")]
    Mocked(String),
}

impl AgendaError {
    /// The HTTP status carried by this error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            AgendaError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
