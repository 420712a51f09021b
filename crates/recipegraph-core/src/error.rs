use thiserror::Error;

use crate::session::ParsingState;

/// Validation failure for a single recipe entity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("{entity} must be a JSON object")]
    NotAnObject { entity: &'static str },

    #[error("{entity}.{field} must not be empty")]
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity}.{field} is invalid: {reason}")]
    InvalidField {
        entity: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("action '{name}' references no ingredient and no equipment")]
    UnlinkedAction { name: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {event} while session is {from}")]
    InvalidTransition {
        from: ParsingState,
        event: &'static str,
    },

    #[error("session is in a terminal error state: {0}")]
    Terminal(String),
}
