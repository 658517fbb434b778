use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Why a carbohydrate figure could not be read from analysis text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no line with a CARBS: value was found")]
    MissingCarbs,
    #[error("CARBS value {0:?} is not a non-negative number")]
    InvalidNumber(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("could not read carbohydrates from analysis: {reason}")]
    Parse {
        reason: ParseError,
        // raw text returned by the vision call, so the caller can fall back to showing it
        analysis: Option<String>,
    },

    #[error("out of order: {0}")]
    OutOfOrder(String),

    #[error("external service error: {0}")]
    Collaborator(String),
}

impl From<ParseError> for CoreError {
    fn from(reason: ParseError) -> Self {
        CoreError::Parse {
            reason,
            analysis: None,
        }
    }
}

impl CoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidParameter(msg.into())
    }

    pub fn collaborator(msg: impl Into<String>) -> Self {
        CoreError::Collaborator(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CoreError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            CoreError::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CoreError::OutOfOrder(_) => StatusCode::CONFLICT,
            CoreError::Collaborator(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<String>,
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, %status, "request failed");
        } else {
            warn!(error = %self, %status, "request rejected");
        }
        let error = self.to_string();
        let analysis = match self {
            CoreError::Parse { analysis, .. } => analysis,
            _ => None,
        };
        (status, Json(ErrorBody { error, analysis })).into_response()
    }
}
