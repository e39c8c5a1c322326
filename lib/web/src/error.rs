use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rdf_hooks::error::QueryError;
use rdf_hooks::sparql::error::QueryEvaluationError;
use rdf_hooks::sparql::SparqlSyntaxError;
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum RdfHooksServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Cannot do both query and update")]
    QueryAndUpdate,
    #[error("Error parsing the SPARQL request: {0}")]
    Parsing(#[from] SparqlSyntaxError),
    #[error("Error executing the SPARQL request: {0}")]
    Evaluation(#[from] QueryEvaluationError),
    #[error("Error serializing the SPARQL query results: {0}")]
    Serialization(String),
    #[error("INSERT and DELETE queries are not allowed.")]
    UpdateDisabled,
    #[error("Invalid API KEY.")]
    InvalidApiKey,
    #[error("Internal server error: {0}")]
    Internal(anyhow::Error),
}

impl RdfHooksServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::QueryAndUpdate | Self::Parsing(_) | Self::Evaluation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Serialization(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UpdateDisabled | Self::InvalidApiKey => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether executing the request failed, as opposed to the request being rejected.
    ///
    /// Failures are logged as errors even if the protocol answers them with a 4xx status.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Evaluation(_) | Self::Serialization(_) | Self::Internal(_)
        )
    }
}

impl From<QueryError> for RdfHooksServerError {
    fn from(error: QueryError) -> Self {
        match error {
            QueryError::Parsing(error) => Self::Parsing(error),
            QueryError::Evaluation(error) => error.into(),
        }
    }
}

impl IntoResponse for RdfHooksServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_failure() {
            tracing::error!(error = %self, %status, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
