use crate::error::RdfHooksServerError;
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, Method};
use axum::RequestPartsExt;
use axum_extra::TypedHeader;
use headers::authorization::Bearer;
use headers::Authorization;

/// A request to the SPARQL endpoint, gathered from the URL and the body.
///
/// Follows the [SPARQL 1.1 Protocol](https://www.w3.org/TR/sparql11-protocol/): `GET` carries the
/// operation in the query string while `POST` carries it in the body, either directly
/// (`application/sparql-query`, `application/sparql-update`) or form-encoded. A `POST` with an
/// empty body falls back to the query string, as sent by some federated query engines.
#[derive(Debug, Default)]
pub struct SparqlRequest {
    pub query: Option<String>,
    pub update: Option<String>,
    pub default_graph_uris: Vec<String>,
    pub named_graph_uris: Vec<String>,
    /// The raw `Accept` header, empty when absent.
    pub accept: String,
    /// The token of an `Authorization: Bearer` header.
    pub bearer: Option<String>,
}

impl SparqlRequest {
    fn extend(&mut self, pairs: Vec<(String, String)>, with_operation: bool) {
        for (key, value) in pairs {
            match key.as_str() {
                "query" if with_operation => self.query = Some(value),
                "update" if with_operation => self.update = Some(value),
                "default-graph-uri" | "using-graph-uri" => self.default_graph_uris.push(value),
                "named-graph-uri" | "using-named-graph-uri" => self.named_graph_uris.push(value),
                _ => (),
            }
        }
    }

    /// Drops empty operations, which are treated like missing ones.
    fn normalized(mut self) -> Self {
        self.query = self.query.filter(|query| !query.trim().is_empty());
        self.update = self.update.filter(|update| !update.trim().is_empty());
        self
    }
}

impl FromRequest<AppState> for SparqlRequest {
    type Rejection = RdfHooksServerError;

    async fn from_request(request: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = request.into_parts();
        let bearer = parts
            .extract::<Option<TypedHeader<Authorization<Bearer>>>>()
            .await
            .ok()
            .flatten()
            .map(|TypedHeader(authorization)| authorization.token().to_owned());
        let mut result = SparqlRequest {
            accept: header_value(&parts.headers, &ACCEPT),
            bearer,
            ..SparqlRequest::default()
        };

        let url_pairs = parse_pairs(parts.uri.query().unwrap_or_default())?;
        if parts.method != Method::POST {
            result.extend(url_pairs, true);
            return Ok(result.normalized());
        }

        let content_type = header_value(&parts.headers, &CONTENT_TYPE);
        let body = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(|e| RdfHooksServerError::BadRequest(e.body_text()))?;
        let body = String::from_utf8(body.to_vec())
            .map_err(|e| RdfHooksServerError::BadRequest(format!("Invalid UTF-8 body: {e}")))?;

        match essence(&content_type).as_str() {
            "application/sparql-query" => {
                result.extend(url_pairs, false);
                result.query = Some(body);
            }
            "application/sparql-update" => {
                result.extend(url_pairs, false);
                result.update = Some(body);
            }
            "application/x-www-form-urlencoded" => {
                result.extend(url_pairs, false);
                result.extend(parse_pairs(&body)?, true);
            }
            _ => {
                let with_operation = body.is_empty();
                result.extend(url_pairs, with_operation);
            }
        }
        Ok(result.normalized())
    }
}

fn parse_pairs(encoded: &str) -> Result<Vec<(String, String)>, RdfHooksServerError> {
    serde_urlencoded::from_str(encoded)
        .map_err(|e| RdfHooksServerError::BadRequest(format!("Invalid URL encoding: {e}")))
}

fn header_value(headers: &HeaderMap, name: &HeaderName) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
