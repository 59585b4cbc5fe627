//! Deferred query submission

use super::models::DeferredJob;
use crate::config::Credentials;
use crate::error::{ConnectorError, Result};
use crate::network::{ApiRequest, ApiResponse, Transport};
use crate::query::QuerySpec;
use serde_json::{json, Value};
use tracing::{debug, info};

/// GraphQL operation used for J1QL queries
pub const QUERY_LANGUAGE_V1: &str = r#"query QueryLanguageV1(
  $query: String!
  $variables: JSON
  $cursor: String
  $deferredResponse: DeferredResponseOption
) {
  queryV1(
    query: $query
    variables: $variables
    deferredResponse: $deferredResponse
    cursor: $cursor
  ) {
    type
    data
    url
  }
}"#;

/// Fail fast when the account id or token is missing
pub fn check_credentials(credentials: &Credentials) -> Result<()> {
    if credentials.account_id.trim().is_empty() {
        return Err(ConnectorError::Credential(
            "account id is required".to_string(),
        ));
    }
    if credentials.access_token.is_empty() {
        return Err(ConnectorError::Credential(
            "access token is required".to_string(),
        ));
    }
    Ok(())
}

/// Attach bearer token and account headers
pub fn authorize(request: ApiRequest, credentials: &Credentials) -> ApiRequest {
    request
        .header(
            "Authorization",
            format!("Bearer {}", credentials.access_token.expose()),
        )
        .header("JupiterOne-Account", credentials.account_id.as_str())
        .header("Content-Type", "application/json")
}

/// Build the submission body
pub fn submission_body(spec: &QuerySpec, cursor: Option<&str>) -> Value {
    json!({
        "operationName": "QueryLanguageV1",
        "query": QUERY_LANGUAGE_V1,
        "variables": {
            "query": spec.text,
            "deferredResponse": "FORCE",
            "cursor": cursor,
        }
    })
}

/// Submit `spec` and return the deferred job to poll
pub async fn submit(
    transport: &dyn Transport,
    credentials: &Credentials,
    spec: &QuerySpec,
    cursor: Option<&str>,
) -> Result<DeferredJob> {
    check_credentials(credentials)?;

    let request = authorize(
        ApiRequest::post(credentials.graphql_url()),
        credentials,
    )
    .json(submission_body(spec, cursor));

    debug!("Submitting deferred query (cursor: {:?})", cursor);

    let response = transport
        .send(request)
        .await
        .map_err(|e| ConnectorError::Transport {
            status: None,
            body: credentials.access_token.redact(&e.to_string()),
        })?;

    if !response.is_success() {
        return Err(ConnectorError::Transport {
            status: Some(response.status),
            body: credentials.access_token.redact(&response.text),
        });
    }

    let result_url = parse_submission(&spec.original, &response)
        .map_err(|e| redact_error(e, credentials))?;
    info!("Deferred query accepted");
    Ok(DeferredJob::new(result_url))
}

/// Extract the deferred result URL from a submission response.
///
/// Pure function of the response body.
pub fn parse_submission(query: &str, response: &ApiResponse) -> Result<String> {
    let body: Value = response.json().map_err(|e| ConnectorError::Protocol {
        message: format!("submission response is not valid JSON: {}", e),
        raw: response.text.clone(),
    })?;

    if let Some(errors) = body.get("errors") {
        let has_errors = match errors {
            Value::Array(list) => !list.is_empty(),
            Value::Null => false,
            _ => true,
        };
        if has_errors {
            return Err(ConnectorError::Query {
                query: query.to_string(),
                detail: errors.to_string(),
            });
        }
    }

    body.pointer("/data/queryV1/url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(String::from)
        .ok_or_else(|| ConnectorError::Protocol {
            message: "no deferred result location".to_string(),
            raw: response.text.clone(),
        })
}

fn redact_error(err: ConnectorError, credentials: &Credentials) -> ConnectorError {
    let token = &credentials.access_token;
    match err {
        ConnectorError::Query { query, detail } => ConnectorError::Query {
            query,
            detail: token.redact(&detail),
        },
        ConnectorError::Protocol { message, raw } => ConnectorError::Protocol {
            message,
            raw: token.redact(&raw),
        },
        other => other,
    }
}
