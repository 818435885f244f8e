//! Shared request plumbing for the v1 handlers

use axum::{
    extract::Multipart,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::request::{Attachment, CacheControl, Capability, CapabilityRequest};

pub const PROVIDER_HEADER: &str = "x-provider";
pub const DEPLOYMENT_HEADER: &str = "x-deployment-id";
pub const CACHE_STATUS_HEADER: &str = "x-cache-status";

/// `Cache-Control: no-cache` (anywhere in the directive list) forces a
/// fresh upstream call.
pub fn cache_control_from_headers(headers: &HeaderMap) -> CacheControl {
    let directives = headers
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if directives
        .split(',')
        .any(|d| d.trim().eq_ignore_ascii_case("no-cache"))
    {
        CacheControl::NoCache
    } else {
        CacheControl::Default
    }
}

/// Provider selection: `x-provider` header wins, else a `provider` field in
/// the payload. The payload field is stripped so it never reaches the
/// upstream wire or the fingerprint.
pub fn extract_provider(
    headers: &HeaderMap,
    payload: &mut Map<String, Value>,
) -> Result<String, ApiError> {
    if let Some(value) = headers.get(PROVIDER_HEADER) {
        let name = value
            .to_str()
            .map_err(|_| ApiError::bad_request("Invalid x-provider header encoding"))?;
        payload.remove("provider");

        return Ok(name.trim().to_string());
    }

    match payload.remove("provider") {
        Some(Value::String(name)) => Ok(name.trim().to_string()),
        Some(_) => Err(ApiError::bad_request("Field 'provider' must be a string")),
        None => Err(ApiError::bad_request(
            "Provider required. Provide via 'x-provider' header or 'provider' field",
        )),
    }
}

/// Deployment selection mirrors provider selection; absence is fine, the
/// dispatcher decides whether one is required.
pub fn extract_deployment(headers: &HeaderMap, payload: &mut Map<String, Value>) -> Option<String> {
    if let Some(value) = headers.get(DEPLOYMENT_HEADER) {
        payload.remove("deployment_id");

        return value.to_str().ok().map(|s| s.trim().to_string());
    }

    match payload.remove("deployment_id") {
        Some(Value::String(id)) => Some(id),
        _ => None,
    }
}

/// Splits a multipart body into scalar fields (kept as a JSON object) and
/// the single file part. Field order in the form does not matter.
pub async fn split_multipart(
    mut multipart: Multipart,
) -> Result<(Map<String, Value>, Option<Attachment>), ApiError> {
    let mut payload = Map::new();
    let mut attachment = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name() {
            let file_name = file_name.to_string();
            let content_type = field
                .content_type()
                .map(|ct| ct.to_string())
                .unwrap_or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .to_string()
                });
            let data = field.bytes().await.map_err(|e| {
                ApiError::bad_request(format!("Failed to read file part '{}': {}", name, e))
            })?;

            attachment = Some(Attachment::new(file_name, content_type, data));
        } else {
            let text = field.text().await.map_err(|e| {
                ApiError::bad_request(format!("Failed to read field '{}': {}", name, e))
            })?;

            payload.insert(name, Value::String(text));
        }
    }

    Ok((payload, attachment))
}

/// Builds the `CapabilityRequest`, runs it, and shapes the HTTP response
/// with the cache status header.
pub async fn run_dispatch(
    state: &AppState,
    capability: Capability,
    headers: &HeaderMap,
    mut payload: Map<String, Value>,
    attachment: Option<Attachment>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let provider = extract_provider(headers, &mut payload)?;
    let deployment = extract_deployment(headers, &mut payload);
    let cache_control = cache_control_from_headers(headers);

    info!(
        request_id = %request_id,
        provider = %provider,
        capability = %capability,
        has_attachment = attachment.is_some(),
        "Dispatching request"
    );

    let mut request = CapabilityRequest::new(capability, provider, Value::Object(payload))
        .with_cache_control(cache_control);

    if let Some(attachment) = attachment {
        request = request.with_attachment(attachment);
    }

    if let Some(deployment) = deployment {
        request = request.with_deployment_id(deployment);
    }

    let dispatched = state.dispatcher.dispatch(request).await?;

    info!(
        request_id = %request_id,
        served_from_cache = dispatched.served_from_cache,
        "Request dispatched"
    );

    let cache_status = if dispatched.served_from_cache {
        "HIT"
    } else {
        "MISS"
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, dispatched.content_type)
        .header(CACHE_STATUS_HEADER, cache_status)
        .body(dispatched.body.into())
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_cache_control_default() {
        let headers = HeaderMap::new();

        assert_eq!(cache_control_from_headers(&headers), CacheControl::Default);
    }

    #[test]
    fn test_cache_control_no_cache() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, "no-cache".parse().unwrap());

        assert_eq!(cache_control_from_headers(&headers), CacheControl::NoCache);
    }

    #[test]
    fn test_cache_control_among_other_directives() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CACHE_CONTROL,
            "max-age=0, No-Cache".parse().unwrap(),
        );

        assert_eq!(cache_control_from_headers(&headers), CacheControl::NoCache);
    }

    #[test]
    fn test_provider_from_header_strips_payload_field() {
        let mut headers = HeaderMap::new();
        headers.insert(PROVIDER_HEADER, "from-header".parse().unwrap());

        let mut payload = payload_map(json!({"provider": "from-payload", "model": "m"}));
        let provider = extract_provider(&headers, &mut payload).unwrap();

        assert_eq!(provider, "from-header");
        assert!(!payload.contains_key("provider"));
    }

    #[test]
    fn test_provider_from_payload_field() {
        let headers = HeaderMap::new();
        let mut payload = payload_map(json!({"provider": "p1", "model": "m"}));

        let provider = extract_provider(&headers, &mut payload).unwrap();

        assert_eq!(provider, "p1");
        assert!(!payload.contains_key("provider"));
    }

    #[test]
    fn test_provider_payload_field_is_trimmed() {
        let headers = HeaderMap::new();
        let mut payload = payload_map(json!({"provider": " p1 "}));

        assert_eq!(extract_provider(&headers, &mut payload).unwrap(), "p1");
    }

    #[test]
    fn test_provider_missing_is_rejected() {
        let headers = HeaderMap::new();
        let mut payload = payload_map(json!({"model": "m"}));

        assert!(extract_provider(&headers, &mut payload).is_err());
    }

    #[test]
    fn test_deployment_from_payload_is_stripped() {
        let headers = HeaderMap::new();
        let mut payload = payload_map(json!({"deployment_id": "gpt4-prod"}));

        assert_eq!(
            extract_deployment(&headers, &mut payload),
            Some("gpt4-prod".to_string())
        );
        assert!(!payload.contains_key("deployment_id"));
    }

    #[test]
    fn test_deployment_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(DEPLOYMENT_HEADER, "from-header".parse().unwrap());

        let mut payload = payload_map(json!({"deployment_id": "from-payload"}));

        assert_eq!(
            extract_deployment(&headers, &mut payload),
            Some("from-header".to_string())
        );
        assert!(!payload.contains_key("deployment_id"));
    }
}
