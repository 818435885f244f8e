//! Deterministic cache fingerprints for capability requests

use sha2::{Digest, Sha256};

use crate::domain::request::CapabilityRequest;

/// Field separator inside the digest input; not part of the final key
const SEP: u8 = 0x1f;

/// Derives the cache key for a request.
///
/// The key is `provider:capability:<sha256 hex>` where the digest covers the
/// provider name, the capability, the deployment id (empty segment when the
/// request has none), the canonical payload serialization and, when a binary
/// attachment is present, a content hash of its bytes rather than the bytes
/// themselves. Requests differing only in deployment target must never share
/// a key. The function is pure: no salts, no timestamps, reproducible across
/// process restarts.
pub fn request_fingerprint(request: &CapabilityRequest) -> String {
    let mut hasher = Sha256::new();

    hasher.update(request.provider_name.as_bytes());
    hasher.update([SEP]);
    hasher.update(request.capability.as_str().as_bytes());
    hasher.update([SEP]);

    if let Some(deployment_id) = &request.deployment_id {
        hasher.update(deployment_id.as_bytes());
    }

    hasher.update([SEP]);
    hasher.update(canonical_json(&request.payload).as_bytes());

    if let Some(attachment) = &request.attachment {
        let content_hash = Sha256::digest(&attachment.data);
        hasher.update([SEP]);
        hasher.update(content_hash);
    }

    format!(
        "{}:{}:{}",
        request.provider_name,
        request.capability,
        hex::encode(hasher.finalize())
    )
}

/// Serializes a JSON value with object keys sorted recursively, so that
/// field order in the inbound body never affects the fingerprint. Numbers
/// use serde_json's display form, which is stable for equal values.
pub fn canonical_json(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();

            let fields: Vec<String> = keys
                .into_iter()
                .map(|key| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(key).unwrap_or_default(),
                        canonical_json(&map[key])
                    )
                })
                .collect();

            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        // Scalars already serialize deterministically
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::{Attachment, Capability};
    use serde_json::json;

    fn chat_request(payload: serde_json::Value) -> CapabilityRequest {
        CapabilityRequest::new(Capability::ChatCompletion, "p1", payload)
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let request = chat_request(json!({"model": "gpt-x", "messages": [{"role": "user", "content": "hi"}]}));

        assert_eq!(request_fingerprint(&request), request_fingerprint(&request));
    }

    #[test]
    fn test_field_order_does_not_change_fingerprint() {
        let a = chat_request(
            serde_json::from_str(r#"{"model":"gpt-x","temperature":0.5,"messages":[]}"#).unwrap(),
        );
        let b = chat_request(
            serde_json::from_str(r#"{"temperature":0.5,"messages":[],"model":"gpt-x"}"#).unwrap(),
        );

        assert_eq!(request_fingerprint(&a), request_fingerprint(&b));
    }

    #[test]
    fn test_payload_value_changes_fingerprint() {
        let a = chat_request(json!({"model": "gpt-x"}));
        let b = chat_request(json!({"model": "gpt-y"}));

        assert_ne!(request_fingerprint(&a), request_fingerprint(&b));
    }

    #[test]
    fn test_provider_and_capability_change_fingerprint() {
        let payload = json!({"model": "gpt-x"});
        let a = CapabilityRequest::new(Capability::ChatCompletion, "p1", payload.clone());
        let b = CapabilityRequest::new(Capability::ChatCompletion, "p2", payload.clone());
        let c = CapabilityRequest::new(Capability::Completion, "p1", payload);

        assert_ne!(request_fingerprint(&a), request_fingerprint(&b));
        assert_ne!(request_fingerprint(&a), request_fingerprint(&c));
    }

    #[test]
    fn test_attachment_bytes_change_fingerprint() {
        let base = CapabilityRequest::new(
            Capability::AudioTranscription,
            "p1",
            json!({"model": "whisper-1"}),
        );

        let a = base
            .clone()
            .with_attachment(Attachment::new("a.mp3", "audio/mpeg", vec![1u8, 2, 3]));
        let b = base
            .clone()
            .with_attachment(Attachment::new("a.mp3", "audio/mpeg", vec![1u8, 2, 4]));

        assert_ne!(request_fingerprint(&a), request_fingerprint(&b));
    }

    #[test]
    fn test_deployment_id_changes_fingerprint() {
        let base = CapabilityRequest::new(
            Capability::ChatCompletion,
            "azure-main",
            json!({"messages": [{"role": "user", "content": "hi"}]}),
        );

        let prod = base.clone().with_deployment_id("gpt4-prod");
        let cheap = base.clone().with_deployment_id("gpt35-cheap");

        // Identical payloads aimed at different deployments must never
        // share a cache entry
        assert_ne!(request_fingerprint(&prod), request_fingerprint(&cheap));
        assert_ne!(request_fingerprint(&base), request_fingerprint(&prod));
        assert_eq!(
            request_fingerprint(&prod),
            request_fingerprint(&base.with_deployment_id("gpt4-prod"))
        );
    }

    #[test]
    fn test_attachment_presence_changes_fingerprint() {
        let without = chat_request(json!({"model": "gpt-x"}));
        let with = without
            .clone()
            .with_attachment(Attachment::new("f", "application/octet-stream", vec![0u8]));

        assert_ne!(request_fingerprint(&without), request_fingerprint(&with));
    }

    #[test]
    fn test_key_size_is_bounded() {
        let large = vec![0u8; 1 << 20];
        let request = CapabilityRequest::new(
            Capability::AudioTranscription,
            "p1",
            json!({"model": "whisper-1"}),
        )
        .with_attachment(Attachment::new("big.wav", "audio/wav", large));

        // The attachment is hashed, never embedded
        assert!(request_fingerprint(&request).len() < 128);
    }

    #[test]
    fn test_canonical_json_sorts_nested_objects() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"b":{"z":1,"a":2},"a":[{"y":1,"x":2}]}"#).unwrap();

        assert_eq!(
            canonical_json(&value),
            r#"{"a":[{"x":2,"y":1}],"b":{"a":2,"z":1}}"#
        );
    }

    #[test]
    fn test_canonical_json_preserves_array_order() {
        let value = json!([3, 1, 2]);
        assert_eq!(canonical_json(&value), "[3,1,2]");
    }
}
