//! Resources and local change records.

use serde::{Deserialize, Serialize};

/// Identity of a resource: its type plus its server-assigned id.
///
/// Two resources with the same key are versions of the same record;
/// persistence is idempotent by key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Resource type name (e.g. "patient", "order").
    pub resource_type: String,
    /// Server-assigned resource id.
    pub id: String,
}

impl ResourceKey {
    /// Creates a new resource key.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}

/// One domain record synchronized between the local store and the server.
///
/// The engine treats the body as opaque; only the key and version marker
/// drive sync decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Identity (type + id).
    #[serde(flatten)]
    pub key: ResourceKey,
    /// Server version marker, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Server update timestamp, if known (opaque to the engine).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Opaque resource body.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Resource {
    /// Creates a resource with no version marker.
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            key: ResourceKey::new(resource_type, id),
            version: None,
            last_updated: None,
            payload,
        }
    }

    /// Sets the version marker.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the update timestamp.
    pub fn with_last_updated(mut self, last_updated: impl Into<String>) -> Self {
        self.last_updated = Some(last_updated.into());
        self
    }
}

/// A locally modified resource awaiting upload.
///
/// `prior_version` is the remote version the modification was based on.
/// The upload driver clears the dirty flag only after the server accepts
/// this exact version; a mismatch discovered at upload time is a conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalChange {
    /// The modified resource.
    pub resource: Resource,
    /// Remote version the local edit was based on, if any.
    pub prior_version: Option<String>,
}

impl LocalChange {
    /// Creates a change record for a resource.
    pub fn new(resource: Resource, prior_version: Option<String>) -> Self {
        Self {
            resource,
            prior_version,
        }
    }

    /// The identity of the changed resource.
    pub fn key(&self) -> &ResourceKey {
        &self.resource.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_display() {
        let key = ResourceKey::new("patient", "p-17");
        assert_eq!(key.to_string(), "patient/p-17");
    }

    #[test]
    fn resource_json_roundtrip() {
        let resource = Resource::new("patient", "p-1", json!({"name": "Ada"}))
            .with_version("3")
            .with_last_updated("2024-05-01T12:00:00Z");

        let encoded = serde_json::to_string(&resource).unwrap();
        let decoded: Resource = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, resource);
        assert_eq!(decoded.key, ResourceKey::new("patient", "p-1"));
        assert_eq!(decoded.version.as_deref(), Some("3"));
    }

    #[test]
    fn resource_decodes_without_optional_fields() {
        let decoded: Resource =
            serde_json::from_str(r#"{"resource_type":"order","id":"o-9"}"#).unwrap();
        assert_eq!(decoded.version, None);
        assert_eq!(decoded.payload, serde_json::Value::Null);
    }

    #[test]
    fn change_key_points_at_resource() {
        let change = LocalChange::new(
            Resource::new("order", "o-1", json!({})).with_version("2"),
            Some("1".into()),
        );
        assert_eq!(change.key(), &ResourceKey::new("order", "o-1"));
        assert_eq!(change.prior_version.as_deref(), Some("1"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // The key is flattened into the resource object; arbitrary
            // type/id strings must survive encoding without colliding
            // with the payload field.
            #[test]
            fn flattened_key_survives_encoding(
                resource_type in "[a-zA-Z_][a-zA-Z0-9_-]{0,20}",
                id in "\\PC{1,24}",
            ) {
                let resource = Resource::new(
                    resource_type.clone(),
                    id.clone(),
                    json!({"resource_type": "decoy", "id": "decoy"}),
                );

                let encoded = serde_json::to_vec(&resource).unwrap();
                let decoded: Resource = serde_json::from_slice(&encoded).unwrap();

                prop_assert_eq!(decoded.key, ResourceKey::new(resource_type, id));
                prop_assert_eq!(&decoded.payload["id"], &json!("decoy"));
            }
        }
    }
}
