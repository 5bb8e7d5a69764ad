//! Conflict resolution strategies.

use ressync_protocol::{ConflictDecision, LocalChange, Resource};

/// Decides the outcome for one conflicting resource.
///
/// A resolver is a pure function from the local change (including the
/// remote version it was based on) and the server's current copy to a
/// [`ConflictDecision`]. The upload driver applies the decision; no
/// conflict is left undecided at the end of a pass.
pub trait ConflictResolver: Send + Sync {
    /// Resolves one conflict.
    fn resolve(&self, local: &LocalChange, server: &Resource) -> ConflictDecision;
}

/// Keeps the local change, overwriting the server's copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptLocalResolver;

impl ConflictResolver for AcceptLocalResolver {
    fn resolve(&self, _local: &LocalChange, _server: &Resource) -> ConflictDecision {
        ConflictDecision::AcceptLocal
    }
}

/// Discards the local change and adopts the server's copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptRemoteResolver;

impl ConflictResolver for AcceptRemoteResolver {
    fn resolve(&self, _local: &LocalChange, _server: &Resource) -> ConflictDecision {
        ConflictDecision::AcceptRemote
    }
}

impl<F> ConflictResolver for F
where
    F: Fn(&LocalChange, &Resource) -> ConflictDecision + Send + Sync,
{
    fn resolve(&self, local: &LocalChange, server: &Resource) -> ConflictDecision {
        self(local, server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conflict_pair() -> (LocalChange, Resource) {
        let local = LocalChange::new(
            Resource::new("patient", "p-1", json!({"name": "local"})).with_version("2"),
            Some("2".into()),
        );
        let server = Resource::new("patient", "p-1", json!({"name": "server"})).with_version("5");
        (local, server)
    }

    #[test]
    fn builtin_resolvers() {
        let (local, server) = conflict_pair();
        assert_eq!(
            AcceptLocalResolver.resolve(&local, &server),
            ConflictDecision::AcceptLocal
        );
        assert_eq!(
            AcceptRemoteResolver.resolve(&local, &server),
            ConflictDecision::AcceptRemote
        );
    }

    #[test]
    fn closure_resolver_merges() {
        let (local, server) = conflict_pair();
        let resolver = |local: &LocalChange, server: &Resource| {
            let mut merged = server.clone();
            merged.payload = json!({
                "name": server.payload["name"],
                "local_name": local.resource.payload["name"],
            });
            ConflictDecision::Merged(merged)
        };

        match resolver.resolve(&local, &server) {
            ConflictDecision::Merged(resource) => {
                assert_eq!(resource.version.as_deref(), Some("5"));
                assert_eq!(resource.payload["local_name"], json!("local"));
            }
            other => panic!("expected merged decision, got {other:?}"),
        }
    }
}
