use serde_json::Value;
use uuid::Uuid;

/// Records an admin mutation as a structured log event on the `audit`
/// target, so the trail can be filtered or shipped independently of
/// application logs.
pub fn record(session_id: Uuid, action: &str, resource: &str, detail: Value) {
    tracing::info!(
        target: "audit",
        session = %session_id,
        action,
        resource,
        detail = %detail,
        "admin action"
    );
}
