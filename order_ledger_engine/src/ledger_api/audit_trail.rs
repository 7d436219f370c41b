//! Helpers shared by the APIs for best-effort writes to the audit log and permission checks.
use log::*;

use crate::{
    db_types::{NewHistoryRecord, Role},
    traits::{AuditLog, PermissionGate, PermissionGateError},
};

/// Writes `record` to the audit log. Failures are logged and otherwise ignored: by the time this is called the audited
/// change has been committed and its outcome must not change.
pub(crate) async fn record_or_warn<L: AuditLog>(audit: &L, record: NewHistoryRecord) {
    let subject = format!("{} {}", record.object_table, record.object_id);
    match audit.record(record).await {
        Ok(r) => trace!("📜️ Audit record #{} written for {subject}", r.id),
        Err(e) => warn!("📜️ Could not write the audit record for {subject}. {e}"),
    }
}

/// Checks whether the user holds any of `roles` for the business.
pub(crate) async fn is_authorized<G: PermissionGate>(
    gate: &G,
    user_id: &str,
    business_id: &str,
    roles: &[Role],
) -> Result<bool, PermissionGateError> {
    let allowed = gate.check_any(user_id, business_id, roles).await?.is_allowed();
    if !allowed {
        debug!("📜️ {user_id} holds none of {roles:?} for {business_id}. Access denied");
    }
    Ok(allowed)
}
