use tracing::warn;

use crate::logging::pii::Redacted;
use crate::trace_ctx;

/// Security event: a login attempt was rejected.
pub fn login_failed(reason: &str, email: Option<&str>) {
    let trace_id = trace_ctx::trace_id();
    warn!(
        event = "SECURITY_LOGIN_FAILED",
        %trace_id,
        email = %Redacted(email.unwrap_or_default()),
        reason,
        "Authentication failure"
    );
}

/// Security event: a protected route was called without usable credentials.
pub fn access_rejected(path: &str, reason: &str) {
    let trace_id = trace_ctx::trace_id();
    warn!(
        event = "SECURITY_ACCESS_REJECTED",
        %trace_id,
        path,
        reason,
        "Protected route rejected"
    );
}
