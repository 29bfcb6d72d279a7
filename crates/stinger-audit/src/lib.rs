//! Asynchronous, append-only audit trail for forensic analysis, independent
//! of developer logging (spec §4.6).

pub mod destination;
pub mod query;
pub mod record;
pub mod redact;
pub mod stats;
pub mod trail;

pub use destination::Destination;
pub use query::{export_csv, export_json, query, QueryFilter};
pub use record::AuditRecord;
pub use stats::StatsSnapshot;
pub use trail::{AuditTrail, EnableOptions};

use once_cell::sync::OnceCell;

static GLOBAL: OnceCell<AuditTrail> = OnceCell::new();

/// The process-wide audit trail singleton, disabled until `enable` is
/// called.
pub fn get_global_audit_trail() -> &'static AuditTrail {
    GLOBAL.get_or_init(AuditTrail::new)
}
