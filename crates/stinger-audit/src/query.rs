//! Read-path utilities: `query`, `export_csv`, `export_json` (spec §4.6).

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use stinger_types::{StingerError, StingerResult};

use crate::record::AuditRecord;
use crate::trail::read_lines;

#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub user_id: Option<String>,
    pub conversation_id: Option<String>,
    pub event_type: Option<String>,
    pub last_hour: bool,
}

/// Reads `destination`, parses each line as an `AuditRecord`, and returns
/// the ones matching `filter`. Lines that fail to parse are skipped rather
/// than aborting the whole query — an audit log is append-only, and a
/// malformed line (a partial write from a crash, say) shouldn't hide every
/// record after it.
pub fn query(destination: &Path, filter: &QueryFilter) -> StingerResult<Vec<AuditRecord>> {
    let lines = read_lines(destination).map_err(StingerError::Io)?;
    let cutoff = filter.last_hour.then(|| Utc::now() - chrono::Duration::hours(1));

    Ok(lines
        .into_iter()
        .filter_map(|line| serde_json::from_str::<AuditRecord>(&line).ok())
        .filter(|record| {
            filter
                .user_id
                .as_deref()
                .map_or(true, |id| record.user_id() == Some(id))
        })
        .filter(|record| {
            filter
                .conversation_id
                .as_deref()
                .map_or(true, |id| record.conversation_id() == Some(id))
        })
        .filter(|record| {
            filter
                .event_type
                .as_deref()
                .map_or(true, |t| record.event_type() == t)
        })
        .filter(|record| cutoff.map_or(true, |cutoff| record.timestamp() >= cutoff))
        .collect())
}

#[derive(Debug, Serialize)]
struct ExportEnvelope<'a> {
    exported_at: chrono::DateTime<Utc>,
    filter: &'a QueryFilter,
    record_count: usize,
    records: &'a [AuditRecord],
}

impl Serialize for QueryFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("QueryFilter", 4)?;
        s.serialize_field("user_id", &self.user_id)?;
        s.serialize_field("conversation_id", &self.conversation_id)?;
        s.serialize_field("event_type", &self.event_type)?;
        s.serialize_field("last_hour", &self.last_hour)?;
        s.end()
    }
}

pub fn export_json(
    destination: &Path,
    filter: &QueryFilter,
    output_file: Option<PathBuf>,
) -> StingerResult<PathBuf> {
    let records = query(destination, filter)?;
    let output = output_file.unwrap_or_else(|| PathBuf::from("audit-export.json"));
    let envelope = ExportEnvelope {
        exported_at: Utc::now(),
        filter,
        record_count: records.len(),
        records: &records,
    };
    let json = serde_json::to_string_pretty(&envelope)?;
    std::fs::write(&output, json)?;
    Ok(output)
}

pub fn export_csv(
    destination: &Path,
    filter: &QueryFilter,
    output_file: Option<PathBuf>,
) -> StingerResult<PathBuf> {
    let records = query(destination, filter)?;
    let output = output_file.unwrap_or_else(|| PathBuf::from("audit-export.csv"));

    let mut writer = csv::Writer::from_path(&output)
        .map_err(|e| StingerError::Internal(format!("failed to open CSV export file: {e}")))?;
    writer
        .write_record(["timestamp", "event_type", "user_id", "conversation_id", "fields"])
        .map_err(|e| StingerError::Internal(format!("failed to write CSV header: {e}")))?;

    for record in &records {
        let fields: Value = serde_json::to_value(record)?;
        writer
            .write_record([
                record.timestamp().to_rfc3339(),
                record.event_type().to_string(),
                record.user_id().unwrap_or_default().to_string(),
                record.conversation_id().unwrap_or_default().to_string(),
                fields.to_string(),
            ])
            .map_err(|e| StingerError::Internal(format!("failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| StingerError::Internal(format!("failed to flush CSV export: {e}")))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::{AuditTrail, EnableOptions};
    use tempfile::tempdir;

    #[tokio::test]
    async fn query_filters_by_event_type() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let trail = AuditTrail::new();
        trail
            .enable(EnableOptions {
                destination: Some(path.to_string_lossy().to_string()),
                redact_pii: Some(false),
                buffer_size: Some(10),
                flush_interval_secs: Some(60),
            })
            .await
            .unwrap();
        trail.log_prompt("hi", Some("u1"), None, None);
        trail.disable().await.unwrap();

        let records = query(
            &path,
            &QueryFilter {
                event_type: Some("user_prompt".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(records.len(), 1);

        let none = query(
            &path,
            &QueryFilter {
                event_type: Some("llm_response".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn export_json_writes_envelope_with_record_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let trail = AuditTrail::new();
        trail
            .enable(EnableOptions {
                destination: Some(path.to_string_lossy().to_string()),
                redact_pii: Some(false),
                buffer_size: Some(10),
                flush_interval_secs: Some(60),
            })
            .await
            .unwrap();
        trail.log_prompt("hi", None, None, None);
        trail.disable().await.unwrap();

        let output = dir.path().join("export.json");
        export_json(&path, &QueryFilter::default(), Some(output.clone())).unwrap();
        let contents = std::fs::read_to_string(&output).unwrap();
        assert!(contents.contains("\"record_count\": 2"));
    }
}
