//! Audit events appended by every mutation

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;

use super::{now_ts, ts, Database};
use crate::core::error::DbResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: i64,
    pub event_type: String,
    pub supplier_id: Option<i64>,
    pub campaign_id: Option<i64>,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Database {
    pub(super) fn record_event(
        &self,
        event_type: &str,
        supplier_id: Option<i64>,
        campaign_id: Option<i64>,
        data: serde_json::Value,
    ) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO events (event_type, supplier_id, campaign_id, data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![event_type, supplier_id, campaign_id, data.to_string(), now_ts()],
        )?;
        Ok(())
    }

    /// Most recent events, newest first
    pub fn recent_events(&self, limit: i64) -> DbResult<Vec<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, event_type, supplier_id, campaign_id, data, created_at
             FROM events ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            let data: String = row.get("data")?;
            Ok(Event {
                id: row.get("id")?,
                event_type: row.get("event_type")?,
                supplier_id: row.get("supplier_id")?,
                campaign_id: row.get("campaign_id")?,
                data: serde_json::from_str(&data).unwrap_or(serde_json::Value::Null),
                created_at: ts(row, "created_at")?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::supplier::NewSupplier;

    #[test]
    fn test_mutations_append_events() {
        let mut db = Database::open_in_memory().unwrap();
        let sup = db.create_supplier(NewSupplier::new("Aisin Seiki")).unwrap();
        db.delete_supplier(sup.id).unwrap();

        let events = db.recent_events(10).unwrap();
        let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["supplier.deleted", "supplier.created"]);
        assert_eq!(events[0].data["id"], sup.id);
    }
}
