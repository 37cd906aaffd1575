//! IMDS submission queries

use rusqlite::{params, Row, ToSql};
use serde_json::json;

use super::{found, now_ts, opt_ts, ts, ts_text, Database};
use crate::core::error::DbResult;
use crate::entities::imds::{ImdsPatch, ImdsQuery, ImdsStatus, ImdsSubmission, NewImdsSubmission};

const IMDS_SELECT: &str = "SELECT i.*, s.name AS supplier_name
     FROM imds_submissions i
     LEFT JOIN suppliers s ON s.id = i.supplier_id";

fn imds_from_row(row: &Row<'_>) -> rusqlite::Result<ImdsSubmission> {
    Ok(ImdsSubmission {
        id: row.get("id")?,
        supplier_id: row.get("supplier_id")?,
        supplier_name: row.get("supplier_name")?,
        campaign_id: row.get("campaign_id")?,
        internal_ref: row.get("internal_ref")?,
        mds_id: row.get("mds_id")?,
        part_number: row.get("part_number")?,
        part_name: row.get("part_name")?,
        oem: row.get("oem")?,
        status: row.get("status")?,
        rejection_reason: row.get("rejection_reason")?,
        iteration_count: row.get("iteration_count")?,
        submitted_at: opt_ts(row, "submitted_at")?,
        validated_at: opt_ts(row, "validated_at")?,
        notes: row.get("notes")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

impl Database {
    /// IMDS submissions newest first, optionally by supplier and campaign
    pub fn list_imds(&self, query: &ImdsQuery) -> DbResult<Vec<ImdsSubmission>> {
        let mut sql = format!("{} WHERE 1=1", IMDS_SELECT);
        let mut values: Vec<&dyn ToSql> = Vec::new();
        if let Some(supplier_id) = &query.supplier_id {
            sql.push_str(" AND i.supplier_id = ?");
            values.push(supplier_id);
        }
        if let Some(campaign_id) = &query.campaign_id {
            sql.push_str(" AND i.campaign_id = ?");
            values.push(campaign_id);
        }
        sql.push_str(" ORDER BY i.created_at DESC, i.id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(values.as_slice(), imds_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn get_imds(&self, id: i64) -> DbResult<ImdsSubmission> {
        found(
            self.conn.query_row(
                &format!("{} WHERE i.id = ?1", IMDS_SELECT),
                [id],
                imds_from_row,
            ),
            "IMDS submission",
            id,
        )
    }

    pub fn create_imds(&mut self, new: NewImdsSubmission) -> DbResult<ImdsSubmission> {
        let supplier_id = new.validate()?;
        self.get_supplier(supplier_id)?;
        if let Some(campaign_id) = new.campaign_id {
            self.get_campaign(campaign_id)?;
        }

        let now = now_ts();
        let status = new.status.unwrap_or(ImdsStatus::Pending);
        let submitted_at = new.submitted_at.map(ts_text).unwrap_or_else(|| now.clone());
        let validated_at = (status == ImdsStatus::Validated).then(|| now.clone());

        self.conn.execute(
            "INSERT INTO imds_submissions (supplier_id, campaign_id, internal_ref, mds_id,
                                           part_number, part_name, oem, status, submitted_at,
                                           validated_at, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
            params![
                supplier_id,
                new.campaign_id,
                new.internal_ref,
                new.mds_id.trim(),
                new.part_number.trim(),
                new.part_name,
                new.oem,
                status,
                submitted_at,
                validated_at,
                new.notes,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.record_event(
            "imds.created",
            Some(supplier_id),
            new.campaign_id,
            json!({ "id": id, "mds_id": new.mds_id }),
        )?;
        self.get_imds(id)
    }

    /// Partial update; entering `validated` or `rejected` stamps the review
    pub fn update_imds(&mut self, id: i64, patch: ImdsPatch) -> DbResult<ImdsSubmission> {
        patch.validate()?;
        let current = self.get_imds(id)?;
        if let Some(campaign_id) = patch.campaign_id {
            self.get_campaign(campaign_id)?;
        }

        let now = now_ts();
        let validated_at = (patch.status == Some(ImdsStatus::Validated)).then(|| now.clone());
        let rejected = patch.status == Some(ImdsStatus::Rejected);

        self.conn.execute(
            "UPDATE imds_submissions SET
                campaign_id = COALESCE(?2, campaign_id),
                internal_ref = COALESCE(?3, internal_ref),
                mds_id = COALESCE(?4, mds_id),
                part_number = COALESCE(?5, part_number),
                part_name = COALESCE(?6, part_name),
                oem = COALESCE(?7, oem),
                status = COALESCE(?8, status),
                rejection_reason = COALESCE(?9, rejection_reason),
                notes = COALESCE(?10, notes),
                validated_at = COALESCE(?11, validated_at),
                iteration_count = iteration_count + ?12,
                updated_at = ?13
             WHERE id = ?1",
            params![
                id,
                patch.campaign_id,
                patch.internal_ref,
                patch.mds_id.as_deref().map(str::trim),
                patch.part_number.as_deref().map(str::trim),
                patch.part_name,
                patch.oem,
                patch.status,
                patch.rejection_reason,
                patch.notes,
                validated_at,
                rejected as i64,
                now,
            ],
        )?;

        let data = match patch.status {
            Some(status) => json!({ "id": id, "from": current.status, "to": status }),
            None => json!({ "id": id }),
        };
        self.record_event("imds.updated", Some(current.supplier_id), current.campaign_id, data)?;
        self.get_imds(id)
    }

    /// Delete a submission and return what was removed
    pub fn delete_imds(&mut self, id: i64) -> DbResult<ImdsSubmission> {
        let submission = self.get_imds(id)?;
        self.conn.execute("DELETE FROM imds_submissions WHERE id = ?1", [id])?;
        self.record_event(
            "imds.deleted",
            Some(submission.supplier_id),
            submission.campaign_id,
            json!({ "id": id }),
        )?;
        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DbError;
    use crate::entities::supplier::NewSupplier;

    fn setup() -> (Database, i64) {
        let mut db = Database::open_in_memory().unwrap();
        let id = db.create_supplier(NewSupplier::new("Faurecia")).unwrap().id;
        (db, id)
    }

    fn new_sheet(supplier_id: i64, mds: &str) -> NewImdsSubmission {
        NewImdsSubmission {
            supplier_id: Some(supplier_id),
            mds_id: mds.to_string(),
            part_number: "PN-4411".to_string(),
            oem: Some("Stellantis".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_defaults() {
        let (mut db, sid) = setup();
        let sheet = db.create_imds(new_sheet(sid, "MDS-1")).unwrap();
        assert_eq!(sheet.status, ImdsStatus::Pending);
        assert!(sheet.submitted_at.is_some());
        assert_eq!(sheet.iteration_count, 0);
        assert_eq!(sheet.supplier_name.as_deref(), Some("Faurecia"));
    }

    #[test]
    fn test_create_requires_known_supplier() {
        let (mut db, _) = setup();
        let err = db.create_imds(new_sheet(404, "MDS-1")).unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let mut missing = new_sheet(1, "MDS-1");
        missing.part_number = String::new();
        assert!(matches!(db.create_imds(missing), Err(DbError::Invalid(_))));
    }

    #[test]
    fn test_validation_stamps_and_rejection_counts() {
        let (mut db, sid) = setup();
        let sheet = db.create_imds(new_sheet(sid, "MDS-2")).unwrap();

        let rejected = db
            .update_imds(
                sheet.id,
                ImdsPatch {
                    status: Some(ImdsStatus::Rejected),
                    rejection_reason: Some("Missing substance CAS numbers".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(rejected.iteration_count, 1);
        assert_eq!(
            rejected.rejection_reason.as_deref(),
            Some("Missing substance CAS numbers")
        );
        assert!(rejected.validated_at.is_none());

        let validated = db
            .update_imds(
                sheet.id,
                ImdsPatch {
                    status: Some(ImdsStatus::Validated),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(validated.validated_at.is_some());
        assert_eq!(validated.iteration_count, 1);
        assert_eq!(validated.mds_id, "MDS-2");
    }

    #[test]
    fn test_list_filters_and_delete() {
        let (mut db, sid) = setup();
        let other = db.create_supplier(NewSupplier::new("Lear")).unwrap().id;
        db.create_imds(new_sheet(sid, "MDS-A")).unwrap();
        let b = db.create_imds(new_sheet(other, "MDS-B")).unwrap();

        let all = db.list_imds(&ImdsQuery::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b.id);

        let mine = db
            .list_imds(&ImdsQuery {
                supplier_id: Some(sid),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(mine.len(), 1);

        let deleted = db.delete_imds(b.id).unwrap();
        assert_eq!(deleted.mds_id, "MDS-B");
        assert!(matches!(db.get_imds(b.id), Err(DbError::NotFound { .. })));
    }
}
