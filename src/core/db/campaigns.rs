//! Campaign and enrollment queries

use std::collections::BTreeMap;

use rusqlite::{params, Row, ToSql};
use serde_json::json;

use super::{found, json_list, list, now_ts, opt_date, opt_ts, ts, Database};
use crate::core::error::{DbError, DbResult};
use crate::entities::campaign::{
    percent, Campaign, CampaignFilter, CampaignPatch, CampaignProgress, CampaignStats,
    CampaignStatus, CampaignSummary, CampaignSupplier, CampaignTotals, NewCampaign,
    ParticipationStatus, ParticipationUpdate,
};

fn campaign_from_row(row: &Row<'_>) -> rusqlite::Result<Campaign> {
    Ok(Campaign {
        id: row.get("id")?,
        name: row.get("name")?,
        campaign_type: row.get("type")?,
        objective: row.get("objective")?,
        start_date: opt_date(row, "start_date")?,
        end_date: opt_date(row, "end_date")?,
        target_part_families: list(row, "target_part_families")?,
        status: row.get("status")?,
        created_by: row.get("created_by")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn enrollment_from_row(row: &Row<'_>) -> rusqlite::Result<CampaignSupplier> {
    Ok(CampaignSupplier {
        id: row.get("id")?,
        campaign_id: row.get("campaign_id")?,
        supplier_id: row.get("supplier_id")?,
        supplier_name: row.get("supplier_name")?,
        status: row.get("status")?,
        last_contact_at: opt_ts(row, "last_contact_at")?,
        reminders_sent: row.get("reminders_sent")?,
        progression_score: row.get("progression_score")?,
        notes: row.get("notes")?,
        updated_at: ts(row, "updated_at")?,
    })
}

const ENROLLMENT_SELECT: &str = "SELECT css.*, s.name AS supplier_name
     FROM campaign_supplier_status css
     JOIN suppliers s ON s.id = css.supplier_id";

impl Database {
    /// Create a campaign; it always starts as a draft
    pub fn create_campaign(&mut self, new: NewCampaign) -> DbResult<Campaign> {
        new.validate()?;
        let created_by = new
            .created_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("system")
            .to_string();
        let now = now_ts();

        self.conn.execute(
            "INSERT INTO campaigns (name, type, objective, start_date, end_date,
                                    target_part_families, status, created_by,
                                    created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                new.name.trim(),
                new.campaign_type,
                new.objective,
                new.start_date.map(|d| d.to_string()),
                new.end_date.map(|d| d.to_string()),
                json_list(&new.target_part_families),
                CampaignStatus::Draft,
                created_by,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.record_event(
            "campaign.created",
            None,
            Some(id),
            json!({ "name": new.name, "type": new.campaign_type }),
        )?;
        self.get_campaign(id)
    }

    pub fn get_campaign(&self, id: i64) -> DbResult<Campaign> {
        found(
            self.conn
                .query_row("SELECT * FROM campaigns WHERE id = ?1", [id], campaign_from_row),
            "campaign",
            id,
        )
    }

    /// Campaign with its enrollment progress
    pub fn campaign_summary(&self, id: i64) -> DbResult<CampaignSummary> {
        let campaign = self.get_campaign(id)?;
        let progress = self.campaign_progress(id)?;
        Ok(CampaignSummary { campaign, progress })
    }

    /// Campaigns newest first, each with progress
    pub fn list_campaigns(&self, filter: &CampaignFilter) -> DbResult<Vec<CampaignSummary>> {
        let mut sql = String::from("SELECT * FROM campaigns WHERE 1=1");
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(kind) = filter.campaign_type {
            sql.push_str(" AND type = ?");
            values.push(Box::new(kind));
        }
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            values.push(Box::new(status));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let campaigns = stmt
            .query_map(params.as_slice(), campaign_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        campaigns
            .into_iter()
            .map(|campaign| {
                let progress = self.campaign_progress(campaign.id)?;
                Ok(CampaignSummary { campaign, progress })
            })
            .collect()
    }

    pub fn campaign_progress(&self, id: i64) -> DbResult<CampaignProgress> {
        let (total, responded, validated): (i64, i64, i64) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status IN ('submitted', 'validated')), 0),
                    COALESCE(SUM(status = 'validated'), 0)
             FROM campaign_supplier_status WHERE campaign_id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(CampaignProgress::new(total, responded, validated))
    }

    pub fn update_campaign(&mut self, id: i64, patch: CampaignPatch) -> DbResult<Campaign> {
        let current = self.get_campaign(id)?;
        patch.validate(&current)?;

        let families = patch.target_part_families.as_deref().map(json_list);
        self.conn.execute(
            "UPDATE campaigns SET
                name = COALESCE(?2, name),
                type = COALESCE(?3, type),
                objective = COALESCE(?4, objective),
                start_date = COALESCE(?5, start_date),
                end_date = COALESCE(?6, end_date),
                target_part_families = COALESCE(?7, target_part_families),
                status = COALESCE(?8, status),
                updated_at = ?9
             WHERE id = ?1",
            params![
                id,
                patch.name.as_deref().map(str::trim),
                patch.campaign_type,
                patch.objective,
                patch.start_date.map(|d| d.to_string()),
                patch.end_date.map(|d| d.to_string()),
                families,
                patch.status,
                now_ts(),
            ],
        )?;

        let data = match patch.status {
            Some(status) if status != current.status => {
                json!({ "from": current.status, "to": status })
            }
            _ => json!({}),
        };
        self.record_event("campaign.updated", None, Some(id), data)?;
        self.get_campaign(id)
    }

    pub fn delete_campaign(&mut self, id: i64) -> DbResult<Campaign> {
        let campaign = self.get_campaign(id)?;
        self.conn.execute("DELETE FROM campaigns WHERE id = ?1", [id])?;
        self.record_event(
            "campaign.deleted",
            None,
            None,
            json!({ "id": id, "name": campaign.name }),
        )?;
        Ok(campaign)
    }

    /// Enroll suppliers; unknown and already-enrolled ids are skipped
    pub fn add_campaign_suppliers(&mut self, id: i64, supplier_ids: &[i64]) -> DbResult<usize> {
        self.get_campaign(id)?;
        let now = now_ts();
        let mut added = 0;
        for supplier_id in supplier_ids {
            added += self.conn.execute(
                "INSERT OR IGNORE INTO campaign_supplier_status (campaign_id, supplier_id, status, updated_at)
                 SELECT ?1, s.id, ?3, ?4 FROM suppliers s WHERE s.id = ?2",
                params![id, supplier_id, ParticipationStatus::NotStarted, now],
            )?;
        }
        if added > 0 {
            self.record_event("campaign.enrolled", None, Some(id), json!({ "added": added }))?;
        }
        Ok(added)
    }

    /// Enrollment rows joined with supplier names
    pub fn campaign_suppliers(&self, id: i64) -> DbResult<Vec<CampaignSupplier>> {
        self.get_campaign(id)?;
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE css.campaign_id = ?1 ORDER BY s.name COLLATE NOCASE",
            ENROLLMENT_SELECT
        ))?;
        let rows = stmt.query_map([id], enrollment_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn enrollment(&self, id: i64, supplier_id: i64) -> DbResult<CampaignSupplier> {
        found(
            self.conn.query_row(
                &format!(
                    "{} WHERE css.campaign_id = ?1 AND css.supplier_id = ?2",
                    ENROLLMENT_SELECT
                ),
                [id, supplier_id],
                enrollment_from_row,
            ),
            "campaign enrollment for supplier",
            supplier_id,
        )
    }

    pub fn set_supplier_status(
        &mut self,
        id: i64,
        supplier_id: i64,
        update: ParticipationUpdate,
    ) -> DbResult<CampaignSupplier> {
        if let Some(score) = update.progression_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(DbError::invalid("progression_score must be between 0 and 100"));
            }
        }
        let before = self.enrollment(id, supplier_id)?;
        self.conn.execute(
            "UPDATE campaign_supplier_status SET
                status = ?3,
                notes = COALESCE(?4, notes),
                progression_score = COALESCE(?5, progression_score),
                updated_at = ?6
             WHERE campaign_id = ?1 AND supplier_id = ?2",
            params![
                id,
                supplier_id,
                update.status,
                update.notes,
                update.progression_score,
                now_ts(),
            ],
        )?;
        self.record_event(
            "campaign.supplier_status",
            Some(supplier_id),
            Some(id),
            json!({ "from": before.status, "to": update.status }),
        )?;
        self.enrollment(id, supplier_id)
    }

    /// Count a reminder sent to an enrolled supplier
    pub fn record_reminder(&mut self, id: i64, supplier_id: i64) -> DbResult<CampaignSupplier> {
        self.enrollment(id, supplier_id)?;
        let now = now_ts();
        self.conn.execute(
            "UPDATE campaign_supplier_status SET
                reminders_sent = reminders_sent + 1,
                last_contact_at = ?3,
                updated_at = ?3
             WHERE campaign_id = ?1 AND supplier_id = ?2",
            params![id, supplier_id, now],
        )?;
        self.record_event("campaign.reminder", Some(supplier_id), Some(id), json!({}))?;
        self.enrollment(id, supplier_id)
    }

    pub fn campaign_stats(&self, id: i64) -> DbResult<CampaignStats> {
        self.get_campaign(id)?;
        let mut by_status = BTreeMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*) FROM campaign_supplier_status
             WHERE campaign_id = ?1 GROUP BY status",
        )?;
        let rows = stmt.query_map([id], |row| {
            Ok((row.get::<_, ParticipationStatus>(0)?, row.get::<_, i64>(1)?))
        })?;

        let (mut total, mut responded, mut validated) = (0, 0, 0);
        for row in rows {
            let (status, count) = row?;
            total += count;
            if status.has_responded() {
                responded += count;
            }
            if status == ParticipationStatus::Validated {
                validated += count;
            }
            by_status.insert(status.to_string(), count);
        }

        Ok(CampaignStats {
            campaign_id: id,
            total,
            by_status,
            response_rate: percent(responded, total),
            validation_rate: percent(validated, total),
        })
    }

    /// Totals across all campaigns
    pub fn campaign_totals(&self) -> DbResult<CampaignTotals> {
        let mut totals = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'active'), 0),
                    COALESCE(SUM(status = 'draft'), 0),
                    COALESCE(SUM(status = 'completed'), 0)
             FROM campaigns",
            [],
            |row| {
                Ok(CampaignTotals {
                    total: row.get(0)?,
                    active: row.get(1)?,
                    draft: row.get(2)?,
                    completed: row.get(3)?,
                    total_suppliers_engaged: 0,
                })
            },
        )?;
        totals.total_suppliers_engaged = self.conn.query_row(
            "SELECT COUNT(DISTINCT supplier_id) FROM campaign_supplier_status",
            [],
            |row| row.get(0),
        )?;
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::campaign::CampaignType;
    use crate::entities::supplier::NewSupplier;

    fn setup() -> (Database, Vec<i64>) {
        let mut db = Database::open_in_memory().unwrap();
        let ids = ["Bosch", "Continental", "Denso", "Lear"]
            .iter()
            .map(|n| db.create_supplier(NewSupplier::new(*n)).unwrap().id)
            .collect();
        (db, ids)
    }

    #[test]
    fn test_create_starts_as_draft() {
        let (mut db, _) = setup();
        let c = db
            .create_campaign(NewCampaign::new("IMDS Q1 2025", CampaignType::Imds))
            .unwrap();
        assert_eq!(c.status, CampaignStatus::Draft);
        assert_eq!(c.created_by, "system");
    }

    #[test]
    fn test_list_newest_first_with_filters() {
        let (mut db, _) = setup();
        let first = db
            .create_campaign(NewCampaign::new("First", CampaignType::Imds))
            .unwrap();
        let second = db
            .create_campaign(NewCampaign::new("Second", CampaignType::Pcf))
            .unwrap();

        let all = db.list_campaigns(&CampaignFilter::default()).unwrap();
        assert_eq!(all[0].campaign.id, second.id);
        assert_eq!(all[1].campaign.id, first.id);

        let pcf = db
            .list_campaigns(&CampaignFilter {
                campaign_type: Some(CampaignType::Pcf),
                status: None,
            })
            .unwrap();
        assert_eq!(pcf.len(), 1);
        assert_eq!(pcf[0].progress.progress, 0.0);
    }

    #[test]
    fn test_enrollment_skips_unknown_and_duplicates() {
        let (mut db, ids) = setup();
        let c = db
            .create_campaign(NewCampaign::new("PCF wave", CampaignType::Pcf))
            .unwrap();

        assert_eq!(db.add_campaign_suppliers(c.id, &[ids[0], ids[1], 999]).unwrap(), 2);
        assert_eq!(db.add_campaign_suppliers(c.id, &[ids[1], ids[2]]).unwrap(), 1);
        assert_eq!(db.campaign_suppliers(c.id).unwrap().len(), 3);

        let err = db.add_campaign_suppliers(999, &[ids[0]]).unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_progress_and_stats() {
        let (mut db, ids) = setup();
        let c = db
            .create_campaign(NewCampaign::new("Mixed", CampaignType::Mixed))
            .unwrap();
        db.add_campaign_suppliers(c.id, &ids).unwrap();

        let set = |db: &mut Database, sid: i64, status: ParticipationStatus| {
            db.set_supplier_status(
                c.id,
                sid,
                ParticipationUpdate {
                    status,
                    notes: None,
                    progression_score: None,
                },
            )
            .unwrap();
        };
        set(&mut db, ids[0], ParticipationStatus::Submitted);
        set(&mut db, ids[1], ParticipationStatus::Validated);
        set(&mut db, ids[2], ParticipationStatus::InProgress);

        let progress = db.campaign_progress(c.id).unwrap();
        assert_eq!(progress, CampaignProgress::new(4, 2, 1));
        assert_eq!(progress.progress, 50.0);

        let stats = db.campaign_stats(c.id).unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.response_rate, 50.0);
        assert_eq!(stats.validation_rate, 25.0);
        assert_eq!(stats.by_status.get("not_started"), Some(&1));
    }

    #[test]
    fn test_status_for_unenrolled_supplier() {
        let (mut db, ids) = setup();
        let c = db
            .create_campaign(NewCampaign::new("IMDS", CampaignType::Imds))
            .unwrap();
        let err = db
            .set_supplier_status(
                c.id,
                ids[0],
                ParticipationUpdate {
                    status: ParticipationStatus::Submitted,
                    notes: None,
                    progression_score: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_reminders() {
        let (mut db, ids) = setup();
        let c = db
            .create_campaign(NewCampaign::new("IMDS", CampaignType::Imds))
            .unwrap();
        db.add_campaign_suppliers(c.id, &ids[..1]).unwrap();
        db.record_reminder(c.id, ids[0]).unwrap();
        let row = db.record_reminder(c.id, ids[0]).unwrap();
        assert_eq!(row.reminders_sent, 2);
        assert!(row.last_contact_at.is_some());
    }

    #[test]
    fn test_update_checks_dates_against_stored() {
        let (mut db, _) = setup();
        let mut new = NewCampaign::new("Dated", CampaignType::Pcf);
        new.start_date = chrono::NaiveDate::from_ymd_opt(2025, 3, 1);
        let c = db.create_campaign(new).unwrap();

        let err = db
            .update_campaign(
                c.id,
                CampaignPatch {
                    end_date: chrono::NaiveDate::from_ymd_opt(2025, 2, 1),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));

        let active = db
            .update_campaign(
                c.id,
                CampaignPatch {
                    status: Some(CampaignStatus::Active),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(active.status, CampaignStatus::Active);
        assert_eq!(active.name, "Dated");
    }

    #[test]
    fn test_totals_and_delete_cascade() {
        let (mut db, ids) = setup();
        let a = db
            .create_campaign(NewCampaign::new("A", CampaignType::Imds))
            .unwrap();
        let b = db
            .create_campaign(NewCampaign::new("B", CampaignType::Pcf))
            .unwrap();
        db.add_campaign_suppliers(a.id, &ids[..2]).unwrap();
        db.add_campaign_suppliers(b.id, &ids[1..3]).unwrap();
        db.update_campaign(
            b.id,
            CampaignPatch {
                status: Some(CampaignStatus::Active),
                ..Default::default()
            },
        )
        .unwrap();

        let totals = db.campaign_totals().unwrap();
        assert_eq!(totals.total, 2);
        assert_eq!(totals.active, 1);
        assert_eq!(totals.draft, 1);
        assert_eq!(totals.total_suppliers_engaged, 3);

        db.delete_campaign(a.id).unwrap();
        assert_eq!(db.campaign_totals().unwrap().total_suppliers_engaged, 2);
    }
}
