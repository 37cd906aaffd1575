//! PCF declaration queries

use rusqlite::{params, Row, ToSql};
use serde_json::json;

use super::{found, json_list, list, now_ts, opt_ts, ts, Database};
use crate::core::error::{DbError, DbResult};
use crate::entities::pcf::{NewPcfDeclaration, PcfDeclaration, PcfPatch, PcfQuery, ValidationStatus};

const PCF_SELECT: &str = "SELECT p.*, s.name AS supplier_name
     FROM pcf_declarations p
     LEFT JOIN suppliers s ON s.id = p.supplier_id";

fn pcf_from_row(row: &Row<'_>) -> rusqlite::Result<PcfDeclaration> {
    Ok(PcfDeclaration {
        id: row.get("id")?,
        supplier_id: row.get("supplier_id")?,
        supplier_name: row.get("supplier_name")?,
        campaign_id: row.get("campaign_id")?,
        product_ref: row.get("product_ref")?,
        product_name: row.get("product_name")?,
        perimeter: row.get("perimeter")?,
        reference_year: row.get("reference_year")?,
        total_emissions_kgco2e: row.get("total_emissions_kgco2e")?,
        method: row.get("method")?,
        frameworks: list(row, "frameworks")?,
        emission_factor_sources: list(row, "emission_factor_sources")?,
        uncertainty: row.get("uncertainty")?,
        validation_status: row.get("validation_status")?,
        validation_notes: row.get("validation_notes")?,
        validated_at: opt_ts(row, "validated_at")?,
        notes: row.get("notes")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

impl Database {
    /// Declarations newest first, optionally by supplier and campaign
    pub fn list_pcf(&self, query: &PcfQuery) -> DbResult<Vec<PcfDeclaration>> {
        let mut sql = format!("{} WHERE 1=1", PCF_SELECT);
        let mut values: Vec<&dyn ToSql> = Vec::new();
        if let Some(supplier_id) = &query.supplier_id {
            sql.push_str(" AND p.supplier_id = ?");
            values.push(supplier_id);
        }
        if let Some(campaign_id) = &query.campaign_id {
            sql.push_str(" AND p.campaign_id = ?");
            values.push(campaign_id);
        }
        sql.push_str(" ORDER BY p.created_at DESC, p.id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(values.as_slice(), pcf_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn get_pcf(&self, id: i64) -> DbResult<PcfDeclaration> {
        found(
            self.conn
                .query_row(&format!("{} WHERE p.id = ?1", PCF_SELECT), [id], pcf_from_row),
            "PCF declaration",
            id,
        )
    }

    pub fn create_pcf(&mut self, mut new: NewPcfDeclaration) -> DbResult<PcfDeclaration> {
        let supplier_id = new.prepare()?;
        self.get_supplier(supplier_id)?;
        if let Some(campaign_id) = new.campaign_id {
            self.get_campaign(campaign_id)?;
        }

        self.conn.execute(
            "INSERT INTO pcf_declarations (supplier_id, campaign_id, product_ref, product_name,
                                           perimeter, reference_year, total_emissions_kgco2e,
                                           method, frameworks, emission_factor_sources,
                                           uncertainty, validation_status, notes,
                                           created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
            params![
                supplier_id,
                new.campaign_id,
                new.product_ref.trim(),
                new.product_name,
                new.perimeter,
                new.reference_year,
                new.total_emissions_kgco2e,
                new.method,
                json_list(&new.frameworks),
                json_list(&new.emission_factor_sources),
                new.uncertainty,
                ValidationStatus::Pending,
                new.notes,
                now_ts(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.record_event(
            "pcf.created",
            Some(supplier_id),
            new.campaign_id,
            json!({ "id": id, "product_ref": new.product_ref }),
        )?;
        self.get_pcf(id)
    }

    pub fn update_pcf(&mut self, id: i64, patch: PcfPatch) -> DbResult<PcfDeclaration> {
        patch.validate()?;
        let current = self.get_pcf(id)?;
        if let Some(campaign_id) = patch.campaign_id {
            self.get_campaign(campaign_id)?;
        }

        let now = now_ts();
        let validated_at =
            (patch.validation_status == Some(ValidationStatus::Validated)).then(|| now.clone());
        let frameworks = patch.frameworks.as_deref().map(json_list);
        let sources = patch.emission_factor_sources.as_deref().map(json_list);

        self.conn.execute(
            "UPDATE pcf_declarations SET
                campaign_id = COALESCE(?2, campaign_id),
                product_ref = COALESCE(?3, product_ref),
                product_name = COALESCE(?4, product_name),
                perimeter = COALESCE(?5, perimeter),
                reference_year = COALESCE(?6, reference_year),
                total_emissions_kgco2e = COALESCE(?7, total_emissions_kgco2e),
                method = COALESCE(?8, method),
                frameworks = COALESCE(?9, frameworks),
                emission_factor_sources = COALESCE(?10, emission_factor_sources),
                uncertainty = COALESCE(?11, uncertainty),
                validation_status = COALESCE(?12, validation_status),
                validation_notes = COALESCE(?13, validation_notes),
                notes = COALESCE(?14, notes),
                validated_at = COALESCE(?15, validated_at),
                updated_at = ?16
             WHERE id = ?1",
            params![
                id,
                patch.campaign_id,
                patch.product_ref.as_deref().map(str::trim),
                patch.product_name,
                patch.perimeter,
                patch.reference_year,
                patch.total_emissions_kgco2e,
                patch.method,
                frameworks,
                sources,
                patch.uncertainty,
                patch.validation_status,
                patch.validation_notes,
                patch.notes,
                validated_at,
                now,
            ],
        )?;

        let data = match patch.validation_status {
            Some(status) => json!({ "id": id, "from": current.validation_status, "to": status }),
            None => json!({ "id": id }),
        };
        self.record_event("pcf.updated", Some(current.supplier_id), current.campaign_id, data)?;
        self.get_pcf(id)
    }

    /// Mark a declaration validated
    pub fn validate_pcf(&mut self, id: i64, notes: Option<String>) -> DbResult<PcfDeclaration> {
        self.update_pcf(
            id,
            PcfPatch {
                validation_status: Some(ValidationStatus::Validated),
                validation_notes: notes,
                ..Default::default()
            },
        )
    }

    /// Reject a declaration; a reason is mandatory
    pub fn reject_pcf(&mut self, id: i64, reason: &str) -> DbResult<PcfDeclaration> {
        if reason.trim().is_empty() {
            return Err(DbError::invalid("a rejection reason is required"));
        }
        self.update_pcf(
            id,
            PcfPatch {
                validation_status: Some(ValidationStatus::Rejected),
                validation_notes: Some(reason.trim().to_string()),
                ..Default::default()
            },
        )
    }

    pub fn delete_pcf(&mut self, id: i64) -> DbResult<PcfDeclaration> {
        let declaration = self.get_pcf(id)?;
        self.conn.execute("DELETE FROM pcf_declarations WHERE id = ?1", [id])?;
        self.record_event(
            "pcf.deleted",
            Some(declaration.supplier_id),
            declaration.campaign_id,
            json!({ "id": id }),
        )?;
        Ok(declaration)
    }

    /// Sum of declared emissions in kgCO2e
    pub fn total_emissions(&self, campaign_id: Option<i64>) -> DbResult<f64> {
        let total: f64 = match campaign_id {
            Some(cid) => self.conn.query_row(
                "SELECT COALESCE(SUM(total_emissions_kgco2e), 0.0)
                 FROM pcf_declarations WHERE campaign_id = ?1",
                [cid],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "SELECT COALESCE(SUM(total_emissions_kgco2e), 0.0) FROM pcf_declarations",
                [],
                |row| row.get(0),
            )?,
        };
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::campaign::{CampaignType, NewCampaign};
    use crate::entities::supplier::NewSupplier;

    fn setup() -> (Database, i64) {
        let mut db = Database::open_in_memory().unwrap();
        let id = db.create_supplier(NewSupplier::new("Magna")).unwrap().id;
        (db, id)
    }

    fn declaration(supplier_id: i64, kg: f64) -> NewPcfDeclaration {
        NewPcfDeclaration {
            supplier_id: Some(supplier_id),
            product_ref: "SEAT-FRAME-7".to_string(),
            total_emissions_kgco2e: Some(kg),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_applies_defaults() {
        let (mut db, sid) = setup();
        let pcf = db.create_pcf(declaration(sid, 42.0)).unwrap();
        assert_eq!(pcf.perimeter, "cradle-to-gate");
        assert_eq!(pcf.method, "ISO 14067");
        assert_eq!(pcf.validation_status, ValidationStatus::Pending);
        assert!(pcf.validated_at.is_none());
    }

    #[test]
    fn test_create_rejects_zero_emissions() {
        let (mut db, sid) = setup();
        assert!(matches!(
            db.create_pcf(declaration(sid, 0.0)),
            Err(DbError::Invalid(_))
        ));
    }

    #[test]
    fn test_validate_and_reject() {
        let (mut db, sid) = setup();
        let pcf = db.create_pcf(declaration(sid, 10.0)).unwrap();

        let validated = db.validate_pcf(pcf.id, Some("Checked".to_string())).unwrap();
        assert_eq!(validated.validation_status, ValidationStatus::Validated);
        assert!(validated.validated_at.is_some());
        assert_eq!(validated.validation_notes.as_deref(), Some("Checked"));

        assert!(matches!(db.reject_pcf(pcf.id, "  "), Err(DbError::Invalid(_))));
        let rejected = db.reject_pcf(pcf.id, "Secondary data only").unwrap();
        assert_eq!(rejected.validation_status, ValidationStatus::Rejected);
        assert_eq!(rejected.validation_notes.as_deref(), Some("Secondary data only"));
    }

    #[test]
    fn test_total_emissions_by_campaign() {
        let (mut db, sid) = setup();
        let c = db
            .create_campaign(NewCampaign::new("PCF 2025", CampaignType::Pcf))
            .unwrap();
        db.create_pcf(declaration(sid, 100.0)).unwrap();
        db.create_pcf(NewPcfDeclaration {
            campaign_id: Some(c.id),
            ..declaration(sid, 25.5)
        })
        .unwrap();

        assert_eq!(db.total_emissions(None).unwrap(), 125.5);
        assert_eq!(db.total_emissions(Some(c.id)).unwrap(), 25.5);
        assert_eq!(db.total_emissions(Some(999)).unwrap(), 0.0);
    }

    #[test]
    fn test_campaign_delete_keeps_declaration() {
        let (mut db, sid) = setup();
        let c = db
            .create_campaign(NewCampaign::new("PCF 2025", CampaignType::Pcf))
            .unwrap();
        let pcf = db
            .create_pcf(NewPcfDeclaration {
                campaign_id: Some(c.id),
                ..declaration(sid, 5.0)
            })
            .unwrap();
        db.delete_campaign(c.id).unwrap();
        assert_eq!(db.get_pcf(pcf.id).unwrap().campaign_id, None);
    }
}
