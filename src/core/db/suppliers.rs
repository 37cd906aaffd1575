//! Supplier, contact and profile queries

use std::collections::BTreeMap;

use rusqlite::{params, OptionalExtension, Row, ToSql};
use serde_json::json;

use super::{contains_pattern, found, is_unique_violation, json_list, list, now_ts, ts, Database};
use crate::core::error::{DbError, DbResult};
use crate::entities::supplier::{
    HubMetadata, HubMetadataInput, ImdsProfile, ImdsProfileInput, LevelCounts, MaturityCounts,
    NewContact, NewSupplier, PcfProfile, PcfProfileInput, Supplier, SupplierContact,
    SupplierFilter, SupplierPatch, SupplierProfile, SupplierStats,
};

const SUPPLIER_COLUMNS: &str = "id, external_id, name, parent_group, country_code, region, \
     supplier_type, supply_chain_level, main_part_families, created_at, updated_at";

fn supplier_from_row(row: &Row<'_>) -> rusqlite::Result<Supplier> {
    Ok(Supplier {
        id: row.get("id")?,
        external_id: row.get("external_id")?,
        name: row.get("name")?,
        parent_group: row.get("parent_group")?,
        country_code: row.get("country_code")?,
        region: row.get("region")?,
        supplier_type: row.get("supplier_type")?,
        supply_chain_level: row.get("supply_chain_level")?,
        main_part_families: list(row, "main_part_families")?,
        created_at: ts(row, "created_at")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<SupplierContact> {
    Ok(SupplierContact {
        id: row.get("id")?,
        supplier_id: row.get("supplier_id")?,
        full_name: row.get("full_name")?,
        role: row.get("role")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        languages: list(row, "languages")?,
        preferred_channels: list(row, "preferred_channels")?,
        time_zone: row.get("time_zone")?,
        is_primary: row.get("is_primary")?,
        created_at: ts(row, "created_at")?,
    })
}

fn imds_profile_from_row(row: &Row<'_>) -> rusqlite::Result<ImdsProfile> {
    Ok(ImdsProfile {
        id: row.get("id")?,
        supplier_id: row.get("supplier_id")?,
        imds_id: row.get("imds_id")?,
        oems_served: list(row, "oems_served")?,
        on_time_submission_rate: row.get("on_time_submission_rate")?,
        oem_rejection_rate: row.get("oem_rejection_rate")?,
        avg_submission_leadtime_days: row.get("avg_submission_leadtime_days")?,
        support_level: row.get("support_level")?,
        notes: row.get("notes")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn pcf_profile_from_row(row: &Row<'_>) -> rusqlite::Result<PcfProfile> {
    Ok(PcfProfile {
        id: row.get("id")?,
        supplier_id: row.get("supplier_id")?,
        pcf_maturity: row.get("pcf_maturity")?,
        tools_used: list(row, "tools_used")?,
        pcf_count: row.get("pcf_count")?,
        scopes_covered: list(row, "scopes_covered")?,
        reference_years: list(row, "reference_years")?,
        frameworks: list(row, "frameworks")?,
        data_quality_score: row.get("data_quality_score")?,
        notes: row.get("notes")?,
        updated_at: ts(row, "updated_at")?,
    })
}

fn hub_from_row(row: &Row<'_>) -> rusqlite::Result<HubMetadata> {
    Ok(HubMetadata {
        id: row.get("id")?,
        supplier_id: row.get("supplier_id")?,
        priority: row.get("priority")?,
        regulatory_risk: row.get("regulatory_risk")?,
        climate_risk: row.get("climate_risk")?,
        program_status: row.get("program_status")?,
        strategic_notes: row.get("strategic_notes")?,
        updated_at: ts(row, "updated_at")?,
    })
}

impl Database {
    /// List suppliers ordered by name
    pub fn list_suppliers(&self, filter: &SupplierFilter) -> DbResult<Vec<Supplier>> {
        let (skip, limit) = filter.paging()?;

        let mut sql = format!("SELECT {} FROM suppliers WHERE 1=1", SUPPLIER_COLUMNS);
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(country) = &filter.country_code {
            sql.push_str(" AND country_code = ?");
            values.push(Box::new(country.trim().to_ascii_uppercase()));
        }
        if let Some(kind) = filter.supplier_type {
            sql.push_str(" AND supplier_type = ?");
            values.push(Box::new(kind));
        }
        if let Some(level) = filter.supply_chain_level {
            sql.push_str(" AND supply_chain_level = ?");
            values.push(Box::new(level));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sql.push_str(
                " AND (fold_case(name) LIKE ? ESCAPE '\\' \
                 OR fold_case(COALESCE(external_id, '')) LIKE ? ESCAPE '\\')",
            );
            let pattern = contains_pattern(search);
            values.push(Box::new(pattern.clone()));
            values.push(Box::new(pattern));
        }

        sql.push_str(" ORDER BY name COLLATE NOCASE, id LIMIT ? OFFSET ?");
        values.push(Box::new(limit));
        values.push(Box::new(skip));

        let mut stmt = self.conn.prepare(&sql)?;
        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let rows = stmt.query_map(params.as_slice(), supplier_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub fn get_supplier(&self, id: i64) -> DbResult<Supplier> {
        found(
            self.conn.query_row(
                &format!("SELECT {} FROM suppliers WHERE id = ?1", SUPPLIER_COLUMNS),
                [id],
                supplier_from_row,
            ),
            "supplier",
            id,
        )
    }

    /// Look a supplier up by its external reference (e.g. `SUP-001`)
    pub fn find_supplier_by_external_id(&self, external_id: &str) -> DbResult<Option<Supplier>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {} FROM suppliers WHERE external_id = ?1", SUPPLIER_COLUMNS),
                [external_id],
                supplier_from_row,
            )
            .optional()?)
    }

    /// Supplier plus contacts, profiles and hub metadata
    pub fn supplier_profile(&self, id: i64) -> DbResult<SupplierProfile> {
        let supplier = self.get_supplier(id)?;
        Ok(SupplierProfile {
            contacts: self.list_contacts(id)?,
            imds_profile: self.find_imds_profile(id)?,
            pcf_profile: self.find_pcf_profile(id)?,
            hub_metadata: self.find_hub_metadata(id)?,
            supplier,
        })
    }

    pub fn create_supplier(&mut self, mut new: NewSupplier) -> DbResult<Supplier> {
        new.validate()?;
        let now = now_ts();
        let result = self.conn.execute(
            "INSERT INTO suppliers (external_id, name, parent_group, country_code, region,
                                    supplier_type, supply_chain_level, main_part_families,
                                    created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                new.external_id,
                new.name,
                new.parent_group,
                new.country_code,
                new.region,
                new.supplier_type,
                new.supply_chain_level,
                json_list(&new.main_part_families),
                now,
            ],
        );
        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(DbError::Conflict(format!(
                    "supplier with external_id '{}' already exists",
                    new.external_id.unwrap_or_default()
                )));
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.conn.last_insert_rowid();
        self.record_event("supplier.created", Some(id), None, json!({ "name": new.name }))?;
        self.get_supplier(id)
    }

    /// Apply the fields present in `patch` and refresh `updated_at`
    pub fn update_supplier(&mut self, id: i64, mut patch: SupplierPatch) -> DbResult<Supplier> {
        patch.validate()?;
        self.get_supplier(id)?;

        let families = patch.main_part_families.as_deref().map(json_list);
        self.conn.execute(
            "UPDATE suppliers SET
                name = COALESCE(?2, name),
                parent_group = COALESCE(?3, parent_group),
                country_code = COALESCE(?4, country_code),
                region = COALESCE(?5, region),
                supplier_type = COALESCE(?6, supplier_type),
                supply_chain_level = COALESCE(?7, supply_chain_level),
                main_part_families = COALESCE(?8, main_part_families),
                updated_at = ?9
             WHERE id = ?1",
            params![
                id,
                patch.name.as_deref().map(str::trim),
                patch.parent_group,
                patch.country_code,
                patch.region,
                patch.supplier_type,
                patch.supply_chain_level,
                families,
                now_ts(),
            ],
        )?;

        self.record_event("supplier.updated", Some(id), None, json!({}))?;
        self.get_supplier(id)
    }

    /// Delete a supplier and everything attached to it
    pub fn delete_supplier(&mut self, id: i64) -> DbResult<Supplier> {
        let supplier = self.get_supplier(id)?;
        self.conn.execute("DELETE FROM suppliers WHERE id = ?1", [id])?;
        self.record_event(
            "supplier.deleted",
            None,
            None,
            json!({ "id": id, "name": supplier.name }),
        )?;
        Ok(supplier)
    }

    pub fn list_contacts(&self, supplier_id: i64) -> DbResult<Vec<SupplierContact>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM supplier_contacts WHERE supplier_id = ?1
             ORDER BY is_primary DESC, full_name",
        )?;
        let rows = stmt.query_map([supplier_id], contact_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    /// Add a contact; a new primary contact demotes the previous one
    pub fn add_contact(&mut self, supplier_id: i64, contact: NewContact) -> DbResult<SupplierContact> {
        contact.validate()?;
        self.get_supplier(supplier_id)?;

        if contact.is_primary {
            self.conn.execute(
                "UPDATE supplier_contacts SET is_primary = 0 WHERE supplier_id = ?1",
                [supplier_id],
            )?;
        }

        self.conn.execute(
            "INSERT INTO supplier_contacts (supplier_id, full_name, role, email, phone, languages,
                                            preferred_channels, time_zone, is_primary, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                supplier_id,
                contact.full_name.trim(),
                contact.role,
                contact.email,
                contact.phone,
                json_list(&contact.languages),
                json_list(&contact.preferred_channels),
                contact.time_zone,
                contact.is_primary,
                now_ts(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.record_event(
            "supplier.contact_added",
            Some(supplier_id),
            None,
            json!({ "contact_id": id }),
        )?;

        found(
            self.conn.query_row(
                "SELECT * FROM supplier_contacts WHERE id = ?1",
                [id],
                contact_from_row,
            ),
            "contact",
            id,
        )
    }

    fn find_imds_profile(&self, supplier_id: i64) -> DbResult<Option<ImdsProfile>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM imds_profiles WHERE supplier_id = ?1",
                [supplier_id],
                imds_profile_from_row,
            )
            .optional()?)
    }

    fn find_pcf_profile(&self, supplier_id: i64) -> DbResult<Option<PcfProfile>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM pcf_profiles WHERE supplier_id = ?1",
                [supplier_id],
                pcf_profile_from_row,
            )
            .optional()?)
    }

    fn find_hub_metadata(&self, supplier_id: i64) -> DbResult<Option<HubMetadata>> {
        Ok(self
            .conn
            .query_row(
                "SELECT * FROM supplier_hub_metadata WHERE supplier_id = ?1",
                [supplier_id],
                hub_from_row,
            )
            .optional()?)
    }

    pub fn imds_profile(&self, supplier_id: i64) -> DbResult<ImdsProfile> {
        self.get_supplier(supplier_id)?;
        self.find_imds_profile(supplier_id)?
            .ok_or_else(|| DbError::not_found("IMDS profile for supplier", supplier_id))
    }

    pub fn pcf_profile(&self, supplier_id: i64) -> DbResult<PcfProfile> {
        self.get_supplier(supplier_id)?;
        self.find_pcf_profile(supplier_id)?
            .ok_or_else(|| DbError::not_found("PCF profile for supplier", supplier_id))
    }

    /// Create or replace the supplier's IMDS profile
    pub fn upsert_imds_profile(&mut self, supplier_id: i64, input: ImdsProfileInput) -> DbResult<ImdsProfile> {
        input.validate()?;
        self.get_supplier(supplier_id)?;
        self.conn.execute(
            "INSERT INTO imds_profiles (supplier_id, imds_id, oems_served, on_time_submission_rate,
                                        oem_rejection_rate, avg_submission_leadtime_days,
                                        support_level, notes, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(supplier_id) DO UPDATE SET
                imds_id = excluded.imds_id,
                oems_served = excluded.oems_served,
                on_time_submission_rate = excluded.on_time_submission_rate,
                oem_rejection_rate = excluded.oem_rejection_rate,
                avg_submission_leadtime_days = excluded.avg_submission_leadtime_days,
                support_level = excluded.support_level,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
            params![
                supplier_id,
                input.imds_id,
                json_list(&input.oems_served),
                input.on_time_submission_rate,
                input.oem_rejection_rate,
                input.avg_submission_leadtime_days,
                input.support_level,
                input.notes,
                now_ts(),
            ],
        )?;
        self.record_event("supplier.imds_profile", Some(supplier_id), None, json!({}))?;
        self.imds_profile(supplier_id)
    }

    /// Create or replace the supplier's PCF profile
    pub fn upsert_pcf_profile(&mut self, supplier_id: i64, input: PcfProfileInput) -> DbResult<PcfProfile> {
        input.validate()?;
        self.get_supplier(supplier_id)?;
        self.conn.execute(
            "INSERT INTO pcf_profiles (supplier_id, pcf_maturity, tools_used, pcf_count,
                                       scopes_covered, reference_years, frameworks,
                                       data_quality_score, notes, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(supplier_id) DO UPDATE SET
                pcf_maturity = excluded.pcf_maturity,
                tools_used = excluded.tools_used,
                pcf_count = excluded.pcf_count,
                scopes_covered = excluded.scopes_covered,
                reference_years = excluded.reference_years,
                frameworks = excluded.frameworks,
                data_quality_score = excluded.data_quality_score,
                notes = excluded.notes,
                updated_at = excluded.updated_at",
            params![
                supplier_id,
                input.pcf_maturity,
                json_list(&input.tools_used),
                input.pcf_count,
                json_list(&input.scopes_covered),
                json_list(&input.reference_years),
                json_list(&input.frameworks),
                input.data_quality_score,
                input.notes,
                now_ts(),
            ],
        )?;
        self.record_event("supplier.pcf_profile", Some(supplier_id), None, json!({}))?;
        self.pcf_profile(supplier_id)
    }

    pub fn upsert_hub_metadata(&mut self, supplier_id: i64, input: HubMetadataInput) -> DbResult<HubMetadata> {
        self.get_supplier(supplier_id)?;
        self.conn.execute(
            "INSERT INTO supplier_hub_metadata (supplier_id, priority, regulatory_risk, climate_risk,
                                                program_status, strategic_notes, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(supplier_id) DO UPDATE SET
                priority = excluded.priority,
                regulatory_risk = excluded.regulatory_risk,
                climate_risk = excluded.climate_risk,
                program_status = excluded.program_status,
                strategic_notes = excluded.strategic_notes,
                updated_at = excluded.updated_at",
            params![
                supplier_id,
                input.priority,
                input.regulatory_risk,
                input.climate_risk,
                input.program_status,
                input.strategic_notes,
                now_ts(),
            ],
        )?;
        self.record_event("supplier.hub_metadata", Some(supplier_id), None, json!({}))?;
        self.find_hub_metadata(supplier_id)?
            .ok_or_else(|| DbError::not_found("hub metadata for supplier", supplier_id))
    }

    /// Supplier counts by tier, region and PCF maturity
    pub fn supplier_stats(&self) -> DbResult<SupplierStats> {
        let (total, tier1, tier2): (i64, i64, i64) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(supply_chain_level = 'tier1'), 0),
                    COALESCE(SUM(supply_chain_level = 'tier2'), 0)
             FROM suppliers",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let mut by_region = BTreeMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(NULLIF(TRIM(region), ''), 'Unknown') AS r, COUNT(*)
             FROM suppliers GROUP BY r",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (region, count) = row?;
            by_region.insert(region, count);
        }

        let pcf_maturity = self.conn.query_row(
            "SELECT COALESCE(SUM(pcf_maturity = 'advanced'), 0),
                    COALESCE(SUM(pcf_maturity = 'intermediate'), 0),
                    COALESCE(SUM(pcf_maturity = 'beginner'), 0)
             FROM pcf_profiles",
            [],
            |row| {
                Ok(MaturityCounts {
                    advanced: row.get(0)?,
                    intermediate: row.get(1)?,
                    beginner: row.get(2)?,
                })
            },
        )?;

        Ok(SupplierStats {
            total,
            by_level: LevelCounts { tier1, tier2 },
            by_region,
            pcf_maturity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::supplier::{PcfMaturity, SupplyChainLevel, SupplierType};

    fn supplier(name: &str, ext: &str, country: &str, level: SupplyChainLevel) -> NewSupplier {
        NewSupplier {
            external_id: Some(ext.to_string()),
            country_code: Some(country.to_string()),
            supply_chain_level: Some(level),
            supplier_type: Some(SupplierType::Component),
            ..NewSupplier::new(name)
        }
    }

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.create_supplier(supplier("Valeo SA", "SUP-002", "fr", SupplyChainLevel::Tier1))
            .unwrap();
        db.create_supplier(supplier("Bosch GmbH", "SUP-001", "DE", SupplyChainLevel::Tier1))
            .unwrap();
        db.create_supplier(supplier("Precision Metals", "SUP-011", "DE", SupplyChainLevel::Tier2))
            .unwrap();
        db
    }

    #[test]
    fn test_list_is_ordered_by_name() {
        let db = seeded();
        let names: Vec<String> = db
            .list_suppliers(&SupplierFilter::default())
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Bosch GmbH", "Precision Metals", "Valeo SA"]);
    }

    #[test]
    fn test_list_filters() {
        let db = seeded();
        let de = db
            .list_suppliers(&SupplierFilter {
                country_code: Some("de".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(de.len(), 2);

        let tier2 = db
            .list_suppliers(&SupplierFilter {
                supply_chain_level: Some(SupplyChainLevel::Tier2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(tier2.len(), 1);
        assert_eq!(tier2[0].name, "Precision Metals");

        let by_ext = db
            .list_suppliers(&SupplierFilter {
                search: Some("sup-00".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_ext.len(), 2);

        let by_name = db
            .list_suppliers(&SupplierFilter {
                search: Some("VALEO".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_name.len(), 1);
    }

    #[test]
    fn test_search_folds_accents_and_escapes_wildcards() {
        let mut db = seeded();
        db.create_supplier(NewSupplier::new("Électricité Bernard")).unwrap();
        db.create_supplier(NewSupplier::new("Forge 100% Acier")).unwrap();

        let search = |db: &Database, text: &str| {
            db.list_suppliers(&SupplierFilter {
                search: Some(text.to_string()),
                ..Default::default()
            })
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect::<Vec<_>>()
        };

        assert_eq!(search(&db, "Électricité"), vec!["Électricité Bernard"]);
        assert_eq!(search(&db, "éLECTRICITÉ bernard"), vec!["Électricité Bernard"]);
        assert!(search(&db, "_").is_empty());
        assert_eq!(search(&db, "100%"), vec!["Forge 100% Acier"]);
        assert!(search(&db, "0%a").is_empty());
    }

    #[test]
    fn test_contains_pattern_escapes() {
        assert_eq!(contains_pattern("A_b%c\\"), "%a\\_b\\%c\\\\%");
    }

    #[test]
    fn test_list_paging() {
        let db = seeded();
        let page = db
            .list_suppliers(&SupplierFilter {
                skip: Some(1),
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Precision Metals");
    }

    #[test]
    fn test_create_normalizes_and_conflicts() {
        let mut db = seeded();
        let valeo = db.find_supplier_by_external_id("SUP-002").unwrap().unwrap();
        assert_eq!(valeo.country_code.as_deref(), Some("FR"));

        let err = db
            .create_supplier(supplier("Valeo Bis", "SUP-002", "FR", SupplyChainLevel::Tier1))
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[test]
    fn test_suppliers_without_external_id_do_not_conflict() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_supplier(NewSupplier::new("A")).unwrap();
        db.create_supplier(NewSupplier::new("B")).unwrap();
        assert_eq!(db.supplier_stats().unwrap().total, 2);
    }

    #[test]
    fn test_update_only_touches_given_fields() {
        let mut db = seeded();
        let bosch = db.find_supplier_by_external_id("SUP-001").unwrap().unwrap();
        let updated = db
            .update_supplier(
                bosch.id,
                SupplierPatch {
                    region: Some("Europe".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.region.as_deref(), Some("Europe"));
        assert_eq!(updated.name, "Bosch GmbH");
        assert_eq!(updated.country_code.as_deref(), Some("DE"));
        assert!(updated.updated_at >= bosch.updated_at);
    }

    #[test]
    fn test_update_missing_supplier() {
        let mut db = seeded();
        let err = db.update_supplier(999, SupplierPatch::default()).unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_primary_contact_is_unique() {
        let mut db = seeded();
        let id = db.find_supplier_by_external_id("SUP-001").unwrap().unwrap().id;
        db.add_contact(
            id,
            NewContact {
                full_name: "Hans Weber".to_string(),
                is_primary: true,
                ..Default::default()
            },
        )
        .unwrap();
        db.add_contact(
            id,
            NewContact {
                full_name: "Klara Vogel".to_string(),
                email: Some("klara@bosch.example".to_string()),
                is_primary: true,
                ..Default::default()
            },
        )
        .unwrap();

        let contacts = db.list_contacts(id).unwrap();
        let primaries: Vec<&str> = contacts
            .iter()
            .filter(|c| c.is_primary)
            .map(|c| c.full_name.as_str())
            .collect();
        assert_eq!(primaries, vec!["Klara Vogel"]);
    }

    #[test]
    fn test_profile_upserts_and_cascade() {
        let mut db = seeded();
        let id = db.find_supplier_by_external_id("SUP-002").unwrap().unwrap().id;

        assert!(matches!(db.pcf_profile(id), Err(DbError::NotFound { .. })));

        db.upsert_pcf_profile(
            id,
            PcfProfileInput {
                pcf_maturity: Some(PcfMaturity::Advanced),
                pcf_count: 12,
                reference_years: vec![2023, 2024],
                ..Default::default()
            },
        )
        .unwrap();
        let again = db
            .upsert_pcf_profile(
                id,
                PcfProfileInput {
                    pcf_maturity: Some(PcfMaturity::Intermediate),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(again.pcf_maturity, Some(PcfMaturity::Intermediate));
        assert_eq!(again.pcf_count, 0);

        db.upsert_imds_profile(
            id,
            ImdsProfileInput {
                oems_served: vec!["Stellantis".to_string(), "Renault".to_string()],
                on_time_submission_rate: Some(0.9),
                ..Default::default()
            },
        )
        .unwrap();

        let profile = db.supplier_profile(id).unwrap();
        assert_eq!(profile.imds_profile.unwrap().oems_served.len(), 2);
        assert!(profile.hub_metadata.is_none());

        db.delete_supplier(id).unwrap();
        let counts: i64 = db
            .conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM pcf_profiles) + (SELECT COUNT(*) FROM imds_profiles)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(counts, 0);
    }

    #[test]
    fn test_stats() {
        let mut db = seeded();
        let id = db.find_supplier_by_external_id("SUP-001").unwrap().unwrap().id;
        db.update_supplier(
            id,
            SupplierPatch {
                region: Some("Europe".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        db.upsert_pcf_profile(
            id,
            PcfProfileInput {
                pcf_maturity: Some(PcfMaturity::Beginner),
                ..Default::default()
            },
        )
        .unwrap();

        let stats = db.supplier_stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_level, LevelCounts { tier1: 2, tier2: 1 });
        assert_eq!(stats.by_region.get("Europe"), Some(&1));
        assert_eq!(stats.by_region.get("Unknown"), Some(&2));
        assert_eq!(stats.pcf_maturity.beginner, 1);
    }
}
