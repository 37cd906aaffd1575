//! Demo dataset for trying the API and the dashboard
//!
//! Twelve automotive suppliers (ten tier-1, two tier-2) with contacts and
//! profiles, three campaigns, enrollments, IMDS submissions, PCF
//! declarations and one user per role. Numbers are drawn from the given RNG
//! so a fixed seed gives a reproducible database.

use chrono::{Duration, NaiveDate, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

use crate::core::db::Database;
use crate::core::error::{DbError, DbResult};
use crate::entities::campaign::{
    Campaign, CampaignPatch, CampaignStatus, CampaignType, NewCampaign, ParticipationStatus,
    ParticipationUpdate,
};
use crate::entities::imds::{ImdsPatch, ImdsStatus, NewImdsSubmission};
use crate::entities::pcf::NewPcfDeclaration;
use crate::entities::supplier::{
    HubMetadataInput, HubPriority, ImdsProfileInput, NewContact, NewSupplier, PcfMaturity,
    PcfProfileInput, RiskRating, Supplier, SupplierType, SupplyChainLevel, SupportLevel,
};
use crate::entities::user::{NewUser, Role};

struct DemoSupplier {
    external_id: &'static str,
    name: &'static str,
    parent_group: Option<&'static str>,
    country_code: &'static str,
    region: &'static str,
    supplier_type: SupplierType,
    level: SupplyChainLevel,
    part_families: &'static [&'static str],
}

const fn tier1(
    external_id: &'static str,
    name: &'static str,
    parent_group: &'static str,
    country_code: &'static str,
    region: &'static str,
    supplier_type: SupplierType,
    part_families: &'static [&'static str],
) -> DemoSupplier {
    DemoSupplier {
        external_id,
        name,
        parent_group: Some(parent_group),
        country_code,
        region,
        supplier_type,
        level: SupplyChainLevel::Tier1,
        part_families,
    }
}

const DEMO_SUPPLIERS: &[DemoSupplier] = &[
    tier1("SUP-001", "Bosch Automotive", "Robert Bosch GmbH", "DE", "Europe",
        SupplierType::Component, &["electronics", "sensors", "actuators"]),
    tier1("SUP-002", "Valeo SA", "Valeo", "FR", "Europe",
        SupplierType::Assembly, &["lighting", "thermal", "visibility"]),
    tier1("SUP-003", "Continental AG", "Continental", "DE", "Europe",
        SupplierType::Component, &["tires", "brakes", "electronics"]),
    tier1("SUP-004", "Denso Corporation", "Denso", "JP", "Asia",
        SupplierType::Component, &["thermal", "powertrain", "electronics"]),
    tier1("SUP-005", "ZF Friedrichshafen", "ZF Group", "DE", "Europe",
        SupplierType::Assembly, &["transmission", "chassis", "safety"]),
    tier1("SUP-006", "Magna International", "Magna", "CA", "North America",
        SupplierType::Assembly, &["body", "chassis", "seating"]),
    tier1("SUP-007", "Aisin Seiki", "Aisin", "JP", "Asia",
        SupplierType::Component, &["drivetrain", "body", "brakes"]),
    tier1("SUP-008", "Lear Corporation", "Lear", "US", "North America",
        SupplierType::Assembly, &["seating", "electrical"]),
    tier1("SUP-009", "Faurecia", "Forvia", "FR", "Europe",
        SupplierType::Assembly, &["interior", "seating", "clean_mobility"]),
    tier1("SUP-010", "Plastic Omnium", "Plastic Omnium", "FR", "Europe",
        SupplierType::Component, &["exterior", "fuel_systems", "modules"]),
    DemoSupplier {
        external_id: "SUP-011",
        name: "Precision Metals GmbH",
        parent_group: None,
        country_code: "DE",
        region: "Europe",
        supplier_type: SupplierType::Material,
        level: SupplyChainLevel::Tier2,
        part_families: &["steel", "aluminum", "castings"],
    },
    DemoSupplier {
        external_id: "SUP-012",
        name: "Chemical Solutions Inc",
        parent_group: None,
        country_code: "US",
        region: "North America",
        supplier_type: SupplierType::Material,
        level: SupplyChainLevel::Tier2,
        part_families: &["coatings", "adhesives", "plastics"],
    },
];

const DEMO_USERS: &[(&str, &str, Role, &str)] = &[
    ("admin@sect.local", "Alex Admin", Role::Admin, "IT"),
    ("quality@sect.local", "Quentin Qualité", Role::QualityManager, "Quality"),
    ("steward@sect.local", "Sasha Data", Role::DataSteward, "RSE"),
    ("viewer@sect.local", "Victor Lecteur", Role::Viewer, "Purchasing"),
];

const PCF_TOOLS: &[&str] = &["Excel", "SimaPro", "GaBi", "OpenLCA", "Sphera"];
const PCF_FRAMEWORKS: &[&str] = &["ISO14067", "GHG Protocol", "Catena-X", "PEF"];
const OEMS: &[&str] = &["VW", "BMW", "Mercedes", "GM", "Ford"];
const PCF_METHODS: &[&str] = &["ISO 14067", "PEF", "GHG Protocol"];

/// Row counts written by [`load_demo`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedSummary {
    pub suppliers: usize,
    pub campaigns: usize,
    pub enrollments: usize,
    pub imds_submissions: usize,
    pub pcf_declarations: usize,
    pub users: usize,
}

fn pick<T: Copy>(rng: &mut impl Rng, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Load the demo dataset. A non-empty database is refused unless `force`,
/// in which case every row is deleted first.
pub fn load_demo(db: &mut Database, force: bool, rng: &mut impl Rng) -> DbResult<SeedSummary> {
    if !db.is_empty()? {
        if !force {
            return Err(DbError::Conflict(
                "database already holds data; use --force to replace it".to_string(),
            ));
        }
        db.clear()?;
    }

    let mut summary = SeedSummary::default();

    let suppliers = seed_suppliers(db, rng)?;
    summary.suppliers = suppliers.len();

    let campaigns = seed_campaigns(db)?;
    summary.campaigns = campaigns.len();

    let tier1: Vec<i64> = suppliers
        .iter()
        .filter(|s| s.supply_chain_level == Some(SupplyChainLevel::Tier1))
        .map(|s| s.id)
        .collect();
    for campaign in campaigns.iter().filter(|c| c.status == CampaignStatus::Active) {
        summary.enrollments += enroll(db, campaign.id, &tier1, rng)?;
    }

    let imds_campaign = campaigns
        .iter()
        .find(|c| c.campaign_type == CampaignType::Imds && c.status == CampaignStatus::Active);
    let pcf_campaign = campaigns
        .iter()
        .find(|c| c.campaign_type == CampaignType::Pcf && c.status == CampaignStatus::Active);

    for supplier in suppliers.iter().take(8) {
        if let Some(campaign) = imds_campaign {
            summary.imds_submissions += seed_imds(db, supplier, campaign.id, rng)?;
        }
        if let Some(campaign) = pcf_campaign {
            summary.pcf_declarations += seed_pcf(db, supplier, campaign.id, rng)?;
        }
    }

    for (email, name, role, department) in DEMO_USERS {
        db.create_user(NewUser {
            email: email.to_string(),
            name: name.to_string(),
            role: Some(*role),
            department: Some(department.to_string()),
            ..Default::default()
        })?;
        summary.users += 1;
    }

    Ok(summary)
}

fn seed_suppliers(db: &mut Database, rng: &mut impl Rng) -> DbResult<Vec<Supplier>> {
    let mut created = Vec::with_capacity(DEMO_SUPPLIERS.len());

    for demo in DEMO_SUPPLIERS {
        let supplier = db.create_supplier(NewSupplier {
            external_id: Some(demo.external_id.to_string()),
            name: demo.name.to_string(),
            parent_group: demo.parent_group.map(str::to_string),
            country_code: Some(demo.country_code.to_string()),
            region: Some(demo.region.to_string()),
            supplier_type: Some(demo.supplier_type),
            supply_chain_level: Some(demo.level),
            main_part_families: strings(demo.part_families),
        })?;

        let languages = if matches!(demo.country_code, "FR" | "CA") {
            vec!["en", "fr"]
        } else {
            vec!["en"]
        };
        db.add_contact(
            supplier.id,
            NewContact {
                full_name: format!("Contact {}", demo.name),
                role: Some("Quality Manager".to_string()),
                email: Some(format!("contact@{}.com", demo.external_id.to_lowercase())),
                languages: strings(&languages),
                is_primary: true,
                ..Default::default()
            },
        )?;

        let oems: &[&str] = if demo.region == "Europe" {
            &["VW", "BMW", "Mercedes"]
        } else {
            &["GM", "Ford", "Toyota"]
        };
        db.upsert_imds_profile(
            supplier.id,
            ImdsProfileInput {
                imds_id: Some(format!("IMDS-{}", demo.external_id)),
                oems_served: strings(oems),
                on_time_submission_rate: Some(rng.random_range(0.70..0.98)),
                oem_rejection_rate: Some(rng.random_range(0.02..0.15)),
                avg_submission_leadtime_days: Some(rng.random_range(5..=20) as f64),
                support_level: Some(pick(rng, SupportLevel::ALL)),
                notes: None,
            },
        )?;

        let tool_count = rng.random_range(1..=3);
        let framework_count = rng.random_range(1..=3);
        let scopes: &[&str] = if rng.random_bool(0.7) {
            &["cradle-to-gate"]
        } else {
            &["cradle-to-gate", "A1-A3"]
        };
        db.upsert_pcf_profile(
            supplier.id,
            PcfProfileInput {
                pcf_maturity: Some(pick(rng, PcfMaturity::ALL)),
                tools_used: PCF_TOOLS
                    .choose_multiple(rng, tool_count)
                    .map(|s| s.to_string())
                    .collect(),
                pcf_count: rng.random_range(0..=50),
                scopes_covered: strings(scopes),
                reference_years: vec![2024],
                frameworks: PCF_FRAMEWORKS
                    .choose_multiple(rng, framework_count)
                    .map(|s| s.to_string())
                    .collect(),
                data_quality_score: Some(rng.random_range(50.0..95.0)),
                notes: None,
            },
        )?;

        db.upsert_hub_metadata(
            supplier.id,
            HubMetadataInput {
                priority: Some(pick(rng, HubPriority::ALL)),
                regulatory_risk: Some(pick(rng, RiskRating::ALL)),
                climate_risk: Some(pick(rng, RiskRating::ALL)),
                program_status: Some("active".to_string()),
                strategic_notes: None,
            },
        )?;

        created.push(supplier);
    }

    Ok(created)
}

fn seed_campaigns(db: &mut Database) -> DbResult<Vec<Campaign>> {
    let date = NaiveDate::from_ymd_opt;
    let demos = [
        (
            "Campagne PCF Q1 2025 - Tier 1",
            CampaignType::Pcf,
            "Collecter les PCF des 10 principaux fournisseurs Tier-1",
            CampaignStatus::Active,
            (date(2025, 1, 15), date(2025, 3, 31)),
            &["electronics", "seating", "chassis"][..],
            "RSE Team",
        ),
        (
            "IMDS Compliance 2025",
            CampaignType::Imds,
            "Mise à jour IMDS 15.0 pour tous les fournisseurs",
            CampaignStatus::Active,
            (date(2025, 1, 1), date(2025, 6, 30)),
            &[][..],
            "Quality Team",
        ),
        (
            "Campagne Mixte Scope 3",
            CampaignType::Mixed,
            "Améliorer la couverture données Scope 3",
            CampaignStatus::Draft,
            (date(2025, 4, 1), date(2025, 9, 30)),
            &["thermal", "powertrain"][..],
            "RSE Team",
        ),
    ];

    let mut created = Vec::with_capacity(demos.len());
    for (name, kind, objective, status, (start, end), families, author) in demos {
        let mut new = NewCampaign::new(name, kind);
        new.objective = Some(objective.to_string());
        new.start_date = start;
        new.end_date = end;
        new.target_part_families = strings(families);
        new.created_by = Some(author.to_string());

        let mut campaign = db.create_campaign(new)?;
        if status != CampaignStatus::Draft {
            campaign = db.update_campaign(
                campaign.id,
                CampaignPatch {
                    status: Some(status),
                    ..Default::default()
                },
            )?;
        }
        created.push(campaign);
    }
    Ok(created)
}

fn enroll(db: &mut Database, campaign_id: i64, pool: &[i64], rng: &mut impl Rng) -> DbResult<usize> {
    let chosen: Vec<i64> = pool.choose_multiple(rng, pool.len().min(8)).copied().collect();
    let added = db.add_campaign_suppliers(campaign_id, &chosen)?;

    let statuses = [
        ParticipationStatus::NotStarted,
        ParticipationStatus::InProgress,
        ParticipationStatus::Submitted,
        ParticipationStatus::Validated,
    ];
    for supplier_id in chosen {
        db.set_supplier_status(
            campaign_id,
            supplier_id,
            ParticipationUpdate {
                status: pick(rng, &statuses),
                notes: None,
                progression_score: Some((rng.random_range(0.0..100.0_f64) * 10.0).round() / 10.0),
            },
        )?;
        for _ in 0..rng.random_range(0..=3) {
            db.record_reminder(campaign_id, supplier_id)?;
        }
    }
    Ok(added)
}

fn seed_imds(
    db: &mut Database,
    supplier: &Supplier,
    campaign_id: i64,
    rng: &mut impl Rng,
) -> DbResult<usize> {
    let external_id = supplier.external_id.as_deref().unwrap_or("SUP");
    let count = rng.random_range(1..=3);

    for i in 1..=count {
        let target = pick(
            rng,
            &[ImdsStatus::Draft, ImdsStatus::Submitted, ImdsStatus::Validated, ImdsStatus::Rejected],
        );
        let initial = if target == ImdsStatus::Draft {
            ImdsStatus::Draft
        } else {
            ImdsStatus::Submitted
        };
        let submission = db.create_imds(NewImdsSubmission {
            supplier_id: Some(supplier.id),
            campaign_id: Some(campaign_id),
            internal_ref: Some(format!("INT-{}-{}", external_id, i)),
            mds_id: format!("MDS-{}", rng.random_range(100_000..=999_999)),
            part_number: format!("PN-{}", rng.random_range(1000..=9999)),
            oem: Some(pick(rng, OEMS).to_string()),
            status: Some(initial),
            submitted_at: Some(Utc::now() - Duration::days(rng.random_range(1..=30))),
            ..Default::default()
        })?;

        if target != initial {
            db.update_imds(
                submission.id,
                ImdsPatch {
                    status: Some(target),
                    rejection_reason: (target == ImdsStatus::Rejected)
                        .then(|| "Substance list incomplete".to_string()),
                    ..Default::default()
                },
            )?;
        }
    }
    Ok(count)
}

fn seed_pcf(
    db: &mut Database,
    supplier: &Supplier,
    campaign_id: i64,
    rng: &mut impl Rng,
) -> DbResult<usize> {
    let external_id = supplier.external_id.as_deref().unwrap_or("SUP");
    let count = rng.random_range(1..=5);

    for i in 1..=count {
        let emissions = (rng.random_range(10.0..500.0_f64) * 100.0).round() / 100.0;
        let declaration = db.create_pcf(NewPcfDeclaration {
            supplier_id: Some(supplier.id),
            campaign_id: Some(campaign_id),
            product_ref: format!("PROD-{}-{}", external_id, i),
            perimeter: Some("cradle-to-gate".to_string()),
            reference_year: Some(2024),
            total_emissions_kgco2e: Some(emissions),
            method: Some(pick(rng, PCF_METHODS).to_string()),
            frameworks: vec!["Catena-X".to_string()],
            ..Default::default()
        })?;

        match rng.random_range(0..3) {
            1 => {
                db.validate_pcf(declaration.id, None)?;
            }
            2 => {
                db.reject_pcf(declaration.id, "Emission factor sources missing")?;
            }
            _ => {}
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::campaign::CampaignFilter;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_demo_dataset_shape() {
        let mut db = Database::open_in_memory().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let summary = load_demo(&mut db, false, &mut rng).unwrap();

        assert_eq!(summary.suppliers, 12);
        assert_eq!(summary.campaigns, 3);
        assert_eq!(summary.enrollments, 16);
        assert_eq!(summary.users, 4);
        assert!((8..=24).contains(&summary.imds_submissions));
        assert!((8..=40).contains(&summary.pcf_declarations));

        let stats = db.supplier_stats().unwrap();
        assert_eq!(stats.total, 12);
        assert_eq!(stats.by_level.tier1, 10);
        assert_eq!(stats.by_level.tier2, 2);

        let active = db
            .list_campaigns(&CampaignFilter {
                status: Some(CampaignStatus::Active),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|c| c.progress.suppliers_total == 8));

        let bosch = db.find_supplier_by_external_id("SUP-001").unwrap().unwrap();
        let profile = db.supplier_profile(bosch.id).unwrap();
        assert_eq!(profile.contacts.len(), 1);
        assert!(profile.imds_profile.is_some());
        assert!(profile.pcf_profile.is_some());
        assert!(profile.hub_metadata.is_some());
    }

    #[test]
    fn test_refuses_non_empty_without_force() {
        let mut db = Database::open_in_memory().unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        load_demo(&mut db, false, &mut rng).unwrap();

        let err = load_demo(&mut db, false, &mut rng).unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        let again = load_demo(&mut db, true, &mut rng).unwrap();
        assert_eq!(again.suppliers, 12);
        assert_eq!(db.supplier_stats().unwrap().total, 12);
    }

    #[test]
    fn test_same_seed_same_numbers() {
        let run = |seed| {
            let mut db = Database::open_in_memory().unwrap();
            load_demo(&mut db, false, &mut StdRng::seed_from_u64(seed)).unwrap()
        };
        assert_eq!(run(42), run(42));
    }
}
