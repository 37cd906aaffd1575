//! Supplier records - master data plus IMDS, PCF and hub profiles

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{require_text, DbError, DbResult};

text_enum! {
    /// What the supplier delivers
    pub enum SupplierType ("supplier type") {
        Material => "material",
        Component => "component",
        Assembly => "assembly",
        Service => "service",
    }
}

text_enum! {
    /// Distance from the OEM in the supply chain
    pub enum SupplyChainLevel ("supply chain level") {
        Tier1 => "tier1",
        Tier2 => "tier2",
        Tier3 => "tier3",
        Tier4 => "tier4",
    }
}

text_enum! {
    /// How far a supplier is in computing product carbon footprints
    pub enum PcfMaturity ("PCF maturity") {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

text_enum! {
    /// Support a supplier needs to complete IMDS declarations
    pub enum SupportLevel ("support level") {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

text_enum! {
    /// Engagement priority assigned by the program team
    pub enum HubPriority ("hub priority") {
        A => "A",
        B => "B",
        C => "C",
    }
}

text_enum! {
    /// Regulatory or climate exposure rating
    pub enum RiskRating ("risk rating") {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// A supplier as stored in the `suppliers` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub external_id: Option<String>,
    pub name: String,
    pub parent_group: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub supplier_type: Option<SupplierType>,
    pub supply_chain_level: Option<SupplyChainLevel>,
    pub main_part_families: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a supplier
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    #[serde(default)]
    pub external_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub parent_group: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub supplier_type: Option<SupplierType>,
    #[serde(default)]
    pub supply_chain_level: Option<SupplyChainLevel>,
    #[serde(default)]
    pub main_part_families: Vec<String>,
}

impl NewSupplier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Check required fields and normalize the country code in place
    pub fn validate(&mut self) -> DbResult<()> {
        require_text("name", &self.name)?;
        self.name = self.name.trim().to_string();
        self.country_code = normalize_country(self.country_code.take())?;
        if let Some(ext) = &self.external_id {
            if ext.trim().is_empty() {
                self.external_id = None;
            }
        }
        Ok(())
    }
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub parent_group: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub supplier_type: Option<SupplierType>,
    pub supply_chain_level: Option<SupplyChainLevel>,
    pub main_part_families: Option<Vec<String>>,
}

impl SupplierPatch {
    pub fn validate(&mut self) -> DbResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        self.country_code = normalize_country(self.country_code.take())?;
        Ok(())
    }
}

/// ISO 3166 alpha-2 codes are stored upper-case
fn normalize_country(code: Option<String>) -> DbResult<Option<String>> {
    match code {
        None => Ok(None),
        Some(c) if c.trim().is_empty() => Ok(None),
        Some(c) => {
            let c = c.trim().to_ascii_uppercase();
            if c.len() != 2 || !c.chars().all(|ch| ch.is_ascii_alphabetic()) {
                return Err(DbError::invalid(format!(
                    "country_code must be a two-letter ISO code, got '{}'",
                    c
                )));
            }
            Ok(Some(c))
        }
    }
}

/// Query parameters for listing suppliers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupplierFilter {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub country_code: Option<String>,
    pub supplier_type: Option<SupplierType>,
    pub supply_chain_level: Option<SupplyChainLevel>,
    pub search: Option<String>,
}

impl SupplierFilter {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 500;

    /// Resolve paging, rejecting out-of-range values
    pub fn paging(&self) -> DbResult<(i64, i64)> {
        let skip = self.skip.unwrap_or(0);
        if skip < 0 {
            return Err(DbError::invalid("skip must be >= 0"));
        }
        let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT);
        if !(1..=Self::MAX_LIMIT).contains(&limit) {
            return Err(DbError::invalid(format!(
                "limit must be between 1 and {}",
                Self::MAX_LIMIT
            )));
        }
        Ok((skip, limit))
    }
}

/// A person to contact at a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierContact {
    pub id: i64,
    pub supplier_id: i64,
    pub full_name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub languages: Vec<String>,
    pub preferred_channels: Vec<String>,
    pub time_zone: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContact {
    pub full_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub preferred_channels: Vec<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

impl NewContact {
    pub fn validate(&self) -> DbResult<()> {
        require_text("full_name", &self.full_name)?;
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(DbError::invalid(format!("invalid email: {}", email)));
            }
        }
        Ok(())
    }
}

/// IMDS performance profile (one per supplier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImdsProfile {
    pub id: i64,
    pub supplier_id: i64,
    pub imds_id: Option<String>,
    pub oems_served: Vec<String>,
    pub on_time_submission_rate: Option<f64>,
    pub oem_rejection_rate: Option<f64>,
    pub avg_submission_leadtime_days: Option<f64>,
    pub support_level: Option<SupportLevel>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImdsProfileInput {
    pub imds_id: Option<String>,
    pub oems_served: Vec<String>,
    pub on_time_submission_rate: Option<f64>,
    pub oem_rejection_rate: Option<f64>,
    pub avg_submission_leadtime_days: Option<f64>,
    pub support_level: Option<SupportLevel>,
    pub notes: Option<String>,
}

impl ImdsProfileInput {
    pub fn validate(&self) -> DbResult<()> {
        check_ratio("on_time_submission_rate", self.on_time_submission_rate)?;
        check_ratio("oem_rejection_rate", self.oem_rejection_rate)?;
        if let Some(days) = self.avg_submission_leadtime_days {
            if !days.is_finite() || days < 0.0 {
                return Err(DbError::invalid("avg_submission_leadtime_days must be >= 0"));
            }
        }
        Ok(())
    }
}

/// Rates are stored as fractions in [0, 1]
fn check_ratio(field: &str, value: Option<f64>) -> DbResult<()> {
    match value {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(DbError::invalid(format!(
            "{} must be between 0 and 1",
            field
        ))),
        _ => Ok(()),
    }
}

/// PCF capability profile (one per supplier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcfProfile {
    pub id: i64,
    pub supplier_id: i64,
    pub pcf_maturity: Option<PcfMaturity>,
    pub tools_used: Vec<String>,
    pub pcf_count: i64,
    pub scopes_covered: Vec<String>,
    pub reference_years: Vec<i32>,
    pub frameworks: Vec<String>,
    pub data_quality_score: Option<f64>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PcfProfileInput {
    pub pcf_maturity: Option<PcfMaturity>,
    pub tools_used: Vec<String>,
    pub pcf_count: i64,
    pub scopes_covered: Vec<String>,
    pub reference_years: Vec<i32>,
    pub frameworks: Vec<String>,
    pub data_quality_score: Option<f64>,
    pub notes: Option<String>,
}

impl PcfProfileInput {
    pub fn validate(&self) -> DbResult<()> {
        if self.pcf_count < 0 {
            return Err(DbError::invalid("pcf_count must be >= 0"));
        }
        if let Some(score) = self.data_quality_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(DbError::invalid("data_quality_score must be between 0 and 100"));
            }
        }
        Ok(())
    }
}

/// Program-level metadata kept by the control tower team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMetadata {
    pub id: i64,
    pub supplier_id: i64,
    pub priority: Option<HubPriority>,
    pub regulatory_risk: Option<RiskRating>,
    pub climate_risk: Option<RiskRating>,
    pub program_status: Option<String>,
    pub strategic_notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HubMetadataInput {
    pub priority: Option<HubPriority>,
    pub regulatory_risk: Option<RiskRating>,
    pub climate_risk: Option<RiskRating>,
    pub program_status: Option<String>,
    pub strategic_notes: Option<String>,
}

/// Supplier with everything attached to it
#[derive(Debug, Clone, Serialize)]
pub struct SupplierProfile {
    #[serde(flatten)]
    pub supplier: Supplier,
    pub contacts: Vec<SupplierContact>,
    pub imds_profile: Option<ImdsProfile>,
    pub pcf_profile: Option<PcfProfile>,
    pub hub_metadata: Option<HubMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelCounts {
    pub tier1: i64,
    pub tier2: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaturityCounts {
    pub advanced: i64,
    pub intermediate: i64,
    pub beginner: i64,
}

/// Aggregates shown on the suppliers page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupplierStats {
    pub total: i64,
    pub by_level: LevelCounts,
    pub by_region: BTreeMap<String, i64>,
    pub pcf_maturity: MaturityCounts,
}
