//! Product carbon footprint declarations

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{require_text, DbError, DbResult};

pub const DEFAULT_PERIMETER: &str = "cradle-to-gate";
pub const DEFAULT_METHOD: &str = "ISO 14067";

text_enum! {
    /// Review state of a declaration
    pub enum ValidationStatus ("validation status") {
        Pending => "pending",
        Validated => "validated",
        Rejected => "rejected",
    }
}

/// A supplier's carbon footprint declaration for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcfDeclaration {
    pub id: i64,
    pub supplier_id: i64,
    pub supplier_name: Option<String>,
    pub campaign_id: Option<i64>,
    pub product_ref: String,
    pub product_name: Option<String>,
    pub perimeter: String,
    pub reference_year: i32,
    pub total_emissions_kgco2e: f64,
    pub method: String,
    pub frameworks: Vec<String>,
    pub emission_factor_sources: Vec<String>,
    pub uncertainty: Option<String>,
    pub validation_status: ValidationStatus,
    pub validation_notes: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPcfDeclaration {
    pub supplier_id: Option<i64>,
    pub campaign_id: Option<i64>,
    pub product_ref: String,
    pub product_name: Option<String>,
    pub perimeter: Option<String>,
    pub reference_year: Option<i32>,
    pub total_emissions_kgco2e: Option<f64>,
    pub method: Option<String>,
    pub frameworks: Vec<String>,
    pub emission_factor_sources: Vec<String>,
    pub uncertainty: Option<String>,
    pub notes: Option<String>,
}

impl NewPcfDeclaration {
    /// Check required fields and fill in defaults, returning the supplier id
    pub fn prepare(&mut self) -> DbResult<i64> {
        let supplier_id = self
            .supplier_id
            .ok_or_else(|| DbError::invalid("supplier_id is required"))?;
        require_text("product_ref", &self.product_ref)?;
        let emissions = self
            .total_emissions_kgco2e
            .ok_or_else(|| DbError::invalid("total_emissions_kgco2e is required"))?;
        check_emissions(emissions)?;

        if self.perimeter.as_deref().map_or(true, |p| p.trim().is_empty()) {
            self.perimeter = Some(DEFAULT_PERIMETER.to_string());
        }
        if self.method.as_deref().map_or(true, |m| m.trim().is_empty()) {
            self.method = Some(DEFAULT_METHOD.to_string());
        }
        if self.reference_year.is_none() {
            self.reference_year = Some(Utc::now().year());
        }
        Ok(supplier_id)
    }
}

pub fn check_emissions(value: f64) -> DbResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DbError::invalid(
            "total_emissions_kgco2e must be a positive number",
        ));
    }
    Ok(())
}

/// Partial update; the id travels in the body for `PUT /pcf`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PcfPatch {
    pub id: Option<i64>,
    pub campaign_id: Option<i64>,
    pub product_ref: Option<String>,
    pub product_name: Option<String>,
    pub perimeter: Option<String>,
    pub reference_year: Option<i32>,
    pub total_emissions_kgco2e: Option<f64>,
    pub method: Option<String>,
    pub frameworks: Option<Vec<String>>,
    pub emission_factor_sources: Option<Vec<String>>,
    pub uncertainty: Option<String>,
    pub validation_status: Option<ValidationStatus>,
    pub validation_notes: Option<String>,
    pub notes: Option<String>,
}

impl PcfPatch {
    pub fn validate(&self) -> DbResult<()> {
        if let Some(product_ref) = &self.product_ref {
            require_text("product_ref", product_ref)?;
        }
        if let Some(emissions) = self.total_emissions_kgco2e {
            check_emissions(emissions)?;
        }
        Ok(())
    }
}

/// Query parameters for `GET /pcf`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PcfQuery {
    pub id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub campaign_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewNote {
    pub notes: Option<String>,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration() -> NewPcfDeclaration {
        NewPcfDeclaration {
            supplier_id: Some(3),
            product_ref: "BRK-PAD-01".to_string(),
            total_emissions_kgco2e: Some(12.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_prepare_fills_defaults() {
        let mut pcf = declaration();
        assert_eq!(pcf.prepare().unwrap(), 3);
        assert_eq!(pcf.perimeter.as_deref(), Some(DEFAULT_PERIMETER));
        assert_eq!(pcf.method.as_deref(), Some(DEFAULT_METHOD));
        assert_eq!(pcf.reference_year, Some(Utc::now().year()));
    }

    #[test]
    fn test_prepare_keeps_given_values() {
        let mut pcf = NewPcfDeclaration {
            perimeter: Some("cradle-to-grave".to_string()),
            reference_year: Some(2023),
            ..declaration()
        };
        pcf.prepare().unwrap();
        assert_eq!(pcf.perimeter.as_deref(), Some("cradle-to-grave"));
        assert_eq!(pcf.reference_year, Some(2023));
    }

    #[test]
    fn test_emissions_must_be_positive() {
        for bad in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let mut pcf = NewPcfDeclaration {
                total_emissions_kgco2e: Some(bad),
                ..declaration()
            };
            assert!(pcf.prepare().is_err(), "{} should be rejected", bad);
        }

        let mut missing = NewPcfDeclaration {
            total_emissions_kgco2e: None,
            ..declaration()
        };
        assert!(missing.prepare().is_err());
    }

    #[test]
    fn test_patch_checks_emissions() {
        let patch = PcfPatch {
            total_emissions_kgco2e: Some(-1.0),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }
}
