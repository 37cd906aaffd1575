//! IMDS submission records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{require_text, DbError, DbResult};

text_enum! {
    /// Review state of a material data sheet
    pub enum ImdsStatus ("IMDS status") {
        Draft => "draft",
        Pending => "pending",
        Submitted => "submitted",
        Validated => "validated",
        Rejected => "rejected",
    }
}

impl ImdsStatus {
    /// Statuses counted as "pending" on the dashboard
    pub fn is_open(&self) -> bool {
        matches!(self, ImdsStatus::Draft | ImdsStatus::Pending | ImdsStatus::Submitted)
    }
}

/// A material data sheet submitted by a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImdsSubmission {
    pub id: i64,
    pub supplier_id: i64,
    pub supplier_name: Option<String>,
    pub campaign_id: Option<i64>,
    pub internal_ref: Option<String>,
    pub mds_id: String,
    pub part_number: String,
    pub part_name: Option<String>,
    pub oem: Option<String>,
    pub status: ImdsStatus,
    pub rejection_reason: Option<String>,
    pub iteration_count: i64,
    pub submitted_at: Option<DateTime<Utc>>,
    pub validated_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewImdsSubmission {
    pub supplier_id: Option<i64>,
    #[serde(default)]
    pub campaign_id: Option<i64>,
    #[serde(default)]
    pub internal_ref: Option<String>,
    #[serde(default)]
    pub mds_id: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub part_name: Option<String>,
    #[serde(default)]
    pub oem: Option<String>,
    #[serde(default)]
    pub status: Option<ImdsStatus>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewImdsSubmission {
    /// Returns the supplier id once required fields are present
    pub fn validate(&self) -> DbResult<i64> {
        let supplier_id = self
            .supplier_id
            .ok_or_else(|| DbError::invalid("supplier_id is required"))?;
        require_text("mds_id", &self.mds_id)?;
        require_text("part_number", &self.part_number)?;
        Ok(supplier_id)
    }
}

/// Partial update; the id travels in the body for `PUT /imds`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImdsPatch {
    pub id: Option<i64>,
    pub campaign_id: Option<i64>,
    pub internal_ref: Option<String>,
    pub mds_id: Option<String>,
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub oem: Option<String>,
    pub status: Option<ImdsStatus>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
}

impl ImdsPatch {
    pub fn validate(&self) -> DbResult<()> {
        if let Some(mds_id) = &self.mds_id {
            require_text("mds_id", mds_id)?;
        }
        if let Some(part_number) = &self.part_number {
            require_text("part_number", part_number)?;
        }
        Ok(())
    }
}

/// Query parameters for `GET /imds`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImdsQuery {
    pub id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub campaign_id: Option<i64>,
}
