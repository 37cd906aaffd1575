//! Campaign records - data-collection drives and per-supplier progress

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{require_text, DbError, DbResult};

text_enum! {
    /// What a campaign collects
    pub enum CampaignType ("campaign type") {
        Imds => "IMDS",
        Pcf => "PCF",
        Mixed => "MIXED",
    }
}

text_enum! {
    /// Campaign lifecycle
    pub enum CampaignStatus ("campaign status") {
        Draft => "draft",
        Active => "active",
        Paused => "paused",
        Completed => "completed",
        Archived => "archived",
    }
}

text_enum! {
    /// Where one supplier stands inside one campaign
    pub enum ParticipationStatus ("participation status") {
        NotStarted => "not_started",
        InProgress => "in_progress",
        Submitted => "submitted",
        Validated => "validated",
        Rejected => "rejected",
        Overdue => "overdue",
    }
}

impl ParticipationStatus {
    /// Submitted and validated suppliers count as having responded
    pub fn has_responded(&self) -> bool {
        matches!(self, ParticipationStatus::Submitted | ParticipationStatus::Validated)
    }
}

/// A data-collection campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    pub objective: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub target_part_families: Vec<String>,
    pub status: CampaignStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enrollment counts for one campaign
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CampaignProgress {
    pub suppliers_total: i64,
    pub suppliers_responded: i64,
    pub suppliers_validated: i64,
    pub progress: f64,
}

impl CampaignProgress {
    pub fn new(total: i64, responded: i64, validated: i64) -> Self {
        Self {
            suppliers_total: total,
            suppliers_responded: responded,
            suppliers_validated: validated,
            progress: percent(responded, total),
        }
    }
}

/// `part / whole` as a percentage rounded to one decimal, 0 for an empty whole
pub fn percent(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

/// Campaign as returned by listings, with its progress inlined
#[derive(Debug, Clone, Serialize)]
pub struct CampaignSummary {
    #[serde(flatten)]
    pub campaign: Campaign,
    #[serde(flatten)]
    pub progress: CampaignProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    #[serde(rename = "type")]
    pub campaign_type: CampaignType,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub target_part_families: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl NewCampaign {
    pub fn new(name: impl Into<String>, campaign_type: CampaignType) -> Self {
        Self {
            name: name.into(),
            campaign_type,
            objective: None,
            start_date: None,
            end_date: None,
            target_part_families: Vec::new(),
            created_by: None,
        }
    }

    pub fn validate(&self) -> DbResult<()> {
        require_text("name", &self.name)?;
        check_dates(self.start_date, self.end_date)
    }
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DbResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(DbError::invalid(format!(
                "end_date {} is before start_date {}",
                end, start
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub campaign_type: Option<CampaignType>,
    pub objective: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub target_part_families: Option<Vec<String>>,
    pub status: Option<CampaignStatus>,
}

impl CampaignPatch {
    /// Validate against the stored campaign so a lone end date is still checked
    pub fn validate(&self, current: &Campaign) -> DbResult<()> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        check_dates(
            self.start_date.or(current.start_date),
            self.end_date.or(current.end_date),
        )
    }
}

/// Query parameters for listing campaigns
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CampaignFilter {
    #[serde(rename = "type")]
    pub campaign_type: Option<CampaignType>,
    pub status: Option<CampaignStatus>,
}

/// A supplier's row inside a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSupplier {
    pub id: i64,
    pub campaign_id: i64,
    pub supplier_id: i64,
    pub supplier_name: String,
    pub status: ParticipationStatus,
    pub last_contact_at: Option<DateTime<Utc>>,
    pub reminders_sent: i64,
    pub progression_score: Option<f64>,
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Body of the enrollment endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Enrollment {
    pub supplier_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParticipationUpdate {
    pub status: ParticipationStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub progression_score: Option<f64>,
}

/// Per-campaign statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignStats {
    pub campaign_id: i64,
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub response_rate: f64,
    pub validation_rate: f64,
}

/// Totals across every campaign
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignTotals {
    pub total: i64,
    pub active: i64,
    pub draft: i64,
    pub completed: i64,
    pub total_suppliers_engaged: i64,
}
