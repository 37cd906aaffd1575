//! Supplier portal - access tokens and the submissions made with them

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::error::{DbError, DbResult};

/// Random bytes behind each token; rendered as twice as many hex chars
pub const TOKEN_BYTES: usize = 32;

/// Accepted range for `expires_days`
pub const EXPIRY_RANGE: std::ops::RangeInclusive<i64> = 1..=365;

text_enum! {
    /// Kind of data a portal submission carries
    pub enum SubmissionType ("submission type") {
        Imds => "imds",
        Pcf => "pcf",
    }
}

text_enum! {
    /// Review state of a portal submission
    pub enum PortalStatus ("portal status") {
        Draft => "draft",
        Submitted => "submitted",
        Validated => "validated",
        Rejected => "rejected",
    }
}

impl PortalStatus {
    /// Statuses a supplier may set through their own token
    pub fn supplier_settable(&self) -> bool {
        matches!(self, PortalStatus::Draft | PortalStatus::Submitted)
    }

    pub fn is_review(&self) -> bool {
        matches!(self, PortalStatus::Validated | PortalStatus::Rejected)
    }
}

/// Generate a new bearer token as lowercase hex
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    to_hex(&bytes)
}

/// Short SHA-256 fingerprint of a token, safe to log
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    to_hex(&digest[..6])
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// A time-limited token handed to a supplier contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub id: i64,
    pub supplier_id: i64,
    pub campaign_id: Option<i64>,
    pub token: String,
    pub contact_email: String,
    pub contact_name: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub use_count: i64,
    pub supplier_name: Option<String>,
    pub campaign_name: Option<String>,
}

impl AccessToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }

    /// Whether the holder may see a record of `supplier_id` in `campaign_id`.
    /// A campaign-scoped token only reaches that campaign.
    pub fn covers(&self, supplier_id: i64, campaign_id: Option<i64>) -> bool {
        self.supplier_id == supplier_id
            && self.campaign_id.map_or(true, |scope| campaign_id == Some(scope))
    }
}

/// Body of `POST /portal/tokens`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    pub supplier_id: Option<i64>,
    pub campaign_id: Option<i64>,
    pub contact_email: String,
    pub contact_name: Option<String>,
    pub expires_days: Option<i64>,
    pub created_by: Option<String>,
}

impl TokenRequest {
    /// Returns the supplier id and the resolved expiry in days
    pub fn validate(&self, default_days: i64) -> DbResult<(i64, i64)> {
        let supplier_id = self
            .supplier_id
            .ok_or_else(|| DbError::invalid("supplier_id and contact_email are required"))?;
        let email = self.contact_email.trim();
        if email.is_empty() {
            return Err(DbError::invalid("supplier_id and contact_email are required"));
        }
        if !email.contains('@') {
            return Err(DbError::invalid(format!("invalid contact_email: {}", email)));
        }
        let days = self.expires_days.unwrap_or(default_days);
        if !EXPIRY_RANGE.contains(&days) {
            return Err(DbError::invalid(format!(
                "expires_days must be between {} and {}",
                EXPIRY_RANGE.start(),
                EXPIRY_RANGE.end()
            )));
        }
        Ok((supplier_id, days))
    }
}

/// Freshly issued token plus the link to send
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    #[serde(flatten)]
    pub token: AccessToken,
    pub portal_url: String,
}

/// Build the portal link for a token
pub fn portal_url(public_url: &str, token: &str) -> String {
    format!("{}/portal?token={}", public_url.trim_end_matches('/'), token)
}

/// Query parameters for `GET /portal/tokens` and `DELETE /portal/tokens`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TokenQuery {
    pub id: Option<i64>,
    pub token: Option<String>,
    pub supplier_id: Option<i64>,
}

/// Data entered by a supplier through the portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalSubmission {
    pub id: i64,
    pub supplier_id: i64,
    pub campaign_id: Option<i64>,
    pub token_id: Option<i64>,
    pub submission_type: SubmissionType,
    pub mds_id: Option<String>,
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub oem: Option<String>,
    pub product_name: Option<String>,
    pub emissions_total: Option<f64>,
    pub emissions_unit: String,
    pub perimeter: Option<String>,
    pub methodology: Option<String>,
    pub reference_year: Option<i32>,
    pub notes: Option<String>,
    pub attachments: Vec<serde_json::Value>,
    pub status: PortalStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub supplier_name: Option<String>,
    pub campaign_name: Option<String>,
}

pub const DEFAULT_EMISSIONS_UNIT: &str = "kg CO2e";

/// Body of `POST /portal/submissions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewPortalSubmission {
    pub token: String,
    pub submission_type: Option<String>,
    pub mds_id: Option<String>,
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub oem: Option<String>,
    pub product_name: Option<String>,
    pub emissions_total: Option<f64>,
    pub emissions_unit: Option<String>,
    pub perimeter: Option<String>,
    pub methodology: Option<String>,
    pub reference_year: Option<i32>,
    pub notes: Option<String>,
    pub attachments: Vec<serde_json::Value>,
}

impl NewPortalSubmission {
    pub fn submission_type(&self) -> DbResult<SubmissionType> {
        match self.submission_type.as_deref() {
            Some(s) => s
                .parse()
                .map_err(|_| DbError::invalid(format!("invalid submission_type: {}", s))),
            None => Err(DbError::invalid("submission_type is required (imds or pcf)")),
        }
    }
}

/// Body of `PUT /portal/submissions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalPatch {
    pub id: Option<i64>,
    pub token: Option<String>,
    pub mds_id: Option<String>,
    pub part_number: Option<String>,
    pub part_name: Option<String>,
    pub oem: Option<String>,
    pub product_name: Option<String>,
    pub emissions_total: Option<f64>,
    pub emissions_unit: Option<String>,
    pub perimeter: Option<String>,
    pub methodology: Option<String>,
    pub reference_year: Option<i32>,
    pub notes: Option<String>,
    pub attachments: Option<Vec<serde_json::Value>>,
    pub status: Option<PortalStatus>,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
}

/// Query parameters for `GET /portal/submissions`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmissionQuery {
    pub id: Option<i64>,
    pub token: Option<String>,
    pub supplier_id: Option<i64>,
}
