//! Record types stored in the engagement database
//!
//! SECT tracks the following records:
//!
//! **Supplier base:**
//! - [`Supplier`] - Suppliers with contacts, IMDS/PCF profiles and hub metadata
//!
//! **Engagement:**
//! - [`Campaign`] - IMDS, PCF or mixed data-collection campaigns
//! - [`CampaignSupplier`] - A supplier's progress inside one campaign
//!
//! **Submissions:**
//! - [`ImdsSubmission`] - Material data sheets submitted to IMDS
//! - [`PcfDeclaration`] - Product carbon footprint declarations
//!
//! **Supplier portal:**
//! - [`AccessToken`] - Time-limited bearer tokens for supplier contacts
//! - [`PortalSubmission`] - Drafts and submissions entered through the portal
//!
//! **Accounts:**
//! - [`User`] - Back-office users with role-based permissions

/// Declare a closed set of text values stored as-is in SQLite and JSON.
///
/// Parsing is case-insensitive; rendering always uses the canonical text.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let options: Vec<&str> = $name::ALL.iter().map(|v| v.as_str()).collect();
                        format!("Invalid {}: {}. Use {}", $label, s, options.join(", "))
                    })
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| rusqlite::types::FromSqlError::Other(e.into()))
            }
        }
    };
}

pub mod campaign;
pub mod imds;
pub mod pcf;
pub mod portal;
pub mod supplier;
pub mod user;

pub use campaign::{Campaign, CampaignStatus, CampaignSupplier, CampaignType, ParticipationStatus};
pub use imds::{ImdsStatus, ImdsSubmission};
pub use pcf::{PcfDeclaration, ValidationStatus};
pub use portal::{AccessToken, PortalStatus, PortalSubmission, SubmissionType};
pub use supplier::{Supplier, SupplierType, SupplyChainLevel};
pub use user::{Permission, Role, User};

#[cfg(test)]
mod tests {
    use super::supplier::SupplyChainLevel;

    #[test]
    fn test_text_enum_parse_is_case_insensitive() {
        assert_eq!("TIER1".parse::<SupplyChainLevel>().unwrap(), SupplyChainLevel::Tier1);
        assert_eq!(" tier2 ".parse::<SupplyChainLevel>().unwrap(), SupplyChainLevel::Tier2);
    }

    #[test]
    fn test_text_enum_error_lists_options() {
        let err = "tier9".parse::<SupplyChainLevel>().unwrap_err();
        assert!(err.contains("supply chain level"));
        assert!(err.contains("tier1, tier2, tier3, tier4"));
    }

    #[test]
    fn test_text_enum_json() {
        let json = serde_json::to_string(&SupplyChainLevel::Tier3).unwrap();
        assert_eq!(json, "\"tier3\"");
        let parsed: SupplyChainLevel = serde_json::from_str("\"Tier3\"").unwrap();
        assert_eq!(parsed, SupplyChainLevel::Tier3);
        assert!(serde_json::from_str::<SupplyChainLevel>("\"gold\"").is_err());
    }
}
