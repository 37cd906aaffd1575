//! Dashboard aggregates: headline stats, activity feed, emissions trend, KPIs

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use rusqlite::params;
use serde::Serialize;

use super::{ts, ts_text, Database};
use crate::core::error::{DbError, DbResult};
use crate::entities::campaign::{percent, CampaignFilter, CampaignStatus, CampaignSummary};

pub const DEFAULT_ACTIVITY_LIMIT: i64 = 10;
pub const DEFAULT_TREND_MONTHS: u32 = 6;

/// Rows taken from each submission table before merging the feed
const ACTIVITY_PER_SOURCE: i64 = 5;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SupplierCounts {
    pub total: i64,
    pub tier1: i64,
    pub tier2: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignCounts {
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImdsCounts {
    pub total: i64,
    pub validated: i64,
    pub pending: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PcfCounts {
    pub total: i64,
    pub validated: i64,
    pub pending: i64,
    pub coverage: f64,
    pub suppliers_covered: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmissionsCounts {
    pub total_kgco2e: f64,
    pub total_tco2e: f64,
}

impl EmissionsCounts {
    pub fn from_kg(kg: f64) -> Self {
        Self {
            total_kgco2e: kg,
            total_tco2e: (kg / 1000.0 * 100.0).round() / 100.0,
        }
    }
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub suppliers: SupplierCounts,
    pub campaigns: CampaignCounts,
    pub imds: ImdsCounts,
    pub pcf: PcfCounts,
    pub emissions: EmissionsCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub stats: DashboardStats,
    pub active_campaigns: Vec<CampaignSummary>,
}

/// One line of the recent-activity feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Emissions declared during one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    /// `YYYY-MM`
    pub month: String,
    pub label: &'static str,
    pub collected: f64,
    pub validated: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImdsKpi {
    pub validation_rate: f64,
    pub total: i64,
    pub validated: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PcfKpi {
    pub coverage: f64,
    pub validation_rate: f64,
    pub total: i64,
    pub validated: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementKpi {
    pub avg_response_rate: f64,
    pub active_campaigns: i64,
    pub suppliers_total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionsKpi {
    pub total_kgco2e: f64,
    pub total_tco2e: f64,
    /// Percent change of collected emissions between the last two months
    pub trend: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub imds: ImdsKpi,
    pub pcf: PcfKpi,
    pub engagement: EngagementKpi,
    pub emissions: EmissionsKpi,
}

/// First day of the month `back` months before `now`'s month
fn month_start(now: DateTime<Utc>, back: u32) -> NaiveDate {
    let total = now.year() * 12 + now.month0() as i32 - back as i32;
    let (year, month0) = (total.div_euclid(12), total.rem_euclid(12) as u32);
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).unwrap_or(NaiveDate::MIN)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

impl Database {
    pub fn dashboard_stats(&self) -> DbResult<DashboardStats> {
        let suppliers = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(supply_chain_level = 'tier1'), 0),
                    COALESCE(SUM(supply_chain_level = 'tier2'), 0)
             FROM suppliers",
            [],
            |row| {
                Ok(SupplierCounts {
                    total: row.get(0)?,
                    tier1: row.get(1)?,
                    tier2: row.get(2)?,
                })
            },
        )?;

        let campaigns = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(status = 'active'), 0) FROM campaigns",
            [],
            |row| {
                Ok(CampaignCounts {
                    total: row.get(0)?,
                    active: row.get(1)?,
                })
            },
        )?;

        let imds = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'validated'), 0),
                    COALESCE(SUM(status IN ('draft', 'pending', 'submitted')), 0),
                    COALESCE(SUM(status = 'rejected'), 0)
             FROM imds_submissions",
            [],
            |row| {
                Ok(ImdsCounts {
                    total: row.get(0)?,
                    validated: row.get(1)?,
                    pending: row.get(2)?,
                    rejected: row.get(3)?,
                })
            },
        )?;

        let (pcf_total, pcf_validated, pcf_pending, covered, kg): (i64, i64, i64, i64, f64) =
            self.conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(validation_status = 'validated'), 0),
                        COALESCE(SUM(validation_status = 'pending'), 0),
                        COUNT(DISTINCT CASE WHEN validation_status = 'validated'
                                            THEN supplier_id END),
                        COALESCE(SUM(total_emissions_kgco2e), 0.0)
                 FROM pcf_declarations",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )?;

        Ok(DashboardStats {
            pcf: PcfCounts {
                total: pcf_total,
                validated: pcf_validated,
                pending: pcf_pending,
                coverage: percent(covered, suppliers.total),
                suppliers_covered: covered,
            },
            emissions: EmissionsCounts::from_kg(kg),
            suppliers,
            campaigns,
            imds,
        })
    }

    /// Stats plus every active campaign with its progress
    pub fn dashboard_overview(&self) -> DbResult<Overview> {
        Ok(Overview {
            stats: self.dashboard_stats()?,
            active_campaigns: self.list_campaigns(&CampaignFilter {
                campaign_type: None,
                status: Some(CampaignStatus::Active),
            })?,
        })
    }

    /// Recently touched IMDS sheets and PCF declarations, newest first
    pub fn recent_activity(&self, limit: i64) -> DbResult<Vec<ActivityItem>> {
        if !(1..=50).contains(&limit) {
            return Err(DbError::invalid("limit must be between 1 and 50"));
        }

        let mut items = Vec::new();

        let mut stmt = self.conn.prepare(
            "SELECT i.id, i.status, i.mds_id, i.internal_ref, i.updated_at,
                    COALESCE(s.name, 'Unknown') AS supplier_name
             FROM imds_submissions i LEFT JOIN suppliers s ON s.id = i.supplier_id
             ORDER BY i.updated_at DESC, i.id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([ACTIVITY_PER_SOURCE], |row| {
            let status: String = row.get("status")?;
            let mds_id: Option<String> = row.get("mds_id")?;
            let internal_ref: Option<String> = row.get("internal_ref")?;
            let supplier: String = row.get("supplier_name")?;
            Ok(ActivityItem {
                kind: "imds_submission",
                id: row.get("id")?,
                title: format!("IMDS {}", activity_verb(&status)),
                description: format!(
                    "{} - {}",
                    supplier,
                    mds_id.or(internal_ref).unwrap_or_default()
                ),
                status,
                timestamp: ts(row, "updated_at")?,
            })
        })?;
        for row in rows {
            items.push(row?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.validation_status, p.product_ref, p.updated_at,
                    COALESCE(s.name, 'Unknown') AS supplier_name
             FROM pcf_declarations p LEFT JOIN suppliers s ON s.id = p.supplier_id
             ORDER BY p.updated_at DESC, p.id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([ACTIVITY_PER_SOURCE], |row| {
            let status: String = row.get("validation_status")?;
            let supplier: String = row.get("supplier_name")?;
            let product: String = row.get("product_ref")?;
            Ok(ActivityItem {
                kind: "pcf_submission",
                id: row.get("id")?,
                title: format!("PCF {}", activity_verb(&status)),
                description: format!("{} - {}", supplier, product),
                status,
                timestamp: ts(row, "updated_at")?,
            })
        })?;
        for row in rows {
            items.push(row?);
        }

        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items.truncate(limit as usize);
        Ok(items)
    }

    /// Emissions per calendar month, oldest first, ending with the current month
    pub fn emissions_trend(&self, months: u32) -> DbResult<Vec<MonthTotal>> {
        self.emissions_trend_at(months, Utc::now())
    }

    pub(crate) fn emissions_trend_at(&self, months: u32, now: DateTime<Utc>) -> DbResult<Vec<MonthTotal>> {
        if !(1..=24).contains(&months) {
            return Err(DbError::invalid("months must be between 1 and 24"));
        }

        let first = month_start(now, months - 1);
        let since = Utc.from_utc_datetime(&first.and_hms_opt(0, 0, 0).unwrap_or_default());

        let mut stmt = self.conn.prepare(
            "SELECT substr(created_at, 1, 7) AS month,
                    SUM(total_emissions_kgco2e),
                    COALESCE(SUM(CASE WHEN validation_status = 'validated'
                                      THEN total_emissions_kgco2e END), 0.0)
             FROM pcf_declarations
             WHERE created_at >= ?1
             GROUP BY month",
        )?;
        let sums = stmt
            .query_map(params![ts_text(since)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?, row.get::<_, f64>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((0..months)
            .rev()
            .map(|back| {
                let start = month_start(now, back);
                let key = start.format("%Y-%m").to_string();
                let (collected, validated) = sums
                    .iter()
                    .find(|(m, _, _)| *m == key)
                    .map(|(_, c, v)| (*c, *v))
                    .unwrap_or((0.0, 0.0));
                MonthTotal {
                    label: MONTH_LABELS[start.month0() as usize],
                    month: key,
                    collected,
                    validated,
                }
            })
            .collect())
    }

    pub fn kpis(&self) -> DbResult<Kpis> {
        self.kpis_at(Utc::now())
    }

    pub(crate) fn kpis_at(&self, now: DateTime<Utc>) -> DbResult<Kpis> {
        let stats = self.dashboard_stats()?;
        let active = self.list_campaigns(&CampaignFilter {
            campaign_type: None,
            status: Some(CampaignStatus::Active),
        })?;

        let rates: Vec<f64> = active
            .iter()
            .filter(|c| c.progress.suppliers_total > 0)
            .map(|c| {
                c.progress.suppliers_responded as f64 / c.progress.suppliers_total as f64 * 100.0
            })
            .collect();
        let avg_response_rate = if rates.is_empty() {
            0.0
        } else {
            round1(rates.iter().sum::<f64>() / rates.len() as f64)
        };

        let trend = self.emissions_trend_at(2, now)?;
        let change = match trend.as_slice() {
            [prev, last] if prev.collected > 0.0 => {
                Some(round1((last.collected - prev.collected) / prev.collected * 100.0))
            }
            _ => None,
        };

        Ok(Kpis {
            imds: ImdsKpi {
                validation_rate: percent(stats.imds.validated, stats.imds.total),
                total: stats.imds.total,
                validated: stats.imds.validated,
                pending: stats.imds.pending,
            },
            pcf: PcfKpi {
                coverage: stats.pcf.coverage,
                validation_rate: percent(stats.pcf.validated, stats.pcf.total),
                total: stats.pcf.total,
                validated: stats.pcf.validated,
            },
            engagement: EngagementKpi {
                avg_response_rate,
                active_campaigns: active.len() as i64,
                suppliers_total: stats.suppliers.total,
            },
            emissions: EmissionsKpi {
                total_kgco2e: stats.emissions.total_kgco2e,
                total_tco2e: stats.emissions.total_tco2e,
                trend: change,
            },
        })
    }
}

fn activity_verb(status: &str) -> &'static str {
    match status {
        "validated" => "validated",
        "rejected" => "rejected",
        _ => "submitted",
    }
}
