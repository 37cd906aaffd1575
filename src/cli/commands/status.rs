//! `sect status` command - Engagement dashboard

use console::style;
use miette::Result;
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::commands::utils::open_db;
use crate::cli::helpers::{print_structured, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::db::{
    ActivityItem, DashboardStats, Kpis, MonthTotal, DEFAULT_ACTIVITY_LIMIT, DEFAULT_TREND_MONTHS,
};
use crate::entities::campaign::CampaignSummary;

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Months of emissions trend to show
    #[arg(long, default_value_t = DEFAULT_TREND_MONTHS)]
    pub months: u32,

    /// Number of recent activity items
    #[arg(long, default_value_t = DEFAULT_ACTIVITY_LIMIT)]
    pub activity: i64,
}

#[derive(Serialize)]
struct Dashboard {
    stats: DashboardStats,
    kpis: Kpis,
    active_campaigns: Vec<CampaignSummary>,
    emissions_trend: Vec<MonthTotal>,
    activity: Vec<ActivityItem>,
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let (_, db) = open_db(global)?;
    let overview = db.dashboard_overview()?;
    let dashboard = Dashboard {
        stats: overview.stats,
        kpis: db.kpis()?,
        active_campaigns: overview.active_campaigns,
        emissions_trend: db.emissions_trend(args.months)?,
        activity: db.recent_activity(args.activity)?,
    };

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&dashboard, global.format),
        format => {
            let markdown = format == OutputFormat::Md;
            print_dashboard(&dashboard, markdown);
            Ok(())
        }
    }
}

fn render(builder: Builder, markdown: bool) -> String {
    let mut table = builder.build();
    if markdown {
        table.with(Style::markdown());
    } else {
        table.with(Style::rounded());
    }
    table.to_string()
}

fn heading(title: &str, markdown: bool) {
    println!();
    if markdown {
        println!("## {}", title);
        println!();
    } else {
        println!("{}", style(title).bold());
    }
}

fn print_dashboard(d: &Dashboard, markdown: bool) {
    let width = 68;
    if markdown {
        println!("# SECT Status");
    } else {
        println!("{}", style("SECT Status").bold().underlined());
        println!("{}", "═".repeat(width));
    }

    let s = &d.stats;
    let mut headline = Builder::default();
    headline.push_record(["Area", "Total", "Detail"]);
    headline.push_record([
        "Suppliers".to_string(),
        s.suppliers.total.to_string(),
        format!("{} tier 1, {} tier 2", s.suppliers.tier1, s.suppliers.tier2),
    ]);
    headline.push_record([
        "Campaigns".to_string(),
        s.campaigns.total.to_string(),
        format!("{} active", s.campaigns.active),
    ]);
    headline.push_record([
        "IMDS".to_string(),
        s.imds.total.to_string(),
        format!(
            "{} validated, {} pending, {} rejected",
            s.imds.validated, s.imds.pending, s.imds.rejected
        ),
    ]);
    headline.push_record([
        "PCF".to_string(),
        s.pcf.total.to_string(),
        format!(
            "{} validated, {} pending, {:.1}% supplier coverage",
            s.pcf.validated, s.pcf.pending, s.pcf.coverage
        ),
    ]);
    headline.push_record([
        "Emissions".to_string(),
        format!("{:.2} tCO2e", s.emissions.total_tco2e),
        format!("{:.1} kgCO2e declared", s.emissions.total_kgco2e),
    ]);
    heading("Overview", markdown);
    println!("{}", render(headline, markdown));

    let k = &d.kpis;
    let trend = match k.emissions.trend {
        Some(t) if t > 0.0 => format!("+{:.1}%", t),
        Some(t) => format!("{:.1}%", t),
        None => "-".to_string(),
    };
    let mut kpis = Builder::default();
    kpis.push_record(["KPI", "Value"]);
    kpis.push_record([
        "IMDS validation rate".to_string(),
        format!("{:.1}%", k.imds.validation_rate),
    ]);
    kpis.push_record(["PCF coverage".to_string(), format!("{:.1}%", k.pcf.coverage)]);
    kpis.push_record([
        "PCF validation rate".to_string(),
        format!("{:.1}%", k.pcf.validation_rate),
    ]);
    kpis.push_record([
        "Avg. campaign response".to_string(),
        format!("{:.1}%", k.engagement.avg_response_rate),
    ]);
    kpis.push_record(["Emissions trend (month)".to_string(), trend]);
    heading("KPIs", markdown);
    println!("{}", render(kpis, markdown));

    if !d.active_campaigns.is_empty() {
        let mut campaigns = Builder::default();
        campaigns.push_record(["ID", "Campaign", "Type", "Responded", "Progress"]);
        for c in &d.active_campaigns {
            campaigns.push_record([
                c.campaign.id.to_string(),
                truncate_str(&c.campaign.name, 36),
                c.campaign.campaign_type.to_string(),
                format!(
                    "{}/{}",
                    c.progress.suppliers_responded, c.progress.suppliers_total
                ),
                format!("{:.1}%", c.progress.progress),
            ]);
        }
        heading("Active campaigns", markdown);
        println!("{}", render(campaigns, markdown));
    }

    if !d.emissions_trend.is_empty() {
        let mut trend = Builder::default();
        trend.push_record(["Month", "Collected (kgCO2e)", "Validated (kgCO2e)"]);
        for m in &d.emissions_trend {
            trend.push_record([
                format!("{} {}", m.label, &m.month[..4.min(m.month.len())]),
                format!("{:.1}", m.collected),
                format!("{:.1}", m.validated),
            ]);
        }
        heading("Emissions trend", markdown);
        println!("{}", render(trend, markdown));
    }

    heading("Recent activity", markdown);
    if d.activity.is_empty() {
        println!("No activity yet. Load demo data with {}", style("sect seed").yellow());
    } else {
        let mut activity = Builder::default();
        activity.push_record(["When", "Type", "Title", "Status"]);
        for item in &d.activity {
            activity.push_record([
                item.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                item.kind.to_string(),
                truncate_str(&item.title, 40),
                item.status.clone(),
            ]);
        }
        println!("{}", render(activity, markdown));
    }
}
