//! `sect campaign` command - Engagement campaigns

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::commands::utils::open_db;
use crate::cli::helpers::{or_dash, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::campaign::{
    CampaignFilter, CampaignStatus, CampaignSummary, CampaignSupplier, CampaignType, NewCampaign,
};

#[derive(Subcommand, Debug)]
pub enum CampaignCommands {
    /// List campaigns with their progress
    List(ListArgs),

    /// Show a campaign and its enrolled suppliers
    Show(ShowArgs),

    /// Create a new campaign in draft
    New(NewArgs),

    /// Enroll suppliers in a campaign
    Enroll(EnrollArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status (draft, active, paused, completed, archived)
    #[arg(long, short = 's')]
    pub status: Option<CampaignStatus>,

    /// Filter by type (IMDS, PCF, MIXED)
    #[arg(long = "type", short = 't')]
    pub campaign_type: Option<CampaignType>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Campaign id
    pub id: i64,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Campaign name
    pub name: String,

    /// What the campaign collects (IMDS, PCF, MIXED)
    #[arg(long = "type", short = 't')]
    pub campaign_type: CampaignType,

    #[arg(long)]
    pub objective: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Targeted part families (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub families: Vec<String>,

    /// Recorded as the campaign owner
    #[arg(long)]
    pub created_by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct EnrollArgs {
    /// Campaign id
    pub id: i64,

    /// Supplier ids to enroll
    #[arg(required = true)]
    pub suppliers: Vec<i64>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("name", "NAME", 36),
    ColumnDef::new("type", "TYPE", 6),
    ColumnDef::new("status", "STATUS", 11),
    ColumnDef::new("suppliers", "SUPPLIERS", 10),
    ColumnDef::new("responded", "RESPONDED", 10),
    ColumnDef::new("progress", "PROGRESS", 9),
    ColumnDef::new("end", "END", 11),
];

const SUPPLIER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "SUP", 6),
    ColumnDef::new("name", "SUPPLIER", 32),
    ColumnDef::new("status", "STATUS", 12),
    ColumnDef::new("reminders", "REMINDERS", 10),
    ColumnDef::new("last_contact", "LAST CONTACT", 17),
];

pub fn run(cmd: CampaignCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CampaignCommands::List(args) => run_list(args, global),
        CampaignCommands::Show(args) => run_show(args, global),
        CampaignCommands::New(args) => run_new(args, global),
        CampaignCommands::Enroll(args) => run_enroll(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (_, db) = open_db(global)?;
    let campaigns = db.list_campaigns(&CampaignFilter {
        campaign_type: args.campaign_type,
        status: args.status,
    })?;

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&campaigns, global.format),
        format => {
            if campaigns.is_empty() && format == OutputFormat::Auto {
                println!("No campaigns found.");
                return Ok(());
            }
            TableFormatter::new(COLUMNS, "campaign").output(campaigns.iter().map(row), format)
        }
    }
}

fn row(c: &CampaignSummary) -> TableRow {
    let campaign = &c.campaign;
    TableRow::new(campaign.id)
        .cell("id", CellValue::Id(campaign.id))
        .cell("name", CellValue::Text(campaign.name.clone()))
        .cell("type", CellValue::Text(campaign.campaign_type.to_string()))
        .cell("status", CellValue::Status(campaign.status.to_string()))
        .cell("suppliers", CellValue::Number(c.progress.suppliers_total))
        .cell("responded", CellValue::Number(c.progress.suppliers_responded))
        .cell("progress", CellValue::Percent(c.progress.progress))
        .cell(
            "end",
            campaign
                .end_date
                .map_or(CellValue::Empty, |d| CellValue::Text(d.to_string())),
        )
}

fn supplier_row(s: &CampaignSupplier) -> TableRow {
    TableRow::new(s.supplier_id)
        .cell("id", CellValue::Id(s.supplier_id))
        .cell("name", CellValue::Text(s.supplier_name.clone()))
        .cell("status", CellValue::Status(s.status.to_string()))
        .cell("reminders", CellValue::Number(s.reminders_sent))
        .cell("last_contact", CellValue::DateTime(s.last_contact_at))
}

#[derive(Serialize)]
struct CampaignDetail<'a> {
    #[serde(flatten)]
    summary: &'a CampaignSummary,
    suppliers: &'a [CampaignSupplier],
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (_, db) = open_db(global)?;
    let summary = db.campaign_summary(args.id)?;
    let suppliers = db.campaign_suppliers(args.id)?;

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(
            &CampaignDetail {
                summary: &summary,
                suppliers: &suppliers,
            },
            global.format,
        ),
        OutputFormat::Id => {
            for s in &suppliers {
                println!("{}", s.supplier_id);
            }
            Ok(())
        }
        format => {
            let c = &summary.campaign;
            println!(
                "{} {} [{}] {}",
                style(c.id).cyan(),
                style(&c.name).bold(),
                c.campaign_type,
                c.status
            );
            println!("  objective: {}", or_dash(c.objective.as_deref()));
            println!(
                "  period:    {} .. {}",
                c.start_date.map_or("-".to_string(), |d| d.to_string()),
                c.end_date.map_or("-".to_string(), |d| d.to_string())
            );
            println!(
                "  progress:  {}/{} responded, {} validated ({:.1}%)",
                summary.progress.suppliers_responded,
                summary.progress.suppliers_total,
                summary.progress.suppliers_validated,
                summary.progress.progress
            );
            println!();
            if suppliers.is_empty() {
                println!("No suppliers enrolled. Use {}", style("sect campaign enroll").yellow());
                return Ok(());
            }
            TableFormatter::new(SUPPLIER_COLUMNS, "enrolled supplier")
                .output(suppliers.iter().map(supplier_row), format)
        }
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut db) = open_db(global)?;
    let new = NewCampaign {
        name: args.name,
        campaign_type: args.campaign_type,
        objective: args.objective,
        start_date: args.start,
        end_date: args.end,
        target_part_families: args.families,
        created_by: args.created_by,
    };
    let campaign = db.create_campaign(new)?;

    match global.format {
        OutputFormat::Id => println!("{}", campaign.id),
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&campaign, global.format)?,
        _ => println!(
            "{} Created {} campaign {} {}",
            style("✓").green(),
            campaign.campaign_type,
            style(campaign.id).cyan(),
            campaign.name
        ),
    }
    Ok(())
}

fn run_enroll(args: EnrollArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut db) = open_db(global)?;
    let added = db.add_campaign_suppliers(args.id, &args.suppliers)?;

    if !global.quiet {
        let skipped = args.suppliers.len().saturating_sub(added);
        println!(
            "{} Enrolled {} supplier(s) in campaign {}",
            style("✓").green(),
            style(added).cyan(),
            style(args.id).cyan()
        );
        if skipped > 0 {
            println!(
                "  {} {} already enrolled",
                style("!").yellow(),
                skipped
            );
        }
    }
    Ok(())
}
