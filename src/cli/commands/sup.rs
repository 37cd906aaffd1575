//! `sect sup` command - Supplier management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::commands::utils::open_db;
use crate::cli::helpers::{confirm, or_dash, print_cancelled, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::supplier::{
    NewContact, NewSupplier, Supplier, SupplierFilter, SupplierProfile, SupplierType,
    SupplyChainLevel,
};

#[derive(Subcommand, Debug)]
pub enum SupCommands {
    /// List suppliers with filtering
    List(ListArgs),

    /// Show a supplier with contacts and profiles
    Show(ShowArgs),

    /// Create a new supplier
    New(NewArgs),

    /// Delete a supplier and everything attached to it
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by ISO country code
    #[arg(long, short = 'c')]
    pub country: Option<String>,

    /// Filter by supplier type (material, component, assembly, service)
    #[arg(long = "type", short = 't')]
    pub supplier_type: Option<SupplierType>,

    /// Filter by supply chain level (tier1..tier4)
    #[arg(long)]
    pub level: Option<SupplyChainLevel>,

    /// Search in name and external id
    #[arg(long)]
    pub search: Option<String>,

    /// Skip the first N suppliers
    #[arg(long)]
    pub skip: Option<i64>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<i64>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Supplier id
    pub id: i64,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Supplier name
    pub name: String,

    /// External reference, e.g. an ERP vendor code
    #[arg(long)]
    pub external_id: Option<String>,

    /// Parent group
    #[arg(long)]
    pub group: Option<String>,

    /// ISO 3166 alpha-2 country code
    #[arg(long, short = 'c')]
    pub country: Option<String>,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long = "type", short = 't')]
    pub supplier_type: Option<SupplierType>,

    #[arg(long)]
    pub level: Option<SupplyChainLevel>,

    /// Main part families (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub families: Vec<String>,

    /// Primary contact name
    #[arg(long)]
    pub contact: Option<String>,

    /// Primary contact email
    #[arg(long)]
    pub email: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Supplier id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("external_id", "EXT-ID", 12),
    ColumnDef::new("name", "NAME", 32),
    ColumnDef::new("country", "CTRY", 6),
    ColumnDef::new("type", "TYPE", 11),
    ColumnDef::new("level", "LEVEL", 7),
    ColumnDef::new("families", "PART FAMILIES", 30),
];

pub fn run(cmd: SupCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SupCommands::List(args) => run_list(args, global),
        SupCommands::Show(args) => run_show(args, global),
        SupCommands::New(args) => run_new(args, global),
        SupCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (_, db) = open_db(global)?;
    let filter = SupplierFilter {
        skip: args.skip,
        limit: args.limit,
        country_code: args.country,
        supplier_type: args.supplier_type,
        supply_chain_level: args.level,
        search: args.search,
    };
    let suppliers = db.list_suppliers(&filter)?;

    if args.count {
        println!("{}", suppliers.len());
        return Ok(());
    }

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&suppliers, global.format),
        format => {
            if suppliers.is_empty() && format == OutputFormat::Auto {
                println!("No suppliers found.");
                return Ok(());
            }
            TableFormatter::new(COLUMNS, "supplier").output(suppliers.iter().map(row), format)
        }
    }
}

fn row(s: &Supplier) -> TableRow {
    TableRow::new(s.id)
        .cell("id", CellValue::Id(s.id))
        .cell(
            "external_id",
            s.external_id
                .clone()
                .map_or(CellValue::Empty, CellValue::Text),
        )
        .cell("name", CellValue::Text(s.name.clone()))
        .cell(
            "country",
            s.country_code
                .clone()
                .map_or(CellValue::Empty, CellValue::Text),
        )
        .cell(
            "type",
            s.supplier_type
                .map_or(CellValue::Empty, |t| CellValue::Text(t.to_string())),
        )
        .cell(
            "level",
            s.supply_chain_level
                .map_or(CellValue::Empty, |l| CellValue::Text(l.to_string())),
        )
        .cell("families", CellValue::Tags(s.main_part_families.clone()))
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let (_, db) = open_db(global)?;
    let profile = db.supplier_profile(args.id)?;

    match global.format {
        OutputFormat::Id => {
            println!("{}", profile.supplier.id);
            Ok(())
        }
        OutputFormat::Tsv | OutputFormat::Md | OutputFormat::Csv => {
            print_profile(&profile);
            Ok(())
        }
        format => print_structured(&profile, format),
    }
}

fn print_profile(profile: &SupplierProfile) {
    let s = &profile.supplier;
    println!("{} {}", style(s.id).cyan(), style(&s.name).bold());
    println!("  external id:  {}", or_dash(s.external_id.as_deref()));
    println!("  group:        {}", or_dash(s.parent_group.as_deref()));
    println!(
        "  location:     {} {}",
        or_dash(s.country_code.as_deref()),
        s.region.as_deref().unwrap_or("")
    );
    println!(
        "  type / level: {} / {}",
        s.supplier_type.map_or("-", |t| t.as_str()),
        s.supply_chain_level.map_or("-", |l| l.as_str())
    );
    if !s.main_part_families.is_empty() {
        println!("  families:     {}", s.main_part_families.join(", "));
    }

    if !profile.contacts.is_empty() {
        println!();
        println!("{}", style("Contacts").bold());
        for c in &profile.contacts {
            let marker = if c.is_primary { "*" } else { " " };
            println!(
                " {} {} <{}> {}",
                marker,
                c.full_name,
                or_dash(c.email.as_deref()),
                style(or_dash(c.role.as_deref())).dim()
            );
        }
    }

    if let Some(imds) = &profile.imds_profile {
        println!();
        println!("{}", style("IMDS").bold());
        println!("  company id:   {}", or_dash(imds.imds_id.as_deref()));
        println!("  OEMs served:  {}", imds.oems_served.join(", "));
        if let Some(rate) = imds.on_time_submission_rate {
            println!("  on-time rate: {:.1}%", rate);
        }
    }

    if let Some(pcf) = &profile.pcf_profile {
        println!();
        println!("{}", style("PCF").bold());
        println!(
            "  maturity:     {}",
            pcf.pcf_maturity.map_or("-", |m| m.as_str())
        );
        println!("  declarations: {}", pcf.pcf_count);
        println!("  frameworks:   {}", pcf.frameworks.join(", "));
    }

    if let Some(hub) = &profile.hub_metadata {
        println!();
        println!("{}", style("Hub").bold());
        println!("  priority:     {}", hub.priority.map_or("-", |p| p.as_str()));
        println!("  program:      {}", or_dash(hub.program_status.as_deref()));
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut db) = open_db(global)?;

    let new = NewSupplier {
        external_id: args.external_id,
        name: args.name,
        parent_group: args.group,
        country_code: args.country,
        region: args.region,
        supplier_type: args.supplier_type,
        supply_chain_level: args.level,
        main_part_families: args.families,
    };
    let supplier = db.create_supplier(new)?;

    if args.contact.is_some() || args.email.is_some() {
        let full_name = args
            .contact
            .or_else(|| args.email.clone())
            .unwrap_or_default();
        db.add_contact(
            supplier.id,
            NewContact {
                full_name,
                email: args.email,
                is_primary: true,
                ..Default::default()
            },
        )?;
    }

    match global.format {
        OutputFormat::Id => println!("{}", supplier.id),
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&supplier, global.format)?,
        _ => println!(
            "{} Created supplier {} {}",
            style("✓").green(),
            style(supplier.id).cyan(),
            supplier.name
        ),
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut db) = open_db(global)?;
    let supplier = db.get_supplier(args.id)?;

    let prompt = format!(
        "Delete supplier {} ({}) with its contacts, profiles and submissions?",
        supplier.id, supplier.name
    );
    if !confirm(&prompt, args.yes)? {
        print_cancelled();
        return Ok(());
    }

    let removed = db.delete_supplier(args.id)?;
    if !global.quiet {
        println!(
            "{} Deleted supplier {} {}",
            style("✓").green(),
            style(removed.id).cyan(),
            removed.name
        );
    }
    Ok(())
}
