//! `sect token` command - Supplier portal access tokens

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::commands::utils::open_db;
use crate::cli::helpers::{confirm, or_dash, print_cancelled, print_structured};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::template::TemplateRenderer;
use crate::entities::portal::{fingerprint, AccessToken, IssuedToken, TokenRequest};

#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    /// Issue a portal token for a supplier contact
    Issue(IssueArgs),

    /// List tokens, newest first
    List(ListArgs),

    /// Deactivate a token
    Revoke(RevokeArgs),

    /// Check whether a token is currently valid
    Verify(VerifyArgs),
}

#[derive(clap::Args, Debug)]
pub struct IssueArgs {
    /// Supplier id
    #[arg(long, short = 's')]
    pub supplier: i64,

    /// Contact email the link is sent to
    #[arg(long, short = 'e')]
    pub email: String,

    /// Contact name used in the invitation
    #[arg(long)]
    pub name: Option<String>,

    /// Restrict submissions to one campaign
    #[arg(long, short = 'c')]
    pub campaign: Option<i64>,

    /// Validity in days (default: portal.default_expiry_days)
    #[arg(long, short = 'd')]
    pub days: Option<i64>,

    /// Recorded as the issuer
    #[arg(long)]
    pub created_by: Option<String>,

    /// Print only the portal URL
    #[arg(long)]
    pub url_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only tokens for this supplier
    #[arg(long, short = 's')]
    pub supplier: Option<i64>,

    /// Hide revoked and expired tokens
    #[arg(long)]
    pub active: bool,
}

#[derive(clap::Args, Debug)]
pub struct RevokeArgs {
    /// Token id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    /// Token value
    pub token: String,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("supplier", "SUPPLIER", 28),
    ColumnDef::new("email", "CONTACT", 30),
    ColumnDef::new("campaign", "CAMPAIGN", 24),
    ColumnDef::new("state", "STATE", 8),
    ColumnDef::new("expires", "EXPIRES", 17),
    ColumnDef::new("uses", "USES", 5),
    ColumnDef::new("fingerprint", "FINGERPRINT", 14),
];

pub fn run(cmd: TokenCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TokenCommands::Issue(args) => run_issue(args, global),
        TokenCommands::List(args) => run_list(args, global),
        TokenCommands::Revoke(args) => run_revoke(args, global),
        TokenCommands::Verify(args) => run_verify(args, global),
    }
}

#[derive(Serialize)]
struct IssuedOutput<'a> {
    #[serde(flatten)]
    issued: &'a IssuedToken,
    invitation: &'a str,
}

fn run_issue(args: IssueArgs, global: &GlobalOpts) -> Result<()> {
    let (ctx, mut db) = open_db(global)?;
    let request = TokenRequest {
        supplier_id: Some(args.supplier),
        campaign_id: args.campaign,
        contact_email: args.email,
        contact_name: args.name,
        expires_days: args.days,
        created_by: args.created_by,
    };
    let issued = db.issue_token(
        request,
        ctx.config.portal.default_expiry_days,
        &ctx.config.server.public_url,
    )?;
    let invitation = TemplateRenderer::new()?.invitation(&issued)?;

    if args.url_only {
        println!("{}", issued.portal_url);
        return Ok(());
    }

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(
            &IssuedOutput {
                issued: &issued,
                invitation: &invitation,
            },
            global.format,
        ),
        OutputFormat::Id => {
            println!("{}", issued.token.token);
            Ok(())
        }
        _ => {
            let token = &issued.token;
            println!(
                "{} Issued token {} for {} <{}>",
                style("✓").green(),
                style(token.id).cyan(),
                or_dash(token.supplier_name.as_deref()),
                token.contact_email
            );
            println!("  token:   {}", token.token);
            println!("  url:     {}", style(&issued.portal_url).cyan());
            println!(
                "  expires: {}",
                token.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
            if !global.quiet {
                println!();
                println!("{}", style("Invitation").bold());
                println!("{}", style("-".repeat(60)).dim());
                println!("{}", invitation.trim_end());
            }
            Ok(())
        }
    }
}

fn token_state(token: &AccessToken) -> &'static str {
    if !token.is_active {
        "revoked"
    } else if token.is_valid_at(Utc::now()) {
        "active"
    } else {
        "expired"
    }
}

fn row(t: &AccessToken) -> TableRow {
    TableRow::new(t.id)
        .cell("id", CellValue::Id(t.id))
        .cell(
            "supplier",
            CellValue::Text(
                t.supplier_name
                    .clone()
                    .unwrap_or_else(|| t.supplier_id.to_string()),
            ),
        )
        .cell("email", CellValue::Text(t.contact_email.clone()))
        .cell(
            "campaign",
            t.campaign_name
                .clone()
                .map_or(CellValue::Empty, CellValue::Text),
        )
        .cell("state", CellValue::Status(token_state(t).to_string()))
        .cell("expires", CellValue::DateTime(Some(t.expires_at)))
        .cell("uses", CellValue::Number(t.use_count))
        .cell("fingerprint", CellValue::Text(fingerprint(&t.token)))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let (_, db) = open_db(global)?;
    let mut tokens = db.list_tokens(args.supplier)?;
    if args.active {
        let now = Utc::now();
        tokens.retain(|t| t.is_valid_at(now));
    }

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&tokens, global.format),
        format => {
            if tokens.is_empty() && format == OutputFormat::Auto {
                println!("No tokens found.");
                return Ok(());
            }
            TableFormatter::new(COLUMNS, "token").output(tokens.iter().map(row), format)
        }
    }
}

fn run_revoke(args: RevokeArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut db) = open_db(global)?;
    let token = db.get_token(args.id)?;

    let prompt = format!(
        "Revoke token {} for {}? The supplier will lose portal access.",
        token.id, token.contact_email
    );
    if !confirm(&prompt, args.yes)? {
        print_cancelled();
        return Ok(());
    }

    let revoked = db.revoke_token(Some(args.id), None)?;
    if !global.quiet {
        println!(
            "{} Revoked token {} ({})",
            style("✓").green(),
            style(revoked.id).cyan(),
            revoked.contact_email
        );
    }
    Ok(())
}

fn run_verify(args: VerifyArgs, global: &GlobalOpts) -> Result<()> {
    let (_, db) = open_db(global)?;
    let token = db.lookup_token(args.token.trim())?;

    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&token, global.format),
        _ => {
            println!(
                "{} Token is valid for {} <{}>",
                style("✓").green(),
                or_dash(token.supplier_name.as_deref()),
                token.contact_email
            );
            if let Some(campaign) = &token.campaign_name {
                println!("  campaign: {}", campaign);
            }
            println!(
                "  expires:  {}",
                token.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
            Ok(())
        }
    }
}
