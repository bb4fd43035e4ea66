//! # Roles Subcommand
//!
//! Without an argument, prints the role ladder from the loaded table. With
//! a role name, prints that role's full permission set.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tierpay_core::{Level, RateField, Role};

use crate::Context;

/// Arguments for the `tierpay roles` subcommand.
#[derive(Args, Debug)]
pub struct RolesArgs {
    /// Show the permission set of this role (aliases accepted).
    #[arg(value_name = "ROLE")]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
struct LadderRow {
    role: Role,
    display_name: &'static str,
    level: Level,
    aliases: Vec<String>,
    editable_fields: Vec<RateField>,
}

/// Execute the roles subcommand.
pub fn run_roles(args: &RolesArgs, ctx: &Context) -> Result<u8> {
    match &args.role {
        Some(raw) => show_role(raw, ctx),
        None => show_ladder(ctx),
    }
}

fn show_ladder(ctx: &Context) -> Result<u8> {
    let table = ctx.hierarchy().table();
    let rows: Vec<LadderRow> = Role::all()
        .iter()
        .map(|role| LadderRow {
            role: *role,
            display_name: role.display_name(),
            level: table.level(*role),
            aliases: table
                .aliases()
                .filter(|(name, r)| r == role && *name != role.as_str())
                .map(|(name, _)| name.to_string())
                .collect(),
            editable_fields: table.editable_fields(*role).to_vec(),
        })
        .collect();

    if ctx.json {
        ctx.print_json(&rows)?;
        return Ok(0);
    }

    println!("{:<6} {:<18} {:<20} {:<16} EDITABLE", "LEVEL", "ROLE", "NAME", "ALIASES");
    for row in &rows {
        let fields: Vec<&str> = row.editable_fields.iter().map(|f| f.as_str()).collect();
        println!(
            "{:<6} {:<18} {:<20} {:<16} {}",
            row.level.to_string(),
            row.role.as_str(),
            row.display_name,
            row.aliases.join(","),
            if fields.is_empty() { "-".to_string() } else { fields.join(",") }
        );
    }
    Ok(0)
}

fn show_role(raw: &str, ctx: &Context) -> Result<u8> {
    let resolved = ctx.hierarchy().resolve(raw);
    let set = ctx.permissions.permission_set(&resolved);
    if !resolved.is_known() {
        tracing::warn!(role = raw, "unrecognized role has no permissions");
    }

    if ctx.json {
        ctx.print_json(&set)?;
    } else {
        println!("{} (level {})", set.role.display_name, set.role.level);
        for (domain, flags) in [("scheme", set.schemes), ("commission", set.commissions)] {
            let allowed: Vec<&str> = [
                ("create", flags.create),
                ("read", flags.read),
                ("update", flags.update),
                ("delete", flags.delete),
            ]
            .into_iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect();
            println!("  {domain:<11} {}", if allowed.is_empty() { "-".to_string() } else { allowed.join(",") });
        }
        let fields: Vec<&str> = set.editable_commission_fields.iter().map(|f| f.as_str()).collect();
        println!("  editable    {}", if fields.is_empty() { "-".to_string() } else { fields.join(",") });
        let manages: Vec<&str> = set.manageable_roles.iter().map(|r| r.as_str()).collect();
        println!("  manages     {}", if manages.is_empty() { "-".to_string() } else { manages.join(",") });
    }

    Ok(if resolved.is_known() { 0 } else { 1 })
}
