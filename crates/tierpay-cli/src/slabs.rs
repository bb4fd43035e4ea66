//! # Slabs Subcommand
//!
//! Works on a JSON array of slab rows (`slab_min`, `slab_max`, optional
//! `is_active`, and per-role rates). Rows are loaded in file order through
//! the same validation the engine applies to interactive edits.
//!
//! - `check` reports every row that would be rejected.
//! - `resolve` prints the rate a role earns on an amount.
//! - `sort` prints the accepted rows in display order.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tierpay_commission::{sort_slabs, SlabSet, SlabSortField, SortDirection};
use tierpay_core::{CommissionId, FieldError};

use crate::{read_json, Context, SlabRow};

/// Arguments for the `tierpay slabs` subcommand.
#[derive(Args, Debug)]
pub struct SlabsArgs {
    #[command(subcommand)]
    pub command: SlabsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SlabsCommand {
    /// Report overlapping, malformed and hierarchy-violating rows.
    Check {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Print the rate ROLE earns on AMOUNT.
    Resolve {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        #[arg(long)]
        amount: Decimal,

        #[arg(long)]
        role: String,
    },

    /// Print rows ordered by a column.
    Sort {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// slab_min, slab_max, is_active, or a rate column.
        #[arg(long, default_value = "slab_min")]
        by: SlabSortField,

        #[arg(long)]
        desc: bool,
    },
}

#[derive(Debug, Serialize)]
struct RejectedRow {
    row: usize,
    message: String,
    fields: Vec<FieldError>,
}

/// Load `path` into a fresh slab set, collecting the rows that fail.
fn load(path: &Path) -> Result<(SlabSet, Vec<RejectedRow>)> {
    let rows: Vec<SlabRow> = read_json(path)?;
    let mut set = SlabSet::new(CommissionId::new());
    let mut rejected = Vec::new();
    for (row, entry) in rows.into_iter().enumerate() {
        if let Err(err) = set.add(entry.draft) {
            rejected.push(RejectedRow {
                row,
                message: err.to_string(),
                fields: err.field_errors(),
            });
        }
    }
    Ok((set, rejected))
}

/// Execute the slabs subcommand.
pub fn run_slabs(args: &SlabsArgs, ctx: &Context) -> Result<u8> {
    match &args.command {
        SlabsCommand::Check { path } => check(path, ctx),
        SlabsCommand::Resolve { path, amount, role } => resolve(path, *amount, role, ctx),
        SlabsCommand::Sort { path, by, desc } => sort(path, *by, *desc, ctx),
    }
}

fn check(path: &Path, ctx: &Context) -> Result<u8> {
    let (set, rejected) = load(path)?;
    if ctx.json {
        ctx.print_json(&rejected)?;
    } else {
        for r in &rejected {
            println!("row {}: {}", r.row, r.message);
        }
        println!("{} accepted, {} rejected", set.len(), rejected.len());
    }
    Ok(if rejected.is_empty() { 0 } else { 1 })
}

fn resolve(path: &Path, amount: Decimal, role: &str, ctx: &Context) -> Result<u8> {
    let role = ctx.known_role(role)?;
    let (set, rejected) = load(path)?;
    for r in &rejected {
        tracing::warn!(row = r.row, error = %r.message, "slab row skipped");
    }
    let rate = set.resolve(amount, role);
    let covered = set.covering(amount).is_some();

    if ctx.json {
        ctx.print_json(&serde_json::json!({
            "amount": amount,
            "role": role,
            "rate": rate,
            "covered": covered,
        }))?;
    } else {
        println!("{rate}");
    }
    Ok(0)
}

fn sort(path: &Path, by: SlabSortField, desc: bool, ctx: &Context) -> Result<u8> {
    let (set, rejected) = load(path)?;
    for r in &rejected {
        tracing::warn!(row = r.row, error = %r.message, "slab row skipped");
    }
    let direction = if desc { SortDirection::Descending } else { SortDirection::Ascending };
    let sorted = sort_slabs(set.slabs(), by, direction);

    if ctx.json {
        let drafts: Vec<_> = sorted.iter().map(|s| s.to_draft()).collect();
        ctx.print_json(&drafts)?;
    } else {
        for slab in &sorted {
            let rates: Vec<String> = slab.rates.iter().map(|(f, r)| format!("{f}={r}")).collect();
            println!(
                "[{}, {}) {} {}",
                slab.slab_min,
                slab.slab_max,
                if slab.is_active { "active" } else { "inactive" },
                rates.join(" ")
            );
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierpay_core::RoleTable;

    const TWO_BANDS: &str = r#"[
        {"slab_min": 0, "slab_max": 100, "admin": 1, "whitelabel": 1, "masterdistributor": 1, "distributor": 1, "retailer": 1.0},
        {"slab_min": 100, "slab_max": 1000, "admin": 2, "whitelabel": 2, "masterdistributor": 2, "distributor": 2, "retailer": 1.5}
    ]"#;

    fn file(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slabs.json");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    fn ctx() -> Context {
        Context::new(RoleTable::builtin(), false)
    }

    #[test]
    fn clean_file_checks_ok() {
        let (_dir, path) = file(TWO_BANDS);
        let args = SlabsArgs {
            command: SlabsCommand::Check { path },
        };
        assert_eq!(run_slabs(&args, &ctx()).unwrap(), 0);
    }

    #[test]
    fn overlapping_row_is_reported() {
        let (_dir, path) = file(r#"[{"slab_min": 0, "slab_max": 1000}, {"slab_min": 500, "slab_max": 1500}]"#);
        let (set, rejected) = load(&path).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].row, 1);
        assert_eq!(rejected[0].fields[0].field, "range");
        let args = SlabsArgs {
            command: SlabsCommand::Check { path },
        };
        assert_eq!(run_slabs(&args, &ctx()).unwrap(), 1);
    }

    #[test]
    fn resolve_uses_loaded_bands() {
        let (_dir, path) = file(TWO_BANDS);
        let (set, _) = load(&path).unwrap();
        assert_eq!(
            set.resolve(Decimal::from(250), tierpay_core::Role::Retailer),
            Decimal::new(15, 1)
        );
        let args = SlabsArgs {
            command: SlabsCommand::Resolve {
                path,
                amount: Decimal::from(7000),
                role: "retailer".into(),
            },
        };
        assert_eq!(run_slabs(&args, &ctx()).unwrap(), 0);
    }

    #[test]
    fn resolve_rejects_unknown_roles() {
        let (_dir, path) = file(TWO_BANDS);
        let args = SlabsArgs {
            command: SlabsCommand::Resolve {
                path,
                amount: Decimal::from(5),
                role: "auditor".into(),
            },
        };
        assert!(run_slabs(&args, &ctx()).is_err());
    }

    #[test]
    fn sort_runs_in_both_directions() {
        let (_dir, path) = file(TWO_BANDS);
        for desc in [false, true] {
            let args = SlabsArgs {
                command: SlabsCommand::Sort {
                    path: path.clone(),
                    by: SlabSortField::SlabMax,
                    desc,
                },
            };
            assert_eq!(run_slabs(&args, &ctx()).unwrap(), 0);
        }
    }
}
