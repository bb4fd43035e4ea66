//! # Validate Subcommand
//!
//! Runs the commission hierarchy check over a JSON file holding one rate
//! object or an array of them. Extra keys (ids, slab bounds, operator
//! names) are ignored, so exported commission and slab lists can be
//! checked as they are.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::{Deserialize, Serialize};
use tierpay_commission::CommissionHierarchyValidator;
use tierpay_core::{RateMap, Violation};

use crate::{read_json, Context};

/// Arguments for the `tierpay validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON file of rates.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RateFile {
    Many(Vec<RateMap>),
    One(RateMap),
}

#[derive(Debug, Serialize)]
struct RowReport {
    row: usize,
    violations: Vec<Violation>,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when every row is valid, 1 otherwise.
pub fn run_validate(args: &ValidateArgs, ctx: &Context) -> Result<u8> {
    let rows = match read_json::<RateFile>(&args.path)? {
        RateFile::Many(rows) => rows,
        RateFile::One(row) => vec![row],
    };

    let reports: Vec<RowReport> = rows
        .iter()
        .enumerate()
        .map(|(row, rates)| RowReport {
            row,
            violations: CommissionHierarchyValidator::validate(rates),
        })
        .collect();
    let failed = reports.iter().filter(|r| !r.violations.is_empty()).count();

    tracing::info!(path = %args.path.display(), rows = reports.len(), failed, "rates validated");

    if ctx.json {
        ctx.print_json(&reports)?;
    } else {
        for report in &reports {
            if report.violations.is_empty() {
                println!("row {}: OK", report.row);
            }
            for violation in &report.violations {
                println!("row {}: {} ({})", report.row, violation.message, violation.field);
            }
        }
        println!("{} row(s), {} invalid", reports.len(), failed);
    }

    Ok(if failed == 0 { 0 } else { 1 })
}
