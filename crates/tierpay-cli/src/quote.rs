//! # Quote Subcommand
//!
//! Prints the payout a role earns on an amount, for a commission described
//! by its type plus either a rate file or a slab file.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use tierpay_commission::{quote, Commission, CommissionType, SlabSet};
use tierpay_core::{OperatorId, RateMap, SchemeId};

use crate::{read_json, Context, SlabRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    Percentage,
    Fixed,
    #[value(alias = "slab")]
    SlabBased,
}

impl From<TypeArg> for CommissionType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Percentage => CommissionType::Percentage,
            TypeArg::Fixed => CommissionType::Fixed,
            TypeArg::SlabBased => CommissionType::SlabBased,
        }
    }
}

/// Arguments for the `tierpay quote` subcommand.
#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// How the commission pays out.
    #[arg(long = "type", value_enum)]
    pub commission_type: TypeArg,

    /// JSON rate object, for percentage and fixed commissions.
    #[arg(long, value_name = "PATH")]
    pub rates: Option<PathBuf>,

    /// JSON slab array, for slab-based commissions.
    #[arg(long, value_name = "PATH")]
    pub slabs: Option<PathBuf>,

    #[arg(long)]
    pub amount: Decimal,

    #[arg(long)]
    pub role: String,
}

/// Execute the quote subcommand.
pub fn run_quote(args: &QuoteArgs, ctx: &Context) -> Result<u8> {
    let role = ctx.known_role(&args.role)?;
    let commission_type = CommissionType::from(args.commission_type);

    let rates = match (&args.rates, commission_type) {
        (Some(path), _) => read_json::<RateMap>(path)?,
        (None, CommissionType::SlabBased) => RateMap::zero(),
        (None, _) => bail!("--rates is required for {commission_type} commissions"),
    };
    let commission = Commission::new(SchemeId::new(), OperatorId::new(), "cli", commission_type, rates);

    let mut slabs = SlabSet::new(commission.id);
    match (&args.slabs, commission_type) {
        (Some(path), _) => {
            let rows: Vec<SlabRow> = read_json(path)?;
            for (row, entry) in rows.into_iter().enumerate() {
                if let Err(err) = slabs.add(entry.draft) {
                    tracing::warn!(row, error = %err, "slab row skipped");
                }
            }
        }
        (None, CommissionType::SlabBased) => bail!("--slabs is required for slab_based commissions"),
        (None, _) => {}
    }

    let quoted = quote(&commission, &slabs, args.amount, role)?;
    if ctx.json {
        ctx.print_json(&quoted)?;
    } else {
        println!("{}", quoted.payout);
    }
    Ok(0)
}
