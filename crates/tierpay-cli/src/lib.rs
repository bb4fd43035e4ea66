//! # tierpay-cli: Command-Line Interface for the Commission Engine
//!
//! Provides the `tierpay` binary for operators and support staff who need
//! to answer engine questions without the web console.
//!
//! ## Subcommands
//!
//! - `tierpay roles`: the role ladder, or one role's permission set.
//! - `tierpay check`: whether a role may perform an action.
//! - `tierpay validate`: commission hierarchy check of rate files.
//! - `tierpay slabs`: check, resolve against, or sort a slab file.
//! - `tierpay quote`: payout for an amount under a commission.
//!
//! ```bash
//! tierpay check whitelabel commission delete
//! tierpay slabs resolve aeps_slabs.json --amount 250 --role retailer
//! TIERPAY_ROLE_TABLE=roles.yaml tierpay roles mds
//! ```
//!
//! Every subcommand returns an exit code: 0 when the answer is yes or the
//! input is valid, 1 when it is not. Operational failures surface as errors.

pub mod check;
pub mod quote;
pub mod roles;
pub mod slabs;
pub mod validate;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tierpay_access::PermissionResolver;
use tierpay_commission::SlabDraft;
use tierpay_core::{ResolvedRole, Role, RoleHierarchy, RoleTable, SlabId};

/// Shared state for every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub permissions: PermissionResolver,
    /// Print results as JSON instead of text.
    pub json: bool,
}

impl Context {
    pub fn new(table: RoleTable, json: bool) -> Self {
        let hierarchy = RoleHierarchy::new(Arc::new(table));
        Self {
            permissions: PermissionResolver::new(hierarchy),
            json,
        }
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        self.permissions.hierarchy()
    }

    /// Resolve a raw role argument, refusing names the table does not know.
    pub fn known_role(&self, raw: &str) -> Result<Role> {
        match self.hierarchy().resolve(raw) {
            ResolvedRole::Known(role) => Ok(role),
            ResolvedRole::Unrecognized(raw) => bail!("unrecognized role {raw:?}"),
        }
    }

    /// Print `value` as pretty JSON.
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Load the role table from `path`, else from `TIERPAY_ROLE_TABLE`, else
/// the builtin table.
pub fn load_role_table(path: Option<&Path>) -> Result<RoleTable> {
    let table = match path {
        Some(path) => RoleTable::load(path)
            .with_context(|| format!("failed to load role table {}", path.display()))?,
        None => RoleTable::from_env().context("failed to load role table from environment")?,
    };
    Ok(table)
}

/// Parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// One row of a slab file. Ids are optional so hand-written files work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabRow {
    #[serde(default)]
    pub id: Option<SlabId>,
    #[serde(flatten)]
    pub draft: SlabDraft,
}
