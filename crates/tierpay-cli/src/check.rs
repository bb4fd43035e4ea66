//! # Check Subcommand
//!
//! Answers "may ROLE do ACTION in DOMAIN" and, with `--field`, "may ROLE
//! write this commission rate column". Exit code 0 means yes.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tierpay_core::{Action, Domain, RateField};

use crate::Context;

/// Arguments for the `tierpay check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Role name as the identity provider reports it.
    #[arg(value_name = "ROLE")]
    pub role: String,

    /// Permission domain: scheme or commission.
    #[arg(value_name = "DOMAIN")]
    pub domain: Domain,

    /// create, read, update or delete.
    #[arg(value_name = "ACTION")]
    pub action: Action,

    /// Also require that the role may write this rate column.
    #[arg(long, value_name = "FIELD")]
    pub field: Option<RateField>,
}

#[derive(Debug, Serialize)]
struct CheckOutcome<'a> {
    role: &'a str,
    domain: Domain,
    action: Action,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<RateField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_editable: Option<bool>,
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs, ctx: &Context) -> Result<u8> {
    let role = ctx.hierarchy().resolve(&args.role);
    let allowed = ctx.permissions.has_permission(&role, args.domain, args.action);
    let field_editable = args
        .field
        .map(|field| ctx.permissions.can_edit_commission_field(&role, field));

    tracing::debug!(%role, domain = %args.domain, action = %args.action, allowed, "permission checked");

    let granted = allowed && field_editable.unwrap_or(true);
    if ctx.json {
        ctx.print_json(&CheckOutcome {
            role: &args.role,
            domain: args.domain,
            action: args.action,
            allowed,
            field: args.field,
            field_editable,
        })?;
    } else {
        println!(
            "{}: {} may {}{} {}",
            if allowed { "ALLOWED" } else { "DENIED" },
            args.role,
            if allowed { "" } else { "not " },
            args.action,
            args.domain
        );
        if let (Some(field), Some(editable)) = (args.field, field_editable) {
            println!(
                "{}: {} may {}edit the {} column",
                if editable { "ALLOWED" } else { "DENIED" },
                args.role,
                if editable { "" } else { "not " },
                field
            );
        }
    }

    Ok(if granted { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierpay_core::RoleTable;

    fn run(role: &str, domain: Domain, action: Action, field: Option<RateField>) -> u8 {
        let ctx = Context::new(RoleTable::builtin(), false);
        run_check(
            &CheckArgs {
                role: role.into(),
                domain,
                action,
                field,
            },
            &ctx,
        )
        .unwrap()
    }

    #[test]
    fn exit_code_reflects_permission() {
        assert_eq!(run("admin", Domain::Commission, Action::Delete, None), 0);
        assert_eq!(run("whitelabel", Domain::Commission, Action::Delete, None), 1);
        assert_eq!(run("unknown_role", Domain::Scheme, Action::Read, None), 1);
    }

    #[test]
    fn field_check_narrows_the_answer() {
        assert_eq!(
            run("whitelabel", Domain::Commission, Action::Update, Some(RateField::Retailer)),
            0
        );
        assert_eq!(
            run("whitelabel", Domain::Commission, Action::Update, Some(RateField::WhiteLabel)),
            1
        );
    }
}
