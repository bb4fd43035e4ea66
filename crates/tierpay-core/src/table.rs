//! # Role Table: Injected Configuration
//!
//! The role table is the single immutable configuration value behind every
//! rule in the engine: role aliases, levels, CRUD thresholds per permission
//! domain, and the editable rate-field whitelist per role.
//!
//! It is loaded once at process start ([`RoleTable::builtin`],
//! [`RoleTable::load`] or [`RoleTable::from_env`]) and shared by `Arc`.
//!
//! ## YAML Format
//!
//! ```yaml
//! roles:
//!   super_admin: { level: 0, aliases: [superadmin] }
//!   admin: { level: 1 }
//!   whitelabel: { level: 2 }
//!   masterdistributor: { level: 3, aliases: [mds] }
//!   distributor: { level: 4 }
//!   retailer: { level: 5 }
//!   customer: { level: 6 }
//! permissions:
//!   scheme: { create: 2, read: 6, update: 2, delete: 2 }
//!   commission: { create: 2, read: 6, update: 2, delete: 1 }
//! editable_fields:
//!   super_admin: [admin, whitelabel, masterdistributor, distributor, retailer, customer]
//!   whitelabel: [masterdistributor, distributor, retailer, customer]
//! ```
//!
//! Every role's canonical name is always an alias of itself. Roles missing
//! from `editable_fields` are read-only.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::{Action, Domain};
use crate::error::ConfigError;
use crate::role::{Level, RateField, Role, COMMISSION_CHAIN};

/// Environment variable naming a YAML role table to load instead of the
/// builtin one.
pub const ROLE_TABLE_ENV: &str = "TIERPAY_ROLE_TABLE";

/// The most junior level allowed to perform each action. A role is
/// permitted when its level is less than or equal to the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionThresholds {
    pub create: Level,
    pub read: Level,
    pub update: Level,
    pub delete: Level,
}

impl ActionThresholds {
    pub fn threshold(&self, action: Action) -> Level {
        match action {
            Action::Create => self.create,
            Action::Read => self.read,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RoleEntry {
    level: u16,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PermissionDocument {
    scheme: ActionThresholds,
    commission: ActionThresholds,
}

#[derive(Debug, Deserialize)]
struct RoleTableDocument {
    roles: BTreeMap<Role, RoleEntry>,
    permissions: PermissionDocument,
    #[serde(default)]
    editable_fields: BTreeMap<Role, Vec<RateField>>,
}

/// Immutable role configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    aliases: BTreeMap<String, Role>,
    levels: BTreeMap<Role, Level>,
    scheme: ActionThresholds,
    commission: ActionThresholds,
    editable_fields: BTreeMap<Role, Vec<RateField>>,
}

impl RoleTable {
    /// The reseller network's production table.
    pub fn builtin() -> Self {
        let levels: BTreeMap<Role, Level> = Role::all()
            .iter()
            .enumerate()
            .map(|(i, role)| (*role, Level::new(i as u16)))
            .collect();

        let mut aliases: BTreeMap<String, Role> = Role::all()
            .iter()
            .map(|role| (role.as_str().to_string(), *role))
            .collect();
        aliases.insert("superadmin".to_string(), Role::SuperAdmin);
        aliases.insert("mds".to_string(), Role::MasterDistributor);

        let full: Vec<RateField> = COMMISSION_CHAIN.to_vec();
        let mut editable_fields = BTreeMap::new();
        editable_fields.insert(Role::SuperAdmin, full.clone());
        editable_fields.insert(Role::Admin, full);
        // Whitelabel may only set the columns strictly below its own.
        editable_fields.insert(
            Role::WhiteLabel,
            vec![
                RateField::MasterDistributor,
                RateField::Distributor,
                RateField::Retailer,
                RateField::Customer,
            ],
        );

        Self {
            aliases,
            levels,
            scheme: ActionThresholds {
                create: Level::new(2),
                read: Level::new(6),
                update: Level::new(2),
                delete: Level::new(2),
            },
            commission: ActionThresholds {
                create: Level::new(2),
                read: Level::new(6),
                update: Level::new(2),
                delete: Level::new(1),
            },
            editable_fields,
        }
    }

    /// Parse and validate a table from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let doc: RoleTableDocument = serde_yaml::from_str(yaml)?;
        Self::from_document(doc)
    }

    /// Read, parse and validate a table from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), roles = table.levels.len(), "loaded role table");
        Ok(table)
    }

    /// Load the table named by [`ROLE_TABLE_ENV`], or the builtin table when
    /// the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(ROLE_TABLE_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => {
                tracing::debug!("{ROLE_TABLE_ENV} not set, using builtin role table");
                Ok(Self::builtin())
            }
        }
    }

    fn from_document(doc: RoleTableDocument) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();

        for role in Role::all() {
            if !doc.roles.contains_key(role) {
                errors.push(format!("role {role} has no level"));
            }
        }

        let mut levels = BTreeMap::new();
        let mut aliases = BTreeMap::new();
        for (role, entry) in &doc.roles {
            if entry.level == Level::UNRANKED.value() {
                errors.push(format!("role {role} uses the reserved level {}", Level::UNRANKED));
            }
            levels.insert(*role, Level::new(entry.level));

            let names = std::iter::once(role.as_str().to_string()).chain(entry.aliases.iter().cloned());
            for name in names {
                let key = name.trim().to_ascii_lowercase();
                if key != name {
                    errors.push(format!("alias {name:?} must be trimmed lowercase"));
                }
                match aliases.insert(key.clone(), *role) {
                    Some(previous) if previous != *role => {
                        errors.push(format!("alias {key:?} maps to both {previous} and {role}"));
                    }
                    _ => {}
                }
            }
        }

        let ordered: Vec<Level> = Role::all().iter().filter_map(|r| levels.get(r).copied()).collect();
        if ordered.windows(2).any(|pair| pair[0] >= pair[1]) {
            errors.push("levels must strictly increase from super_admin down to customer".to_string());
        }

        for (role, fields) in &doc.editable_fields {
            let unique: BTreeSet<&RateField> = fields.iter().collect();
            if unique.len() != fields.len() {
                errors.push(format!("editable fields for {role} contain duplicates"));
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Invalid { errors });
        }

        Ok(Self {
            aliases,
            levels,
            scheme: doc.permissions.scheme,
            commission: doc.permissions.commission,
            editable_fields: doc.editable_fields,
        })
    }

    /// Look up a role by alias. The key must already be trimmed and
    /// lowercased.
    pub fn alias(&self, normalized: &str) -> Option<Role> {
        self.aliases.get(normalized).copied()
    }

    /// Every alias and the role it names, sorted by alias.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, Role)> + '_ {
        self.aliases.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn level(&self, role: Role) -> Level {
        self.levels.get(&role).copied().unwrap_or(Level::UNRANKED)
    }

    pub fn thresholds(&self, domain: Domain) -> &ActionThresholds {
        match domain {
            Domain::Scheme => &self.scheme,
            Domain::Commission => &self.commission,
        }
    }

    /// The ordered rate columns `role` may write. Empty means read-only.
    pub fn editable_fields(&self, role: Role) -> &[RateField] {
        self.editable_fields
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BUILTIN_YAML: &str = r#"
roles:
  super_admin: { level: 0, aliases: [superadmin] }
  admin: { level: 1 }
  whitelabel: { level: 2 }
  masterdistributor: { level: 3, aliases: [mds] }
  distributor: { level: 4 }
  retailer: { level: 5 }
  customer: { level: 6 }
permissions:
  scheme: { create: 2, read: 6, update: 2, delete: 2 }
  commission: { create: 2, read: 6, update: 2, delete: 1 }
editable_fields:
  super_admin: [admin, whitelabel, masterdistributor, distributor, retailer, customer]
  admin: [admin, whitelabel, masterdistributor, distributor, retailer, customer]
  whitelabel: [masterdistributor, distributor, retailer, customer]
"#;

    #[test]
    fn yaml_equivalent_of_builtin_matches() {
        let parsed = RoleTable::from_yaml_str(BUILTIN_YAML).unwrap();
        assert_eq!(parsed, RoleTable::builtin());
    }

    #[test]
    fn builtin_levels_follow_chain() {
        let table = RoleTable::builtin();
        for (i, role) in Role::all().iter().enumerate() {
            assert_eq!(table.level(*role), Level::new(i as u16));
        }
    }

    #[test]
    fn builtin_aliases_resolve() {
        let table = RoleTable::builtin();
        assert_eq!(table.alias("superadmin"), Some(Role::SuperAdmin));
        assert_eq!(table.alias("mds"), Some(Role::MasterDistributor));
        assert_eq!(table.alias("masterdistributor"), Some(Role::MasterDistributor));
        assert_eq!(table.alias("manager"), None);
    }

    #[test]
    fn builtin_thresholds() {
        let table = RoleTable::builtin();
        assert_eq!(table.thresholds(Domain::Scheme).threshold(Action::Delete), Level::new(2));
        assert_eq!(table.thresholds(Domain::Commission).threshold(Action::Delete), Level::new(1));
        assert_eq!(table.thresholds(Domain::Commission).threshold(Action::Read), Level::new(6));
    }

    #[test]
    fn roles_below_whitelabel_are_read_only() {
        let table = RoleTable::builtin();
        for role in [Role::MasterDistributor, Role::Distributor, Role::Retailer, Role::Customer] {
            assert!(table.editable_fields(role).is_empty());
        }
    }

    #[test]
    fn missing_role_is_rejected() {
        let yaml = BUILTIN_YAML.replace("  customer: { level: 6 }\n", "");
        let err = RoleTable::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("role customer has no level"));
    }

    #[test]
    fn inverted_levels_are_rejected() {
        let yaml = BUILTIN_YAML.replace("retailer: { level: 5 }", "retailer: { level: 3 }");
        let err = RoleTable::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn duplicate_alias_across_roles_is_rejected() {
        let yaml = BUILTIN_YAML.replace("admin: { level: 1 }", "admin: { level: 1, aliases: [mds] }");
        let err = RoleTable::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("\"mds\""));
    }

    #[test]
    fn uppercase_alias_is_rejected() {
        let yaml = BUILTIN_YAML.replace("aliases: [mds]", "aliases: [MDS]");
        assert!(RoleTable::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn duplicate_editable_field_is_rejected() {
        let yaml = BUILTIN_YAML.replace(
            "whitelabel: [masterdistributor, distributor, retailer, customer]",
            "whitelabel: [retailer, retailer]",
        );
        assert!(RoleTable::from_yaml_str(&yaml).is_err());
    }

    #[test]
    fn unknown_role_key_fails_to_parse() {
        let yaml = BUILTIN_YAML.replace("customer: { level: 6 }", "agent: { level: 6 }");
        assert!(matches!(
            RoleTable::from_yaml_str(&yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BUILTIN_YAML.as_bytes()).unwrap();
        let table = RoleTable::load(file.path()).unwrap();
        assert_eq!(table, RoleTable::builtin());
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = RoleTable::load(Path::new("/nonexistent/roles.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/roles.yaml"));
    }

    #[test]
    fn alternate_table_can_raise_thresholds() {
        let yaml = BUILTIN_YAML.replace(
            "commission: { create: 2, read: 6, update: 2, delete: 1 }",
            "commission: { create: 0, read: 3, update: 0, delete: 0 }",
        );
        let table = RoleTable::from_yaml_str(&yaml).unwrap();
        assert_eq!(table.thresholds(Domain::Commission).threshold(Action::Read), Level::new(3));
    }
}
