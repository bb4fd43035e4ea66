//! # Scheme Access
//!
//! Decides whether an actor may see or manage a scheme. Access is an
//! explicit four-way OR, evaluated in this order:
//!
//! 1. **Top level**: the actor holds the level-0 role.
//! 2. **Owner**: `scheme.owner_id == actor.id`.
//! 3. **Shared**: the actor appears in `scheme.shared_with`.
//! 4. **Hierarchy**: the actor is strictly senior to the role that
//!    created the scheme.
//!
//! Ownership and sharing are never revoked by rank: an owner keeps access
//! even when junior to the scheme's creator role.
//!
//! Managing a scheme additionally requires the scheme `update` permission,
//! and creating one the scheme `create` permission.
//!
//! A scheme's name must be non-blank and at most
//! [`MAX_SCHEME_NAME_CHARS`] characters; its description at most
//! [`MAX_SCHEME_DESCRIPTION_CHARS`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tierpay_core::{Action, Domain, EngineError, FieldError, Level, SchemeId, UserId};

use crate::actor::Actor;
use crate::permission::PermissionResolver;

/// What a share grant lets the grantee do, as recorded by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePermission {
    #[serde(alias = "read")]
    View,
    #[serde(alias = "write")]
    Edit,
}

/// One entry of a scheme's `shared_with` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub user_id: UserId,
    pub permission: SharePermission,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ShareGrant>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ShareGrant>>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_active() -> bool {
    true
}

pub const MAX_SCHEME_NAME_CHARS: usize = 255;
pub const MAX_SCHEME_DESCRIPTION_CHARS: usize = 1000;

/// Check the descriptive fields of a scheme being created or changed.
/// `None` means the field is not being set. Every problem is reported.
pub fn check_scheme_fields(name: Option<&str>, description: Option<&str>) -> Result<(), EngineError> {
    let mut errors = Vec::new();
    if let Some(name) = name {
        if name.trim().is_empty() {
            errors.push(FieldError {
                field: "name".into(),
                message: "Scheme name is required".into(),
            });
        } else if name.chars().count() > MAX_SCHEME_NAME_CHARS {
            errors.push(FieldError {
                field: "name".into(),
                message: format!("Scheme name must be at most {MAX_SCHEME_NAME_CHARS} characters"),
            });
        }
    }
    if let Some(description) = description {
        if description.chars().count() > MAX_SCHEME_DESCRIPTION_CHARS {
            errors.push(FieldError {
                field: "description".into(),
                message: format!("Description must be at most {MAX_SCHEME_DESCRIPTION_CHARS} characters"),
            });
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(EngineError::InvalidFields { errors })
    }
}

/// A commission-policy container, as held by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    pub id: SchemeId,
    #[serde(default)]
    pub name: String,
    pub owner_id: UserId,
    /// Raw role name of the creator; resolved through the role table when
    /// access is evaluated.
    pub created_by_role: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub shared_with: Vec<ShareGrant>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Scheme {
    pub fn new(name: impl Into<String>, owner_id: UserId, created_by_role: impl Into<String>) -> Self {
        Self {
            id: SchemeId::new(),
            name: name.into(),
            owner_id,
            created_by_role: created_by_role.into(),
            is_active: true,
            shared_with: Vec::new(),
            description: None,
            updated_at: None,
        }
    }

    pub fn share_with(mut self, user_id: UserId, permission: SharePermission) -> Self {
        self.shared_with.push(ShareGrant { user_id, permission });
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The field checks a new scheme must pass.
    pub fn validate(&self) -> Result<(), EngineError> {
        check_scheme_fields(Some(&self.name), self.description.as_deref())
    }

    pub fn share_for(&self, user_id: UserId) -> Option<&ShareGrant> {
        self.shared_with.iter().find(|s| s.user_id == user_id)
    }
}

/// The branch of the access rule that admitted an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "via", content = "permission")]
pub enum AccessGrant {
    TopLevel,
    Owner,
    Shared(SharePermission),
    Hierarchy,
}

/// Combines ownership, sharing and role rank into scheme access answers.
#[derive(Debug, Clone, Default)]
pub struct SchemeAccessEvaluator {
    permissions: PermissionResolver,
}

impl SchemeAccessEvaluator {
    pub fn new(permissions: PermissionResolver) -> Self {
        Self { permissions }
    }

    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    /// Which rule admits `actor` to `scheme`, if any.
    pub fn access_reason(&self, actor: &Actor, scheme: &Scheme) -> Option<AccessGrant> {
        let hierarchy = self.permissions.hierarchy();
        let actor_level = hierarchy.level(&actor.role);

        if actor_level == Level::TOP {
            return Some(AccessGrant::TopLevel);
        }
        if scheme.owner_id == actor.id {
            return Some(AccessGrant::Owner);
        }
        if let Some(grant) = scheme.share_for(actor.id) {
            return Some(AccessGrant::Shared(grant.permission));
        }
        let creator = hierarchy.resolve(&scheme.created_by_role);
        if actor_level < hierarchy.level(&creator) {
            return Some(AccessGrant::Hierarchy);
        }
        None
    }

    pub fn can_access(&self, actor: &Actor, scheme: &Scheme) -> bool {
        self.access_reason(actor, scheme).is_some()
    }

    /// The accessible subset of `schemes`, in input order.
    pub fn filter_accessible<'a>(&self, schemes: &'a [Scheme], actor: &Actor) -> Vec<&'a Scheme> {
        schemes.iter().filter(|s| self.can_access(actor, s)).collect()
    }

    /// Access plus the scheme `update` permission.
    pub fn can_manage(&self, actor: &Actor, scheme: &Scheme) -> bool {
        self.can_access(actor, scheme)
            && self.permissions.has_scheme_permission(&actor.role, Action::Update)
    }

    /// Check both access and the role's permission for `action` on `scheme`.
    pub fn authorize(&self, actor: &Actor, scheme: &Scheme, action: Action) -> Result<AccessGrant, EngineError> {
        self.permissions.require(&actor.role, Domain::Scheme, action)?;
        match self.access_reason(actor, scheme) {
            Some(grant) => Ok(grant),
            None => {
                tracing::debug!(
                    actor = %actor.id,
                    scheme_id = %scheme.id,
                    %action,
                    "scheme outside actor's reach"
                );
                Err(EngineError::PermissionDenied {
                    action,
                    domain: Domain::Scheme,
                })
            }
        }
    }

    /// Whether `actor` may create schemes at all. A new scheme is owned by
    /// its creator, so no per-scheme access applies.
    pub fn authorize_create(&self, actor: &Actor) -> Result<(), EngineError> {
        self.permissions.require(&actor.role, Domain::Scheme, Action::Create)
    }

    /// [`authorize`](Self::authorize) for [`Action::Update`].
    pub fn authorize_update(&self, actor: &Actor, scheme: &Scheme) -> Result<AccessGrant, EngineError> {
        self.authorize(actor, scheme, Action::Update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierpay_core::Role;

    fn evaluator() -> SchemeAccessEvaluator {
        SchemeAccessEvaluator::default()
    }

    #[test]
    fn scheme_name_is_required_and_bounded() {
        let blank = Scheme::new("   ", UserId::new(), "admin");
        let err = blank.validate().unwrap_err();
        assert_eq!(err.field_errors()[0].field, "name");
        assert_eq!(err.field_errors()[0].message, "Scheme name is required");

        let at_limit = Scheme::new("n".repeat(MAX_SCHEME_NAME_CHARS), UserId::new(), "admin");
        assert!(at_limit.validate().is_ok());
        let too_long = Scheme::new("n".repeat(MAX_SCHEME_NAME_CHARS + 1), UserId::new(), "admin");
        assert!(matches!(too_long.validate(), Err(EngineError::InvalidFields { .. })));
    }

    #[test]
    fn scheme_description_is_bounded() {
        let ok = Scheme::new("s", UserId::new(), "admin").with_description("d".repeat(MAX_SCHEME_DESCRIPTION_CHARS));
        assert!(ok.validate().is_ok());
        let long = Scheme::new("s", UserId::new(), "admin").with_description("d".repeat(MAX_SCHEME_DESCRIPTION_CHARS + 1));
        let fields = long.validate().unwrap_err().field_errors();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "description");
    }

    #[test]
    fn every_field_problem_is_reported() {
        let err = check_scheme_fields(Some(""), Some(&"d".repeat(1001))).unwrap_err();
        let fields: Vec<_> = err.field_errors().into_iter().map(|f| f.field).collect();
        assert_eq!(fields, ["name", "description"]);
    }

    #[test]
    fn unset_fields_are_not_checked() {
        assert!(check_scheme_fields(None, None).is_ok());
    }

    #[test]
    fn name_length_counts_characters() {
        let name = "é".repeat(MAX_SCHEME_NAME_CHARS);
        assert!(check_scheme_fields(Some(&name), None).is_ok());
    }

    #[test]
    fn scheme_creation_stops_at_whitelabel() {
        let e = evaluator();
        assert!(e.authorize_create(&Actor::with_role(UserId::new(), Role::WhiteLabel)).is_ok());
        assert_eq!(
            e.authorize_create(&Actor::with_role(UserId::new(), Role::MasterDistributor)),
            Err(EngineError::PermissionDenied {
                action: Action::Create,
                domain: Domain::Scheme,
            })
        );
        let ghost = Actor::new(UserId::new(), "ghost", e.permissions().hierarchy());
        assert!(e.authorize_create(&ghost).is_err());
    }

    #[test]
    fn super_admin_sees_everything() {
        let actor = Actor::with_role(UserId::new(), Role::SuperAdmin);
        let scheme = Scheme::new("s", UserId::new(), "super_admin");
        assert_eq!(evaluator().access_reason(&actor, &scheme), Some(AccessGrant::TopLevel));
    }

    #[test]
    fn owner_keeps_access_despite_junior_rank() {
        let owner = UserId::new();
        let actor = Actor::with_role(owner, Role::Retailer);
        let scheme = Scheme::new("s", owner, "admin");
        assert_eq!(evaluator().access_reason(&actor, &scheme), Some(AccessGrant::Owner));
    }

    #[test]
    fn shared_user_gets_access_with_its_permission() {
        let guest = UserId::new();
        let actor = Actor::with_role(guest, Role::Distributor);
        let scheme = Scheme::new("s", UserId::new(), "whitelabel").share_with(guest, SharePermission::View);
        assert_eq!(
            evaluator().access_reason(&actor, &scheme),
            Some(AccessGrant::Shared(SharePermission::View))
        );
    }

    #[test]
    fn senior_role_reaches_junior_creator_schemes() {
        let actor = Actor::with_role(UserId::new(), Role::Admin);
        let scheme = Scheme::new("s", UserId::new(), "whitelabel");
        assert_eq!(evaluator().access_reason(&actor, &scheme), Some(AccessGrant::Hierarchy));
    }

    #[test]
    fn peer_and_junior_roles_are_denied() {
        let e = evaluator();
        let scheme = Scheme::new("s", UserId::new(), "whitelabel");
        for role in [Role::WhiteLabel, Role::MasterDistributor, Role::Customer] {
            assert!(!e.can_access(&Actor::with_role(UserId::new(), role), &scheme), "{role}");
        }
    }

    #[test]
    fn creator_role_aliases_resolve() {
        let actor = Actor::with_role(UserId::new(), Role::WhiteLabel);
        let scheme = Scheme::new("s", UserId::new(), "MDS");
        assert!(evaluator().can_access(&actor, &scheme));
    }

    #[test]
    fn unknown_actor_never_reaches_unknown_creator() {
        let h = tierpay_core::RoleHierarchy::builtin();
        let actor = Actor::new(UserId::new(), "auditor", &h);
        let scheme = Scheme::new("s", UserId::new(), "legacy_role");
        assert!(!evaluator().can_access(&actor, &scheme));
        // Any known role outranks an unrecognized creator.
        let customer = Actor::with_role(UserId::new(), Role::Customer);
        assert!(evaluator().can_access(&customer, &scheme));
    }

    #[test]
    fn filter_accessible_preserves_order() {
        let e = evaluator();
        let actor = Actor::with_role(UserId::new(), Role::WhiteLabel);
        let schemes = vec![
            Scheme::new("a", UserId::new(), "distributor"),
            Scheme::new("b", UserId::new(), "admin"),
            Scheme::new("c", actor.id, "admin"),
            Scheme::new("d", UserId::new(), "retailer"),
        ];
        let names: Vec<&str> = e
            .filter_accessible(&schemes, &actor)
            .into_iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c", "d"]);
        assert!(e.filter_accessible(&[], &actor).is_empty());
    }

    #[test]
    fn managing_needs_access_and_update_permission() {
        let e = evaluator();
        let owner = UserId::new();
        // Owner with a read-only role can see but not manage.
        let retailer = Actor::with_role(owner, Role::Retailer);
        let scheme = Scheme::new("s", owner, "retailer");
        assert!(e.can_access(&retailer, &scheme));
        assert!(!e.can_manage(&retailer, &scheme));

        let wl = Actor::with_role(UserId::new(), Role::WhiteLabel);
        let junior = Scheme::new("j", UserId::new(), "distributor");
        assert!(e.can_manage(&wl, &junior));
        let senior = Scheme::new("k", UserId::new(), "admin");
        assert!(!e.can_manage(&wl, &senior));
    }

    #[test]
    fn authorize_checks_permission_before_reach() {
        let e = evaluator();
        let actor = Actor::with_role(UserId::new(), Role::Distributor);
        let scheme = Scheme::new("s", actor.id, "distributor");
        let err = e.authorize(&actor, &scheme, Action::Update).unwrap_err();
        assert_eq!(
            err,
            EngineError::PermissionDenied {
                action: Action::Update,
                domain: Domain::Scheme
            }
        );
        assert_eq!(e.authorize(&actor, &scheme, Action::Read).unwrap(), AccessGrant::Owner);
    }

    #[test]
    fn scheme_json_tolerates_null_sharing_and_missing_flags() {
        let owner = UserId::new();
        let json = format!(
            r#"{{"id":"{}","owner_id":"{}","created_by_role":"Admin","shared_with":null}}"#,
            SchemeId::new(),
            owner
        );
        let scheme: Scheme = serde_json::from_str(&json).unwrap();
        assert!(scheme.shared_with.is_empty());
        assert!(scheme.is_active);
    }

    #[test]
    fn share_permission_accepts_read_write_aliases() {
        let p: SharePermission = serde_json::from_str("\"write\"").unwrap();
        assert_eq!(p, SharePermission::Edit);
    }
}
