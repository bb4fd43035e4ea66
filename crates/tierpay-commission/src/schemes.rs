//! # Scheme Service
//!
//! Gates scheme writes the same way slab writes are gated: permission
//! first, then the field checks, then the store. A rejected write never
//! reaches the store.

use tierpay_access::{Actor, Scheme, SchemeAccessEvaluator};
use tierpay_core::{EngineError, SchemeId};

use crate::repository::{SchemeFilter, SchemeRepository, SchemeUpdate};

pub struct SchemeService<R> {
    repository: R,
    access: SchemeAccessEvaluator,
}

impl<R: SchemeRepository> SchemeService<R> {
    pub fn new(repository: R, access: SchemeAccessEvaluator) -> Self {
        Self { repository, access }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Schemes matching `filter` that `actor` can reach.
    pub fn list(&self, actor: &Actor, filter: &SchemeFilter) -> Result<Vec<Scheme>, EngineError> {
        let schemes = self.repository.list_schemes(filter)?;
        Ok(schemes
            .into_iter()
            .filter(|scheme| self.access.can_access(actor, scheme))
            .collect())
    }

    /// Create a scheme owned by `actor`, stamped with the actor's role.
    pub fn create(
        &self,
        actor: &Actor,
        name: &str,
        description: Option<&str>,
    ) -> Result<Scheme, EngineError> {
        let mut scheme = Scheme::new(name.trim(), actor.id, actor.role.to_string());
        scheme.description = description.map(str::to_owned);
        self.try_create(actor, scheme)
            .map_err(|err| rejected("create", None, actor, err))
    }

    pub fn update(&self, actor: &Actor, scheme_id: SchemeId, update: &SchemeUpdate) -> Result<Scheme, EngineError> {
        self.try_update(actor, scheme_id, update)
            .map_err(|err| rejected("update", Some(scheme_id), actor, err))
    }

    fn try_create(&self, actor: &Actor, scheme: Scheme) -> Result<Scheme, EngineError> {
        self.access.authorize_create(actor)?;
        scheme.validate()?;
        let stored = self.repository.create_scheme(scheme)?;
        tracing::debug!(scheme_id = %stored.id, actor = %actor.id, "scheme created");
        Ok(stored)
    }

    fn try_update(&self, actor: &Actor, scheme_id: SchemeId, update: &SchemeUpdate) -> Result<Scheme, EngineError> {
        let current = self.repository.get_scheme(scheme_id)?;
        let grant = self.access.authorize_update(actor, &current)?;
        update.validate()?;
        let stored = self.repository.update_scheme(scheme_id, update)?;
        tracing::debug!(scheme_id = %scheme_id, actor = %actor.id, ?grant, "scheme updated");
        Ok(stored)
    }
}

fn rejected(op: &'static str, scheme_id: Option<SchemeId>, actor: &Actor, err: EngineError) -> EngineError {
    tracing::warn!(
        scheme_id = ?scheme_id,
        actor = %actor.id,
        op,
        error = %err,
        "scheme mutation rejected"
    );
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use tierpay_core::{Action, Domain, Role, UserId};

    fn service() -> SchemeService<InMemoryRepository> {
        SchemeService::new(InMemoryRepository::new(), SchemeAccessEvaluator::default())
    }

    fn admin() -> Actor {
        Actor::with_role(UserId::new(), Role::Admin)
    }

    #[test]
    fn created_scheme_is_owned_by_the_actor() {
        let svc = service();
        let actor = admin();
        let scheme = svc.create(&actor, "  Standard ", Some("default plan")).unwrap();
        assert_eq!(scheme.name, "Standard");
        assert_eq!(scheme.owner_id, actor.id);
        assert_eq!(scheme.created_by_role, "admin");
        assert_eq!(scheme.description.as_deref(), Some("default plan"));
        assert_eq!(svc.list(&actor, &SchemeFilter::default()).unwrap(), vec![scheme]);
    }

    #[test]
    fn create_permission_is_checked_before_the_fields() {
        let svc = service();
        let retailer = Actor::with_role(UserId::new(), Role::Retailer);
        let err = svc.create(&retailer, "", None).unwrap_err();
        assert_eq!(
            err,
            EngineError::PermissionDenied {
                action: Action::Create,
                domain: Domain::Scheme,
            }
        );
        assert!(svc.repository().list_schemes(&SchemeFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn invalid_scheme_never_reaches_the_store() {
        let svc = service();
        let err = svc.create(&admin(), "   ", None).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.field_errors()[0].message, "Scheme name is required");

        let err = svc.create(&admin(), &"n".repeat(256), Some(&"d".repeat(1001))).unwrap_err();
        assert_eq!(err.field_errors().len(), 2);
        assert!(svc.repository().list_schemes(&SchemeFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn update_is_authorized_against_the_stored_scheme() {
        let svc = service();
        let owner = admin();
        let scheme = svc.create(&owner, "Standard", None).unwrap();
        let other_admin = admin();
        let distributor = Actor::with_role(UserId::new(), Role::Distributor);
        let rename = SchemeUpdate {
            name: Some("Premium".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update(&distributor, scheme.id, &rename),
            Err(EngineError::PermissionDenied { .. })
        ));

        let blank = SchemeUpdate {
            name: Some(String::new()),
            ..Default::default()
        };
        // Same level as the creator, so outside this admin's reach.
        assert!(matches!(
            svc.update(&other_admin, scheme.id, &rename),
            Err(EngineError::PermissionDenied { .. })
        ));
        assert!(matches!(
            svc.update(&owner, scheme.id, &blank),
            Err(EngineError::InvalidFields { .. })
        ));
        assert_eq!(svc.update(&owner, scheme.id, &rename).unwrap().name, "Premium");
    }

    #[test]
    fn updating_a_missing_scheme_is_not_found() {
        let err = service()
            .update(&admin(), SchemeId::new(), &SchemeUpdate::default())
            .unwrap_err();
        assert!(err.requires_refresh());
    }
}
