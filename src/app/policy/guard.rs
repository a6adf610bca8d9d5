//! Write-time authorization.
//!
//! The mutation rules are an explicit table over (entity kind, operation,
//! actor's relation to the target organization), not ad hoc branching in
//! handlers. The UI is an untrusted collaborator: these checks hold even
//! for requests the UI would never produce.

use crate::app::domain::OrganizationId;
use crate::app::error::AppError;
use crate::app::identity::Identity;

/// Kinds of entities a mutation can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Organization,
    Membership,
    Client,
    Project,
    Task,
    Invoice,
    Attachment,
}

/// Write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Resolve the target organization for a create.
///
/// A supplied id wins. Without one, a non-superadmin with exactly one
/// membership writes into that organization; everything else is
/// `MissingTenantContext`. Superadmins must always name a target — "create
/// with no tenant" is never valid.
pub fn resolve_target_organization(
    identity: &Identity,
    supplied: Option<OrganizationId>,
) -> Result<OrganizationId, AppError> {
    if let Some(organization_id) = supplied {
        return Ok(organization_id);
    }
    if !identity.is_superadmin {
        if let [membership] = identity.memberships.as_slice() {
            return Ok(membership.organization_id.clone());
        }
    }
    Err(AppError::MissingTenantContext)
}

/// Decide whether `identity` may perform `operation` on an entity of `kind`
/// belonging to `target_organization`.
///
/// Rule table:
///
/// | kind                     | create              | update                    | delete              |
/// |--------------------------|---------------------|---------------------------|---------------------|
/// | Organization             | superadmin          | superadmin or owner/admin | superadmin          |
/// | Membership               | superadmin or owner/admin                  | n/a | superadmin or owner/admin |
/// | tenant-scoped (the rest) | superadmin or any member of the target organization                   |
///
/// Self-service creation of a user's first organization does not go through
/// this table; see [`authorize_organization_bootstrap`].
pub fn authorize_mutation(
    identity: &Identity,
    kind: EntityKind,
    operation: Operation,
    target_organization: Option<&OrganizationId>,
) -> Result<(), AppError> {
    let organization_id = target_organization.ok_or(AppError::MissingTenantContext)?;

    if identity.is_superadmin {
        return Ok(());
    }

    match (kind, operation) {
        (EntityKind::Organization, Operation::Create | Operation::Delete) => {
            // Members with roles on the organization still may not create
            // or delete it; surface the same denial either way.
            Err(AppError::Forbidden)
        }
        (EntityKind::Organization, Operation::Update)
        | (EntityKind::Membership, _) => match identity.role_in(organization_id) {
            Some(role) if role.can_manage_organization() => Ok(()),
            Some(_) => Err(AppError::Forbidden),
            None => Err(AppError::CrossTenantWrite),
        },
        _ => {
            if identity.is_member_of(organization_id) {
                Ok(())
            } else {
                Err(AppError::CrossTenantWrite)
            }
        }
    }
}

/// Self-service "create my organization": any authenticated actor may
/// create an organization they will own. The caller must atomically assign
/// the creator the `owner` role.
pub fn authorize_organization_bootstrap(_identity: &Identity) -> Result<(), AppError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::{OrganizationRole, UserId};
    use crate::app::identity::Membership;

    fn actor(is_superadmin: bool, orgs: &[(OrganizationId, OrganizationRole)]) -> Identity {
        Identity {
            user_id: UserId::new(),
            is_superadmin,
            memberships: orgs
                .iter()
                .map(|(organization_id, role)| Membership {
                    organization_id: organization_id.clone(),
                    role: *role,
                })
                .collect(),
        }
    }

    #[test]
    fn missing_target_is_rejected_even_for_superadmins() {
        let superadmin = actor(true, &[]);
        let denied = authorize_mutation(&superadmin, EntityKind::Client, Operation::Create, None);
        assert!(matches!(denied, Err(AppError::MissingTenantContext)));
    }

    #[test]
    fn superadmin_may_mutate_anything_with_a_target() {
        let superadmin = actor(true, &[]);
        let org = OrganizationId::new();
        for kind in [
            EntityKind::Organization,
            EntityKind::Membership,
            EntityKind::Client,
            EntityKind::Invoice,
        ] {
            for operation in [Operation::Create, Operation::Update, Operation::Delete] {
                assert!(authorize_mutation(&superadmin, kind, operation, Some(&org)).is_ok());
            }
        }
    }

    #[test]
    fn member_may_write_own_org_entities_only() {
        let org_a = OrganizationId::new();
        let org_b = OrganizationId::new();
        let member = actor(false, &[(org_a.clone(), OrganizationRole::Member)]);

        assert!(authorize_mutation(&member, EntityKind::Client, Operation::Create, Some(&org_a)).is_ok());
        assert!(authorize_mutation(&member, EntityKind::Task, Operation::Delete, Some(&org_a)).is_ok());

        let denied = authorize_mutation(&member, EntityKind::Client, Operation::Create, Some(&org_b));
        assert!(matches!(denied, Err(AppError::CrossTenantWrite)));
        let denied = authorize_mutation(&member, EntityKind::Invoice, Operation::Update, Some(&org_b));
        assert!(matches!(denied, Err(AppError::CrossTenantWrite)));
    }

    #[test]
    fn organization_lifecycle_is_superadmin_only() {
        let org = OrganizationId::new();
        let owner = actor(false, &[(org.clone(), OrganizationRole::Owner)]);

        let denied = authorize_mutation(&owner, EntityKind::Organization, Operation::Create, Some(&org));
        assert!(matches!(denied, Err(AppError::Forbidden)));
        let denied = authorize_mutation(&owner, EntityKind::Organization, Operation::Delete, Some(&org));
        assert!(matches!(denied, Err(AppError::Forbidden)));
    }

    #[test]
    fn organization_update_needs_owner_or_admin() {
        let org = OrganizationId::new();

        let admin = actor(false, &[(org.clone(), OrganizationRole::Admin)]);
        assert!(authorize_mutation(&admin, EntityKind::Organization, Operation::Update, Some(&org)).is_ok());

        let member = actor(false, &[(org.clone(), OrganizationRole::Member)]);
        let denied = authorize_mutation(&member, EntityKind::Organization, Operation::Update, Some(&org));
        assert!(matches!(denied, Err(AppError::Forbidden)));

        let outsider = actor(false, &[]);
        let denied = authorize_mutation(&outsider, EntityKind::Organization, Operation::Update, Some(&org));
        assert!(matches!(denied, Err(AppError::CrossTenantWrite)));
    }

    #[test]
    fn membership_changes_need_owner_or_admin() {
        let org = OrganizationId::new();

        let owner = actor(false, &[(org.clone(), OrganizationRole::Owner)]);
        assert!(authorize_mutation(&owner, EntityKind::Membership, Operation::Create, Some(&org)).is_ok());
        assert!(authorize_mutation(&owner, EntityKind::Membership, Operation::Delete, Some(&org)).is_ok());

        let client = actor(false, &[(org.clone(), OrganizationRole::Client)]);
        let denied = authorize_mutation(&client, EntityKind::Membership, Operation::Create, Some(&org));
        assert!(matches!(denied, Err(AppError::Forbidden)));
    }

    #[test]
    fn create_target_inferred_only_for_single_membership() {
        let org = OrganizationId::new();
        let single = actor(false, &[(org.clone(), OrganizationRole::Member)]);
        assert_eq!(resolve_target_organization(&single, None).unwrap(), org);

        let multi = actor(
            false,
            &[
                (OrganizationId::new(), OrganizationRole::Member),
                (OrganizationId::new(), OrganizationRole::Member),
            ],
        );
        assert!(matches!(
            resolve_target_organization(&multi, None),
            Err(AppError::MissingTenantContext)
        ));

        let superadmin = actor(true, &[]);
        assert!(matches!(
            resolve_target_organization(&superadmin, None),
            Err(AppError::MissingTenantContext)
        ));

        let supplied = OrganizationId::new();
        assert_eq!(
            resolve_target_organization(&superadmin, Some(supplied.clone())).unwrap(),
            supplied
        );
    }
}
