//! Identity resolution.
//!
//! Turns an authenticated user id into the two orthogonal facts every policy
//! decision needs: the global superadmin flag and the list of
//! (organization, role) memberships. Resolved once per request by the
//! session extractor and carried through the handler, which is the only
//! identity caching this app does — nothing survives the request, so a role
//! change or sign-out can never serve a stale identity to the next request.

use sqlx::SqlitePool;

use crate::app::{
    db,
    domain::{OrganizationId, OrganizationRole, UserId},
    error::AppError,
};

/// One organization membership of the resolved actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub organization_id: OrganizationId,
    pub role: OrganizationRole,
}

/// Resolved actor identity. Superadmin is a global capability, never folded
/// into the per-organization roles.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub is_superadmin: bool,
    pub memberships: Vec<Membership>,
}

impl Identity {
    /// The actor's role in the given organization, if they are a member.
    pub fn role_in(&self, organization_id: &OrganizationId) -> Option<OrganizationRole> {
        self.memberships
            .iter()
            .find(|m| &m.organization_id == organization_id)
            .map(|m| m.role)
    }

    pub fn is_member_of(&self, organization_id: &OrganizationId) -> bool {
        self.role_in(organization_id).is_some()
    }
}

/// Resolve an actor's identity from the database.
///
/// The superadmin lookup fails closed: any lookup error yields `false`,
/// never an error and never `true`. Incorrectly granting elevated access is
/// unacceptable; incorrectly denying it only degrades functionality.
/// Membership lookup errors propagate normally.
pub async fn resolve(pool: &SqlitePool, user_id: &UserId) -> Result<Identity, AppError> {
    let is_superadmin = db::users::is_superadmin(pool, user_id).await.unwrap_or(false);
    let memberships = db::organizations::memberships_for_user(pool, user_id).await?;

    Ok(Identity {
        user_id: user_id.clone(),
        is_superadmin,
        memberships,
    })
}
