//! Read-time tenant scoping.
//!
//! The scope filter is the mandatory predicate gating every list/read
//! operation. It is computed purely from the resolved identity and an
//! optional caller-requested organization, then rendered into the query as
//! the outermost condition. Caller filters may narrow it, never widen it.

use sqlx::{QueryBuilder, Sqlite};

use crate::app::domain::OrganizationId;
use crate::app::identity::Identity;

/// Effective tenant filter for a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeFilter {
    /// Superadmin with no requested narrowing: matches every organization.
    Unrestricted,
    /// Matches rows in exactly these organizations.
    Organizations(Vec<OrganizationId>),
    /// Matches nothing. Reads under this filter return empty result sets,
    /// not errors, so callers cannot distinguish "no data" from "no access".
    Empty,
}

impl ScopeFilter {
    /// Compute the filter for a read by `identity`, optionally narrowed to
    /// `requested`.
    ///
    /// Deterministic: memberships are used in the order they were resolved,
    /// with no time- or randomness-dependence.
    pub fn for_read(identity: &Identity, requested: Option<&OrganizationId>) -> Self {
        if identity.is_superadmin {
            // Narrowing to one organization is the superadmin's choice
            // (e.g. a single-tenant dashboard), not a policy requirement.
            return match requested {
                Some(organization_id) => Self::Organizations(vec![organization_id.clone()]),
                None => Self::Unrestricted,
            };
        }

        match requested {
            // Requesting an organization outside the membership set fails
            // closed to zero rows rather than an error.
            Some(organization_id) if identity.is_member_of(organization_id) => {
                Self::Organizations(vec![organization_id.clone()])
            }
            Some(_) => Self::Empty,
            None => {
                let organization_ids: Vec<OrganizationId> = identity
                    .memberships
                    .iter()
                    .map(|m| m.organization_id.clone())
                    .collect();
                if organization_ids.is_empty() {
                    Self::Empty
                } else {
                    Self::Organizations(organization_ids)
                }
            }
        }
    }

    /// Whether a row in `organization_id` is visible under this filter.
    pub fn allows(&self, organization_id: &OrganizationId) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Organizations(organization_ids) => organization_ids.contains(organization_id),
            Self::Empty => false,
        }
    }

    /// Render this filter into `qb` as a predicate on `column`.
    ///
    /// Always emits a condition, so queries can uniformly say
    /// `WHERE <caller conditions> AND <scope>` and the scope can never be
    /// skipped by parameter shape.
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Sqlite>, column: &str) {
        match self {
            Self::Unrestricted => {
                qb.push("1 = 1");
            }
            Self::Organizations(organization_ids) => {
                qb.push(column);
                qb.push(" IN (");
                let mut separated = qb.separated(", ");
                for organization_id in organization_ids {
                    separated.push_bind(organization_id.as_str());
                }
                separated.push_unseparated(")");
            }
            Self::Empty => {
                qb.push("1 = 0");
            }
        }
    }
}
