use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Role of a user within one organization. A user may hold memberships in
/// several organizations, each with an independent role. Superadmin is NOT
/// a role here: it is a global flag on the user, orthogonal to memberships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrganizationRole {
    Owner,
    Admin,
    Member,
    Client,
}

impl OrganizationRole {
    /// Owners and admins may manage the organization itself and its members.
    pub fn can_manage_organization(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lowercase() {
        assert_eq!("owner".parse::<OrganizationRole>().unwrap(), OrganizationRole::Owner);
        assert_eq!("client".parse::<OrganizationRole>().unwrap(), OrganizationRole::Client);
        assert!("superadmin".parse::<OrganizationRole>().is_err());
    }

    #[test]
    fn management_is_owner_or_admin_only() {
        assert!(OrganizationRole::Owner.can_manage_organization());
        assert!(OrganizationRole::Admin.can_manage_organization());
        assert!(!OrganizationRole::Member.can_manage_organization());
        assert!(!OrganizationRole::Client.can_manage_organization());
    }
}
