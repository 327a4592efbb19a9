use sapitos_auth::Role;
use sapitos_core::{Organization, UserId};

/// Organization context for a request.
///
/// This is immutable and must be present for all domain routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgContext {
    organization: Organization,
}

impl OrgContext {
    pub fn new(organization: Organization) -> Self {
        Self { organization }
    }

    pub fn organization(&self) -> &Organization {
        &self.organization
    }
}

/// Principal context for a request (authenticated identity + roles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
