use uuid::Uuid;

use crate::role::Role;

/// The authenticated principal behind a request.
///
/// Built by the bearer middleware from a verified token and the stored user record,
/// then handed to the usecases as an explicit parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn regular(id: Uuid) -> Self {
        Self::new(id, Role::Regular)
    }

    pub fn admin(id: Uuid) -> Self {
        Self::new(id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owners and admins may act on a resource; everyone else is denied.
    pub fn may_access(&self, owner: Uuid) -> bool {
        self.is_admin() || self.id == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_and_admin_have_access() {
        let owner = Uuid::new_v4();
        assert!(Caller::regular(owner).may_access(owner));
        assert!(Caller::admin(Uuid::new_v4()).may_access(owner));
        assert!(!Caller::regular(Uuid::new_v4()).may_access(owner));
    }
}
