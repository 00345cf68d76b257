//! Role-based operation guard.
//!
//! Each operation carries a static allow-list of roles (see
//! [`crate::access`]). The guard denies unauthenticated callers outright,
//! lets super-admins through unconditionally, and treats an empty
//! allow-list as open to any authenticated role.

use cliniq_core::context::{ActorContext, Role};
use cliniq_core::error::{CliniqError, CliniqResult};

/// Allow-list check for one operation.
#[derive(Debug, Clone, Copy)]
pub struct RoleGuard {
    allowed: &'static [Role],
}

impl RoleGuard {
    pub const fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// Check the actor against the allow-list.
    ///
    /// `None` means the request never authenticated; that is always a
    /// denial, regardless of how permissive the list is.
    pub fn check(&self, actor: Option<&ActorContext>) -> CliniqResult<()> {
        let Some(actor) = actor else {
            return Err(CliniqError::Forbidden {
                reason: "authentication required".into(),
            });
        };

        if actor.is_super_admin() || self.allowed.is_empty() || self.allowed.contains(&actor.role)
        {
            return Ok(());
        }

        Err(CliniqError::Forbidden {
            reason: format!(
                "role {} is not permitted to perform this operation",
                actor.role.as_str()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn actor(role: Role) -> ActorContext {
        ActorContext::new(Uuid::new_v4(), role, Some(Uuid::new_v4()))
    }

    #[test]
    fn unauthenticated_is_always_denied() {
        let open = RoleGuard::new(&[]);
        assert!(matches!(
            open.check(None),
            Err(CliniqError::Forbidden { .. })
        ));
    }

    #[test]
    fn empty_list_admits_any_authenticated_role() {
        let open = RoleGuard::new(&[]);
        assert!(open.check(Some(&actor(Role::Employee))).is_ok());
        assert!(open.check(Some(&actor(Role::Accountant))).is_ok());
    }

    #[test]
    fn super_admin_bypasses_the_list() {
        let admins_only = RoleGuard::new(&[Role::CabinetAdmin]);
        assert!(admins_only.check(Some(&actor(Role::SuperAdmin))).is_ok());
    }

    #[test]
    fn listed_role_passes_unlisted_is_denied() {
        let guard = RoleGuard::new(&[Role::CabinetAdmin, Role::Accountant]);
        assert!(guard.check(Some(&actor(Role::Accountant))).is_ok());

        let err = guard.check(Some(&actor(Role::Clinician))).unwrap_err();
        match err {
            CliniqError::Forbidden { reason } => assert!(reason.contains("Clinician")),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }
}
