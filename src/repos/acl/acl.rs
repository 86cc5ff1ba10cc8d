//! Access control traits shared by all repos
use failure::Error as FailureError;

use types::UserId;

/// Decides whether an object belongs to the scope of a user
pub trait CheckScope<Scope, T> {
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&T>) -> bool;
}

/// Access control list
pub trait Acl<Resource, Action, Scope, Error, T> {
    /// Tells if `action` on `resource` is allowed. `scope_checker` resolves
    /// scoped permissions against `obj`.
    fn allows(
        &self,
        resource: Resource,
        action: Action,
        scope_checker: &CheckScope<Scope, T>,
        obj: Option<&T>,
    ) -> Result<bool, Error>;
}

/// Allows everything. Used by background jobs and internal lookups.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemACL;

impl<Resource, Action, Scope, T> Acl<Resource, Action, Scope, FailureError, T> for SystemACL {
    fn allows(
        &self,
        _resource: Resource,
        _action: Action,
        _scope_checker: &CheckScope<Scope, T>,
        _obj: Option<&T>,
    ) -> Result<bool, FailureError> {
        Ok(true)
    }
}
