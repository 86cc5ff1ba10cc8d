//! Repos is a module responsible for interacting with access control lists
//! Authorization module contains authorization logic for the repo layer app

#[macro_use]
pub mod macros;
pub mod acl;
pub mod roles_cache;

pub use self::acl::{Acl, CheckScope, SystemACL};
pub use self::roles_cache::RolesCacheImpl;

use std::collections::HashMap;
use std::rc::Rc;

use errors::Error;
use failure::Error as FailureError;

use models::authorization::*;
use types::{MarketRole, UserId};

pub fn check<T>(
    acl: &Acl<Resource, Action, Scope, FailureError, T>,
    resource: Resource,
    action: Action,
    scope_checker: &CheckScope<Scope, T>,
    obj: Option<&T>,
) -> Result<(), FailureError> {
    acl.allows(resource, action, scope_checker, obj).and_then(|allowed| {
        if allowed {
            Ok(())
        } else {
            Err(format_err!("Denied request to do {:?} on {:?}", action, resource)
                .context(Error::Forbidden)
                .into())
        }
    })
}

const CATALOG: [Resource; 6] = [
    Resource::AutoTypes,
    Resource::AutoBrands,
    Resource::AutoModels,
    Resource::ProductGroups,
    Resource::Products,
    Resource::ProductBranches,
];

/// ApplicationAcl contains main logic for manipulation with resources
#[derive(Clone)]
pub struct ApplicationAcl {
    acls: Rc<HashMap<MarketRole, Vec<Permission>>>,
    roles: Vec<MarketRole>,
    user_id: UserId,
}

impl ApplicationAcl {
    pub fn new(roles: Vec<MarketRole>, user_id: UserId) -> Self {
        let mut hash = ::std::collections::HashMap::new();
        hash.insert(
            MarketRole::Superadmin,
            vec![
                permission!(Resource::AutoBrands),
                permission!(Resource::AutoModels),
                permission!(Resource::AutoTypes),
                permission!(Resource::CartProducts),
                permission!(Resource::Notifications),
                permission!(Resource::Offers),
                permission!(Resource::OrderRequests),
                permission!(Resource::Orders),
                permission!(Resource::Organizations),
                permission!(Resource::ProductBranches),
                permission!(Resource::ProductGroups),
                permission!(Resource::Products),
                permission!(Resource::UserRoles),
            ],
        );

        let mut manager = CATALOG.iter().map(|resource| permission!(*resource)).collect::<Vec<_>>();
        manager.extend(vec![
            permission!(Resource::Organizations, Action::Read),
            permission!(Resource::OrderRequests, Action::Read),
            permission!(Resource::Offers, Action::Read),
            permission!(Resource::Orders, Action::Read),
        ]);
        hash.insert(MarketRole::Manager, manager);

        let mut operator = CATALOG
            .iter()
            .map(|resource| permission!(*resource, Action::Read))
            .collect::<Vec<_>>();
        operator.extend(vec![
            permission!(Resource::Organizations, Action::Read),
            permission!(Resource::OrderRequests, Action::Read),
            permission!(Resource::Offers, Action::Read),
            permission!(Resource::Orders, Action::Read),
            permission!(Resource::UserRoles, Action::Read),
        ]);
        hash.insert(MarketRole::Operator, operator);

        let mut seller = CATALOG
            .iter()
            .map(|resource| permission!(*resource, Action::Read))
            .collect::<Vec<_>>();
        seller.extend(vec![
            permission!(Resource::Organizations, Action::Read),
            permission!(Resource::Organizations, Action::Create, Scope::Owned),
            permission!(Resource::Organizations, Action::Update, Scope::Owned),
            permission!(Resource::OrderRequests, Action::Read, Scope::Owned),
            permission!(Resource::Offers, Action::All, Scope::Owned),
            permission!(Resource::Orders, Action::Read, Scope::Owned),
            permission!(Resource::Orders, Action::Update, Scope::Owned),
            permission!(Resource::CartProducts, Action::All, Scope::Owned),
            permission!(Resource::Notifications, Action::All, Scope::Owned),
            permission!(Resource::UserRoles, Action::Read, Scope::Owned),
        ]);
        hash.insert(MarketRole::Seller, seller);

        let mut customer = CATALOG
            .iter()
            .map(|resource| permission!(*resource, Action::Read))
            .collect::<Vec<_>>();
        customer.extend(vec![
            permission!(Resource::Organizations, Action::Read),
            permission!(Resource::Organizations, Action::Create, Scope::Owned),
            permission!(Resource::CartProducts, Action::All, Scope::Owned),
            permission!(Resource::OrderRequests, Action::All, Scope::Owned),
            permission!(Resource::Offers, Action::Read, Scope::Owned),
            permission!(Resource::Offers, Action::Update, Scope::Owned),
            permission!(Resource::Orders, Action::Create, Scope::Owned),
            permission!(Resource::Orders, Action::Read, Scope::Owned),
            permission!(Resource::Orders, Action::Update, Scope::Owned),
            permission!(Resource::Notifications, Action::All, Scope::Owned),
            permission!(Resource::UserRoles, Action::Read, Scope::Owned),
        ]);
        hash.insert(MarketRole::Customer, customer);

        ApplicationAcl {
            acls: Rc::new(hash),
            roles,
            user_id,
        }
    }
}

impl<T> Acl<Resource, Action, Scope, FailureError, T> for ApplicationAcl {
    fn allows(
        &self,
        resource: Resource,
        action: Action,
        scope_checker: &CheckScope<Scope, T>,
        obj: Option<&T>,
    ) -> Result<bool, FailureError> {
        let empty: Vec<Permission> = Vec::new();
        let user_id = self.user_id;
        let hashed_acls = self.acls.clone();
        let mut acls = self
            .roles
            .iter()
            .flat_map(|role| hashed_acls.get(role).unwrap_or(&empty))
            .filter(|permission| (permission.resource == resource) && ((permission.action == action) || (permission.action == Action::All)))
            .filter(|permission| scope_checker.is_in_scope(user_id, &permission.scope, obj));

        if acls.next().is_some() {
            Ok(true)
        } else {
            error!("Denied request from user {} to do {} on {}.", user_id, action, resource);
            Ok(false)
        }
    }
}

/// Anonymous users may only read the catalog
#[derive(Clone, Default)]
pub struct UnauthorizedAcl;

impl<T> Acl<Resource, Action, Scope, FailureError, T> for UnauthorizedAcl {
    fn allows(
        &self,
        resource: Resource,
        action: Action,
        _scope_checker: &CheckScope<Scope, T>,
        _obj: Option<&T>,
    ) -> Result<bool, FailureError> {
        if action == Action::Read && resource.is_catalog() {
            Ok(true)
        } else {
            error!("Denied unauthorized request to do {} on {}.", action, resource);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use failure::Error as FailureError;

    use models::authorization::*;
    use repos::acl::*;
    use types::{MarketRole, UserId};

    /// Object owned by a single user
    struct Owned {
        owner: UserId,
    }

    struct ScopeChecker;

    impl CheckScope<Scope, Owned> for ScopeChecker {
        fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&Owned>) -> bool {
            match *scope {
                Scope::All => true,
                Scope::Owned => obj.map(|o| o.owner == user_id).unwrap_or(false),
            }
        }
    }

    fn allows(acl: &Acl<Resource, Action, Scope, FailureError, Owned>, resource: Resource, action: Action, owner: i32) -> bool {
        acl.allows(resource, action, &ScopeChecker, Some(&Owned { owner: UserId(owner) }))
            .unwrap()
    }

    #[test]
    fn superadmin_can_do_everything() {
        let acl = ApplicationAcl::new(vec![MarketRole::Superadmin], UserId(1));
        assert!(allows(&acl, Resource::Orders, Action::Update, 2));
        assert!(allows(&acl, Resource::UserRoles, Action::Create, 2));
        assert!(allows(&acl, Resource::Notifications, Action::Delete, 2));
    }

    #[test]
    fn manager_edits_catalog_but_not_orders() {
        let acl = ApplicationAcl::new(vec![MarketRole::Manager], UserId(1));
        assert!(allows(&acl, Resource::Products, Action::Create, 2));
        assert!(allows(&acl, Resource::AutoBrands, Action::Delete, 2));
        assert!(allows(&acl, Resource::Orders, Action::Read, 2));
        assert!(!allows(&acl, Resource::Orders, Action::Update, 2));
        assert!(!allows(&acl, Resource::CartProducts, Action::Read, 2));
    }

    #[test]
    fn operator_only_reads() {
        let acl = ApplicationAcl::new(vec![MarketRole::Operator], UserId(1));
        assert!(allows(&acl, Resource::OrderRequests, Action::Read, 2));
        assert!(!allows(&acl, Resource::OrderRequests, Action::Update, 2));
        assert!(!allows(&acl, Resource::Notifications, Action::Read, 2));
        assert!(!allows(&acl, Resource::CartProducts, Action::Read, 2));
    }

    #[test]
    fn customer_works_with_own_objects() {
        let acl = ApplicationAcl::new(vec![MarketRole::Customer], UserId(5));
        assert!(allows(&acl, Resource::CartProducts, Action::Create, 5));
        assert!(!allows(&acl, Resource::CartProducts, Action::Create, 6));
        assert!(allows(&acl, Resource::OrderRequests, Action::Delete, 5));
        assert!(!allows(&acl, Resource::OrderRequests, Action::Read, 6));
        assert!(!allows(&acl, Resource::Offers, Action::Create, 5));
        assert!(allows(&acl, Resource::Products, Action::Read, 6));
        assert!(!allows(&acl, Resource::Products, Action::Update, 6));
        assert!(allows(&acl, Resource::Organizations, Action::Create, 5));
        assert!(!allows(&acl, Resource::Organizations, Action::Update, 5));
    }

    #[test]
    fn seller_and_customer_roles_add_up() {
        let acl = ApplicationAcl::new(vec![MarketRole::Customer, MarketRole::Seller], UserId(5));
        assert!(allows(&acl, Resource::Offers, Action::Create, 5));
        assert!(allows(&acl, Resource::OrderRequests, Action::Create, 5));
        assert!(allows(&acl, Resource::Organizations, Action::Update, 5));
        assert!(!allows(&acl, Resource::Organizations, Action::Update, 6));
    }

    #[test]
    fn user_without_roles_is_denied() {
        let acl = ApplicationAcl::new(vec![], UserId(5));
        assert!(!allows(&acl, Resource::Products, Action::Read, 5));
    }

    #[test]
    fn anonymous_reads_catalog_only() {
        let acl = UnauthorizedAcl::default();
        assert!(allows(&acl, Resource::AutoTypes, Action::Read, 1));
        assert!(allows(&acl, Resource::ProductGroups, Action::Read, 1));
        assert!(!allows(&acl, Resource::AutoTypes, Action::Create, 1));
        assert!(!allows(&acl, Resource::Organizations, Action::Read, 1));
    }

    #[test]
    fn system_acl_allows_everything() {
        let acl = SystemACL::default();
        assert!(allows(&acl, Resource::Orders, Action::Delete, 1));
    }
}
