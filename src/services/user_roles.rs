//! UserRoles Services, presents CRUD operations with user_roles

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{NewUserRole, RemoveUserRole, UserRole};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::Service;
use types::{MarketRole, RoleId, UserId};

pub trait UserRolesService {
    /// Returns role by user ID
    fn get_roles(&self, user_id: UserId) -> ServiceFuture<Vec<MarketRole>>;

    /// Creates new user_role
    fn create_user_role(&self, payload: NewUserRole) -> ServiceFuture<UserRole>;

    /// Remove user_role
    fn delete_user_role(&self, user_role: RemoveUserRole) -> ServiceFuture<UserRole>;

    /// Deletes role for user by id
    fn delete_user_role_by_id(&self, id_arg: RoleId) -> ServiceFuture<UserRole>;

    /// Gives the user the customer role unless it is already there.
    /// Returns the roles of the user.
    fn create_default_role(&self, user_id: UserId) -> ServiceFuture<Vec<MarketRole>>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > UserRolesService for Service<T, M, F>
{
    fn get_roles(&self, user_id: UserId) -> ServiceFuture<Vec<MarketRole>> {
        let current_uid = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let user_roles_repo = repo_factory.create_user_roles_repo(&*conn, current_uid);
            user_roles_repo
                .list_for_user(user_id)
                .map_err(|e: FailureError| e.context("Service user_roles, get_roles endpoint error occurred.").into())
        })
    }

    fn create_user_role(&self, new_user_role: NewUserRole) -> ServiceFuture<UserRole> {
        let current_uid = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let user_roles_repo = repo_factory.create_user_roles_repo(&*conn, current_uid);
            conn.transaction::<UserRole, FailureError, _>(move || user_roles_repo.create(new_user_role))
                .map_err(|e: FailureError| e.context("Service user_roles, create endpoint error occurred.").into())
        })
    }

    fn delete_user_role(&self, user_role: RemoveUserRole) -> ServiceFuture<UserRole> {
        let current_uid = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let user_roles_repo = repo_factory.create_user_roles_repo(&*conn, current_uid);
            conn.transaction::<UserRole, FailureError, _>(move || user_roles_repo.delete_user_role(user_role.user_id, user_role.name))
                .map_err(|e: FailureError| e.context("Service user_roles, delete_user_role endpoint error occurred.").into())
        })
    }

    fn delete_user_role_by_id(&self, id_arg: RoleId) -> ServiceFuture<UserRole> {
        let current_uid = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let user_roles_repo = repo_factory.create_user_roles_repo(&*conn, current_uid);
            user_roles_repo
                .delete_by_id(id_arg)
                .map_err(|e: FailureError| e.context("Service user_roles, delete_by_id endpoint error occurred.").into())
        })
    }

    fn create_default_role(&self, user_id: UserId) -> ServiceFuture<Vec<MarketRole>> {
        let current_uid = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let user_roles_repo = repo_factory.create_user_roles_repo(&*conn, current_uid);
            conn.transaction::<Vec<MarketRole>, FailureError, _>(move || {
                let mut roles = user_roles_repo.list_for_user(user_id)?;
                if !roles.contains(&MarketRole::Customer) {
                    user_roles_repo.create(NewUserRole {
                        user_id,
                        name: MarketRole::Customer,
                    })?;
                    roles.push(MarketRole::Customer);
                }
                Ok(roles)
            }).map_err(|e: FailureError| e.context("Service user_roles, create_default_role endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::user_roles::UserRolesService;
    use types::*;

    #[test]
    fn test_get_user_roles() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.get_roles(MOCK_USER_ID);
        let result = core.run(work).unwrap();
        assert_eq!(result, vec![MarketRole::Superadmin]);
    }

    #[test]
    fn test_create_user_role() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let payload = NewUserRole {
            user_id: MOCK_OTHER_USER_ID,
            name: MarketRole::Manager,
        };
        let work = service.create_user_role(payload);
        let result = core.run(work).unwrap();
        assert_eq!(result.user_id, MOCK_OTHER_USER_ID);
        assert_eq!(result.name, MarketRole::Manager);
    }

    #[test]
    fn test_default_role_is_added_once() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);

        let roles = core.run(service.create_default_role(MOCK_USER_ID)).unwrap();
        assert_eq!(roles, vec![MarketRole::Superadmin, MarketRole::Customer]);

        let roles = core.run(service.create_default_role(MOCK_OTHER_USER_ID)).unwrap();
        assert_eq!(roles, vec![MarketRole::Customer]);
    }
}
