//! Repo for user_roles table. UserRole is an entity that connects
//! users and roles. I.e. this table is for user has-many roles
//! relationship

use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{NewUserRole, UserRole};
use repos::acl::{self, CheckScope, RolesCacheImpl};
use repos::types::{RepoAcl, RepoResult};
use schema::user_roles::dsl::*;
use types::{MarketRole, RoleId, UserId};

/// UserRoles repository for handling UserRoles
pub trait UserRolesRepo {
    /// Returns list of user_roles for a specific user
    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<MarketRole>>;

    /// Create a new user role
    fn create(&self, payload: NewUserRole) -> RepoResult<UserRole>;

    /// Delete roles of a user
    fn delete_by_user_id(&self, user_id: UserId) -> RepoResult<Vec<UserRole>>;

    /// Delete user role by id
    fn delete_by_id(&self, id: RoleId) -> RepoResult<UserRole>;

    /// Delete one role of a user
    fn delete_user_role(&self, user_id: UserId, name: MarketRole) -> RepoResult<UserRole>;
}

/// Implementation of UserRoles trait
pub struct UserRolesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<UserRole>>,
    pub cached_roles: RolesCacheImpl,
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UserRolesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<UserRole>>, cached_roles: RolesCacheImpl) -> Self {
        Self {
            db_conn,
            acl,
            cached_roles,
        }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> UserRolesRepo for UserRolesRepoImpl<'a, T> {
    fn list_for_user(&self, user_id_value: UserId) -> RepoResult<Vec<MarketRole>> {
        debug!("list user roles for id {}.", user_id_value);
        if let Some(roles) = self.cached_roles.get(user_id_value) {
            return Ok(roles);
        }

        let query = user_roles.filter(user_id.eq(user_id_value));
        query
            .get_results::<UserRole>(self.db_conn)
            .map_err(From::from)
            .and_then(|user_roles_arg| {
                for user_role in &user_roles_arg {
                    acl::check(&*self.acl, Resource::UserRoles, Action::Read, self, Some(user_role))?;
                }
                let roles = user_roles_arg.into_iter().map(|user_role| user_role.name).collect::<Vec<MarketRole>>();
                if let Err(err) = self.cached_roles.set(user_id_value, &roles) {
                    warn!("Roles of user {} were not cached: {}", user_id_value, err);
                }
                Ok(roles)
            }).map_err(|e: FailureError| e.context(format!("List user roles for user {} error occurred.", user_id_value)).into())
    }

    fn create(&self, payload: NewUserRole) -> RepoResult<UserRole> {
        debug!("create new user role {:?}.", payload);
        self.cached_roles.remove(payload.user_id);
        let query = diesel::insert_into(user_roles).values(&payload);
        query
            .get_result::<UserRole>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::UserRoles, Action::Create, self, Some(&value))?;
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Create a new user role {:?} error occurred", payload)).into())
    }

    fn delete_by_user_id(&self, user_id_arg: UserId) -> RepoResult<Vec<UserRole>> {
        debug!("delete user roles by user id {}.", user_id_arg);
        acl::check(&*self.acl, Resource::UserRoles, Action::Delete, self, None)?;
        self.cached_roles.remove(user_id_arg);
        let filtered = user_roles.filter(user_id.eq(user_id_arg));
        let query = diesel::delete(filtered);
        query
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Delete user roles by user id {} error occurred", user_id_arg)).into())
    }

    fn delete_by_id(&self, id_arg: RoleId) -> RepoResult<UserRole> {
        debug!("delete user role by id {}.", id_arg);
        acl::check(&*self.acl, Resource::UserRoles, Action::Delete, self, None)?;
        let filtered = user_roles.filter(id.eq(id_arg));
        let query = diesel::delete(filtered);
        query
            .get_result::<UserRole>(self.db_conn)
            .map_err(From::from)
            .map(|user_role| {
                self.cached_roles.remove(user_role.user_id);
                user_role
            }).map_err(|e: FailureError| e.context(format!("Delete user role by id {} error occurred", id_arg)).into())
    }

    fn delete_user_role(&self, user_id_arg: UserId, name_arg: MarketRole) -> RepoResult<UserRole> {
        debug!("delete user role {} of user {}.", name_arg, user_id_arg);
        acl::check(&*self.acl, Resource::UserRoles, Action::Delete, self, None)?;
        self.cached_roles.remove(user_id_arg);
        let filtered = user_roles.filter(user_id.eq(user_id_arg)).filter(name.eq(name_arg));
        let query = diesel::delete(filtered);
        query.get_result(self.db_conn).map_err(From::from).map_err(|e: FailureError| {
            e.context(format!("Delete user role {} of user {} error occurred", name_arg, user_id_arg))
                .into()
        })
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, UserRole>
    for UserRolesRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id_arg: UserId, scope: &Scope, obj: Option<&UserRole>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => {
                if let Some(user_role) = obj {
                    user_role.user_id == user_id_arg
                } else {
                    false
                }
            }
        }
    }
}
