//! Organizations repo, presents CRUD operations with db for seller organizations
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{NewOrganization, Organization, Pagination, SellerProductCategories, UpdateOrganization};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::organizations::dsl as Organizations;
use types::{OrganizationId, UserId};

pub struct OrganizationsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Organization>>,
}

pub trait OrganizationsRepo {
    fn find(&self, id: OrganizationId) -> RepoResult<Option<Organization>>;

    /// Returns list of organizations, limited by `from` and `count` parameters
    fn list(&self, pagination: Pagination) -> RepoResult<Vec<Organization>>;

    /// Returns every active organization
    fn list_active(&self) -> RepoResult<Vec<Organization>>;

    /// Organizations owned by the user
    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Organization>>;

    fn create(&self, payload: NewOrganization) -> RepoResult<Organization>;

    fn update(&self, id: OrganizationId, payload: UpdateOrganization) -> RepoResult<Organization>;

    /// Overwrites what the organization sells
    fn set_categories(&self, id: OrganizationId, payload: SellerProductCategories) -> RepoResult<Organization>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OrganizationsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Organization>>) -> Self {
        Self { db_conn, acl }
    }

    fn find_for_write(&self, id_arg: OrganizationId, action: Action) -> RepoResult<Organization> {
        let value = Organizations::organizations.find(id_arg).get_result::<Organization>(self.db_conn)?;
        acl::check(&*self.acl, Resource::Organizations, action, self, Some(&value))?;
        Ok(value)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> OrganizationsRepo
    for OrganizationsRepoImpl<'a, T>
{
    fn find(&self, id_arg: OrganizationId) -> RepoResult<Option<Organization>> {
        debug!("Find in organizations with id {}.", id_arg);
        Organizations::organizations
            .find(id_arg)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Organization>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Organizations, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find organization by id: {} error occurred", id_arg)).into())
    }

    fn list(&self, pagination: Pagination) -> RepoResult<Vec<Organization>> {
        debug!("List organizations with {:?}.", pagination);
        Organizations::organizations
            .filter(Organizations::id.gt(pagination.offset_id()))
            .order(Organizations::id)
            .limit(pagination.limit())
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<Organization>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Organizations, Action::Read, self, Some(value))?;
                }
                Ok(values)
            }).map_err(|e: FailureError| e.context(format!("List organizations with {:?} error occurred", pagination)).into())
    }

    fn list_active(&self) -> RepoResult<Vec<Organization>> {
        debug!("List active organizations.");
        Organizations::organizations
            .filter(Organizations::is_active.eq(true))
            .order(Organizations::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<Organization>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Organizations, Action::Read, self, Some(value))?;
                }
                Ok(values)
            }).map_err(|e: FailureError| e.context("List active organizations error occurred").into())
    }

    fn list_for_user(&self, user_id_arg: UserId) -> RepoResult<Vec<Organization>> {
        debug!("List organizations of user {}.", user_id_arg);
        Organizations::organizations
            .filter(Organizations::user_id.eq(user_id_arg))
            .order(Organizations::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<Organization>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::Organizations, Action::Read, self, Some(value))?;
                }
                Ok(values)
            }).map_err(|e: FailureError| e.context(format!("List organizations of user {} error occurred", user_id_arg)).into())
    }

    fn create(&self, payload: NewOrganization) -> RepoResult<Organization> {
        debug!("Create organization {:?}.", payload);
        diesel::insert_into(Organizations::organizations)
            .values(&payload)
            .get_result::<Organization>(self.db_conn)
            .map_err(From::from)
            .and_then(|value| {
                acl::check(&*self.acl, Resource::Organizations, Action::Create, self, Some(&value))?;
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Create organization {:?} error occurred", payload)).into())
    }

    fn update(&self, id_arg: OrganizationId, payload: UpdateOrganization) -> RepoResult<Organization> {
        debug!("Updating organization with id {} and payload {:?}.", id_arg, payload);
        self.find_for_write(id_arg, Action::Update)
            .and_then(|_| {
                let filtered = Organizations::organizations.filter(Organizations::id.eq(id_arg));
                diesel::update(filtered)
                    .set(&payload)
                    .get_result::<Organization>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| {
                e.context(format!("Update organization id: {}, payload: {:?} error occurred", id_arg, payload))
                    .into()
            })
    }

    fn set_categories(&self, id_arg: OrganizationId, payload: SellerProductCategories) -> RepoResult<Organization> {
        debug!("Set product categories {:?} of organization {}.", payload, id_arg);
        self.find_for_write(id_arg, Action::Update)
            .and_then(|_| {
                let filtered = Organizations::organizations.filter(Organizations::id.eq(id_arg));
                diesel::update(filtered)
                    .set(&payload)
                    .get_result::<Organization>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Set product categories of organization {} error occurred", id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Organization>
    for OrganizationsRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&Organization>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => obj.map(|organization| organization.user_id == user_id).unwrap_or(false),
        }
    }
}
