//! Auto types repo, presents CRUD operations with db for auto types
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::dsl::exists;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::select;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{AutoType, NewAutoType, UpdateAutoType};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::auto_types::dsl as AutoTypes;
use types::{AutoTypeId, UserId};

/// Auto types repository, responsible for handling auto types
pub struct AutoTypesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<AutoType>>,
}

pub trait AutoTypesRepo {
    /// Find specific auto type by ID
    fn find(&self, id: AutoTypeId) -> RepoResult<Option<AutoType>>;

    /// Returns auto types with given ids
    fn find_many(&self, ids: &[AutoTypeId]) -> RepoResult<Vec<AutoType>>;

    /// Returns all auto types ordered by position
    fn list(&self) -> RepoResult<Vec<AutoType>>;

    /// Creates new auto type
    fn create(&self, payload: NewAutoType) -> RepoResult<AutoType>;

    /// Updates specific auto type
    fn update(&self, id: AutoTypeId, payload: UpdateAutoType) -> RepoResult<AutoType>;

    /// Checks that slug already exists
    fn slug_exists(&self, slug: String) -> RepoResult<bool>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AutoTypesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<AutoType>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AutoTypesRepo for AutoTypesRepoImpl<'a, T> {
    fn find(&self, id_arg: AutoTypeId) -> RepoResult<Option<AutoType>> {
        debug!("Find in auto types with id {}.", id_arg);
        let query = AutoTypes::auto_types.find(id_arg);
        query
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<AutoType>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::AutoTypes, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find auto type by id: {} error occurred", id_arg)).into())
    }

    fn find_many(&self, ids: &[AutoTypeId]) -> RepoResult<Vec<AutoType>> {
        debug!("Find auto types with ids {:?}.", ids);
        let query = AutoTypes::auto_types.filter(AutoTypes::id.eq_any(ids)).order(AutoTypes::id);
        query
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<AutoType>| {
                acl::check(&*self.acl, Resource::AutoTypes, Action::Read, self, None)?;
                Ok(values)
            }).map_err(|e: FailureError| e.context(format!("Find auto types by ids: {:?} error occurred", ids)).into())
    }

    fn list(&self) -> RepoResult<Vec<AutoType>> {
        debug!("List all auto types.");
        let query = AutoTypes::auto_types.order((AutoTypes::position, AutoTypes::id));
        query
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<AutoType>| {
                acl::check(&*self.acl, Resource::AutoTypes, Action::Read, self, None)?;
                Ok(values)
            }).map_err(|e: FailureError| e.context("List all auto types error occurred").into())
    }

    fn create(&self, payload: NewAutoType) -> RepoResult<AutoType> {
        debug!("Create auto type {:?}.", payload);
        acl::check(&*self.acl, Resource::AutoTypes, Action::Create, self, None)?;
        let query = diesel::insert_into(AutoTypes::auto_types).values(&payload);
        query
            .get_result::<AutoType>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Create auto type {:?} error occurred", payload)).into())
    }

    fn update(&self, id_arg: AutoTypeId, payload: UpdateAutoType) -> RepoResult<AutoType> {
        debug!("Updating auto type with id {} and payload {:?}.", id_arg, payload);
        acl::check(&*self.acl, Resource::AutoTypes, Action::Update, self, None)?;
        let filtered = AutoTypes::auto_types.filter(AutoTypes::id.eq(id_arg));
        let query = diesel::update(filtered).set(&payload);
        query
            .get_result::<AutoType>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Update auto type id: {}, payload: {:?} error occurred", id_arg, payload))
                    .into()
            })
    }

    fn slug_exists(&self, slug_arg: String) -> RepoResult<bool> {
        debug!("Check if auto type slug {} exists.", slug_arg);
        let query = select(exists(AutoTypes::auto_types.filter(AutoTypes::slug.eq(&slug_arg))));
        query
            .get_result(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Check auto type slug {} error occurred", slug_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, AutoType>
    for AutoTypesRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: UserId, scope: &Scope, _obj: Option<&AutoType>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
