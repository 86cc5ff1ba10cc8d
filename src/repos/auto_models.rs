//! Auto models repo
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
use models::{AutoModel, AutoModelsQuery, NewAutoModel, UpdateAutoModel};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::auto_models::dsl as AutoModels;
use types::{AutoModelId, UserId};

pub struct AutoModelsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<AutoModel>>,
}

pub trait AutoModelsRepo {
    fn find(&self, id: AutoModelId) -> RepoResult<Option<AutoModel>>;

    fn find_many(&self, ids: &[AutoModelId]) -> RepoResult<Vec<AutoModel>>;

    /// Lists models filtered by auto type and/or auto brand
    fn list(&self, query: AutoModelsQuery) -> RepoResult<Vec<AutoModel>>;

    fn create(&self, payload: NewAutoModel) -> RepoResult<AutoModel>;

    fn update(&self, id: AutoModelId, payload: UpdateAutoModel) -> RepoResult<AutoModel>;

    fn slug_exists(&self, slug: String) -> RepoResult<bool>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AutoModelsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<AutoModel>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AutoModelsRepo for AutoModelsRepoImpl<'a, T> {
    fn find(&self, id_arg: AutoModelId) -> RepoResult<Option<AutoModel>> {
        debug!("Find in auto models with id {}.", id_arg);
        AutoModels::auto_models
            .find(id_arg)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<AutoModel>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::AutoModels, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find auto model by id: {} error occurred", id_arg)).into())
    }

    fn find_many(&self, ids: &[AutoModelId]) -> RepoResult<Vec<AutoModel>> {
        debug!("Find auto models with ids {:?}.", ids);
        acl::check(&*self.acl, Resource::AutoModels, Action::Read, self, None)?;
        AutoModels::auto_models
            .filter(AutoModels::id.eq_any(ids))
            .order(AutoModels::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Find auto models by ids: {:?} error occurred", ids)).into())
    }

    fn list(&self, search: AutoModelsQuery) -> RepoResult<Vec<AutoModel>> {
        debug!("List auto models by {:?}.", search);
        acl::check(&*self.acl, Resource::AutoModels, Action::Read, self, None)?;
        let mut query = AutoModels::auto_models.into_boxed();
        if let Some(auto_type_id) = search.auto_type_id {
            query = query.filter(AutoModels::auto_type_id.eq(auto_type_id));
        }
        if let Some(auto_brand_id) = search.auto_brand_id {
            query = query.filter(AutoModels::auto_brand_id.eq(auto_brand_id));
        }
        query
            .order((AutoModels::name, AutoModels::id))
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("List auto models by {:?} error occurred", search)).into())
    }

    fn create(&self, payload: NewAutoModel) -> RepoResult<AutoModel> {
        debug!("Create auto model {:?}.", payload);
        acl::check(&*self.acl, Resource::AutoModels, Action::Create, self, None)?;
        diesel::insert_into(AutoModels::auto_models)
            .values(&payload)
            .get_result::<AutoModel>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Create auto model {:?} error occurred", payload)).into())
    }

    fn update(&self, id_arg: AutoModelId, payload: UpdateAutoModel) -> RepoResult<AutoModel> {
        debug!("Updating auto model with id {} and payload {:?}.", id_arg, payload);
        acl::check(&*self.acl, Resource::AutoModels, Action::Update, self, None)?;
        let filtered = AutoModels::auto_models.filter(AutoModels::id.eq(id_arg));
        diesel::update(filtered)
            .set(&payload)
            .get_result::<AutoModel>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Update auto model id: {}, payload: {:?} error occurred", id_arg, payload))
                    .into()
            })
    }

    fn slug_exists(&self, slug_arg: String) -> RepoResult<bool> {
        debug!("Check if auto model slug {} exists.", slug_arg);
        select(exists(AutoModels::auto_models.filter(AutoModels::slug.eq(&slug_arg))))
            .get_result(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Check auto model slug {} error occurred", slug_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, AutoModel>
    for AutoModelsRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: UserId, scope: &Scope, _obj: Option<&AutoModel>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
