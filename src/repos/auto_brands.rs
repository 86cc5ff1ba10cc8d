//! Auto brands repo
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
use models::{AutoBrand, NewAutoBrand, UpdateAutoBrand};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::auto_brands::dsl as AutoBrands;
use schema::auto_type_brand_relations::dsl as Relations;
use types::{AutoBrandId, AutoTypeId, IdList, UserId};

pub struct AutoBrandsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<AutoBrand>>,
}

pub trait AutoBrandsRepo {
    /// Find specific auto brand by ID
    fn find(&self, id: AutoBrandId) -> RepoResult<Option<AutoBrand>>;

    fn find_many(&self, ids: &[AutoBrandId]) -> RepoResult<Vec<AutoBrand>>;

    /// Lists brands ordered by name, only the ones related to `auto_type_id` when given
    fn list(&self, auto_type_id: Option<AutoTypeId>) -> RepoResult<Vec<AutoBrand>>;

    fn create(&self, payload: NewAutoBrand) -> RepoResult<AutoBrand>;

    fn update(&self, id: AutoBrandId, payload: UpdateAutoBrand) -> RepoResult<AutoBrand>;

    /// Overwrites the denormalized list of related auto types
    fn set_active_auto_types(&self, id: AutoBrandId, auto_type_ids: IdList) -> RepoResult<AutoBrand>;

    fn slug_exists(&self, slug: String) -> RepoResult<bool>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AutoBrandsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<AutoBrand>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AutoBrandsRepo for AutoBrandsRepoImpl<'a, T> {
    fn find(&self, id_arg: AutoBrandId) -> RepoResult<Option<AutoBrand>> {
        debug!("Find in auto brands with id {}.", id_arg);
        AutoBrands::auto_brands
            .find(id_arg)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<AutoBrand>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::AutoBrands, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find auto brand by id: {} error occurred", id_arg)).into())
    }

    fn find_many(&self, ids: &[AutoBrandId]) -> RepoResult<Vec<AutoBrand>> {
        debug!("Find auto brands with ids {:?}.", ids);
        AutoBrands::auto_brands
            .filter(AutoBrands::id.eq_any(ids))
            .order(AutoBrands::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<AutoBrand>| {
                acl::check(&*self.acl, Resource::AutoBrands, Action::Read, self, None)?;
                Ok(values)
            }).map_err(|e: FailureError| e.context(format!("Find auto brands by ids: {:?} error occurred", ids)).into())
    }

    fn list(&self, auto_type_id: Option<AutoTypeId>) -> RepoResult<Vec<AutoBrand>> {
        debug!("List auto brands, auto type {:?}.", auto_type_id);
        acl::check(&*self.acl, Resource::AutoBrands, Action::Read, self, None)?;
        let result = match auto_type_id {
            Some(auto_type_id) => {
                let related = Relations::auto_type_brand_relations
                    .filter(Relations::auto_type_id.eq(auto_type_id))
                    .select(Relations::auto_brand_id);
                AutoBrands::auto_brands
                    .filter(AutoBrands::id.eq_any(related))
                    .order((AutoBrands::name, AutoBrands::id))
                    .get_results(self.db_conn)
            }
            None => AutoBrands::auto_brands
                .order((AutoBrands::name, AutoBrands::id))
                .get_results(self.db_conn),
        };
        result
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("List auto brands of auto type {:?} error occurred", auto_type_id)).into())
    }

    fn create(&self, payload: NewAutoBrand) -> RepoResult<AutoBrand> {
        debug!("Create auto brand {:?}.", payload);
        acl::check(&*self.acl, Resource::AutoBrands, Action::Create, self, None)?;
        diesel::insert_into(AutoBrands::auto_brands)
            .values(&payload)
            .get_result::<AutoBrand>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Create auto brand {:?} error occurred", payload)).into())
    }

    fn update(&self, id_arg: AutoBrandId, payload: UpdateAutoBrand) -> RepoResult<AutoBrand> {
        debug!("Updating auto brand with id {} and payload {:?}.", id_arg, payload);
        acl::check(&*self.acl, Resource::AutoBrands, Action::Update, self, None)?;
        let filtered = AutoBrands::auto_brands.filter(AutoBrands::id.eq(id_arg));
        diesel::update(filtered)
            .set(&payload)
            .get_result::<AutoBrand>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Update auto brand id: {}, payload: {:?} error occurred", id_arg, payload))
                    .into()
            })
    }

    fn set_active_auto_types(&self, id_arg: AutoBrandId, auto_type_ids: IdList) -> RepoResult<AutoBrand> {
        debug!("Set active auto types {:?} of auto brand {}.", auto_type_ids, id_arg);
        acl::check(&*self.acl, Resource::AutoBrands, Action::Update, self, None)?;
        let filtered = AutoBrands::auto_brands.filter(AutoBrands::id.eq(id_arg));
        diesel::update(filtered)
            .set(AutoBrands::active_auto_type_ids.eq(&auto_type_ids))
            .get_result::<AutoBrand>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Set active auto types of auto brand {} error occurred", id_arg))
                    .into()
            })
    }

    fn slug_exists(&self, slug_arg: String) -> RepoResult<bool> {
        debug!("Check if auto brand slug {} exists.", slug_arg);
        select(exists(AutoBrands::auto_brands.filter(AutoBrands::slug.eq(&slug_arg))))
            .get_result(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Check auto brand slug {} error occurred", slug_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, AutoBrand>
    for AutoBrandsRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: UserId, scope: &Scope, _obj: Option<&AutoBrand>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
