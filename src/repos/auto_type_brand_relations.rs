//! Relations between auto types and auto brands
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{AutoTypeBrandRelation, NewAutoTypeBrandRelation};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::auto_type_brand_relations::dsl as Relations;
use types::{AutoBrandId, AutoTypeId, UserId};

pub struct AutoTypeBrandRelationsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<AutoTypeBrandRelation>>,
}

pub trait AutoTypeBrandRelationsRepo {
    fn find(&self, auto_type_id: AutoTypeId, auto_brand_id: AutoBrandId) -> RepoResult<Option<AutoTypeBrandRelation>>;

    fn list_for_brand(&self, auto_brand_id: AutoBrandId) -> RepoResult<Vec<AutoTypeBrandRelation>>;

    fn list_all(&self) -> RepoResult<Vec<AutoTypeBrandRelation>>;

    /// Inserts the relation unless it exists. Returns the stored relation and
    /// whether it was created by this call.
    fn ensure(&self, payload: NewAutoTypeBrandRelation) -> RepoResult<(AutoTypeBrandRelation, bool)>;

    /// Deletes the relation, returns it when it existed
    fn delete(&self, auto_type_id: AutoTypeId, auto_brand_id: AutoBrandId) -> RepoResult<Option<AutoTypeBrandRelation>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AutoTypeBrandRelationsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<AutoTypeBrandRelation>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> AutoTypeBrandRelationsRepo
    for AutoTypeBrandRelationsRepoImpl<'a, T>
{
    fn find(&self, auto_type_id_arg: AutoTypeId, auto_brand_id_arg: AutoBrandId) -> RepoResult<Option<AutoTypeBrandRelation>> {
        debug!("Find relation of auto type {} and auto brand {}.", auto_type_id_arg, auto_brand_id_arg);
        acl::check(&*self.acl, Resource::AutoBrands, Action::Read, self, None)?;
        Relations::auto_type_brand_relations
            .filter(Relations::auto_type_id.eq(auto_type_id_arg))
            .filter(Relations::auto_brand_id.eq(auto_brand_id_arg))
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!(
                    "Find relation of auto type {} and auto brand {} error occurred",
                    auto_type_id_arg, auto_brand_id_arg
                )).into()
            })
    }

    fn list_for_brand(&self, auto_brand_id_arg: AutoBrandId) -> RepoResult<Vec<AutoTypeBrandRelation>> {
        debug!("List relations of auto brand {}.", auto_brand_id_arg);
        acl::check(&*self.acl, Resource::AutoBrands, Action::Read, self, None)?;
        Relations::auto_type_brand_relations
            .filter(Relations::auto_brand_id.eq(auto_brand_id_arg))
            .order(Relations::auto_type_id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("List relations of auto brand {} error occurred", auto_brand_id_arg)).into())
    }

    fn list_all(&self) -> RepoResult<Vec<AutoTypeBrandRelation>> {
        debug!("List all auto type brand relations.");
        acl::check(&*self.acl, Resource::AutoBrands, Action::Read, self, None)?;
        Relations::auto_type_brand_relations
            .order(Relations::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context("List all auto type brand relations error occurred").into())
    }

    fn ensure(&self, payload: NewAutoTypeBrandRelation) -> RepoResult<(AutoTypeBrandRelation, bool)> {
        debug!("Ensure relation {:?}.", payload);
        acl::check(&*self.acl, Resource::AutoBrands, Action::Update, self, None)?;
        let inserted = diesel::insert_into(Relations::auto_type_brand_relations)
            .values(&payload)
            .on_conflict((Relations::auto_type_id, Relations::auto_brand_id))
            .do_nothing()
            .get_result::<AutoTypeBrandRelation>(self.db_conn)
            .optional()
            .map_err(|e| FailureError::from(e).context(format!("Insert relation {:?} error occurred", payload)))?;

        match inserted {
            Some(relation) => Ok((relation, true)),
            None => Relations::auto_type_brand_relations
                .filter(Relations::auto_type_id.eq(payload.auto_type_id))
                .filter(Relations::auto_brand_id.eq(payload.auto_brand_id))
                .get_result(self.db_conn)
                .map(|relation| (relation, false))
                .map_err(From::from)
                .map_err(|e: FailureError| e.context(format!("Find relation {:?} error occurred", payload)).into()),
        }
    }

    fn delete(&self, auto_type_id_arg: AutoTypeId, auto_brand_id_arg: AutoBrandId) -> RepoResult<Option<AutoTypeBrandRelation>> {
        debug!("Delete relation of auto type {} and auto brand {}.", auto_type_id_arg, auto_brand_id_arg);
        acl::check(&*self.acl, Resource::AutoBrands, Action::Update, self, None)?;
        let filtered = Relations::auto_type_brand_relations
            .filter(Relations::auto_type_id.eq(auto_type_id_arg))
            .filter(Relations::auto_brand_id.eq(auto_brand_id_arg));
        diesel::delete(filtered)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!(
                    "Delete relation of auto type {} and auto brand {} error occurred",
                    auto_type_id_arg, auto_brand_id_arg
                )).into()
            })
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, AutoTypeBrandRelation>
    for AutoTypeBrandRelationsRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: UserId, scope: &Scope, _obj: Option<&AutoTypeBrandRelation>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
