//! Product branches repo
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{NewProductBranch, ProductBranch, UpdateProductBranch};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::product_branches::dsl as Branches;
use types::{AutoBrandId, AutoTypeId, ProductBranchId, ProductGroupId, ProductId, UserId};

pub struct ProductBranchesRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<ProductBranch>>,
}

pub trait ProductBranchesRepo {
    fn find(&self, id: ProductBranchId) -> RepoResult<Option<ProductBranch>>;

    fn list_for_product(&self, product_id: ProductId) -> RepoResult<Vec<ProductBranch>>;

    /// Branches placed into the group either as group or as subgroup
    fn list_for_group(&self, group_id: ProductGroupId) -> RepoResult<Vec<ProductBranch>>;

    fn create_many(&self, payload: Vec<NewProductBranch>) -> RepoResult<Vec<ProductBranch>>;

    fn update(&self, id: ProductBranchId, payload: UpdateProductBranch) -> RepoResult<ProductBranch>;

    fn delete(&self, id: ProductBranchId) -> RepoResult<ProductBranch>;

    fn delete_many(&self, ids: &[ProductBranchId]) -> RepoResult<Vec<ProductBranch>>;

    /// Number of branches using the (auto type, auto brand) pair
    fn count_for_pair(&self, auto_type_id: AutoTypeId, auto_brand_id: AutoBrandId) -> RepoResult<i64>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProductBranchesRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<ProductBranch>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProductBranchesRepo
    for ProductBranchesRepoImpl<'a, T>
{
    fn find(&self, id_arg: ProductBranchId) -> RepoResult<Option<ProductBranch>> {
        debug!("Find in product branches with id {}.", id_arg);
        Branches::product_branches
            .find(id_arg)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<ProductBranch>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::ProductBranches, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find product branch by id: {} error occurred", id_arg)).into())
    }

    fn list_for_product(&self, product_id_arg: ProductId) -> RepoResult<Vec<ProductBranch>> {
        debug!("List branches of product {}.", product_id_arg);
        acl::check(&*self.acl, Resource::ProductBranches, Action::Read, self, None)?;
        Branches::product_branches
            .filter(Branches::product_id.eq(product_id_arg))
            .order(Branches::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("List branches of product {} error occurred", product_id_arg)).into())
    }

    fn list_for_group(&self, group_id_arg: ProductGroupId) -> RepoResult<Vec<ProductBranch>> {
        debug!("List branches of product group {}.", group_id_arg);
        acl::check(&*self.acl, Resource::ProductBranches, Action::Read, self, None)?;
        Branches::product_branches
            .filter(Branches::group_id.eq(group_id_arg).or(Branches::subgroup_id.eq(group_id_arg)))
            .order(Branches::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("List branches of product group {} error occurred", group_id_arg)).into())
    }

    fn create_many(&self, payload: Vec<NewProductBranch>) -> RepoResult<Vec<ProductBranch>> {
        debug!("Create product branches {:?}.", payload);
        acl::check(&*self.acl, Resource::ProductBranches, Action::Create, self, None)?;
        if payload.is_empty() {
            return Ok(vec![]);
        }
        diesel::insert_into(Branches::product_branches)
            .values(&payload)
            .get_results::<ProductBranch>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Create product branches {:?} error occurred", payload)).into())
    }

    fn update(&self, id_arg: ProductBranchId, payload: UpdateProductBranch) -> RepoResult<ProductBranch> {
        debug!("Updating product branch with id {} and payload {:?}.", id_arg, payload);
        acl::check(&*self.acl, Resource::ProductBranches, Action::Update, self, None)?;
        let filtered = Branches::product_branches.filter(Branches::id.eq(id_arg));
        diesel::update(filtered)
            .set(&payload)
            .get_result::<ProductBranch>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Update product branch id: {}, payload: {:?} error occurred", id_arg, payload))
                    .into()
            })
    }

    fn delete(&self, id_arg: ProductBranchId) -> RepoResult<ProductBranch> {
        debug!("Delete product branch with id {}.", id_arg);
        acl::check(&*self.acl, Resource::ProductBranches, Action::Delete, self, None)?;
        let filtered = Branches::product_branches.filter(Branches::id.eq(id_arg));
        diesel::delete(filtered)
            .get_result::<ProductBranch>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Delete product branch id: {} error occurred", id_arg)).into())
    }

    fn delete_many(&self, ids: &[ProductBranchId]) -> RepoResult<Vec<ProductBranch>> {
        debug!("Delete product branches with ids {:?}.", ids);
        acl::check(&*self.acl, Resource::ProductBranches, Action::Delete, self, None)?;
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let filtered = Branches::product_branches.filter(Branches::id.eq_any(ids));
        diesel::delete(filtered)
            .get_results::<ProductBranch>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Delete product branches {:?} error occurred", ids)).into())
    }

    fn count_for_pair(&self, auto_type_id_arg: AutoTypeId, auto_brand_id_arg: AutoBrandId) -> RepoResult<i64> {
        debug!(
            "Count branches of auto type {} and auto brand {}.",
            auto_type_id_arg, auto_brand_id_arg
        );
        acl::check(&*self.acl, Resource::ProductBranches, Action::Read, self, None)?;
        Branches::product_branches
            .filter(Branches::auto_type_id.eq(auto_type_id_arg))
            .filter(Branches::auto_brand_id.eq(auto_brand_id_arg))
            .select(count_star())
            .get_result(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!(
                    "Count branches of auto type {} and auto brand {} error occurred",
                    auto_type_id_arg, auto_brand_id_arg
                )).into()
            })
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, ProductBranch>
    for ProductBranchesRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: UserId, scope: &Scope, _obj: Option<&ProductBranch>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
