//! Product groups repo
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
use models::{NewProductGroup, ProductGroup, ProductGroupCategories, UpdateProductGroup};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::product_groups::dsl as ProductGroups;
use types::{ProductGroupId, UserId};

pub struct ProductGroupsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<ProductGroup>>,
}

pub trait ProductGroupsRepo {
    fn find(&self, id: ProductGroupId) -> RepoResult<Option<ProductGroup>>;

    fn find_many(&self, ids: &[ProductGroupId]) -> RepoResult<Vec<ProductGroup>>;

    /// Returns every group and subgroup
    fn list_all(&self) -> RepoResult<Vec<ProductGroup>>;

    fn create(&self, payload: NewProductGroup) -> RepoResult<ProductGroup>;

    fn update(&self, id: ProductGroupId, payload: UpdateProductGroup) -> RepoResult<ProductGroup>;

    /// Overwrites the denormalized auto types and brands of a group
    fn set_categories(&self, id: ProductGroupId, payload: ProductGroupCategories) -> RepoResult<ProductGroup>;

    fn slug_exists(&self, slug: String) -> RepoResult<bool>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProductGroupsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<ProductGroup>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProductGroupsRepo
    for ProductGroupsRepoImpl<'a, T>
{
    fn find(&self, id_arg: ProductGroupId) -> RepoResult<Option<ProductGroup>> {
        debug!("Find in product groups with id {}.", id_arg);
        ProductGroups::product_groups
            .find(id_arg)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<ProductGroup>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::ProductGroups, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find product group by id: {} error occurred", id_arg)).into())
    }

    fn find_many(&self, ids: &[ProductGroupId]) -> RepoResult<Vec<ProductGroup>> {
        debug!("Find product groups with ids {:?}.", ids);
        acl::check(&*self.acl, Resource::ProductGroups, Action::Read, self, None)?;
        ProductGroups::product_groups
            .filter(ProductGroups::id.eq_any(ids))
            .order(ProductGroups::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Find product groups by ids: {:?} error occurred", ids)).into())
    }

    fn list_all(&self) -> RepoResult<Vec<ProductGroup>> {
        debug!("List all product groups.");
        acl::check(&*self.acl, Resource::ProductGroups, Action::Read, self, None)?;
        ProductGroups::product_groups
            .order((ProductGroups::position, ProductGroups::id))
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context("List all product groups error occurred").into())
    }

    fn create(&self, payload: NewProductGroup) -> RepoResult<ProductGroup> {
        debug!("Create product group {:?}.", payload);
        acl::check(&*self.acl, Resource::ProductGroups, Action::Create, self, None)?;
        diesel::insert_into(ProductGroups::product_groups)
            .values(&payload)
            .get_result::<ProductGroup>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Create product group {:?} error occurred", payload)).into())
    }

    fn update(&self, id_arg: ProductGroupId, payload: UpdateProductGroup) -> RepoResult<ProductGroup> {
        debug!("Updating product group with id {} and payload {:?}.", id_arg, payload);
        acl::check(&*self.acl, Resource::ProductGroups, Action::Update, self, None)?;
        let filtered = ProductGroups::product_groups.filter(ProductGroups::id.eq(id_arg));
        diesel::update(filtered)
            .set(&payload)
            .get_result::<ProductGroup>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Update product group id: {}, payload: {:?} error occurred", id_arg, payload))
                    .into()
            })
    }

    fn set_categories(&self, id_arg: ProductGroupId, payload: ProductGroupCategories) -> RepoResult<ProductGroup> {
        debug!("Set categories {:?} of product group {}.", payload, id_arg);
        acl::check(&*self.acl, Resource::ProductGroups, Action::Update, self, None)?;
        let filtered = ProductGroups::product_groups.filter(ProductGroups::id.eq(id_arg));
        diesel::update(filtered)
            .set(&payload)
            .get_result::<ProductGroup>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Set categories of product group {} error occurred", id_arg)).into())
    }

    fn slug_exists(&self, slug_arg: String) -> RepoResult<bool> {
        debug!("Check if product group slug {} exists.", slug_arg);
        select(exists(ProductGroups::product_groups.filter(ProductGroups::slug.eq(&slug_arg))))
            .get_result(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Check product group slug {} error occurred", slug_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, ProductGroup>
    for ProductGroupsRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: UserId, scope: &Scope, _obj: Option<&ProductGroup>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
