//! Products repo, presents CRUD operations with db for products
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{NewProduct, Pagination, Product, ProductCategories, UpdateProduct};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::products::dsl as Products;
use types::{ProductId, UserId};

/// Products repository, responsible for handling products
pub struct ProductsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<Product>>,
}

pub trait ProductsRepo {
    /// Find specific product by ID
    fn find(&self, product_id: ProductId) -> RepoResult<Option<Product>>;

    fn find_many(&self, ids: &[ProductId]) -> RepoResult<Vec<Product>>;

    /// Returns active products, limited by `from` and `count` parameters
    fn list(&self, pagination: Pagination) -> RepoResult<Vec<Product>>;

    /// Returns all products (active or not) with id greater than `from`, for batch jobs
    fn list_batch(&self, from: ProductId, count: i64) -> RepoResult<Vec<Product>>;

    /// Creates new product
    fn create(&self, payload: NewProduct) -> RepoResult<Product>;

    /// Updates specific product
    fn update(&self, product_id: ProductId, payload: UpdateProduct) -> RepoResult<Product>;

    /// Deactivates specific product
    fn deactivate(&self, product_id: ProductId) -> RepoResult<Product>;

    /// Overwrites the category lists of a product
    fn set_categories(&self, product_id: ProductId, payload: ProductCategories) -> RepoResult<Product>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProductsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<Product>>) -> Self {
        Self { db_conn, acl }
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> ProductsRepo for ProductsRepoImpl<'a, T> {
    fn find(&self, product_id_arg: ProductId) -> RepoResult<Option<Product>> {
        debug!("Find in products with id {}.", product_id_arg);
        Products::products
            .find(product_id_arg)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<Product>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::Products, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find product by id: {} error occurred", product_id_arg)).into())
    }

    fn find_many(&self, ids: &[ProductId]) -> RepoResult<Vec<Product>> {
        debug!("Find products with ids {:?}.", ids);
        acl::check(&*self.acl, Resource::Products, Action::Read, self, None)?;
        Products::products
            .filter(Products::id.eq_any(ids))
            .order(Products::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Find products by ids: {:?} error occurred", ids)).into())
    }

    fn list(&self, pagination: Pagination) -> RepoResult<Vec<Product>> {
        debug!("Find in products with {:?}.", pagination);
        acl::check(&*self.acl, Resource::Products, Action::Read, self, None)?;
        Products::products
            .filter(Products::is_active.eq(true))
            .filter(Products::id.gt(pagination.offset_id()))
            .order(Products::id)
            .limit(pagination.limit())
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("List products with {:?} error occurred", pagination)).into())
    }

    fn list_batch(&self, from: ProductId, count: i64) -> RepoResult<Vec<Product>> {
        debug!("Find batch of {} products after {}.", count, from);
        acl::check(&*self.acl, Resource::Products, Action::Read, self, None)?;
        Products::products
            .filter(Products::id.gt(from))
            .order(Products::id)
            .limit(count)
            .get_results(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Find batch of products after {} error occurred", from)).into())
    }

    fn create(&self, payload: NewProduct) -> RepoResult<Product> {
        debug!("Create product {:?}.", payload);
        acl::check(&*self.acl, Resource::Products, Action::Create, self, None)?;
        diesel::insert_into(Products::products)
            .values(&payload)
            .get_result::<Product>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Create product {:?} error occurred", payload)).into())
    }

    fn update(&self, product_id_arg: ProductId, payload: UpdateProduct) -> RepoResult<Product> {
        debug!("Updating product with id {} and payload {:?}.", product_id_arg, payload);
        acl::check(&*self.acl, Resource::Products, Action::Update, self, None)?;
        let filtered = Products::products.filter(Products::id.eq(product_id_arg));
        diesel::update(filtered)
            .set(&payload)
            .get_result::<Product>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| {
                e.context(format!("Update product id: {}, payload: {:?} error occurred", product_id_arg, payload))
                    .into()
            })
    }

    fn deactivate(&self, product_id_arg: ProductId) -> RepoResult<Product> {
        debug!("Deactivate product with id {}.", product_id_arg);
        acl::check(&*self.acl, Resource::Products, Action::Delete, self, None)?;
        let filtered = Products::products.filter(Products::id.eq(product_id_arg));
        diesel::update(filtered)
            .set(Products::is_active.eq(false))
            .get_result::<Product>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Deactivate product id: {} error occurred", product_id_arg)).into())
    }

    fn set_categories(&self, product_id_arg: ProductId, payload: ProductCategories) -> RepoResult<Product> {
        debug!("Set categories {:?} of product {}.", payload, product_id_arg);
        acl::check(&*self.acl, Resource::Products, Action::Update, self, None)?;
        let filtered = Products::products.filter(Products::id.eq(product_id_arg));
        diesel::update(filtered)
            .set(&payload)
            .get_result::<Product>(self.db_conn)
            .map_err(From::from)
            .map_err(|e: FailureError| e.context(format!("Set categories of product {} error occurred", product_id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, Product>
    for ProductsRepoImpl<'a, T>
{
    fn is_in_scope(&self, _user_id: UserId, scope: &Scope, _obj: Option<&Product>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => false,
        }
    }
}
