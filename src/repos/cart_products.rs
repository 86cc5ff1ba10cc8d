//! Cart products repo
use diesel;
use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_dsl::RunQueryDsl;
use diesel::Connection;
use failure::Error as FailureError;

use models::authorization::*;
use models::{CartProduct, NewCartProduct, UpdateCartQuantity};
use repos::acl::{self, CheckScope};
use repos::types::{RepoAcl, RepoResult};
use schema::cart_products::dsl as CartProducts;
use types::{CartProductId, OfferProductId, ProductId, UserId};

pub struct CartProductsRepoImpl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> {
    pub db_conn: &'a T,
    pub acl: Box<RepoAcl<CartProduct>>,
}

pub trait CartProductsRepo {
    fn find(&self, id: CartProductId) -> RepoResult<Option<CartProduct>>;

    /// Row of the user holding the same product and offer item
    fn find_same(&self, user_id: UserId, product_id: ProductId, offer_product_id: Option<OfferProductId>) -> RepoResult<Option<CartProduct>>;

    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<CartProduct>>;

    /// Inserts the row unless the user already holds the same item.
    /// Returns `None` on conflict.
    fn create_if_absent(&self, payload: NewCartProduct) -> RepoResult<Option<CartProduct>>;

    fn set_quantity(&self, id: CartProductId, quantity: i32) -> RepoResult<CartProduct>;

    /// Adds `delta` to the stored quantity in a single update
    fn increment_quantity(&self, id: CartProductId, delta: i32) -> RepoResult<CartProduct>;

    fn delete(&self, id: CartProductId) -> RepoResult<CartProduct>;

    /// Empties the cart of the user
    fn clear(&self, user_id: UserId) -> RepoResult<Vec<CartProduct>>;
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CartProductsRepoImpl<'a, T> {
    pub fn new(db_conn: &'a T, acl: Box<RepoAcl<CartProduct>>) -> Self {
        Self { db_conn, acl }
    }

    fn find_for_write(&self, id_arg: CartProductId, action: Action) -> RepoResult<CartProduct> {
        let value = CartProducts::cart_products.find(id_arg).get_result::<CartProduct>(self.db_conn)?;
        acl::check(&*self.acl, Resource::CartProducts, action, self, Some(&value))?;
        Ok(value)
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CartProductsRepo
    for CartProductsRepoImpl<'a, T>
{
    fn find(&self, id_arg: CartProductId) -> RepoResult<Option<CartProduct>> {
        debug!("Find in cart products with id {}.", id_arg);
        CartProducts::cart_products
            .find(id_arg)
            .get_result(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<CartProduct>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::CartProducts, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Find cart product by id: {} error occurred", id_arg)).into())
    }

    fn find_same(
        &self,
        user_id_arg: UserId,
        product_id_arg: ProductId,
        offer_product_id_arg: Option<OfferProductId>,
    ) -> RepoResult<Option<CartProduct>> {
        debug!(
            "Find cart product of user {} with product {} and offer product {:?}.",
            user_id_arg, product_id_arg, offer_product_id_arg
        );
        let query = CartProducts::cart_products
            .filter(CartProducts::user_id.eq(user_id_arg))
            .filter(CartProducts::product_id.eq(product_id_arg))
            .into_boxed();
        let query = match offer_product_id_arg {
            Some(offer_product_id_arg) => query.filter(CartProducts::offer_product_id.eq(offer_product_id_arg)),
            None => query.filter(CartProducts::offer_product_id.is_null()),
        };
        query
            .first(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<CartProduct>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::CartProducts, Action::Read, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| {
                e.context(format!(
                    "Find cart product of user {} with product {} error occurred",
                    user_id_arg, product_id_arg
                )).into()
            })
    }

    fn list_for_user(&self, user_id_arg: UserId) -> RepoResult<Vec<CartProduct>> {
        debug!("List cart of user {}.", user_id_arg);
        CartProducts::cart_products
            .filter(CartProducts::user_id.eq(user_id_arg))
            .order(CartProducts::id)
            .get_results(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<CartProduct>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::CartProducts, Action::Read, self, Some(value))?;
                }
                Ok(values)
            }).map_err(|e: FailureError| e.context(format!("List cart of user {} error occurred", user_id_arg)).into())
    }

    fn create_if_absent(&self, payload: NewCartProduct) -> RepoResult<Option<CartProduct>> {
        debug!("Create cart product {:?}.", payload);
        diesel::insert_into(CartProducts::cart_products)
            .values(&payload)
            .on_conflict_do_nothing()
            .get_result::<CartProduct>(self.db_conn)
            .optional()
            .map_err(From::from)
            .and_then(|value: Option<CartProduct>| {
                if let Some(ref value) = value {
                    acl::check(&*self.acl, Resource::CartProducts, Action::Create, self, Some(value))?;
                }
                Ok(value)
            }).map_err(|e: FailureError| e.context(format!("Create cart product {:?} error occurred", payload)).into())
    }

    fn set_quantity(&self, id_arg: CartProductId, quantity: i32) -> RepoResult<CartProduct> {
        debug!("Set quantity {} of cart product {}.", quantity, id_arg);
        self.find_for_write(id_arg, Action::Update)
            .and_then(|_| {
                let filtered = CartProducts::cart_products.filter(CartProducts::id.eq(id_arg));
                diesel::update(filtered)
                    .set(&UpdateCartQuantity { quantity })
                    .get_result::<CartProduct>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Set quantity of cart product {} error occurred", id_arg)).into())
    }

    fn increment_quantity(&self, id_arg: CartProductId, delta: i32) -> RepoResult<CartProduct> {
        debug!("Increment quantity of cart product {} by {}.", id_arg, delta);
        self.find_for_write(id_arg, Action::Update)
            .and_then(|_| {
                let filtered = CartProducts::cart_products.filter(CartProducts::id.eq(id_arg));
                diesel::update(filtered)
                    .set(CartProducts::quantity.eq(CartProducts::quantity + delta))
                    .get_result::<CartProduct>(self.db_conn)
                    .map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Increment quantity of cart product {} error occurred", id_arg)).into())
    }

    fn delete(&self, id_arg: CartProductId) -> RepoResult<CartProduct> {
        debug!("Delete cart product {}.", id_arg);
        self.find_for_write(id_arg, Action::Delete)
            .and_then(|_| {
                let filtered = CartProducts::cart_products.filter(CartProducts::id.eq(id_arg));
                diesel::delete(filtered).get_result::<CartProduct>(self.db_conn).map_err(From::from)
            }).map_err(|e: FailureError| e.context(format!("Delete cart product {} error occurred", id_arg)).into())
    }

    fn clear(&self, user_id_arg: UserId) -> RepoResult<Vec<CartProduct>> {
        debug!("Clear cart of user {}.", user_id_arg);
        let filtered = CartProducts::cart_products.filter(CartProducts::user_id.eq(user_id_arg));
        diesel::delete(filtered)
            .get_results::<CartProduct>(self.db_conn)
            .map_err(From::from)
            .and_then(|values: Vec<CartProduct>| {
                for value in &values {
                    acl::check(&*self.acl, Resource::CartProducts, Action::Delete, self, Some(value))?;
                }
                Ok(values)
            }).map_err(|e: FailureError| e.context(format!("Clear cart of user {} error occurred", user_id_arg)).into())
    }
}

impl<'a, T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static> CheckScope<Scope, CartProduct>
    for CartProductsRepoImpl<'a, T>
{
    fn is_in_scope(&self, user_id: UserId, scope: &Scope, obj: Option<&CartProduct>) -> bool {
        match *scope {
            Scope::All => true,
            Scope::Owned => obj.map(|cart_product| cart_product.user_id == user_id).unwrap_or(false),
        }
    }
}
