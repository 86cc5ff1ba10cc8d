//! Cart of the current user

use std::collections::HashMap;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{CartItem, CartProduct, NewCartProductPayload};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::{current_user, found, invalid, Service};
use types::{CartProductId, OfferProductId, ProductId};

pub trait CartService {
    /// Cart items with their products and offer prices
    fn get_cart(&self) -> ServiceFuture<Vec<CartItem>>;
    /// Adds a product to the cart. Adding the same product and offer again
    /// increases the quantity of the existing item.
    fn add_cart_product(&self, payload: NewCartProductPayload) -> ServiceFuture<CartProduct>;
    fn set_cart_product_quantity(&self, id: CartProductId, quantity: i32) -> ServiceFuture<CartProduct>;
    fn delete_cart_product(&self, id: CartProductId) -> ServiceFuture<CartProduct>;
    fn clear_cart(&self) -> ServiceFuture<Vec<CartProduct>>;
}

fn check_quantity(quantity: i32, max: i32) -> Result<(), FailureError> {
    if quantity < 1 || quantity > max {
        return Err(invalid(
            "quantity",
            "Quantity is out of range",
            format!("Quantity {} is not in 1..={}.", quantity, max),
        ));
    }
    Ok(())
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > CartService for Service<T, M, F>
{
    fn get_cart(&self) -> ServiceFuture<Vec<CartItem>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let cart_repo = repo_factory.create_cart_products_repo(&*conn, user_id);
            let products_repo = repo_factory.create_products_repo(&*conn, user_id);
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            current_user(user_id)
                .and_then(|owner| {
                    let cart = cart_repo.list_for_user(owner)?;
                    let product_ids = cart.iter().map(|c| c.product_id).collect::<Vec<ProductId>>();
                    let products = products_repo
                        .find_many(&product_ids)?
                        .into_iter()
                        .map(|p| (p.id, p))
                        .collect::<HashMap<_, _>>();
                    let offer_product_ids = cart.iter().filter_map(|c| c.offer_product_id).collect::<Vec<OfferProductId>>();
                    let offer_products = if offer_product_ids.is_empty() {
                        HashMap::new()
                    } else {
                        offers_repo
                            .find_products(&offer_product_ids)?
                            .into_iter()
                            .map(|op| (op.id, op))
                            .collect::<HashMap<_, _>>()
                    };

                    Ok(cart
                        .into_iter()
                        .filter_map(|cart_product| {
                            let product = products.get(&cart_product.product_id)?.clone();
                            let offer_product = cart_product.offer_product_id.and_then(|id| offer_products.get(&id));
                            Some(CartItem::new(cart_product, product, offer_product))
                        }).collect())
                }).map_err(|e: FailureError| e.context("Service Cart, get endpoint error occurred.").into())
        })
    }

    fn add_cart_product(&self, payload: NewCartProductPayload) -> ServiceFuture<CartProduct> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();
        let max_quantity = self.static_context.config.marketplace.max_cart_quantity;

        self.spawn_on_pool(move |conn| {
            let cart_repo = repo_factory.create_cart_products_repo(&*conn, user_id);
            let products_repo = repo_factory.create_products_repo(&*conn, user_id);
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            conn.transaction::<CartProduct, FailureError, _>(move || {
                let owner = current_user(user_id)?;
                check_quantity(payload.quantity, max_quantity)?;
                let product = found(products_repo.find(payload.product_id)?, "Product", payload.product_id)?;
                if !product.is_active {
                    return Err(invalid(
                        "product_id",
                        "Product is not available",
                        format!("Product {} is deactivated.", product.id),
                    ));
                }
                if let Some(offer_product_id) = payload.offer_product_id {
                    let offer_products = offers_repo.find_products(&[offer_product_id])?;
                    found(offer_products.into_iter().next(), "Offer product", offer_product_id)?;
                }

                let (product_id, offer_product_id, quantity) = (payload.product_id, payload.offer_product_id, payload.quantity);
                let existing = match cart_repo.find_same(owner, product_id, offer_product_id)? {
                    Some(existing) => existing,
                    None => match cart_repo.create_if_absent(payload.into_new(owner))? {
                        Some(created) => return Ok(created),
                        // inserted by a concurrent request in the meantime
                        None => found(cart_repo.find_same(owner, product_id, offer_product_id)?, "Cart product", product_id)?,
                    },
                };
                let updated = cart_repo.increment_quantity(existing.id, quantity)?;
                check_quantity(updated.quantity, max_quantity)?;
                Ok(updated)
            }).map_err(|e| e.context("Service Cart, add endpoint error occurred.").into())
        })
    }

    fn set_cart_product_quantity(&self, id: CartProductId, quantity: i32) -> ServiceFuture<CartProduct> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();
        let max_quantity = self.static_context.config.marketplace.max_cart_quantity;

        self.spawn_on_pool(move |conn| {
            let cart_repo = repo_factory.create_cart_products_repo(&*conn, user_id);
            conn.transaction::<CartProduct, FailureError, _>(move || {
                check_quantity(quantity, max_quantity)?;
                found(cart_repo.find(id)?, "Cart product", id)?;
                cart_repo.set_quantity(id, quantity)
            }).map_err(|e| e.context("Service Cart, set_quantity endpoint error occurred.").into())
        })
    }

    fn delete_cart_product(&self, id: CartProductId) -> ServiceFuture<CartProduct> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let cart_repo = repo_factory.create_cart_products_repo(&*conn, user_id);
            conn.transaction::<CartProduct, FailureError, _>(move || {
                found(cart_repo.find(id)?, "Cart product", id)?;
                cart_repo.delete(id)
            }).map_err(|e| e.context("Service Cart, delete endpoint error occurred.").into())
        })
    }

    fn clear_cart(&self) -> ServiceFuture<Vec<CartProduct>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let cart_repo = repo_factory.create_cart_products_repo(&*conn, user_id);
            current_user(user_id)
                .and_then(|owner| cart_repo.clear(owner))
                .map_err(|e: FailureError| e.context("Service Cart, clear endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::cart::CartService;
    use types::*;

    fn payload(product_id: ProductId, quantity: i32) -> NewCartProductPayload {
        NewCartProductPayload {
            product_id,
            offer_product_id: None,
            quantity,
        }
    }

    #[test]
    fn test_added_product_is_in_cart_once() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let added = core.run(service.add_cart_product(payload(ProductId(1), 1))).unwrap();
        assert_eq!(added.product_id, ProductId(1));

        let cart = core.run(service.get_cart()).unwrap();
        assert_eq!(cart.iter().filter(|item| item.product.id == ProductId(1)).count(), 1);
        assert_eq!(cart[0].price, Some(ProductPrice(10.5)));
    }

    #[test]
    fn test_adding_same_product_increments_quantity() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.add_cart_product(payload(MOCK_PRODUCT_IN_CART_ID, 3))).unwrap();
        assert_eq!(result.id, CartProductId(3));
        assert_eq!(result.quantity, MOCK_PRODUCT_IN_CART_QUANTITY + 3);
    }

    #[test]
    fn test_item_inserted_concurrently_is_incremented() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let factory = ReposFactoryMock::default();
        let service = create_service_with_factory(Some(MOCK_USER_ID), handle, factory.clone());
        let result = core.run(service.add_cart_product(payload(MOCK_RACED_PRODUCT_ID, 2))).unwrap();
        assert_eq!(result.product_id, MOCK_RACED_PRODUCT_ID);
        assert_eq!(result.quantity, MOCK_RACED_PRODUCT_QUANTITY + 2);
        assert_eq!(factory.cart.lock().unwrap().insert_conflicts, 1);
    }

    #[test]
    fn test_increment_over_limit_is_refused() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core.run(service.add_cart_product(payload(MOCK_PRODUCT_IN_CART_ID, 998))).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_inactive_product_is_refused() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core.run(service.add_cart_product(payload(MOCK_INACTIVE_PRODUCT_ID, 1))).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_quantity_limits() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core.run(service.add_cart_product(payload(ProductId(1), 1000))).unwrap_err();
        assert!(is_validation_error(&err));
        let err = core.run(service.set_cart_product_quantity(CartProductId(1), 0)).unwrap_err();
        assert!(is_validation_error(&err));
        let result = core.run(service.set_cart_product_quantity(CartProductId(1), 7)).unwrap();
        assert_eq!(result.quantity, 7);
    }

    #[test]
    fn test_missing_cart_product() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core.run(service.delete_cart_product(CartProductId(MOCK_MISSING_ID))).unwrap_err();
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_anonymous_user_has_no_cart() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(None, handle);
        let err = core.run(service.get_cart()).unwrap_err();
        assert!(is_forbidden(&err));
    }
}
