//! Customer cart
use std::time::SystemTime;

use validator::Validate;

use models::offer::OfferProduct;
use models::product::Product;
use models::validation_rules::*;
use schema::cart_products;
use types::{CartProductId, OfferProductId, ProductId, ProductPrice, UserId};

#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct CartProduct {
    pub id: CartProductId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub offer_product_id: Option<OfferProductId>,
    pub quantity: i32,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable)]
#[table_name = "cart_products"]
pub struct NewCartProduct {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub offer_product_id: Option<OfferProductId>,
    pub quantity: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct NewCartProductPayload {
    pub product_id: ProductId,
    pub offer_product_id: Option<OfferProductId>,
    #[validate(custom = "validate_positive_quantity")]
    pub quantity: i32,
}

impl NewCartProductPayload {
    pub fn into_new(self, user_id: UserId) -> NewCartProduct {
        NewCartProduct {
            user_id,
            product_id: self.product_id,
            offer_product_id: self.offer_product_id,
            quantity: self.quantity,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Validate)]
pub struct SetQuantityPayload {
    #[validate(custom = "validate_positive_quantity")]
    pub quantity: i32,
}

#[derive(Clone, Copy, Debug, AsChangeset)]
#[table_name = "cart_products"]
pub struct UpdateCartQuantity {
    pub quantity: i32,
}

/// Cart row with its product and the price of the chosen offer, if any
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: CartProductId,
    pub product: Product,
    pub offer_product_id: Option<OfferProductId>,
    pub price: Option<ProductPrice>,
    pub quantity: i32,
}

impl CartItem {
    pub fn new(cart_product: CartProduct, product: Product, offer_product: Option<&OfferProduct>) -> Self {
        Self {
            id: cart_product.id,
            product,
            offer_product_id: cart_product.offer_product_id,
            price: offer_product.map(|op| op.price),
            quantity: cart_product.quantity,
        }
    }
}
