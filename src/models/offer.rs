//! Seller offers answering order requests
use std::time::{Duration, SystemTime};

use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use validator::{Validate, ValidationErrors};

use models::validation_rules::*;
use schema::{offer_products, offers};
use types::{OfferId, OfferProductId, OfferStatus, OrderRequestId, OrganizationId, ProductPrice, RequestProductId, UserId};

#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct Offer {
    pub id: OfferId,
    pub order_request_id: OrderRequestId,
    pub organization_id: OrganizationId,
    pub seller_id: UserId,
    pub status: OfferStatus,
    pub delivery_days: i32,
    pub comment: Option<String>,
    pub expires_at: SystemTime,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Offer {
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expires_at <= now
    }
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "offers"]
pub struct NewOffer {
    pub order_request_id: OrderRequestId,
    pub organization_id: OrganizationId,
    pub seller_id: UserId,
    pub status: OfferStatus,
    pub delivery_days: i32,
    pub comment: Option<String>,
    pub expires_at: SystemTime,
}

#[derive(Clone, Copy, Debug, AsChangeset)]
#[table_name = "offers"]
pub struct UpdateOfferStatus {
    pub status: OfferStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct OfferProduct {
    pub id: OfferProductId,
    pub offer_id: OfferId,
    pub request_product_id: RequestProductId,
    pub price: ProductPrice,
    pub quantity: i32,
    pub created_at: SystemTime,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "offer_products"]
pub struct NewOfferProduct {
    pub offer_id: OfferId,
    pub request_product_id: RequestProductId,
    pub price: ProductPrice,
    pub quantity: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct NewOfferItem {
    pub request_product_id: RequestProductId,
    #[validate(custom = "validate_positive_price")]
    pub price: ProductPrice,
    #[validate(custom = "validate_positive_quantity")]
    pub quantity: i32,
}

impl NewOfferItem {
    pub fn into_new(self, offer_id: OfferId) -> NewOfferProduct {
        NewOfferProduct {
            offer_id,
            request_product_id: self.request_product_id,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct NewOfferPayload {
    pub order_request_id: OrderRequestId,
    pub organization_id: OrganizationId,
    #[validate(custom = "validate_delivery_days")]
    pub delivery_days: i32,
    #[validate(length(max = "1000", message = "Comment is too long"))]
    pub comment: Option<String>,
    #[validate(length(min = "1", message = "At least one item is required"))]
    pub items: Vec<NewOfferItem>,
}

impl NewOfferPayload {
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        self.validate()?;
        for item in &self.items {
            item.validate()?;
        }
        let mut ids = self.items.iter().map(|i| i.request_product_id).collect::<Vec<_>>();
        ids.sort();
        ids.dedup();
        if ids.len() != self.items.len() {
            return Err(validation_errors!({
                "items": ["items" => "Every requested item may be offered only once"]
            }));
        }
        Ok(())
    }

    pub fn new_offer(&self, seller_id: UserId, now: SystemTime, ttl: Duration) -> NewOffer {
        NewOffer {
            order_request_id: self.order_request_id,
            organization_id: self.organization_id,
            seller_id,
            status: OfferStatus::Pending,
            delivery_days: self.delivery_days,
            comment: self.comment.clone(),
            expires_at: now + ttl,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OfferWithProducts {
    pub offer: Offer,
    pub products: Vec<OfferProduct>,
    pub total_price: ProductPrice,
}

impl OfferWithProducts {
    pub fn new(offer: Offer, products: Vec<OfferProduct>) -> Self {
        let total_price = total_price(&products);
        Self {
            offer,
            products,
            total_price,
        }
    }
}

/// Sum of price x quantity, rounded to cents
pub fn total_price(products: &[OfferProduct]) -> ProductPrice {
    let total = products.iter().fold(Decimal::new(0, 0), |acc, p| {
        let price = Decimal::from_f64(p.price.0).unwrap_or_default();
        acc + price * Decimal::from(p.quantity)
    });
    ProductPrice(total.round_dp(2).to_f64().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;

    fn offer_product(price: f64, quantity: i32) -> OfferProduct {
        OfferProduct {
            id: OfferProductId(1),
            offer_id: OfferId(1),
            request_product_id: RequestProductId(1),
            price: ProductPrice(price),
            quantity,
            created_at: SystemTime::now(),
        }
    }

    fn item(request_product_id: i32, price: f64, quantity: i32) -> NewOfferItem {
        NewOfferItem {
            request_product_id: RequestProductId(request_product_id),
            price: ProductPrice(price),
            quantity,
        }
    }

    fn payload(items: Vec<NewOfferItem>) -> NewOfferPayload {
        NewOfferPayload {
            order_request_id: OrderRequestId(1),
            organization_id: OrganizationId(1),
            delivery_days: 3,
            comment: None,
            items,
        }
    }

    #[test]
    fn total_is_exact_in_cents() {
        let products = vec![offer_product(0.1, 3), offer_product(19.99, 2)];
        assert_eq!(total_price(&products), ProductPrice(40.28));
        assert_eq!(total_price(&[]), ProductPrice(0.0));
    }

    #[test]
    fn offer_items_are_validated() {
        assert!(payload(vec![item(1, 10.0, 1)]).validate_all().is_ok());
        assert!(payload(vec![]).validate_all().is_err());
        assert!(payload(vec![item(1, 0.0, 1)]).validate_all().is_err());
        assert!(payload(vec![item(1, 10.0, 0)]).validate_all().is_err());
        assert!(payload(vec![item(1, 10.0, 1), item(1, 12.0, 1)]).validate_all().is_err());
    }

    #[test]
    fn new_offer_expires_after_ttl() {
        let now = SystemTime::now();
        let offer = payload(vec![item(1, 10.0, 1)]).new_offer(UserId(7), now, Duration::from_secs(60));
        assert_eq!(offer.expires_at, now + Duration::from_secs(60));
        assert_eq!(offer.status, OfferStatus::Pending);
        assert_eq!(offer.seller_id, UserId(7));
    }
}
