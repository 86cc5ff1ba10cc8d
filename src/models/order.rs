//! Orders created from accepted offers, with the marketplace reward
use std::time::SystemTime;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use models::offer::{Offer, OfferProduct};
use schema::orders;
use types::{OfferId, OrderId, OrderRequestId, OrderStatus, OrganizationId, ProductPrice, UserId};

#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub order_request_id: OrderRequestId,
    pub offer_id: OfferId,
    pub customer_id: UserId,
    pub organization_id: OrganizationId,
    pub seller_id: UserId,
    pub status: OrderStatus,
    pub total_price: ProductPrice,
    pub reward_amount: Option<ProductPrice>,
    pub reward_payout_at: Option<SystemTime>,
    pub completed_at: Option<SystemTime>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "orders"]
pub struct NewOrder {
    pub order_request_id: OrderRequestId,
    pub offer_id: OfferId,
    pub customer_id: UserId,
    pub organization_id: OrganizationId,
    pub seller_id: UserId,
    pub status: OrderStatus,
    pub total_price: ProductPrice,
}

impl NewOrder {
    pub fn from_offer(offer: &Offer, customer_id: UserId, total_price: ProductPrice) -> Self {
        Self {
            order_request_id: offer.order_request_id,
            offer_id: offer.id,
            customer_id,
            organization_id: offer.organization_id,
            seller_id: offer.seller_id,
            status: OrderStatus::Created,
            total_price,
        }
    }
}

#[derive(Clone, Copy, Debug, AsChangeset)]
#[table_name = "orders"]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
    pub completed_at: Option<SystemTime>,
}

#[derive(Clone, Copy, Debug, AsChangeset)]
#[table_name = "orders"]
pub struct OrderReward {
    pub reward_amount: Option<ProductPrice>,
    pub reward_payout_at: Option<SystemTime>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SetOrderStatusPayload {
    pub status: OrderStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderWithProducts {
    pub order: Order,
    pub products: Vec<OfferProduct>,
}

/// `total * percent / 100`, rounded to cents
pub fn reward_amount(total: ProductPrice, percent: f64) -> ProductPrice {
    let total = Decimal::from_f64(total.0).unwrap_or_default();
    let percent = Decimal::from_f64(percent).unwrap_or_default();
    let reward = (total * percent / Decimal::new(100, 0)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    ProductPrice(reward.to_f64().unwrap_or_default())
}

/// Midnight UTC of `day` in the month after completion.
/// The day is clamped to the length of that month.
pub fn reward_payout_date(completed_at: SystemTime, day: u32) -> Option<SystemTime> {
    let completed = DateTime::<Utc>::from(completed_at);
    let (year, month) = if completed.month() == 12 {
        (completed.year() + 1, 1)
    } else {
        (completed.year(), completed.month() + 1)
    };
    let (after_year, after_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let month_length = NaiveDate::from_ymd_opt(after_year, after_month, 1)?.pred().day();
    let day = day.max(1).min(month_length);
    let payout = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;

    Some(SystemTime::from(DateTime::<Utc>::from_utc(payout, Utc)))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> SystemTime {
        SystemTime::from(Utc.ymd(y, m, d).and_hms(h, 0, 0))
    }

    #[test]
    fn reward_is_rounded_to_cents() {
        assert_eq!(reward_amount(ProductPrice(1000.0), 3.0), ProductPrice(30.0));
        assert_eq!(reward_amount(ProductPrice(333.33), 3.0), ProductPrice(10.0));
        assert_eq!(reward_amount(ProductPrice(19.99), 2.5), ProductPrice(0.5));
        assert_eq!(reward_amount(ProductPrice(12.5), 1.0), ProductPrice(0.13));
        assert_eq!(reward_amount(ProductPrice(0.5), 1.0), ProductPrice(0.01));
    }

    #[test]
    fn payout_is_in_next_month() {
        assert_eq!(reward_payout_date(at(2026, 3, 15, 17), 10), Some(at(2026, 4, 10, 0)));
        assert_eq!(reward_payout_date(at(2026, 12, 31, 23), 10), Some(at(2027, 1, 10, 0)));
    }

    #[test]
    fn payout_day_is_clamped_to_month_length() {
        assert_eq!(reward_payout_date(at(2026, 1, 20, 0), 31), Some(at(2026, 2, 28, 0)));
        assert_eq!(reward_payout_date(at(2028, 1, 20, 0), 30), Some(at(2028, 2, 29, 0)));
        assert_eq!(reward_payout_date(at(2026, 5, 2, 0), 0), Some(at(2026, 6, 1, 0)));
    }
}
