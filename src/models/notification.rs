//! In-app notifications
use std::time::SystemTime;

use serde_json::Value;

use models::offer::Offer;
use models::order::Order;
use models::order_request::OrderRequest;
use schema::notifications;
use types::{NotificationId, NotificationKind, UserId};

#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: Option<Value>,
    pub is_read: bool,
    pub created_at: SystemTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable, PartialEq)]
#[table_name = "notifications"]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: Option<Value>,
}

impl NewNotification {
    pub fn new_order_request(seller_id: UserId, request: &OrderRequest) -> Self {
        Self {
            user_id: seller_id,
            kind: NotificationKind::NewOrderRequest,
            title: "New order request".to_string(),
            body: format!("Order request #{} matches your catalog", request.id),
            data: Some(json!({ "order_request_id": request.id })),
        }
    }

    pub fn new_offer(customer_id: UserId, offer: &Offer) -> Self {
        Self {
            user_id: customer_id,
            kind: NotificationKind::NewOffer,
            title: "New offer".to_string(),
            body: format!("You received offer #{} for order request #{}", offer.id, offer.order_request_id),
            data: Some(json!({ "offer_id": offer.id, "order_request_id": offer.order_request_id })),
        }
    }

    pub fn offer_accepted(offer: &Offer, order: &Order) -> Self {
        Self {
            user_id: offer.seller_id,
            kind: NotificationKind::OfferAccepted,
            title: "Offer accepted".to_string(),
            body: format!("Offer #{} was accepted, order #{} created", offer.id, order.id),
            data: Some(json!({ "offer_id": offer.id, "order_id": order.id })),
        }
    }

    pub fn offer_rejected(offer: &Offer) -> Self {
        Self {
            user_id: offer.seller_id,
            kind: NotificationKind::OfferRejected,
            title: "Offer rejected".to_string(),
            body: format!("Offer #{} was rejected", offer.id),
            data: Some(json!({ "offer_id": offer.id })),
        }
    }

    pub fn offer_expired(offer: &Offer) -> Self {
        Self {
            user_id: offer.seller_id,
            kind: NotificationKind::OfferExpired,
            title: "Offer expired".to_string(),
            body: format!("Offer #{} expired", offer.id),
            data: Some(json!({ "offer_id": offer.id })),
        }
    }

    pub fn order_status_changed(user_id: UserId, order: &Order) -> Self {
        Self {
            user_id,
            kind: NotificationKind::OrderStatusChanged,
            title: "Order status changed".to_string(),
            body: format!("Order #{} is now {}", order.id, order.status),
            data: Some(json!({ "order_id": order.id, "status": order.status })),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct UnreadCount {
    pub count: i64,
}
