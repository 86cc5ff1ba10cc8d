//! Roles and lifecycle statuses stored as snake_case strings.

/// Marketplace role of a user. A user may hold several.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "::diesel::sql_types::VarChar"]
#[serde(rename_all = "snake_case")]
pub enum MarketRole {
    Superadmin,
    Manager,
    Operator,
    Seller,
    Customer,
}

text_enum_sql!(MarketRole {
    Superadmin => "superadmin",
    Manager => "manager",
    Operator => "operator",
    Seller => "seller",
    Customer => "customer",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "::diesel::sql_types::VarChar"]
#[serde(rename_all = "snake_case")]
pub enum OrderRequestStatus {
    Open,
    Processed,
    Completed,
    Canceled,
    Expired,
}

text_enum_sql!(OrderRequestStatus {
    Open => "open",
    Processed => "processed",
    Completed => "completed",
    Canceled => "canceled",
    Expired => "expired",
});

impl OrderRequestStatus {
    pub fn can_transition_to(self, next: OrderRequestStatus) -> bool {
        use self::OrderRequestStatus::*;

        match (self, next) {
            (Open, Processed) | (Processed, Completed) | (Open, Canceled) | (Processed, Canceled) | (Open, Expired) => true,
            _ => false,
        }
    }

    /// Sellers may still send offers
    pub fn accepts_offers(self) -> bool {
        self == OrderRequestStatus::Open || self == OrderRequestStatus::Processed
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "::diesel::sql_types::VarChar"]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

text_enum_sql!(OfferStatus {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
    Expired => "expired",
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "::diesel::sql_types::VarChar"]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Confirmed,
    Shipped,
    Completed,
    Canceled,
}

text_enum_sql!(OrderStatus {
    Created => "created",
    Confirmed => "confirmed",
    Shipped => "shipped",
    Completed => "completed",
    Canceled => "canceled",
});

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use self::OrderStatus::*;

        match (self, next) {
            (Created, Confirmed) | (Confirmed, Shipped) | (Shipped, Completed) => true,
            (Created, Canceled) | (Confirmed, Canceled) | (Shipped, Canceled) => true,
            _ => false,
        }
    }

    pub fn is_final(self) -> bool {
        self == OrderStatus::Completed || self == OrderStatus::Canceled
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "::diesel::sql_types::VarChar"]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOrderRequest,
    NewOffer,
    OfferAccepted,
    OfferRejected,
    OfferExpired,
    OrderStatusChanged,
}

text_enum_sql!(NotificationKind {
    NewOrderRequest => "new_order_request",
    NewOffer => "new_offer",
    OfferAccepted => "offer_accepted",
    OfferRejected => "offer_rejected",
    OfferExpired => "offer_expired",
    OrderStatusChanged => "order_status_changed",
});

#[cfg(test)]
mod tests {
    use serde_json;

    use super::*;

    #[test]
    fn text_and_json_forms_agree() {
        for kind in NotificationKind::variants() {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<NotificationKind>().unwrap(), kind);
        }
        assert!("unknown".parse::<MarketRole>().is_err());
    }

    #[test]
    fn order_status_machine() {
        use self::OrderStatus::*;

        assert!(Created.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Completed));
        assert!(Shipped.can_transition_to(Canceled));
        assert!(!Created.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Created));
        assert!(!Confirmed.can_transition_to(Confirmed));
    }

    #[test]
    fn order_request_status_machine() {
        use self::OrderRequestStatus::*;

        assert!(Open.can_transition_to(Processed));
        assert!(Open.can_transition_to(Expired));
        assert!(!Processed.can_transition_to(Expired));
        assert!(!Completed.can_transition_to(Canceled));
        assert!(Processed.accepts_offers());
        assert!(!Expired.accepts_offers());
    }
}
