//! Customer order requests and their items
use std::time::SystemTime;

use validator::{Validate, ValidationErrors};

use models::cart_product::CartProduct;
use models::product::Product;
use models::validation_rules::*;
use schema::{order_request_products, order_requests};
use types::{
    AutoBrandId, AutoTypeId, IdList, OrderRequestId, OrderRequestStatus, OrganizationId, ProductGroupId, ProductId, RequestProductId,
    UserId,
};

/// `seller_ids` holds the organizations matched to the request
#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct OrderRequest {
    pub id: OrderRequestId,
    pub customer_id: UserId,
    pub status: OrderRequestStatus,
    pub comment: Option<String>,
    pub delivery_address: Option<String>,
    pub seller_ids: IdList,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl OrderRequest {
    pub fn is_matched_with(&self, organization_id: OrganizationId) -> bool {
        self.seller_ids.contains(organization_id)
    }
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "order_requests"]
pub struct NewOrderRequest {
    pub customer_id: UserId,
    pub status: OrderRequestStatus,
    pub comment: Option<String>,
    pub delivery_address: Option<String>,
    pub seller_ids: IdList,
}

#[derive(Clone, Debug, AsChangeset)]
#[table_name = "order_requests"]
pub struct UpdateOrderRequestSellers {
    pub seller_ids: IdList,
}

#[derive(Clone, Copy, Debug, AsChangeset)]
#[table_name = "order_requests"]
pub struct UpdateOrderRequestStatus {
    pub status: OrderRequestStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct RequestProduct {
    pub id: RequestProductId,
    pub order_request_id: OrderRequestId,
    pub product_id: Option<ProductId>,
    pub name: String,
    pub article: Option<String>,
    pub quantity: i32,
    pub auto_type_id: Option<AutoTypeId>,
    pub auto_brand_id: Option<AutoBrandId>,
    pub group_id: Option<ProductGroupId>,
    pub created_at: SystemTime,
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "order_request_products"]
pub struct NewRequestProduct {
    pub order_request_id: OrderRequestId,
    pub product_id: Option<ProductId>,
    pub name: String,
    pub article: Option<String>,
    pub quantity: i32,
    pub auto_type_id: Option<AutoTypeId>,
    pub auto_brand_id: Option<AutoBrandId>,
    pub group_id: Option<ProductGroupId>,
}

/// Requested item. Either a catalog product or a free-form part described by name.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct NewRequestItem {
    pub product_id: Option<ProductId>,
    #[validate(length(min = "1", max = "250", message = "Name must not be empty"))]
    pub name: Option<String>,
    pub article: Option<String>,
    #[validate(custom = "validate_positive_quantity")]
    pub quantity: i32,
    pub auto_type_id: Option<AutoTypeId>,
    pub auto_brand_id: Option<AutoBrandId>,
    pub group_id: Option<ProductGroupId>,
}

impl NewRequestItem {
    /// Builds the row, taking the name and article of the linked product when absent
    pub fn into_new(self, order_request_id: OrderRequestId, product: Option<&Product>) -> NewRequestProduct {
        let name = self
            .name
            .or_else(|| product.map(|p| p.name.clone()))
            .unwrap_or_default();
        let article = self.article.or_else(|| product.map(|p| p.article.clone()));
        NewRequestProduct {
            order_request_id,
            product_id: self.product_id,
            name,
            article,
            quantity: self.quantity,
            auto_type_id: self.auto_type_id,
            auto_brand_id: self.auto_brand_id,
            group_id: self.group_id,
        }
    }
}

impl<'a> From<&'a CartProduct> for NewRequestItem {
    fn from(cart_product: &'a CartProduct) -> Self {
        Self {
            product_id: Some(cart_product.product_id),
            name: None,
            article: None,
            quantity: cart_product.quantity,
            auto_type_id: None,
            auto_brand_id: None,
            group_id: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct NewOrderRequestPayload {
    #[validate(length(max = "1000", message = "Comment is too long"))]
    pub comment: Option<String>,
    #[validate(length(max = "500", message = "Address is too long"))]
    pub delivery_address: Option<String>,
    #[validate(length(min = "1", message = "At least one item is required"))]
    pub items: Vec<NewRequestItem>,
}

impl NewOrderRequestPayload {
    /// Validates the payload together with every item
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        self.validate()?;
        for item in &self.items {
            item.validate()?;
            if item.product_id.is_none() && item.name.is_none() {
                return Err(validation_errors!({
                    "items": ["items" => "Every item needs a product or a name"]
                }));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct FromCartPayload {
    #[validate(length(max = "1000", message = "Comment is too long"))]
    pub comment: Option<String>,
    #[validate(length(max = "500", message = "Address is too long"))]
    pub delivery_address: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OrderRequestWithProducts {
    pub order_request: OrderRequest,
    pub products: Vec<RequestProduct>,
}

/// Result of recomputing the sellers of open requests
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TransformOrdersReport {
    pub requests_scanned: usize,
    pub requests_changed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: Option<i32>, name: Option<&str>, quantity: i32) -> NewRequestItem {
        NewRequestItem {
            product_id: product_id.map(ProductId),
            name: name.map(|n| n.to_string()),
            article: None,
            quantity,
            auto_type_id: None,
            auto_brand_id: None,
            group_id: None,
        }
    }

    fn payload(items: Vec<NewRequestItem>) -> NewOrderRequestPayload {
        NewOrderRequestPayload {
            comment: None,
            delivery_address: None,
            items,
        }
    }

    #[test]
    fn request_needs_items() {
        assert!(payload(vec![]).validate_all().is_err());
        assert!(payload(vec![item(Some(1), None, 2)]).validate_all().is_ok());
    }

    #[test]
    fn items_need_product_or_name_and_quantity() {
        assert!(payload(vec![item(None, None, 1)]).validate_all().is_err());
        assert!(payload(vec![item(None, Some("Timing belt"), 1)]).validate_all().is_ok());
        assert!(payload(vec![item(None, Some("Timing belt"), 0)]).validate_all().is_err());
    }

    #[test]
    fn free_form_item_keeps_its_name() {
        let row = item(None, Some("Timing belt"), 3).into_new(OrderRequestId(5), None);
        assert_eq!(row.name, "Timing belt");
        assert_eq!(row.order_request_id, OrderRequestId(5));
        assert_eq!(row.quantity, 3);
    }
}
