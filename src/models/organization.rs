//! Seller organizations
use std::time::SystemTime;

use validator::Validate;

use models::validation_rules::*;
use schema::organizations;
use types::{IdList, OrganizationId, UserId};

/// The three id lists describe which parts the organization sells.
/// An empty list means "any".
#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct Organization {
    pub id: OrganizationId,
    pub user_id: UserId,
    pub name: String,
    pub inn: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub auto_type_ids: IdList,
    pub auto_brand_ids: IdList,
    pub product_group_ids: IdList,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct NewOrganizationPayload {
    #[validate(length(min = "1", max = "250", message = "Name must not be empty"))]
    pub name: String,
    #[validate(custom = "validate_inn")]
    pub inn: String,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
}

impl NewOrganizationPayload {
    pub fn into_new(self, user_id: UserId) -> NewOrganization {
        NewOrganization {
            user_id,
            name: self.name,
            inn: self.inn,
            phone: self.phone,
            email: self.email,
            address: self.address,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable)]
#[table_name = "organizations"]
pub struct NewOrganization {
    pub user_id: UserId,
    pub name: String,
    pub inn: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, AsChangeset, Validate)]
#[table_name = "organizations"]
pub struct UpdateOrganization {
    #[validate(length(min = "1", max = "250", message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(custom = "validate_inn")]
    pub inn: Option<String>,
    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

/// What an organization sells
#[derive(Clone, Debug, Default, Serialize, Deserialize, AsChangeset, PartialEq)]
#[table_name = "organizations"]
pub struct SellerProductCategories {
    #[serde(default)]
    pub auto_type_ids: IdList,
    #[serde(default)]
    pub auto_brand_ids: IdList,
    #[serde(default)]
    pub product_group_ids: IdList,
}

impl SellerProductCategories {
    pub fn normalized(&self) -> Self {
        Self {
            auto_type_ids: self.auto_type_ids.normalized(),
            auto_brand_ids: self.auto_brand_ids.normalized(),
            product_group_ids: self.product_group_ids.normalized(),
        }
    }

    pub fn of(organization: &Organization) -> Self {
        Self {
            auto_type_ids: organization.auto_type_ids.clone(),
            auto_brand_ids: organization.auto_brand_ids.clone(),
            product_group_ids: organization.product_group_ids.clone(),
        }
    }
}

/// Result of `update_seller_product_categories`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SellerCategoriesUpdate {
    pub organization: Organization,
    pub added_to_requests: usize,
    pub removed_from_requests: usize,
}
