//! Auto brands and their relations with auto types
use std::time::SystemTime;

use validator::Validate;

use models::validation_rules::*;
use schema::{auto_brands, auto_type_brand_relations};
use types::{AutoBrandId, AutoTypeBrandRelationId, AutoTypeId, IdList};

/// `active_auto_type_ids` mirrors the `auto_type_brand_relations` rows of the brand
#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct AutoBrand {
    pub id: AutoBrandId,
    pub name: String,
    pub slug: String,
    pub active_auto_type_ids: IdList,
    pub is_active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable)]
#[table_name = "auto_brands"]
pub struct NewAutoBrand {
    pub name: String,
    pub slug: String,
}

/// Payload for creating a brand, optionally linked to auto types right away
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct NewAutoBrandPayload {
    #[validate(length(min = "1", max = "100", message = "Name must not be empty"))]
    pub name: String,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    #[serde(default)]
    pub auto_type_ids: Vec<AutoTypeId>,
}

impl NewAutoBrandPayload {
    pub fn split(self) -> (NewAutoBrand, Vec<AutoTypeId>) {
        let NewAutoBrandPayload { name, slug, auto_type_ids } = self;
        (NewAutoBrand { name, slug }, auto_type_ids)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, AsChangeset, Validate)]
#[table_name = "auto_brands"]
pub struct UpdateAutoBrand {
    #[validate(length(min = "1", max = "100", message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct AutoTypeBrandRelation {
    pub id: AutoTypeBrandRelationId,
    pub auto_type_id: AutoTypeId,
    pub auto_brand_id: AutoBrandId,
    pub created_at: SystemTime,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Insertable, PartialEq, Eq, Hash)]
#[table_name = "auto_type_brand_relations"]
pub struct NewAutoTypeBrandRelation {
    pub auto_type_id: AutoTypeId,
    pub auto_brand_id: AutoBrandId,
}

/// Filter of the brand list
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct AutoBrandsQuery {
    pub auto_type_id: Option<AutoTypeId>,
}
