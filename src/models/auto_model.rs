//! Auto models belong to exactly one (auto type, auto brand) pair
use std::time::SystemTime;

use validator::Validate;

use models::validation_rules::*;
use schema::auto_models;
use types::{AutoBrandId, AutoModelId, AutoTypeId};

#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct AutoModel {
    pub id: AutoModelId,
    pub name: String,
    pub slug: String,
    pub auto_type_id: AutoTypeId,
    pub auto_brand_id: AutoBrandId,
    pub is_active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable, Validate)]
#[table_name = "auto_models"]
pub struct NewAutoModel {
    #[validate(length(min = "1", max = "100", message = "Name must not be empty"))]
    pub name: String,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    pub auto_type_id: AutoTypeId,
    pub auto_brand_id: AutoBrandId,
}

#[derive(Clone, Debug, Serialize, Deserialize, AsChangeset, Validate)]
#[table_name = "auto_models"]
pub struct UpdateAutoModel {
    #[validate(length(min = "1", max = "100", message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct AutoModelsQuery {
    pub auto_type_id: Option<AutoTypeId>,
    pub auto_brand_id: Option<AutoBrandId>,
}
