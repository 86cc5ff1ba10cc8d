//! Auto types: cars, trucks, motorcycles, special machinery
use std::time::SystemTime;

use validator::Validate;

use models::validation_rules::*;
use schema::auto_types;
use types::AutoTypeId;

#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct AutoType {
    pub id: AutoTypeId,
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub is_active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable, Validate)]
#[table_name = "auto_types"]
pub struct NewAutoType {
    #[validate(length(min = "1", max = "100", message = "Name must not be empty"))]
    pub name: String,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    #[serde(default)]
    pub position: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, AsChangeset, Validate)]
#[table_name = "auto_types"]
pub struct UpdateAutoType {
    #[validate(length(min = "1", max = "100", message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
}
