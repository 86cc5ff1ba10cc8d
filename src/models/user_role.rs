//! Models for managing Roles
use std::time::SystemTime;

use types::{MarketRole, RoleId, UserId};

use schema::user_roles;

#[derive(Clone, Debug, Serialize, Deserialize, Queryable)]
pub struct UserRole {
    pub id: RoleId,
    pub user_id: UserId,
    pub name: MarketRole,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable)]
#[table_name = "user_roles"]
pub struct NewUserRole {
    pub user_id: UserId,
    pub name: MarketRole,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoveUserRole {
    pub user_id: UserId,
    pub name: MarketRole,
}
