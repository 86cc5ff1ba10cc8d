//! Repos is a module responsible for interacting with postgres db
#[macro_use]
pub mod acl;
pub mod auto_brands;
pub mod auto_models;
pub mod auto_type_brand_relations;
pub mod auto_types;
pub mod cart_products;
pub mod notifications;
pub mod offers;
pub mod order_requests;
pub mod orders;
pub mod organizations;
pub mod product_branches;
pub mod product_groups;
pub mod product_groups_cache;
pub mod products;
pub mod repo_factory;
pub mod types;
pub mod user_roles;

pub use self::acl::*;
pub use self::auto_brands::*;
pub use self::auto_models::*;
pub use self::auto_type_brand_relations::*;
pub use self::auto_types::*;
pub use self::cart_products::*;
pub use self::notifications::*;
pub use self::offers::*;
pub use self::order_requests::*;
pub use self::orders::*;
pub use self::organizations::*;
pub use self::product_branches::*;
pub use self::product_groups::*;
pub use self::product_groups_cache::*;
pub use self::products::*;
pub use self::repo_factory::*;
pub use self::types::*;
pub use self::user_roles::*;
