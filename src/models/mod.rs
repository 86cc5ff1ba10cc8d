//! Models contains all structures that are used in different
//! modules of the app

pub mod authorization;
pub mod auto_brand;
pub mod auto_model;
pub mod auto_type;
pub mod cart_product;
pub mod matching;
pub mod notification;
pub mod offer;
pub mod order;
pub mod order_request;
pub mod organization;
pub mod pagination;
pub mod product;
pub mod product_branch;
pub mod product_group;
pub mod user_role;
pub mod validation_rules;

pub use self::authorization::*;
pub use self::auto_brand::*;
pub use self::auto_model::*;
pub use self::auto_type::*;
pub use self::cart_product::*;
pub use self::matching::*;
pub use self::notification::*;
pub use self::offer::*;
pub use self::order::*;
pub use self::order_request::*;
pub use self::organization::*;
pub use self::pagination::*;
pub use self::product::*;
pub use self::product_branch::*;
pub use self::product_group::*;
pub use self::user_role::*;
pub use self::validation_rules::*;
