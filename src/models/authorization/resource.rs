//! Enum for resources available in ACLs
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Resource {
    AutoBrands,
    AutoModels,
    AutoTypes,
    CartProducts,
    Notifications,
    Offers,
    OrderRequests,
    Orders,
    Organizations,
    ProductBranches,
    ProductGroups,
    Products,
    UserRoles,
}

impl Resource {
    /// Catalog resources are public for reading
    pub fn is_catalog(self) -> bool {
        match self {
            Resource::AutoTypes
            | Resource::AutoBrands
            | Resource::AutoModels
            | Resource::ProductGroups
            | Resource::Products
            | Resource::ProductBranches => true,
            _ => false,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Resource::AutoBrands => write!(f, "auto brands"),
            Resource::AutoModels => write!(f, "auto models"),
            Resource::AutoTypes => write!(f, "auto types"),
            Resource::CartProducts => write!(f, "cart products"),
            Resource::Notifications => write!(f, "notifications"),
            Resource::Offers => write!(f, "offers"),
            Resource::OrderRequests => write!(f, "order requests"),
            Resource::Orders => write!(f, "orders"),
            Resource::Organizations => write!(f, "organizations"),
            Resource::ProductBranches => write!(f, "product branches"),
            Resource::ProductGroups => write!(f, "product groups"),
            Resource::Products => write!(f, "products"),
            Resource::UserRoles => write!(f, "user roles"),
        }
    }
}
