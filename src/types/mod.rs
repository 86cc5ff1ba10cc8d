//! Shared value types: entity ids, prices, id lists and status enums.

pub mod id_list;
pub mod statuses;

pub use self::id_list::IdList;
pub use self::statuses::*;

use std::fmt;
use std::io::Write;
use std::num::ParseIntError;
use std::str::FromStr;

use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::{Double, Integer};

macro_rules! id_newtype {
    ($($name:ident),+ $(,)*) => {$(
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, FromSqlRow, AsExpression)]
        #[sql_type = "::diesel::sql_types::Integer"]
        pub struct $name(pub i32);

        impl ToSql<Integer, Pg> for $name {
            fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
                <i32 as ToSql<Integer, Pg>>::to_sql(&self.0, out)
            }
        }

        impl FromSql<Integer, Pg> for $name {
            fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
                <i32 as FromSql<Integer, Pg>>::from_sql(bytes).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i32>().map($name)
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                $name(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    )+};
}

id_newtype!(
    UserId,
    RoleId,
    AutoTypeId,
    AutoBrandId,
    AutoModelId,
    AutoTypeBrandRelationId,
    ProductGroupId,
    ProductId,
    ProductBranchId,
    OrganizationId,
    CartProductId,
    OrderRequestId,
    RequestProductId,
    OfferId,
    OfferProductId,
    OrderId,
    NotificationId,
);

/// Unit price offered by a seller
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize, FromSqlRow, AsExpression)]
#[sql_type = "::diesel::sql_types::Double"]
pub struct ProductPrice(pub f64);

impl ToSql<Double, Pg> for ProductPrice {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Pg>) -> serialize::Result {
        <f64 as ToSql<Double, Pg>>::to_sql(&self.0, out)
    }
}

impl FromSql<Double, Pg> for ProductPrice {
    fn from_sql(bytes: Option<&[u8]>) -> deserialize::Result<Self> {
        <f64 as FromSql<Double, Pg>>::from_sql(bytes).map(ProductPrice)
    }
}

impl fmt::Display for ProductPrice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json;

    use super::*;

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let id = ProductId(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        assert_eq!(serde_json::from_str::<ProductId>("42").unwrap(), id);
    }

    #[test]
    fn ids_parse_from_path_segments() {
        assert_eq!("7".parse::<OrderId>().unwrap(), OrderId(7));
        assert!("seven".parse::<OrderId>().is_err());
    }
}
