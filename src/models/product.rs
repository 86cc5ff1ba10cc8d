//! Products (auto parts)
use std::time::SystemTime;

use validator::Validate;

use models::product_branch::{NewBranchPayload, ProductBranch};
use schema::products;
use types::{IdList, ProductId};

/// The id lists are derived from the product branches, see `ProductCategories`
#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub article: String,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub auto_type_ids: IdList,
    pub auto_brand_ids: IdList,
    pub auto_model_ids: IdList,
    pub group_ids: IdList,
    pub subgroup_ids: IdList,
    pub is_active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable)]
#[table_name = "products"]
pub struct NewProduct {
    pub name: String,
    pub article: String,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub auto_type_ids: IdList,
    pub auto_brand_ids: IdList,
    pub auto_model_ids: IdList,
    pub group_ids: IdList,
    pub subgroup_ids: IdList,
}

/// Payload for creating a product together with its first branches
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct NewProductPayload {
    #[validate(length(min = "1", max = "250", message = "Name must not be empty"))]
    pub name: String,
    #[validate(length(min = "1", max = "100", message = "Article must not be empty"))]
    pub article: String,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub branches: Vec<NewBranchPayload>,
}

impl NewProductPayload {
    pub fn split(self) -> (NewProduct, Vec<NewBranchPayload>) {
        let NewProductPayload {
            name,
            article,
            manufacturer,
            description,
            branches,
        } = self;
        let product = NewProduct {
            name,
            article: article.trim().to_uppercase(),
            manufacturer,
            description,
            auto_type_ids: IdList::new(),
            auto_brand_ids: IdList::new(),
            auto_model_ids: IdList::new(),
            group_ids: IdList::new(),
            subgroup_ids: IdList::new(),
        };
        (product, branches)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, AsChangeset, Validate)]
#[table_name = "products"]
pub struct UpdateProduct {
    #[validate(length(min = "1", max = "250", message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = "1", max = "100", message = "Article must not be empty"))]
    pub article: Option<String>,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Denormalized category lists of a product
#[derive(Clone, Debug, Default, Serialize, Deserialize, AsChangeset, PartialEq)]
#[table_name = "products"]
pub struct ProductCategories {
    pub auto_type_ids: IdList,
    pub auto_brand_ids: IdList,
    pub auto_model_ids: IdList,
    pub group_ids: IdList,
    pub subgroup_ids: IdList,
}

impl ProductCategories {
    /// Union of the non-empty branch columns, sorted
    pub fn from_branches(branches: &[ProductBranch]) -> Self {
        let auto_type_ids = branches.iter().filter_map(|b| b.auto_type_id).collect::<IdList>();
        let auto_brand_ids = branches.iter().filter_map(|b| b.auto_brand_id).collect::<IdList>();
        let auto_model_ids = branches.iter().filter_map(|b| b.auto_model_id).collect::<IdList>();
        let group_ids = branches.iter().filter_map(|b| b.group_id).collect::<IdList>();
        let subgroup_ids = branches.iter().filter_map(|b| b.subgroup_id).collect::<IdList>();

        Self {
            auto_type_ids: auto_type_ids.normalized(),
            auto_brand_ids: auto_brand_ids.normalized(),
            auto_model_ids: auto_model_ids.normalized(),
            group_ids: group_ids.normalized(),
            subgroup_ids: subgroup_ids.normalized(),
        }
    }

    pub fn of(product: &Product) -> Self {
        Self {
            auto_type_ids: product.auto_type_ids.clone(),
            auto_brand_ids: product.auto_brand_ids.clone(),
            auto_model_ids: product.auto_model_ids.clone(),
            group_ids: product.group_ids.clone(),
            subgroup_ids: product.subgroup_ids.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProductWithBranches {
    pub product: Product,
    pub branches: Vec<ProductBranch>,
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use types::*;

    fn branch(id: i32, auto_type: Option<i32>, brand: Option<i32>, model: Option<i32>, group: Option<i32>, subgroup: Option<i32>) -> ProductBranch {
        ProductBranch {
            id: ProductBranchId(id),
            product_id: ProductId(1),
            auto_type_id: auto_type.map(AutoTypeId),
            auto_brand_id: brand.map(AutoBrandId),
            auto_model_id: model.map(AutoModelId),
            group_id: group.map(ProductGroupId),
            subgroup_id: subgroup.map(ProductGroupId),
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn lists_are_derived_from_branches() {
        let branches = vec![
            branch(1, Some(2), Some(10), Some(100), Some(5), Some(6)),
            branch(2, Some(1), Some(10), None, Some(5), None),
            branch(3, Some(2), None, None, None, None),
        ];
        let categories = ProductCategories::from_branches(&branches);
        assert_eq!(categories.auto_type_ids.as_slice(), &[1, 2]);
        assert_eq!(categories.auto_brand_ids.as_slice(), &[10]);
        assert_eq!(categories.auto_model_ids.as_slice(), &[100]);
        assert_eq!(categories.group_ids.as_slice(), &[5]);
        assert_eq!(categories.subgroup_ids.as_slice(), &[6]);
    }

    #[test]
    fn no_branches_no_categories() {
        assert_eq!(ProductCategories::from_branches(&[]), ProductCategories::default());
    }

    #[test]
    fn article_is_normalized_on_create() {
        let payload = NewProductPayload {
            name: "Brake pad".to_string(),
            article: " gdb1330 ".to_string(),
            manufacturer: Some("TRW".to_string()),
            description: None,
            branches: vec![],
        };
        let (product, branches) = payload.split();
        assert_eq!(product.article, "GDB1330");
        assert!(branches.is_empty());
        assert!(product.group_ids.is_empty());
    }
}
