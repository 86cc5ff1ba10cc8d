//! Matching of seller organizations against order request items
use models::organization::Organization;
use models::order_request::RequestProduct;
use models::product::Product;
use types::{AutoBrandId, AutoTypeId, IdList, ProductGroupId};

/// Catalog dimensions of one requested item. An empty list means the
/// item says nothing about that dimension.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemDimensions {
    pub auto_type_ids: IdList,
    pub auto_brand_ids: IdList,
    pub group_ids: IdList,
}

impl ItemDimensions {
    /// Explicit ids win, the linked product fills the rest
    pub fn new(
        auto_type_id: Option<AutoTypeId>,
        auto_brand_id: Option<AutoBrandId>,
        group_id: Option<ProductGroupId>,
        product: Option<&Product>,
    ) -> Self {
        let auto_type_ids = match (auto_type_id, product) {
            (Some(id), _) => vec![id].into_iter().collect(),
            (None, Some(p)) => p.auto_type_ids.clone(),
            (None, None) => IdList::new(),
        };
        let auto_brand_ids = match (auto_brand_id, product) {
            (Some(id), _) => vec![id].into_iter().collect(),
            (None, Some(p)) => p.auto_brand_ids.clone(),
            (None, None) => IdList::new(),
        };
        let group_ids = match (group_id, product) {
            (Some(id), _) => vec![id].into_iter().collect(),
            (None, Some(p)) => p.group_ids.union(&p.subgroup_ids),
            (None, None) => IdList::new(),
        };

        Self {
            auto_type_ids,
            auto_brand_ids,
            group_ids,
        }
    }

    pub fn of_request_product(item: &RequestProduct, product: Option<&Product>) -> Self {
        Self::new(item.auto_type_id, item.auto_brand_id, item.group_id, product)
    }
}

fn dimension_matches(seller: &IdList, item: &IdList) -> bool {
    seller.is_empty() || item.is_empty() || seller.intersects(item)
}

pub fn organization_matches_item(organization: &Organization, item: &ItemDimensions) -> bool {
    dimension_matches(&organization.auto_type_ids, &item.auto_type_ids)
        && dimension_matches(&organization.auto_brand_ids, &item.auto_brand_ids)
        && dimension_matches(&organization.product_group_ids, &item.group_ids)
}

/// Active organizations match a request when at least one item matches
pub fn organization_matches_request(organization: &Organization, items: &[ItemDimensions]) -> bool {
    organization.is_active && items.iter().any(|item| organization_matches_item(organization, item))
}

/// Ids of the matching organizations, sorted
pub fn match_organizations(organizations: &[Organization], items: &[ItemDimensions]) -> IdList {
    organizations
        .iter()
        .filter(|org| organization_matches_request(org, items))
        .map(|org| org.id)
        .collect::<IdList>()
        .normalized()
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use types::*;

    fn organization(id: i32, types: Vec<i32>, brands: Vec<i32>, groups: Vec<i32>) -> Organization {
        Organization {
            id: OrganizationId(id),
            user_id: UserId(id * 10),
            name: format!("seller {}", id),
            inn: "7707083893".to_string(),
            phone: None,
            email: None,
            address: None,
            is_active: true,
            auto_type_ids: types.into_iter().collect(),
            auto_brand_ids: brands.into_iter().collect(),
            product_group_ids: groups.into_iter().collect(),
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn product(types: Vec<i32>, brands: Vec<i32>, groups: Vec<i32>, subgroups: Vec<i32>) -> Product {
        Product {
            id: ProductId(1),
            name: "Spark plug".to_string(),
            article: "BKR6E".to_string(),
            manufacturer: None,
            description: None,
            auto_type_ids: types.into_iter().collect(),
            auto_brand_ids: brands.into_iter().collect(),
            auto_model_ids: IdList::new(),
            group_ids: groups.into_iter().collect(),
            subgroup_ids: subgroups.into_iter().collect(),
            is_active: true,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    #[test]
    fn empty_seller_lists_match_everything() {
        let org = organization(1, vec![], vec![], vec![]);
        let item = ItemDimensions::new(Some(AutoTypeId(1)), Some(AutoBrandId(2)), Some(ProductGroupId(3)), None);
        assert!(organization_matches_item(&org, &item));
    }

    #[test]
    fn item_without_dimension_matches_any_seller() {
        let org = organization(1, vec![1], vec![2], vec![3]);
        let item = ItemDimensions::new(None, None, None, None);
        assert!(organization_matches_item(&org, &item));
    }

    #[test]
    fn every_dimension_must_intersect() {
        let org = organization(1, vec![1], vec![2], vec![3]);
        let matching = ItemDimensions::new(Some(AutoTypeId(1)), Some(AutoBrandId(2)), None, None);
        let wrong_brand = ItemDimensions::new(Some(AutoTypeId(1)), Some(AutoBrandId(5)), None, None);
        assert!(organization_matches_item(&org, &matching));
        assert!(!organization_matches_item(&org, &wrong_brand));
    }

    #[test]
    fn product_lists_fill_missing_dimensions() {
        let p = product(vec![1, 4], vec![7], vec![3], vec![9]);
        let item = ItemDimensions::new(None, Some(AutoBrandId(8)), None, Some(&p));
        assert_eq!(item.auto_type_ids.as_slice(), &[1, 4]);
        assert_eq!(item.auto_brand_ids.as_slice(), &[8]);
        assert_eq!(item.group_ids.as_slice(), &[3, 9]);

        let org = organization(1, vec![], vec![], vec![9]);
        assert!(organization_matches_item(&org, &item));
    }

    #[test]
    fn inactive_organizations_never_match() {
        let mut inactive = organization(2, vec![], vec![], vec![]);
        inactive.is_active = false;
        let orgs = vec![organization(3, vec![5], vec![], vec![]), inactive, organization(1, vec![], vec![], vec![])];
        let items = vec![
            ItemDimensions::new(Some(AutoTypeId(1)), None, None, None),
            ItemDimensions::new(Some(AutoTypeId(5)), None, None, None),
        ];
        assert_eq!(match_organizations(&orgs, &items).as_slice(), &[1, 3]);
        assert!(match_organizations(&orgs, &[]).is_empty());
    }
}
