//! Product groups form a two-level tree: groups and their subgroups
use std::time::SystemTime;

use validator::Validate;

use models::validation_rules::*;
use schema::product_groups;
use types::{IdList, ProductGroupId};

/// `auto_type_ids` and `auto_brand_ids` list the types and brands of the
/// product branches placed into the group or subgroup
#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct ProductGroup {
    pub id: ProductGroupId,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<ProductGroupId>,
    pub auto_type_ids: IdList,
    pub auto_brand_ids: IdList,
    pub position: i32,
    pub is_active: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl ProductGroup {
    pub fn is_subgroup(&self) -> bool {
        self.parent_id.is_some()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable, Validate)]
#[table_name = "product_groups"]
pub struct NewProductGroup {
    #[validate(length(min = "1", max = "150", message = "Name must not be empty"))]
    pub name: String,
    #[validate(custom = "validate_slug")]
    pub slug: String,
    pub parent_id: Option<ProductGroupId>,
    #[serde(default)]
    pub position: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, AsChangeset, Validate)]
#[table_name = "product_groups"]
pub struct UpdateProductGroup {
    #[validate(length(min = "1", max = "150", message = "Name must not be empty"))]
    pub name: Option<String>,
    #[validate(custom = "validate_slug")]
    pub slug: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize, AsChangeset)]
#[table_name = "product_groups"]
pub struct ProductGroupCategories {
    pub auto_type_ids: IdList,
    pub auto_brand_ids: IdList,
}

/// Node of the groups tree served to clients
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProductGroupNode {
    pub id: ProductGroupId,
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub auto_type_ids: IdList,
    pub auto_brand_ids: IdList,
    pub children: Vec<ProductGroupNode>,
}

impl<'a> From<&'a ProductGroup> for ProductGroupNode {
    fn from(group: &'a ProductGroup) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            slug: group.slug.clone(),
            position: group.position,
            auto_type_ids: group.auto_type_ids.clone(),
            auto_brand_ids: group.auto_brand_ids.clone(),
            children: vec![],
        }
    }
}

/// Builds the tree of active groups ordered by position, then id.
/// Subgroups of inactive or missing groups are dropped.
pub fn build_groups_tree(groups: &[ProductGroup]) -> Vec<ProductGroupNode> {
    let mut active = groups.iter().filter(|g| g.is_active).collect::<Vec<_>>();
    active.sort_by_key(|g| (g.position, g.id));

    active
        .iter()
        .filter(|g| g.parent_id.is_none())
        .map(|root| {
            let mut node = ProductGroupNode::from(*root);
            node.children = active
                .iter()
                .filter(|child| child.parent_id == Some(root.id))
                .map(|child| ProductGroupNode::from(*child))
                .collect();
            node
        }).collect()
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use types::{IdList, ProductGroupId};

    fn group(id: i32, parent_id: Option<i32>, position: i32, is_active: bool) -> ProductGroup {
        ProductGroup {
            id: ProductGroupId(id),
            name: format!("group {}", id),
            slug: format!("group-{}", id),
            parent_id: parent_id.map(ProductGroupId),
            auto_type_ids: IdList::new(),
            auto_brand_ids: IdList::new(),
            position,
            is_active,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    #[test]
    fn tree_is_sorted_and_nested() {
        let groups = vec![
            group(1, None, 2, true),
            group(2, None, 1, true),
            group(3, Some(1), 0, true),
            group(4, Some(1), 0, true),
            group(5, Some(2), 5, true),
        ];
        let tree = build_groups_tree(&groups);
        assert_eq!(tree.iter().map(|n| n.id.0).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(tree[1].children.iter().map(|n| n.id.0).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(tree[0].children.len(), 1);
    }

    #[test]
    fn inactive_groups_hide_their_subgroups() {
        let groups = vec![group(1, None, 0, false), group(2, Some(1), 0, true), group(3, None, 0, true)];
        let tree = build_groups_tree(&groups);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, ProductGroupId(3));
        assert!(tree[0].children.is_empty());
    }
}
