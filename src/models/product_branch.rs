//! A product branch places a product into one (auto type, auto brand,
//! auto model, group, subgroup) combination of the catalog.
use std::collections::{BTreeSet, HashSet};
use std::time::SystemTime;

use models::auto_brand::NewAutoTypeBrandRelation;
use models::auto_model::AutoModel;
use models::product::Product;
use models::product_group::ProductGroup;
use schema::product_branches;
use types::{AutoBrandId, AutoModelId, AutoTypeId, ProductBranchId, ProductGroupId, ProductId};

#[derive(Clone, Debug, Serialize, Deserialize, Queryable, PartialEq)]
pub struct ProductBranch {
    pub id: ProductBranchId,
    pub product_id: ProductId,
    pub auto_type_id: Option<AutoTypeId>,
    pub auto_brand_id: Option<AutoBrandId>,
    pub auto_model_id: Option<AutoModelId>,
    pub group_id: Option<ProductGroupId>,
    pub subgroup_id: Option<ProductGroupId>,
    pub created_at: SystemTime,
}

impl ProductBranch {
    pub fn combination(&self) -> BranchCombination {
        BranchCombination {
            auto_type_id: self.auto_type_id,
            auto_brand_id: self.auto_brand_id,
            auto_model_id: self.auto_model_id,
            group_id: self.group_id,
            subgroup_id: self.subgroup_id,
        }
    }

    /// The (auto type, auto brand) pair the branch relies on
    pub fn type_brand_pair(&self) -> Option<NewAutoTypeBrandRelation> {
        self.combination().type_brand_pair()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Insertable, PartialEq)]
#[table_name = "product_branches"]
pub struct NewProductBranch {
    pub product_id: ProductId,
    pub auto_type_id: Option<AutoTypeId>,
    pub auto_brand_id: Option<AutoBrandId>,
    pub auto_model_id: Option<AutoModelId>,
    pub group_id: Option<ProductGroupId>,
    pub subgroup_id: Option<ProductGroupId>,
}

#[derive(Clone, Debug, AsChangeset)]
#[table_name = "product_branches"]
#[changeset_options(treat_none_as_null = "true")]
pub struct UpdateProductBranch {
    pub auto_type_id: Option<AutoTypeId>,
    pub auto_brand_id: Option<AutoBrandId>,
    pub auto_model_id: Option<AutoModelId>,
    pub group_id: Option<ProductGroupId>,
    pub subgroup_id: Option<ProductGroupId>,
}

/// Catalog coordinates of a branch without the product
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BranchCombination {
    pub auto_type_id: Option<AutoTypeId>,
    pub auto_brand_id: Option<AutoBrandId>,
    pub auto_model_id: Option<AutoModelId>,
    pub group_id: Option<ProductGroupId>,
    pub subgroup_id: Option<ProductGroupId>,
}

impl BranchCombination {
    pub fn is_empty(&self) -> bool {
        *self == BranchCombination::default()
    }

    pub fn type_brand_pair(&self) -> Option<NewAutoTypeBrandRelation> {
        match (self.auto_type_id, self.auto_brand_id) {
            (Some(auto_type_id), Some(auto_brand_id)) => Some(NewAutoTypeBrandRelation {
                auto_type_id,
                auto_brand_id,
            }),
            _ => None,
        }
    }

    pub fn into_new_branch(self, product_id: ProductId) -> NewProductBranch {
        NewProductBranch {
            product_id,
            auto_type_id: self.auto_type_id,
            auto_brand_id: self.auto_brand_id,
            auto_model_id: self.auto_model_id,
            group_id: self.group_id,
            subgroup_id: self.subgroup_id,
        }
    }

    pub fn into_update(self) -> UpdateProductBranch {
        UpdateProductBranch {
            auto_type_id: self.auto_type_id,
            auto_brand_id: self.auto_brand_id,
            auto_model_id: self.auto_model_id,
            group_id: self.group_id,
            subgroup_id: self.subgroup_id,
        }
    }
}

/// Payload for adding branches. One branch is created per model,
/// or a single branch without model when the list is empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct NewBranchPayload {
    pub auto_type_id: Option<AutoTypeId>,
    pub auto_brand_id: Option<AutoBrandId>,
    #[serde(default)]
    pub auto_model_ids: Vec<AutoModelId>,
    pub group_id: Option<ProductGroupId>,
    pub subgroup_id: Option<ProductGroupId>,
}

impl NewBranchPayload {
    pub fn combinations(&self) -> Vec<BranchCombination> {
        let base = BranchCombination {
            auto_type_id: self.auto_type_id,
            auto_brand_id: self.auto_brand_id,
            auto_model_id: None,
            group_id: self.group_id,
            subgroup_id: self.subgroup_id,
        };
        if self.auto_model_ids.is_empty() {
            vec![base]
        } else {
            self.auto_model_ids
                .iter()
                .map(|model_id| BranchCombination {
                    auto_model_id: Some(*model_id),
                    ..base
                }).collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }
    }
}

/// Payload replacing the combination of one branch
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateBranchPayload {
    pub auto_type_id: Option<AutoTypeId>,
    pub auto_brand_id: Option<AutoBrandId>,
    pub auto_model_id: Option<AutoModelId>,
    pub group_id: Option<ProductGroupId>,
    pub subgroup_id: Option<ProductGroupId>,
}

impl From<UpdateBranchPayload> for BranchCombination {
    fn from(payload: UpdateBranchPayload) -> Self {
        BranchCombination {
            auto_type_id: payload.auto_type_id,
            auto_brand_id: payload.auto_brand_id,
            auto_model_id: payload.auto_model_id,
            group_id: payload.group_id,
            subgroup_id: payload.subgroup_id,
        }
    }
}

/// Catalog data needed to rebuild the branches of one product
pub struct BranchSources<'a> {
    /// Existing (auto type, auto brand) relations
    pub relations: &'a HashSet<NewAutoTypeBrandRelation>,
    /// Models listed in the product
    pub models: &'a [AutoModel],
    /// Groups and subgroups listed in the product
    pub groups: &'a [ProductGroup],
}

/// Computes the branches of a product from its own category lists.
///
/// A (type, brand) pair is used when a relation exists or when one of the
/// product models belongs to it. Pairs get one combination per matching model
/// or one without model. Types without any pair stand alone; brands without a
/// type are dropped. The vehicle part is multiplied with the group part:
/// every subgroup with its parent group, every group without selected subgroups alone.
pub fn build_branches(product: &Product, sources: &BranchSources) -> Vec<BranchCombination> {
    let type_ids: Vec<AutoTypeId> = product.auto_type_ids.ids();
    let brand_ids: Vec<AutoBrandId> = product.auto_brand_ids.ids();
    let models = sources
        .models
        .iter()
        .filter(|m| product.auto_model_ids.contains(m.id))
        .collect::<Vec<_>>();

    let mut pairs = BTreeSet::new();
    for type_id in &type_ids {
        for brand_id in &brand_ids {
            let pair = NewAutoTypeBrandRelation {
                auto_type_id: *type_id,
                auto_brand_id: *brand_id,
            };
            let has_model = models.iter().any(|m| m.auto_type_id == *type_id && m.auto_brand_id == *brand_id);
            if sources.relations.contains(&pair) || has_model {
                pairs.insert((*type_id, *brand_id));
            }
        }
    }
    for model in &models {
        pairs.insert((model.auto_type_id, model.auto_brand_id));
    }

    let mut vehicle_parts = vec![];
    for &(type_id, brand_id) in &pairs {
        let pair_models = models
            .iter()
            .filter(|m| m.auto_type_id == type_id && m.auto_brand_id == brand_id)
            .collect::<Vec<_>>();
        if pair_models.is_empty() {
            vehicle_parts.push((Some(type_id), Some(brand_id), None));
        } else {
            for model in pair_models {
                vehicle_parts.push((Some(type_id), Some(brand_id), Some(model.id)));
            }
        }
    }
    for type_id in &type_ids {
        if !pairs.iter().any(|&(t, _)| t == *type_id) {
            vehicle_parts.push((Some(*type_id), None, None));
        }
    }
    if vehicle_parts.is_empty() {
        vehicle_parts.push((None, None, None));
    }

    let mut group_parts = vec![];
    let mut groups_with_subgroups = HashSet::new();
    for subgroup in sources.groups.iter().filter(|g| product.subgroup_ids.contains(g.id)) {
        if let Some(parent_id) = subgroup.parent_id {
            groups_with_subgroups.insert(parent_id);
            group_parts.push((Some(parent_id), Some(subgroup.id)));
        }
    }
    for group_id in product.group_ids.ids::<ProductGroupId>() {
        if !groups_with_subgroups.contains(&group_id) {
            group_parts.push((Some(group_id), None));
        }
    }
    if group_parts.is_empty() {
        group_parts.push((None, None));
    }

    let mut result = BTreeSet::new();
    for &(auto_type_id, auto_brand_id, auto_model_id) in &vehicle_parts {
        for &(group_id, subgroup_id) in &group_parts {
            let combination = BranchCombination {
                auto_type_id,
                auto_brand_id,
                auto_model_id,
                group_id,
                subgroup_id,
            };
            if !combination.is_empty() {
                result.insert(combination);
            }
        }
    }

    result.into_iter().collect()
}

/// Difference between the stored and the computed branches of a product
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BranchesDiff {
    pub to_delete: Vec<ProductBranchId>,
    pub to_create: Vec<BranchCombination>,
}

impl BranchesDiff {
    pub fn compute(existing: &[ProductBranch], wanted: &[BranchCombination]) -> Self {
        let wanted_set = wanted.iter().cloned().collect::<HashSet<_>>();
        let mut kept = HashSet::new();
        let mut to_delete = vec![];
        for branch in existing {
            let combination = branch.combination();
            if wanted_set.contains(&combination) && kept.insert(combination) {
                continue;
            }
            to_delete.push(branch.id);
        }
        let to_create = wanted.iter().filter(|c| !kept.contains(*c)).cloned().collect();

        Self { to_delete, to_create }
    }

    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_create.is_empty()
    }
}

/// Result of rebuilding the branches of all products
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TransformBranchesReport {
    pub products_scanned: usize,
    pub products_changed: usize,
    pub branches_created: usize,
    pub branches_deleted: usize,
    pub products_failed: usize,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::SystemTime;

    use super::*;
    use types::*;

    fn product(types: Vec<i32>, brands: Vec<i32>, models: Vec<i32>, groups: Vec<i32>, subgroups: Vec<i32>) -> Product {
        Product {
            id: ProductId(1),
            name: "Oil filter".to_string(),
            article: "W712".to_string(),
            manufacturer: None,
            description: None,
            auto_type_ids: types.into_iter().collect(),
            auto_brand_ids: brands.into_iter().collect(),
            auto_model_ids: models.into_iter().collect(),
            group_ids: groups.into_iter().collect(),
            subgroup_ids: subgroups.into_iter().collect(),
            is_active: true,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn model(id: i32, auto_type: i32, brand: i32) -> AutoModel {
        AutoModel {
            id: AutoModelId(id),
            name: format!("model {}", id),
            slug: format!("model-{}", id),
            auto_type_id: AutoTypeId(auto_type),
            auto_brand_id: AutoBrandId(brand),
            is_active: true,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn group(id: i32, parent: Option<i32>) -> ProductGroup {
        ProductGroup {
            id: ProductGroupId(id),
            name: format!("group {}", id),
            slug: format!("group-{}", id),
            parent_id: parent.map(ProductGroupId),
            auto_type_ids: IdList::new(),
            auto_brand_ids: IdList::new(),
            position: 0,
            is_active: true,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
        }
    }

    fn relations(pairs: &[(i32, i32)]) -> HashSet<NewAutoTypeBrandRelation> {
        pairs
            .iter()
            .map(|&(t, b)| NewAutoTypeBrandRelation {
                auto_type_id: AutoTypeId(t),
                auto_brand_id: AutoBrandId(b),
            }).collect()
    }

    fn combination(t: Option<i32>, b: Option<i32>, m: Option<i32>, g: Option<i32>, s: Option<i32>) -> BranchCombination {
        BranchCombination {
            auto_type_id: t.map(AutoTypeId),
            auto_brand_id: b.map(AutoBrandId),
            auto_model_id: m.map(AutoModelId),
            group_id: g.map(ProductGroupId),
            subgroup_id: s.map(ProductGroupId),
        }
    }

    #[test]
    fn empty_product_has_no_branches() {
        let rel = relations(&[]);
        let sources = BranchSources {
            relations: &rel,
            models: &[],
            groups: &[],
        };
        assert!(build_branches(&product(vec![], vec![], vec![], vec![], vec![]), &sources).is_empty());
    }

    #[test]
    fn related_pairs_are_multiplied_with_groups() {
        let rel = relations(&[(1, 10), (2, 20)]);
        let groups = vec![group(5, None), group(6, Some(5)), group(7, None)];
        let sources = BranchSources {
            relations: &rel,
            models: &[],
            groups: &groups,
        };
        let p = product(vec![1, 2], vec![10, 20], vec![], vec![5, 7], vec![6]);
        let branches = build_branches(&p, &sources);
        assert_eq!(
            branches,
            vec![
                combination(Some(1), Some(10), None, Some(5), Some(6)),
                combination(Some(1), Some(10), None, Some(7), None),
                combination(Some(2), Some(20), None, Some(5), Some(6)),
                combination(Some(2), Some(20), None, Some(7), None),
            ]
        );
    }

    #[test]
    fn models_split_pairs_and_imply_relations() {
        let rel = relations(&[]);
        let models = vec![model(100, 1, 10), model(101, 1, 10), model(200, 3, 30)];
        let sources = BranchSources {
            relations: &rel,
            models: &models,
            groups: &[],
        };
        let p = product(vec![1], vec![10], vec![100, 101, 200], vec![], vec![]);
        let branches = build_branches(&p, &sources);
        assert_eq!(
            branches,
            vec![
                combination(Some(1), Some(10), Some(100), None, None),
                combination(Some(1), Some(10), Some(101), None, None),
                combination(Some(3), Some(30), Some(200), None, None),
            ]
        );
    }

    #[test]
    fn lonely_types_stay_and_lonely_brands_go() {
        let rel = relations(&[(1, 10)]);
        let sources = BranchSources {
            relations: &rel,
            models: &[],
            groups: &[],
        };
        let p = product(vec![1, 2], vec![10, 99], vec![], vec![], vec![]);
        let branches = build_branches(&p, &sources);
        assert_eq!(
            branches,
            vec![
                combination(Some(1), Some(10), None, None, None),
                combination(Some(2), None, None, None, None),
            ]
        );
    }

    #[test]
    fn subgroup_brings_its_parent() {
        let rel = relations(&[]);
        let groups = vec![group(5, None), group(6, Some(5))];
        let sources = BranchSources {
            relations: &rel,
            models: &[],
            groups: &groups,
        };
        let p = product(vec![], vec![], vec![], vec![], vec![6]);
        assert_eq!(
            build_branches(&p, &sources),
            vec![combination(None, None, None, Some(5), Some(6))]
        );
    }

    #[test]
    fn payload_creates_one_combination_per_model() {
        let payload = NewBranchPayload {
            auto_type_id: Some(AutoTypeId(1)),
            auto_brand_id: Some(AutoBrandId(10)),
            auto_model_ids: vec![AutoModelId(101), AutoModelId(100), AutoModelId(101)],
            group_id: Some(ProductGroupId(5)),
            subgroup_id: None,
        };
        assert_eq!(
            payload.combinations(),
            vec![
                combination(Some(1), Some(10), Some(100), Some(5), None),
                combination(Some(1), Some(10), Some(101), Some(5), None),
            ]
        );
        let without_models = NewBranchPayload {
            auto_model_ids: vec![],
            ..payload
        };
        assert_eq!(without_models.combinations().len(), 1);
    }

    #[test]
    fn diff_keeps_matching_branches_and_drops_duplicates() {
        let existing = vec![
            ProductBranch {
                id: ProductBranchId(1),
                product_id: ProductId(1),
                auto_type_id: Some(AutoTypeId(1)),
                auto_brand_id: Some(AutoBrandId(10)),
                auto_model_id: None,
                group_id: None,
                subgroup_id: None,
                created_at: SystemTime::now(),
            },
            ProductBranch {
                id: ProductBranchId(2),
                product_id: ProductId(1),
                auto_type_id: Some(AutoTypeId(1)),
                auto_brand_id: Some(AutoBrandId(10)),
                auto_model_id: None,
                group_id: None,
                subgroup_id: None,
                created_at: SystemTime::now(),
            },
            ProductBranch {
                id: ProductBranchId(3),
                product_id: ProductId(1),
                auto_type_id: Some(AutoTypeId(2)),
                auto_brand_id: None,
                auto_model_id: None,
                group_id: None,
                subgroup_id: None,
                created_at: SystemTime::now(),
            },
        ];
        let wanted = vec![
            combination(Some(1), Some(10), None, None, None),
            combination(Some(3), None, None, None, None),
        ];
        let diff = BranchesDiff::compute(&existing, &wanted);
        assert_eq!(diff.to_delete, vec![ProductBranchId(2), ProductBranchId(3)]);
        assert_eq!(diff.to_create, vec![combination(Some(3), None, None, None, None)]);

        let unchanged = BranchesDiff::compute(&existing[..1], &wanted[..1]);
        assert!(unchanged.is_empty());
    }
}
