//! Product branches service. Every branch change keeps three denormalized
//! places in sync inside the same transaction: the id lists of the product,
//! the id lists of the touched groups and the auto type / auto brand relations
//! (with `active_auto_type_ids` of the brand).

use std::collections::{BTreeSet, HashSet};

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{
    build_branches, BranchCombination, BranchSources, BranchesDiff, NewAutoTypeBrandRelation, NewBranchPayload, Product,
    ProductBranch, ProductCategories, TransformBranchesReport, UpdateBranchPayload,
};
use repos::{
    AutoBrandsRepo, AutoModelsRepo, AutoTypeBrandRelationsRepo, AutoTypesRepo, ProductBranchesRepo, ProductGroupsRepo, ProductsRepo,
    ReposFactory, RepoResult,
};
use services::auto_brands::sync_active_auto_types;
use services::product_groups::refresh_groups;
use services::types::ServiceFuture;
use services::{found, invalid, Service};
use types::{AutoBrandId, AutoModelId, AutoTypeId, ProductBranchId, ProductGroupId, ProductId, UserId};

/// Products read per batch by `transform_products_branches`
pub const TRANSFORM_BATCH_SIZE: i64 = 100;

pub trait ProductBranchesService {
    /// Adds branches to a product, one per auto model of the payload
    fn create_product_branch(&self, product_id: ProductId, payload: NewBranchPayload) -> ServiceFuture<Vec<ProductBranch>>;
    /// Replaces the combination of a branch
    fn update_product_branch(&self, id: ProductBranchId, payload: UpdateBranchPayload) -> ServiceFuture<ProductBranch>;
    fn delete_product_branch(&self, id: ProductBranchId) -> ServiceFuture<ProductBranch>;
    fn list_product_branches(&self, product_id: ProductId) -> ServiceFuture<Vec<ProductBranch>>;
    /// Rebuilds the branches of every product from its own id lists
    fn transform_products_branches(&self) -> ServiceFuture<TransformBranchesReport>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ProductBranchesService for Service<T, M, F>
{
    fn create_product_branch(&self, product_id: ProductId, payload: NewBranchPayload) -> ServiceFuture<Vec<ProductBranch>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let repos = CatalogRepos::new(&repo_factory, &*conn, user_id);
            let cache = repo_factory.product_groups_cache();
            conn.transaction::<Vec<ProductBranch>, FailureError, _>(move || {
                found(repos.products_repo.find(product_id)?, "Product", product_id)?;
                let created = repos.create_branches(product_id, &payload)?;
                repos.refresh_product(product_id)?;
                repos.refresh_groups(touched_groups(created.iter().map(ProductBranch::combination)))?;
                cache.clear();
                Ok(created)
            }).map_err(|e| e.context("Service ProductBranches, create endpoint error occurred.").into())
        })
    }

    fn update_product_branch(&self, id: ProductBranchId, payload: UpdateBranchPayload) -> ServiceFuture<ProductBranch> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let repos = CatalogRepos::new(&repo_factory, &*conn, user_id);
            let cache = repo_factory.product_groups_cache();
            conn.transaction::<ProductBranch, FailureError, _>(move || {
                let branch = found(repos.branches_repo.find(id)?, "Product branch", id)?;
                let old = branch.combination();
                let new = BranchCombination::from(payload);
                if old == new {
                    return Ok(branch);
                }
                if new.is_empty() {
                    return Err(invalid(
                        "auto_type_id",
                        "Branch must reference the catalog",
                        format!("Branch {} would reference nothing.", id),
                    ));
                }
                repos.validate_combination(&new)?;
                let siblings = repos.branches_repo.list_for_product(branch.product_id)?;
                if siblings.iter().any(|b| b.id != id && b.combination() == new) {
                    return Err(invalid(
                        "auto_type_id",
                        "Product already has this branch",
                        format!("Product {} already has a branch with the same combination.", branch.product_id),
                    ));
                }

                let updated = repos.branches_repo.update(id, new.into_update())?;
                if old.type_brand_pair() != new.type_brand_pair() {
                    if let Some(pair) = old.type_brand_pair() {
                        repos.release_relation(pair)?;
                    }
                }
                repos.ensure_relation(&new)?;
                repos.refresh_product(branch.product_id)?;
                repos.refresh_groups(touched_groups(vec![old, new]))?;
                cache.clear();
                Ok(updated)
            }).map_err(|e| e.context("Service ProductBranches, update endpoint error occurred.").into())
        })
    }

    fn delete_product_branch(&self, id: ProductBranchId) -> ServiceFuture<ProductBranch> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let repos = CatalogRepos::new(&repo_factory, &*conn, user_id);
            let cache = repo_factory.product_groups_cache();
            conn.transaction::<ProductBranch, FailureError, _>(move || {
                found(repos.branches_repo.find(id)?, "Product branch", id)?;
                let deleted = repos.branches_repo.delete(id)?;
                if let Some(pair) = deleted.type_brand_pair() {
                    repos.release_relation(pair)?;
                }
                repos.refresh_product(deleted.product_id)?;
                repos.refresh_groups(touched_groups(vec![deleted.combination()]))?;
                cache.clear();
                Ok(deleted)
            }).map_err(|e| e.context("Service ProductBranches, delete endpoint error occurred.").into())
        })
    }

    fn list_product_branches(&self, product_id: ProductId) -> ServiceFuture<Vec<ProductBranch>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let branches_repo = repo_factory.create_product_branches_repo(&*conn, user_id);
            branches_repo
                .list_for_product(product_id)
                .map_err(|e| e.context("Service ProductBranches, list endpoint error occurred.").into())
        })
    }

    fn transform_products_branches(&self) -> ServiceFuture<TransformBranchesReport> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let repos = CatalogRepos::new(&repo_factory, &*conn, user_id);
            let mut relations = repos
                .relations_repo
                .list_all()
                .map_err(|e| e.context("Service ProductBranches, transform endpoint error occurred."))?
                .into_iter()
                .map(|relation| NewAutoTypeBrandRelation {
                    auto_type_id: relation.auto_type_id,
                    auto_brand_id: relation.auto_brand_id,
                }).collect::<HashSet<_>>();

            let mut report = TransformBranchesReport::default();
            let mut from = ProductId(0);
            loop {
                let products = repos
                    .products_repo
                    .list_batch(from, TRANSFORM_BATCH_SIZE)
                    .map_err(|e| e.context("Service ProductBranches, transform endpoint error occurred."))?;
                let last = match products.last() {
                    Some(product) => product.id,
                    None => break,
                };
                for product in products {
                    report.products_scanned += 1;
                    let result = conn.transaction::<_, FailureError, _>(|| repos.transform_product(&product, &relations));
                    match result {
                        Ok(Some(outcome)) => {
                            report.products_changed += 1;
                            report.branches_created += outcome.created;
                            report.branches_deleted += outcome.deleted;
                            relations.extend(outcome.new_relations);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            error!("Could not rebuild branches of product {}: {}", product.id, e);
                            report.products_failed += 1;
                        }
                    }
                }
                from = last;
            }
            repo_factory.product_groups_cache().clear();
            info!("Product branches rebuilt: {:?}", report);
            Ok(report)
        })
    }
}

/// Groups and subgroups referenced by the combinations
fn touched_groups<I: IntoIterator<Item = BranchCombination>>(combinations: I) -> BTreeSet<ProductGroupId> {
    combinations
        .into_iter()
        .flat_map(|c| c.group_id.into_iter().chain(c.subgroup_id))
        .collect()
}

/// Outcome of rebuilding the branches of one product
pub struct ProductTransform {
    pub created: usize,
    pub deleted: usize,
    pub new_relations: Vec<NewAutoTypeBrandRelation>,
}

/// Repos involved in branch bookkeeping, bound to one connection
pub struct CatalogRepos<'a> {
    pub products_repo: Box<ProductsRepo + 'a>,
    pub branches_repo: Box<ProductBranchesRepo + 'a>,
    pub relations_repo: Box<AutoTypeBrandRelationsRepo + 'a>,
    pub auto_types_repo: Box<AutoTypesRepo + 'a>,
    pub auto_brands_repo: Box<AutoBrandsRepo + 'a>,
    pub auto_models_repo: Box<AutoModelsRepo + 'a>,
    pub groups_repo: Box<ProductGroupsRepo + 'a>,
}

impl<'a> CatalogRepos<'a> {
    pub fn new<C, F>(repo_factory: &F, db_conn: &'a C, user_id: Option<UserId>) -> Self
    where
        C: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        F: ReposFactory<C>,
    {
        Self {
            products_repo: repo_factory.create_products_repo(db_conn, user_id),
            branches_repo: repo_factory.create_product_branches_repo(db_conn, user_id),
            relations_repo: repo_factory.create_auto_type_brand_relations_repo(db_conn, user_id),
            auto_types_repo: repo_factory.create_auto_types_repo(db_conn, user_id),
            auto_brands_repo: repo_factory.create_auto_brands_repo(db_conn, user_id),
            auto_models_repo: repo_factory.create_auto_models_repo(db_conn, user_id),
            groups_repo: repo_factory.create_product_groups_repo(db_conn, user_id),
        }
    }

    /// Checks that the combination references existing catalog entries
    /// that fit together
    pub fn validate_combination(&self, combination: &BranchCombination) -> Result<(), FailureError> {
        if let Some(auto_type_id) = combination.auto_type_id {
            self.require_auto_type(auto_type_id)?;
        }
        if let Some(auto_brand_id) = combination.auto_brand_id {
            if combination.auto_type_id.is_none() {
                return Err(invalid(
                    "auto_brand_id",
                    "Auto brand requires an auto type",
                    format!("Auto brand {} is given without auto type.", auto_brand_id),
                ));
            }
            self.require_auto_brand(auto_brand_id)?;
        }
        if let Some(auto_model_id) = combination.auto_model_id {
            self.require_model_fits(auto_model_id, combination.auto_type_id, combination.auto_brand_id)?;
        }
        if let Some(group_id) = combination.group_id {
            let group = self.groups_repo.find(group_id)?.ok_or_else(|| {
                invalid("group_id", "Unknown product group", format!("Product group {} does not exist.", group_id))
            })?;
            if group.is_subgroup() {
                return Err(invalid(
                    "group_id",
                    "Product group is a subgroup",
                    format!("Product group {} is a subgroup.", group_id),
                ));
            }
        }
        if let Some(subgroup_id) = combination.subgroup_id {
            let group_id = combination.group_id.ok_or_else(|| {
                invalid(
                    "group_id",
                    "Subgroup requires a group",
                    format!("Subgroup {} is given without group.", subgroup_id),
                )
            })?;
            let subgroup = self.groups_repo.find(subgroup_id)?.ok_or_else(|| {
                invalid("subgroup_id", "Unknown product group", format!("Product group {} does not exist.", subgroup_id))
            })?;
            if subgroup.parent_id != Some(group_id) {
                return Err(invalid(
                    "subgroup_id",
                    "Subgroup does not belong to the group",
                    format!("Product group {} is not a subgroup of {}.", subgroup_id, group_id),
                ));
            }
        }
        Ok(())
    }

    fn require_auto_type(&self, auto_type_id: AutoTypeId) -> Result<(), FailureError> {
        match self.auto_types_repo.find(auto_type_id)? {
            Some(_) => Ok(()),
            None => Err(invalid(
                "auto_type_id",
                "Unknown auto type",
                format!("Auto type {} does not exist.", auto_type_id),
            )),
        }
    }

    fn require_auto_brand(&self, auto_brand_id: AutoBrandId) -> Result<(), FailureError> {
        match self.auto_brands_repo.find(auto_brand_id)? {
            Some(_) => Ok(()),
            None => Err(invalid(
                "auto_brand_id",
                "Unknown auto brand",
                format!("Auto brand {} does not exist.", auto_brand_id),
            )),
        }
    }

    fn require_model_fits(
        &self,
        auto_model_id: AutoModelId,
        auto_type_id: Option<AutoTypeId>,
        auto_brand_id: Option<AutoBrandId>,
    ) -> Result<(), FailureError> {
        let model = self.auto_models_repo.find(auto_model_id)?.ok_or_else(|| {
            invalid(
                "auto_model_ids",
                "Unknown auto model",
                format!("Auto model {} does not exist.", auto_model_id),
            )
        })?;
        if Some(model.auto_type_id) != auto_type_id || Some(model.auto_brand_id) != auto_brand_id {
            return Err(invalid(
                "auto_model_ids",
                "Auto model does not belong to the auto type and brand",
                format!(
                    "Auto model {} belongs to auto type {} and brand {}.",
                    auto_model_id, model.auto_type_id, model.auto_brand_id
                ),
            ));
        }
        Ok(())
    }

    /// Creates the relation of the pair if it is missing. Returns the pair
    /// when it had to be created.
    pub fn ensure_relation(&self, combination: &BranchCombination) -> RepoResult<Option<NewAutoTypeBrandRelation>> {
        match combination.type_brand_pair() {
            Some(pair) => {
                let (_, created) = self.relations_repo.ensure(pair)?;
                if created {
                    sync_active_auto_types(&*self.auto_brands_repo, &*self.relations_repo, pair.auto_brand_id)?;
                    Ok(Some(pair))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// Drops the relation of the pair once no branch uses it
    pub fn release_relation(&self, pair: NewAutoTypeBrandRelation) -> RepoResult<()> {
        if self.branches_repo.count_for_pair(pair.auto_type_id, pair.auto_brand_id)? == 0 {
            if self.relations_repo.delete(pair.auto_type_id, pair.auto_brand_id)?.is_some() {
                sync_active_auto_types(&*self.auto_brands_repo, &*self.relations_repo, pair.auto_brand_id)?;
            }
        }
        Ok(())
    }

    /// Validates and inserts the branches of the payload, skipping
    /// combinations the product already has
    pub fn create_branches(&self, product_id: ProductId, payload: &NewBranchPayload) -> Result<Vec<ProductBranch>, FailureError> {
        let combinations = payload.combinations();
        if combinations.iter().any(BranchCombination::is_empty) {
            return Err(invalid(
                "auto_type_id",
                "Branch must reference the catalog",
                format!("Branch of product {} would reference nothing.", product_id),
            ));
        }
        for combination in &combinations {
            self.validate_combination(combination)?;
        }

        let existing = self
            .branches_repo
            .list_for_product(product_id)?
            .into_iter()
            .map(|branch| branch.combination())
            .collect::<HashSet<_>>();
        let fresh = combinations.into_iter().filter(|c| !existing.contains(c)).collect::<Vec<_>>();
        if fresh.is_empty() {
            return Ok(vec![]);
        }
        for combination in &fresh {
            self.ensure_relation(combination)?;
        }
        self.branches_repo
            .create_many(fresh.into_iter().map(|c| c.into_new_branch(product_id)).collect())
    }

    /// Rewrites the id lists of the product from its branches
    pub fn refresh_product(&self, product_id: ProductId) -> RepoResult<Product> {
        let branches = self.branches_repo.list_for_product(product_id)?;
        self.products_repo
            .set_categories(product_id, ProductCategories::from_branches(&branches))
    }

    pub fn refresh_groups<I: IntoIterator<Item = ProductGroupId>>(&self, ids: I) -> RepoResult<()> {
        refresh_groups(&*self.groups_repo, &*self.branches_repo, ids).map(|_| ())
    }

    /// Replaces the branches of the product with the ones built from its
    /// id lists. Returns `None` when nothing changed.
    pub fn transform_product(
        &self,
        product: &Product,
        relations: &HashSet<NewAutoTypeBrandRelation>,
    ) -> Result<Option<ProductTransform>, FailureError> {
        let models = self.auto_models_repo.find_many(&product.auto_model_ids.ids::<AutoModelId>())?;
        let groups = self.groups_repo.find_many(&product.subgroup_ids.ids::<ProductGroupId>())?;
        let wanted = build_branches(
            product,
            &BranchSources {
                relations,
                models: &models,
                groups: &groups,
            },
        );
        let existing = self.branches_repo.list_for_product(product.id)?;
        let diff = BranchesDiff::compute(&existing, &wanted);
        if diff.is_empty() {
            return Ok(None);
        }

        let deleted = self.branches_repo.delete_many(&diff.to_delete)?;
        let mut new_relations = vec![];
        for combination in &diff.to_create {
            if let Some(pair) = self.ensure_relation(combination)? {
                new_relations.push(pair);
            }
        }
        let created = self
            .branches_repo
            .create_many(diff.to_create.iter().map(|c| c.into_new_branch(product.id)).collect())?;

        self.refresh_product(product.id)?;
        let touched = touched_groups(
            deleted
                .iter()
                .map(ProductBranch::combination)
                .chain(created.iter().map(ProductBranch::combination)),
        );
        self.refresh_groups(touched)?;

        Ok(Some(ProductTransform {
            created: created.len(),
            deleted: deleted.len(),
            new_relations,
        }))
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::product_branches::ProductBranchesService;
    use types::*;

    fn payload(auto_type: Option<i32>, brand: Option<i32>, models: Vec<i32>, group: Option<i32>, subgroup: Option<i32>) -> NewBranchPayload {
        NewBranchPayload {
            auto_type_id: auto_type.map(AutoTypeId),
            auto_brand_id: brand.map(AutoBrandId),
            auto_model_ids: models.into_iter().map(AutoModelId).collect(),
            group_id: group.map(ProductGroupId),
            subgroup_id: subgroup.map(ProductGroupId),
        }
    }

    #[test]
    fn test_create_branch_per_model() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.create_product_branch(ProductId(1), payload(Some(1), Some(1), vec![1, 7], Some(1), Some(2)));
        let result = core.run(work).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|b| b.subgroup_id == Some(ProductGroupId(2))));
    }

    #[test]
    fn test_existing_combination_is_skipped() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.create_product_branch(ProductId(1), payload(Some(1), Some(1), vec![], Some(1), None));
        let result = core.run(work).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_brand_requires_type() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.create_product_branch(ProductId(1), payload(None, Some(1), vec![], Some(1), None));
        let err = core.run(work).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_model_must_fit_type_and_brand() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.create_product_branch(ProductId(1), payload(Some(2), Some(1), vec![1], None, None));
        let err = core.run(work).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_subgroup_must_belong_to_group() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.create_product_branch(ProductId(1), payload(Some(1), None, vec![], Some(1), Some(4)));
        let err = core.run(work).unwrap_err();
        assert!(is_validation_error(&err));

        let work = service.create_product_branch(ProductId(1), payload(Some(1), None, vec![], None, Some(2)));
        let err = core.run(work).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_branch_of_missing_product() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.create_product_branch(ProductId(MOCK_MISSING_ID), payload(Some(1), None, vec![], None, None));
        let err = core.run(work).unwrap_err();
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_update_branch() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let update = UpdateBranchPayload {
            auto_type_id: Some(AutoTypeId(1)),
            auto_brand_id: Some(AutoBrandId(1)),
            auto_model_id: Some(AutoModelId(1)),
            group_id: Some(ProductGroupId(3)),
            subgroup_id: None,
        };
        let result = core.run(service.update_product_branch(ProductBranchId(1), update)).unwrap();
        assert_eq!(result.auto_model_id, Some(AutoModelId(1)));
        assert_eq!(result.group_id, Some(ProductGroupId(3)));
    }

    #[test]
    fn test_delete_branch() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let factory = ReposFactoryMock::default();
        let service = create_service_with_factory(Some(MOCK_USER_ID), handle, factory.clone());
        let result = core.run(service.delete_product_branch(ProductBranchId(1))).unwrap();
        assert_eq!(result.id, ProductBranchId(1));

        // the last branch of (type 1, brand 1) is gone, so is the relation
        {
            let catalog = factory.catalog.lock().unwrap();
            assert!(catalog.unlinked.contains(&(1, 1)));
            let active = &catalog.active_auto_types[&1];
            assert!(!active.as_slice().contains(&1));
        }

        let err = core
            .run(service.delete_product_branch(ProductBranchId(MOCK_MISSING_ID)))
            .unwrap_err();
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_delete_branch_keeps_relation_in_use() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let factory = ReposFactoryMock::default();
        let service = create_service_with_factory(Some(MOCK_USER_ID), handle, factory.clone());
        let result = core.run(service.delete_product_branch(MOCK_BUSY_BRANCH_ID)).unwrap();
        assert_eq!(result.auto_type_id, Some(MOCK_BUSY_AUTO_TYPE_ID));

        let catalog = factory.catalog.lock().unwrap();
        assert!(catalog.unlinked.is_empty());
        assert!(catalog.active_auto_types.is_empty());
    }

    #[test]
    fn test_update_branch_releases_old_pair() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let factory = ReposFactoryMock::default();
        let service = create_service_with_factory(Some(MOCK_USER_ID), handle, factory.clone());
        let update = UpdateBranchPayload {
            auto_type_id: Some(MOCK_UNRELATED_AUTO_TYPE_ID),
            auto_brand_id: Some(AutoBrandId(1)),
            auto_model_id: None,
            group_id: Some(ProductGroupId(1)),
            subgroup_id: None,
        };
        core.run(service.update_product_branch(ProductBranchId(1), update)).unwrap();

        let catalog = factory.catalog.lock().unwrap();
        assert!(catalog.unlinked.contains(&(1, 1)));
        assert!(catalog.linked.contains(&(MOCK_UNRELATED_AUTO_TYPE_ID.0, 1)));
        assert_eq!(catalog.active_auto_types[&1].as_slice(), &[MOCK_UNRELATED_AUTO_TYPE_ID.0]);
    }

    #[test]
    fn test_transform_products_branches() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let report = core.run(service.transform_products_branches()).unwrap();
        assert_eq!(report.products_scanned, 1);
        assert_eq!(report.products_changed, 0);
        assert_eq!(report.products_failed, 0);
    }
}
