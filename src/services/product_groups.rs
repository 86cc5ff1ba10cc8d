//! Product groups service. The groups tree is cached and dropped on every write.

use std::collections::BTreeSet;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{build_groups_tree, NewProductGroup, ProductGroup, ProductGroupCategories, ProductGroupNode, UpdateProductGroup};
use repos::{ProductBranchesRepo, ProductGroupsRepo, ReposFactory, RepoResult};
use services::types::ServiceFuture;
use services::{found, invalid, Service};
use types::{IdList, ProductGroupId};

pub trait ProductGroupsService {
    /// Creates a group, or a subgroup when `parent_id` names a group
    fn create_product_group(&self, payload: NewProductGroup) -> ServiceFuture<ProductGroup>;
    fn get_product_group(&self, id: ProductGroupId) -> ServiceFuture<Option<ProductGroup>>;
    fn update_product_group(&self, id: ProductGroupId, payload: UpdateProductGroup) -> ServiceFuture<ProductGroup>;
    /// Active groups with their subgroups
    fn get_product_groups_tree(&self) -> ServiceFuture<Vec<ProductGroupNode>>;
    /// Recomputes the auto type and brand lists of the groups from their branches
    fn refresh_group_denormalization(&self, ids: Vec<ProductGroupId>) -> ServiceFuture<Vec<ProductGroup>>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ProductGroupsService for Service<T, M, F>
{
    fn create_product_group(&self, payload: NewProductGroup) -> ServiceFuture<ProductGroup> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let groups_repo = repo_factory.create_product_groups_repo(&*conn, user_id);
            let cache = repo_factory.product_groups_cache();
            conn.transaction::<ProductGroup, FailureError, _>(move || {
                if groups_repo.slug_exists(payload.slug.clone())? {
                    return Err(invalid(
                        "slug",
                        "Product group with this slug already exists",
                        format!("Product group with slug '{}' already exists.", payload.slug),
                    ));
                }
                if let Some(parent_id) = payload.parent_id {
                    let parent = found(groups_repo.find(parent_id)?, "Product group", parent_id)?;
                    if parent.is_subgroup() {
                        return Err(invalid(
                            "parent_id",
                            "Subgroups can not have children",
                            format!("Product group {} is a subgroup itself.", parent_id),
                        ));
                    }
                }
                let group = groups_repo.create(payload)?;
                cache.clear();
                Ok(group)
            }).map_err(|e| e.context("Service ProductGroups, create endpoint error occurred.").into())
        })
    }

    fn get_product_group(&self, id: ProductGroupId) -> ServiceFuture<Option<ProductGroup>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let groups_repo = repo_factory.create_product_groups_repo(&*conn, user_id);
            groups_repo
                .find(id)
                .map_err(|e| e.context("Service ProductGroups, get endpoint error occurred.").into())
        })
    }

    fn update_product_group(&self, id: ProductGroupId, payload: UpdateProductGroup) -> ServiceFuture<ProductGroup> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let groups_repo = repo_factory.create_product_groups_repo(&*conn, user_id);
            let cache = repo_factory.product_groups_cache();
            conn.transaction::<ProductGroup, FailureError, _>(move || {
                let group = found(groups_repo.find(id)?, "Product group", id)?;
                if let Some(ref slug) = payload.slug {
                    if *slug != group.slug && groups_repo.slug_exists(slug.clone())? {
                        return Err(invalid(
                            "slug",
                            "Product group with this slug already exists",
                            format!("Product group with slug '{}' already exists.", slug),
                        ));
                    }
                }
                let group = groups_repo.update(id, payload)?;
                cache.clear();
                Ok(group)
            }).map_err(|e| e.context("Service ProductGroups, update endpoint error occurred.").into())
        })
    }

    fn get_product_groups_tree(&self) -> ServiceFuture<Vec<ProductGroupNode>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let cache = repo_factory.product_groups_cache();
            if let Some(tree) = cache.get() {
                return Ok(tree);
            }
            let groups_repo = repo_factory.create_product_groups_repo(&*conn, user_id);
            groups_repo
                .list_all()
                .map(|groups| {
                    let tree = build_groups_tree(&groups);
                    cache.set(tree.clone());
                    tree
                }).map_err(|e| e.context("Service ProductGroups, get_tree endpoint error occurred.").into())
        })
    }

    fn refresh_group_denormalization(&self, ids: Vec<ProductGroupId>) -> ServiceFuture<Vec<ProductGroup>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let groups_repo = repo_factory.create_product_groups_repo(&*conn, user_id);
            let branches_repo = repo_factory.create_product_branches_repo(&*conn, user_id);
            let cache = repo_factory.product_groups_cache();
            conn.transaction::<Vec<ProductGroup>, FailureError, _>(move || {
                let groups = refresh_groups(&*groups_repo, &*branches_repo, ids)?;
                cache.clear();
                Ok(groups)
            }).map_err(|e| e.context("Service ProductGroups, refresh_group_denormalization endpoint error occurred.").into())
        })
    }
}

/// Sets the auto type and brand lists of every group to those of the
/// branches placed into it. Returns the groups that changed.
pub fn refresh_groups<I>(groups_repo: &ProductGroupsRepo, branches_repo: &ProductBranchesRepo, ids: I) -> RepoResult<Vec<ProductGroup>>
where
    I: IntoIterator<Item = ProductGroupId>,
{
    let ids = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect::<Vec<_>>();
    let mut changed = vec![];
    for group in groups_repo.find_many(&ids)? {
        let branches = branches_repo.list_for_group(group.id)?;
        let categories = ProductGroupCategories {
            auto_type_ids: branches.iter().filter_map(|b| b.auto_type_id).collect::<IdList>().normalized(),
            auto_brand_ids: branches.iter().filter_map(|b| b.auto_brand_id).collect::<IdList>().normalized(),
        };
        if categories.auto_type_ids != group.auto_type_ids || categories.auto_brand_ids != group.auto_brand_ids {
            changed.push(groups_repo.set_categories(group.id, categories)?);
        }
    }
    Ok(changed)
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::product_groups::ProductGroupsService;
    use types::*;

    fn new_group(parent_id: Option<ProductGroupId>) -> NewProductGroup {
        NewProductGroup {
            name: "Brakes".to_string(),
            slug: "brakes".to_string(),
            parent_id,
            position: 0,
        }
    }

    #[test]
    fn test_create_subgroup() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.create_product_group(new_group(Some(ProductGroupId(1))))).unwrap();
        assert_eq!(result.parent_id, Some(ProductGroupId(1)));
    }

    #[test]
    fn test_subgroup_of_subgroup_is_refused() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core
            .run(service.create_product_group(new_group(Some(ProductGroupId(2)))))
            .unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_groups_tree() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(None, handle);
        let tree = core.run(service.get_product_groups_tree()).unwrap();
        assert_eq!(tree.iter().map(|node| node.id).collect::<Vec<_>>(), vec![ProductGroupId(1), ProductGroupId(3)]);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].id, ProductGroupId(2));
    }

    #[test]
    fn test_group_lists_follow_branches() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let changed = core
            .run(service.refresh_group_denormalization(vec![ProductGroupId(1), ProductGroupId(1)]))
            .unwrap();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].auto_type_ids.as_slice(), &[1]);
        assert_eq!(changed[0].auto_brand_ids.as_slice(), &[1]);
    }
}
