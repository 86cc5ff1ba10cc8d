//! Products Services, presents CRUD operations with product

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{NewProductPayload, Pagination, Product, ProductBranch, ProductWithBranches, UpdateProduct};
use repos::ReposFactory;
use services::product_branches::CatalogRepos;
use services::types::ServiceFuture;
use services::{found, Service};
use types::{ProductGroupId, ProductId};

pub trait ProductsService {
    /// Creates product together with its first branches
    fn create_product(&self, payload: NewProductPayload) -> ServiceFuture<ProductWithBranches>;
    /// Returns product by ID
    fn get_product(&self, product_id: ProductId) -> ServiceFuture<Option<ProductWithBranches>>;
    /// Lists active products limited by `from` and `count` parameters
    fn list_products(&self, pagination: Pagination) -> ServiceFuture<Vec<Product>>;
    fn update_product(&self, product_id: ProductId, payload: UpdateProduct) -> ServiceFuture<Product>;
    /// Deactivates specific product
    fn deactivate_product(&self, product_id: ProductId) -> ServiceFuture<Product>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > ProductsService for Service<T, M, F>
{
    fn create_product(&self, payload: NewProductPayload) -> ServiceFuture<ProductWithBranches> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let repos = CatalogRepos::new(&repo_factory, &*conn, user_id);
            let cache = repo_factory.product_groups_cache();
            conn.transaction::<ProductWithBranches, FailureError, _>(move || {
                let (new_product, branch_payloads) = payload.split();
                let product = repos.products_repo.create(new_product)?;
                let mut branches: Vec<ProductBranch> = vec![];
                for branch_payload in &branch_payloads {
                    branches.extend(repos.create_branches(product.id, branch_payload)?);
                }
                if branches.is_empty() {
                    return Ok(ProductWithBranches { product, branches });
                }

                let product = repos.refresh_product(product.id)?;
                let groups = branches
                    .iter()
                    .flat_map(|b| b.group_id.into_iter().chain(b.subgroup_id))
                    .collect::<Vec<ProductGroupId>>();
                repos.refresh_groups(groups)?;
                cache.clear();
                Ok(ProductWithBranches { product, branches })
            }).map_err(|e| e.context("Service Products, create endpoint error occurred.").into())
        })
    }

    fn get_product(&self, product_id: ProductId) -> ServiceFuture<Option<ProductWithBranches>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, user_id);
            let branches_repo = repo_factory.create_product_branches_repo(&*conn, user_id);
            products_repo
                .find(product_id)
                .and_then(|product| match product {
                    Some(product) => branches_repo
                        .list_for_product(product.id)
                        .map(|branches| Some(ProductWithBranches { product, branches })),
                    None => Ok(None),
                }).map_err(|e| e.context("Service Products, get endpoint error occurred.").into())
        })
    }

    fn list_products(&self, pagination: Pagination) -> ServiceFuture<Vec<Product>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, user_id);
            products_repo
                .list(pagination)
                .map_err(|e| e.context("Service Products, list endpoint error occurred.").into())
        })
    }

    fn update_product(&self, product_id: ProductId, payload: UpdateProduct) -> ServiceFuture<Product> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, user_id);
            conn.transaction::<Product, FailureError, _>(move || {
                found(products_repo.find(product_id)?, "Product", product_id)?;
                let payload = UpdateProduct {
                    article: payload.article.map(|article| article.trim().to_uppercase()),
                    ..payload
                };
                products_repo.update(product_id, payload)
            }).map_err(|e| e.context("Service Products, update endpoint error occurred.").into())
        })
    }

    fn deactivate_product(&self, product_id: ProductId) -> ServiceFuture<Product> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let products_repo = repo_factory.create_products_repo(&*conn, user_id);
            conn.transaction::<Product, FailureError, _>(move || {
                found(products_repo.find(product_id)?, "Product", product_id)?;
                products_repo.deactivate(product_id)
            }).map_err(|e| e.context("Service Products, deactivate endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::products::ProductsService;
    use types::*;

    fn new_product(branches: Vec<NewBranchPayload>) -> NewProductPayload {
        NewProductPayload {
            name: "Brake disc".to_string(),
            article: "df4294".to_string(),
            manufacturer: Some("TRW".to_string()),
            description: None,
            branches,
        }
    }

    #[test]
    fn test_create_product_with_branches() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let branch = NewBranchPayload {
            auto_type_id: Some(AutoTypeId(1)),
            auto_brand_id: Some(AutoBrandId(1)),
            auto_model_ids: vec![AutoModelId(1)],
            group_id: Some(ProductGroupId(3)),
            subgroup_id: Some(ProductGroupId(4)),
        };
        let result = core.run(service.create_product(new_product(vec![branch]))).unwrap();
        assert_eq!(result.branches.len(), 1);
        assert_eq!(result.branches[0].auto_model_id, Some(AutoModelId(1)));
    }

    #[test]
    fn test_create_product_without_branches() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.create_product(new_product(vec![]))).unwrap();
        assert_eq!(result.product.article, "DF4294");
        assert!(result.branches.is_empty());
        assert!(result.product.auto_type_ids.is_empty());
    }

    #[test]
    fn test_get_product() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(None, handle);
        let result = core.run(service.get_product(ProductId(1))).unwrap().unwrap();
        assert_eq!(result.product.id, ProductId(1));
        assert_eq!(result.branches.len(), 1);

        let missing = core.run(service.get_product(ProductId(MOCK_MISSING_ID))).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_deactivate_product() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.deactivate_product(ProductId(1))).unwrap();
        assert!(!result.is_active);
    }
}
