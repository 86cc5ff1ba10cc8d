//! Organizations service. Creating an organization makes its owner a seller,
//! changing what it sells re-matches it with open order requests.

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{
    organization_matches_request, NewOrganizationPayload, NewUserRole, Organization, Pagination, SellerCategoriesUpdate,
    SellerProductCategories, UpdateOrganization,
};
use repos::{AutoTypeBrandRelationsRepo, ReposFactory, RepoResult};
use services::order_requests::{request_items, MATCHABLE_STATUSES};
use services::types::ServiceFuture;
use services::{current_user, found, invalid, Service};
use types::{AutoBrandId, AutoTypeId, IdList, MarketRole, OrganizationId, ProductGroupId, UserId};

pub trait OrganizationsService {
    /// Creates organization of the current user and grants the seller role
    fn create_organization(&self, payload: NewOrganizationPayload) -> ServiceFuture<Organization>;
    fn get_organization(&self, id: OrganizationId) -> ServiceFuture<Option<Organization>>;
    fn list_organizations(&self, pagination: Pagination) -> ServiceFuture<Vec<Organization>>;
    fn update_organization(&self, id: OrganizationId, payload: UpdateOrganization) -> ServiceFuture<Organization>;
    fn get_organizations_by_user(&self, user_id: UserId) -> ServiceFuture<Vec<Organization>>;
    /// Stores what the organization sells and re-matches open order requests
    fn update_seller_product_categories(
        &self,
        id: OrganizationId,
        payload: SellerProductCategories,
    ) -> ServiceFuture<SellerCategoriesUpdate>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > OrganizationsService for Service<T, M, F>
{
    fn create_organization(&self, payload: NewOrganizationPayload) -> ServiceFuture<Organization> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            let user_roles_repo = repo_factory.create_user_roles_repo_with_sys_acl(&*conn);
            conn.transaction::<Organization, FailureError, _>(move || {
                let owner = current_user(user_id)?;
                let organization = organizations_repo.create(payload.into_new(owner))?;
                if !user_roles_repo.list_for_user(owner)?.contains(&MarketRole::Seller) {
                    user_roles_repo.create(NewUserRole {
                        user_id: owner,
                        name: MarketRole::Seller,
                    })?;
                }
                Ok(organization)
            }).map_err(|e| e.context("Service Organizations, create endpoint error occurred.").into())
        })
    }

    fn get_organization(&self, id: OrganizationId) -> ServiceFuture<Option<Organization>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            organizations_repo
                .find(id)
                .map_err(|e| e.context("Service Organizations, get endpoint error occurred.").into())
        })
    }

    fn list_organizations(&self, pagination: Pagination) -> ServiceFuture<Vec<Organization>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            organizations_repo
                .list(pagination)
                .map_err(|e| e.context("Service Organizations, list endpoint error occurred.").into())
        })
    }

    fn update_organization(&self, id: OrganizationId, payload: UpdateOrganization) -> ServiceFuture<Organization> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            conn.transaction::<Organization, FailureError, _>(move || {
                found(organizations_repo.find(id)?, "Organization", id)?;
                organizations_repo.update(id, payload)
            }).map_err(|e| e.context("Service Organizations, update endpoint error occurred.").into())
        })
    }

    fn get_organizations_by_user(&self, owner_id: UserId) -> ServiceFuture<Vec<Organization>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            organizations_repo
                .list_for_user(owner_id)
                .map_err(|e| e.context("Service Organizations, get_by_user endpoint error occurred.").into())
        })
    }

    fn update_seller_product_categories(
        &self,
        id: OrganizationId,
        payload: SellerProductCategories,
    ) -> ServiceFuture<SellerCategoriesUpdate> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let organizations_repo = repo_factory.create_organizations_repo(&*conn, user_id);
            let auto_types_repo = repo_factory.create_auto_types_repo(&*conn, user_id);
            let auto_brands_repo = repo_factory.create_auto_brands_repo(&*conn, user_id);
            let groups_repo = repo_factory.create_product_groups_repo(&*conn, user_id);
            let relations_repo = repo_factory.create_auto_type_brand_relations_repo(&*conn, user_id);
            let products_repo = repo_factory.create_products_repo(&*conn, user_id);
            let offers_repo = repo_factory.create_offers_repo(&*conn, user_id);
            let order_requests_repo = repo_factory.create_order_requests_repo_with_sys_acl(&*conn);
            conn.transaction::<SellerCategoriesUpdate, FailureError, _>(move || {
                found(organizations_repo.find(id)?, "Organization", id)?;
                let mut categories = payload.normalized();

                let auto_type_ids = categories.auto_type_ids.ids::<AutoTypeId>();
                if auto_types_repo.find_many(&auto_type_ids)?.len() != auto_type_ids.len() {
                    return Err(invalid("auto_type_ids", "Unknown auto type", format!("{:?} has unknown auto types.", auto_type_ids)));
                }
                let auto_brand_ids = categories.auto_brand_ids.ids::<AutoBrandId>();
                if auto_brands_repo.find_many(&auto_brand_ids)?.len() != auto_brand_ids.len() {
                    return Err(invalid(
                        "auto_brand_ids",
                        "Unknown auto brand",
                        format!("{:?} has unknown auto brands.", auto_brand_ids),
                    ));
                }
                let group_ids = categories.product_group_ids.ids::<ProductGroupId>();
                if groups_repo.find_many(&group_ids)?.len() != group_ids.len() {
                    return Err(invalid(
                        "product_group_ids",
                        "Unknown product group",
                        format!("{:?} has unknown product groups.", group_ids),
                    ));
                }
                if !categories.auto_type_ids.is_empty() {
                    categories.auto_brand_ids = related_brands(&*relations_repo, &categories.auto_type_ids, &auto_brand_ids)?;
                }

                let organization = organizations_repo.set_categories(id, categories)?;

                let mut added_to_requests = 0;
                let mut removed_from_requests = 0;
                for request in order_requests_repo.list_by_statuses(MATCHABLE_STATUSES)? {
                    let items = request_items(&*order_requests_repo, &*products_repo, request.id)?;
                    let matches = organization_matches_request(&organization, &items);
                    let matched = request.is_matched_with(organization.id);
                    let mut seller_ids = request.seller_ids.clone();
                    if matches && !matched {
                        seller_ids.add(organization.id);
                        added_to_requests += 1;
                    } else if !matches && matched && !offers_repo.exists_for_organization(request.id, organization.id)? {
                        seller_ids.remove(organization.id);
                        removed_from_requests += 1;
                    } else {
                        continue;
                    }
                    order_requests_repo.set_seller_ids(request.id, seller_ids)?;
                }

                info!(
                    "Organization {} product categories updated, added to {} and removed from {} order requests.",
                    organization.id, added_to_requests, removed_from_requests
                );
                Ok(SellerCategoriesUpdate {
                    organization,
                    added_to_requests,
                    removed_from_requests,
                })
            }).map_err(|e| e.context("Service Organizations, update_seller_product_categories endpoint error occurred.").into())
        })
    }
}

/// Brands having a relation with at least one of the auto types
fn related_brands(relations_repo: &AutoTypeBrandRelationsRepo, auto_type_ids: &IdList, brand_ids: &[AutoBrandId]) -> RepoResult<IdList> {
    let mut kept = IdList::new();
    for brand_id in brand_ids {
        let relations = relations_repo.list_for_brand(*brand_id)?;
        if relations.iter().any(|relation| auto_type_ids.contains(relation.auto_type_id)) {
            kept.add(*brand_id);
        }
    }
    Ok(kept)
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::organizations::OrganizationsService;
    use types::*;

    fn categories(types: Vec<i32>, brands: Vec<i32>, groups: Vec<i32>) -> SellerProductCategories {
        SellerProductCategories {
            auto_type_ids: types.into_iter().collect(),
            auto_brand_ids: brands.into_iter().collect(),
            product_group_ids: groups.into_iter().collect(),
        }
    }

    #[test]
    fn test_create_organization() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_OTHER_USER_ID), handle);
        let payload = NewOrganizationPayload {
            name: "Parts & Co".to_string(),
            inn: "7707083893".to_string(),
            phone: None,
            email: Some("parts@example.com".to_string()),
            address: None,
        };
        let result = core.run(service.create_organization(payload)).unwrap();
        assert_eq!(result.user_id, MOCK_OTHER_USER_ID);
        assert_eq!(result.name, "Parts & Co");
    }

    #[test]
    fn test_categories_are_normalized_and_brands_filtered() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.update_seller_product_categories(OrganizationId(1), categories(vec![2, 1, 2], vec![1], vec![3]));
        let result = core.run(work).unwrap();
        assert_eq!(result.organization.auto_type_ids.as_slice(), &[1, 2]);
        assert_eq!(result.organization.auto_brand_ids.as_slice(), &[1]);
        assert_eq!(result.organization.product_group_ids.as_slice(), &[3]);
    }

    #[test]
    fn test_brands_without_related_type_are_dropped() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.update_seller_product_categories(OrganizationId(1), categories(vec![2], vec![1], vec![]));
        let result = core.run(work).unwrap();
        assert!(result.organization.auto_brand_ids.is_empty());
    }

    #[test]
    fn test_unknown_category_is_refused() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.update_seller_product_categories(OrganizationId(1), categories(vec![MOCK_MISSING_ID], vec![], vec![]));
        let err = core.run(work).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_items_without_dimensions_keep_seller_matched() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let work = service.update_seller_product_categories(OrganizationId(1), categories(vec![5], vec![], vec![]));
        let result = core.run(work).unwrap();
        assert_eq!(result.removed_from_requests, 0);
        assert_eq!(result.added_to_requests, 0);
    }

    #[test]
    fn test_foreign_organization_joins_matching_requests() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_OTHER_USER_ID), handle);
        let work = service.update_seller_product_categories(MOCK_FOREIGN_ORGANIZATION_ID, categories(vec![], vec![], vec![]));
        let result = core.run(work).unwrap();
        assert_eq!(result.added_to_requests, 1);
    }
}
