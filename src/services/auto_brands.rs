//! Auto brands service. Links between brands and auto types live in
//! `auto_type_brand_relations`, every change of them goes through
//! `sync_active_auto_types` so that the brand's `active_auto_type_ids` follows.

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{AutoBrand, AutoBrandsQuery, NewAutoBrandPayload, NewAutoTypeBrandRelation, UpdateAutoBrand};
use repos::{AutoBrandsRepo, AutoTypeBrandRelationsRepo, ReposFactory, RepoResult};
use services::types::ServiceFuture;
use services::{found, invalid, Service};
use types::{AutoBrandId, AutoTypeId, IdList};

pub trait AutoBrandsService {
    /// Creates a brand, linked to the given auto types
    fn create_auto_brand(&self, payload: NewAutoBrandPayload) -> ServiceFuture<AutoBrand>;
    fn get_auto_brand(&self, id: AutoBrandId) -> ServiceFuture<Option<AutoBrand>>;
    fn list_auto_brands(&self, query: AutoBrandsQuery) -> ServiceFuture<Vec<AutoBrand>>;
    fn update_auto_brand(&self, id: AutoBrandId, payload: UpdateAutoBrand) -> ServiceFuture<AutoBrand>;
    fn link_auto_type(&self, id: AutoBrandId, auto_type_id: AutoTypeId) -> ServiceFuture<AutoBrand>;
    /// Refused while product branches use the pair
    fn unlink_auto_type(&self, id: AutoBrandId, auto_type_id: AutoTypeId) -> ServiceFuture<AutoBrand>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > AutoBrandsService for Service<T, M, F>
{
    fn create_auto_brand(&self, payload: NewAutoBrandPayload) -> ServiceFuture<AutoBrand> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_brands_repo = repo_factory.create_auto_brands_repo(&*conn, user_id);
            let auto_types_repo = repo_factory.create_auto_types_repo(&*conn, user_id);
            let relations_repo = repo_factory.create_auto_type_brand_relations_repo(&*conn, user_id);
            conn.transaction::<AutoBrand, FailureError, _>(move || {
                let (new_brand, auto_type_ids) = payload.split();
                if auto_brands_repo.slug_exists(new_brand.slug.clone())? {
                    return Err(invalid(
                        "slug",
                        "Auto brand with this slug already exists",
                        format!("Auto brand with slug '{}' already exists.", new_brand.slug),
                    ));
                }
                let known = auto_types_repo.find_many(&auto_type_ids)?;
                if let Some(unknown) = auto_type_ids.iter().find(|id| !known.iter().any(|t| t.id == **id)) {
                    return Err(invalid(
                        "auto_type_ids",
                        "Unknown auto type",
                        format!("Auto type {} does not exist.", unknown),
                    ));
                }

                let brand = auto_brands_repo.create(new_brand)?;
                if auto_type_ids.is_empty() {
                    return Ok(brand);
                }
                for auto_type_id in auto_type_ids {
                    relations_repo.ensure(NewAutoTypeBrandRelation {
                        auto_type_id,
                        auto_brand_id: brand.id,
                    })?;
                }
                sync_active_auto_types(&*auto_brands_repo, &*relations_repo, brand.id)
            }).map_err(|e| e.context("Service AutoBrands, create endpoint error occurred.").into())
        })
    }

    fn get_auto_brand(&self, id: AutoBrandId) -> ServiceFuture<Option<AutoBrand>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_brands_repo = repo_factory.create_auto_brands_repo(&*conn, user_id);
            auto_brands_repo
                .find(id)
                .map_err(|e| e.context("Service AutoBrands, get endpoint error occurred.").into())
        })
    }

    fn list_auto_brands(&self, query: AutoBrandsQuery) -> ServiceFuture<Vec<AutoBrand>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_brands_repo = repo_factory.create_auto_brands_repo(&*conn, user_id);
            auto_brands_repo
                .list(query.auto_type_id)
                .map_err(|e| e.context("Service AutoBrands, list endpoint error occurred.").into())
        })
    }

    fn update_auto_brand(&self, id: AutoBrandId, payload: UpdateAutoBrand) -> ServiceFuture<AutoBrand> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_brands_repo = repo_factory.create_auto_brands_repo(&*conn, user_id);
            conn.transaction::<AutoBrand, FailureError, _>(move || {
                let brand = found(auto_brands_repo.find(id)?, "Auto brand", id)?;
                if let Some(ref slug) = payload.slug {
                    if *slug != brand.slug && auto_brands_repo.slug_exists(slug.clone())? {
                        return Err(invalid(
                            "slug",
                            "Auto brand with this slug already exists",
                            format!("Auto brand with slug '{}' already exists.", slug),
                        ));
                    }
                }
                auto_brands_repo.update(id, payload)
            }).map_err(|e| e.context("Service AutoBrands, update endpoint error occurred.").into())
        })
    }

    fn link_auto_type(&self, id: AutoBrandId, auto_type_id: AutoTypeId) -> ServiceFuture<AutoBrand> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_brands_repo = repo_factory.create_auto_brands_repo(&*conn, user_id);
            let auto_types_repo = repo_factory.create_auto_types_repo(&*conn, user_id);
            let relations_repo = repo_factory.create_auto_type_brand_relations_repo(&*conn, user_id);
            conn.transaction::<AutoBrand, FailureError, _>(move || {
                found(auto_brands_repo.find(id)?, "Auto brand", id)?;
                found(auto_types_repo.find(auto_type_id)?, "Auto type", auto_type_id)?;
                relations_repo.ensure(NewAutoTypeBrandRelation {
                    auto_type_id,
                    auto_brand_id: id,
                })?;
                sync_active_auto_types(&*auto_brands_repo, &*relations_repo, id)
            }).map_err(|e| e.context("Service AutoBrands, link_auto_type endpoint error occurred.").into())
        })
    }

    fn unlink_auto_type(&self, id: AutoBrandId, auto_type_id: AutoTypeId) -> ServiceFuture<AutoBrand> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_brands_repo = repo_factory.create_auto_brands_repo(&*conn, user_id);
            let relations_repo = repo_factory.create_auto_type_brand_relations_repo(&*conn, user_id);
            let branches_repo = repo_factory.create_product_branches_repo(&*conn, user_id);
            conn.transaction::<AutoBrand, FailureError, _>(move || {
                found(auto_brands_repo.find(id)?, "Auto brand", id)?;
                let used_by = branches_repo.count_for_pair(auto_type_id, id)?;
                if used_by > 0 {
                    return Err(invalid(
                        "auto_type_id",
                        "Auto type is used by product branches of this brand",
                        format!("{} product branches use auto type {} with brand {}.", used_by, auto_type_id, id),
                    ));
                }
                relations_repo.delete(auto_type_id, id)?;
                sync_active_auto_types(&*auto_brands_repo, &*relations_repo, id)
            }).map_err(|e| e.context("Service AutoBrands, unlink_auto_type endpoint error occurred.").into())
        })
    }
}

/// Rewrites `active_auto_type_ids` of the brand from its relations
pub fn sync_active_auto_types(
    auto_brands_repo: &AutoBrandsRepo,
    relations_repo: &AutoTypeBrandRelationsRepo,
    auto_brand_id: AutoBrandId,
) -> RepoResult<AutoBrand> {
    let auto_type_ids = relations_repo
        .list_for_brand(auto_brand_id)?
        .into_iter()
        .map(|relation| relation.auto_type_id)
        .collect::<IdList>()
        .normalized();
    auto_brands_repo.set_active_auto_types(auto_brand_id, auto_type_ids)
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::auto_brands::AutoBrandsService;
    use types::*;

    #[test]
    fn test_create_auto_brand_with_types() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let payload = NewAutoBrandPayload {
            name: "Volvo".to_string(),
            slug: "volvo".to_string(),
            auto_type_ids: vec![AutoTypeId(1)],
        };
        let result = core.run(service.create_auto_brand(payload)).unwrap();
        assert_eq!(result.active_auto_type_ids.as_slice(), &[1]);
    }

    #[test]
    fn test_create_auto_brand_with_unknown_type() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let payload = NewAutoBrandPayload {
            name: "Volvo".to_string(),
            slug: "volvo".to_string(),
            auto_type_ids: vec![AutoTypeId(MOCK_MISSING_ID)],
        };
        let err = core.run(service.create_auto_brand(payload)).unwrap_err();
        assert!(is_validation_error(&err));
    }

    #[test]
    fn test_active_types_follow_relations() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let factory = ReposFactoryMock::default();
        let service = create_service_with_factory(Some(MOCK_USER_ID), handle, factory.clone());
        let new_type = MOCK_UNRELATED_AUTO_TYPE_ID;

        let linked = core.run(service.link_auto_type(AutoBrandId(7), new_type)).unwrap();
        assert_eq!(linked.id, AutoBrandId(7));
        assert_eq!(linked.active_auto_type_ids.as_slice(), &[1, new_type.0]);
        assert_eq!(factory.catalog.lock().unwrap().active_auto_types[&7], linked.active_auto_type_ids);

        let unlinked = core.run(service.unlink_auto_type(AutoBrandId(7), new_type)).unwrap();
        assert_eq!(unlinked.active_auto_type_ids.as_slice(), &[1]);
        assert_eq!(factory.catalog.lock().unwrap().active_auto_types[&7], unlinked.active_auto_type_ids);

        let emptied = core.run(service.unlink_auto_type(AutoBrandId(7), AutoTypeId(1))).unwrap();
        assert!(emptied.active_auto_type_ids.is_empty());
    }

    #[test]
    fn test_link_missing_auto_type() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core
            .run(service.link_auto_type(AutoBrandId(1), AutoTypeId(MOCK_MISSING_ID)))
            .unwrap_err();
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_unlink_auto_type_used_by_branches() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core
            .run(service.unlink_auto_type(AutoBrandId(1), MOCK_BUSY_AUTO_TYPE_ID))
            .unwrap_err();
        assert!(is_validation_error(&err));

        let result = core.run(service.unlink_auto_type(AutoBrandId(1), AutoTypeId(1)));
        assert!(result.is_ok());
    }
}
