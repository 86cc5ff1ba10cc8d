//! Auto models service

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{AutoModel, AutoModelsQuery, NewAutoModel, UpdateAutoModel};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::{found, invalid, Service};
use types::AutoModelId;

pub trait AutoModelsService {
    /// The (auto type, auto brand) pair of the model must be linked
    fn create_auto_model(&self, payload: NewAutoModel) -> ServiceFuture<AutoModel>;
    fn get_auto_model(&self, id: AutoModelId) -> ServiceFuture<Option<AutoModel>>;
    fn list_auto_models(&self, query: AutoModelsQuery) -> ServiceFuture<Vec<AutoModel>>;
    fn update_auto_model(&self, id: AutoModelId, payload: UpdateAutoModel) -> ServiceFuture<AutoModel>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > AutoModelsService for Service<T, M, F>
{
    fn create_auto_model(&self, payload: NewAutoModel) -> ServiceFuture<AutoModel> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_models_repo = repo_factory.create_auto_models_repo(&*conn, user_id);
            let relations_repo = repo_factory.create_auto_type_brand_relations_repo(&*conn, user_id);
            conn.transaction::<AutoModel, FailureError, _>(move || {
                if relations_repo.find(payload.auto_type_id, payload.auto_brand_id)?.is_none() {
                    return Err(invalid(
                        "auto_brand_id",
                        "Auto brand is not linked with the auto type",
                        format!(
                            "Auto brand {} is not linked with auto type {}.",
                            payload.auto_brand_id, payload.auto_type_id
                        ),
                    ));
                }
                if auto_models_repo.slug_exists(payload.slug.clone())? {
                    return Err(invalid(
                        "slug",
                        "Auto model with this slug already exists",
                        format!("Auto model with slug '{}' already exists.", payload.slug),
                    ));
                }
                auto_models_repo.create(payload)
            }).map_err(|e| e.context("Service AutoModels, create endpoint error occurred.").into())
        })
    }

    fn get_auto_model(&self, id: AutoModelId) -> ServiceFuture<Option<AutoModel>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_models_repo = repo_factory.create_auto_models_repo(&*conn, user_id);
            auto_models_repo
                .find(id)
                .map_err(|e| e.context("Service AutoModels, get endpoint error occurred.").into())
        })
    }

    fn list_auto_models(&self, query: AutoModelsQuery) -> ServiceFuture<Vec<AutoModel>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_models_repo = repo_factory.create_auto_models_repo(&*conn, user_id);
            auto_models_repo
                .list(query)
                .map_err(|e| e.context("Service AutoModels, list endpoint error occurred.").into())
        })
    }

    fn update_auto_model(&self, id: AutoModelId, payload: UpdateAutoModel) -> ServiceFuture<AutoModel> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_models_repo = repo_factory.create_auto_models_repo(&*conn, user_id);
            conn.transaction::<AutoModel, FailureError, _>(move || {
                let model = found(auto_models_repo.find(id)?, "Auto model", id)?;
                if let Some(ref slug) = payload.slug {
                    if *slug != model.slug && auto_models_repo.slug_exists(slug.clone())? {
                        return Err(invalid(
                            "slug",
                            "Auto model with this slug already exists",
                            format!("Auto model with slug '{}' already exists.", slug),
                        ));
                    }
                }
                auto_models_repo.update(id, payload)
            }).map_err(|e| e.context("Service AutoModels, update endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use tokio_core::reactor::Core;

    use models::*;
    use repos::repo_factory::tests::*;
    use services::auto_models::AutoModelsService;
    use types::*;

    fn new_auto_model(auto_type_id: AutoTypeId) -> NewAutoModel {
        NewAutoModel {
            name: "FH16".to_string(),
            slug: "fh16".to_string(),
            auto_type_id,
            auto_brand_id: AutoBrandId(1),
        }
    }

    #[test]
    fn test_create_auto_model() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let result = core.run(service.create_auto_model(new_auto_model(AutoTypeId(1)))).unwrap();
        assert_eq!(result.slug, "fh16");
        assert_eq!(result.auto_brand_id, AutoBrandId(1));
    }

    #[test]
    fn test_create_auto_model_requires_relation() {
        let mut core = Core::new().unwrap();
        let handle = Arc::new(core.handle());
        let service = create_service(Some(MOCK_USER_ID), handle);
        let err = core
            .run(service.create_auto_model(new_auto_model(MOCK_UNRELATED_AUTO_TYPE_ID)))
            .unwrap_err();
        assert!(is_validation_error(&err));
    }
}
