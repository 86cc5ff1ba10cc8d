//! Auto types service

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use r2d2::ManageConnection;

use models::{AutoType, NewAutoType, UpdateAutoType};
use repos::{AutoTypesRepo, ReposFactory};
use services::types::ServiceFuture;
use services::{found, invalid, Service};
use types::AutoTypeId;

pub trait AutoTypesService {
    fn create_auto_type(&self, payload: NewAutoType) -> ServiceFuture<AutoType>;
    fn get_auto_type(&self, id: AutoTypeId) -> ServiceFuture<Option<AutoType>>;
    fn list_auto_types(&self) -> ServiceFuture<Vec<AutoType>>;
    fn update_auto_type(&self, id: AutoTypeId, payload: UpdateAutoType) -> ServiceFuture<AutoType>;
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > AutoTypesService for Service<T, M, F>
{
    fn create_auto_type(&self, payload: NewAutoType) -> ServiceFuture<AutoType> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_types_repo = repo_factory.create_auto_types_repo(&*conn, user_id);
            conn.transaction::<AutoType, FailureError, _>(move || {
                check_slug(&*auto_types_repo, &payload.slug)?;
                auto_types_repo.create(payload)
            }).map_err(|e| e.context("Service AutoTypes, create endpoint error occurred.").into())
        })
    }

    fn get_auto_type(&self, id: AutoTypeId) -> ServiceFuture<Option<AutoType>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_types_repo = repo_factory.create_auto_types_repo(&*conn, user_id);
            auto_types_repo
                .find(id)
                .map_err(|e| e.context("Service AutoTypes, get endpoint error occurred.").into())
        })
    }

    fn list_auto_types(&self) -> ServiceFuture<Vec<AutoType>> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_types_repo = repo_factory.create_auto_types_repo(&*conn, user_id);
            auto_types_repo
                .list()
                .map_err(|e| e.context("Service AutoTypes, list endpoint error occurred.").into())
        })
    }

    fn update_auto_type(&self, id: AutoTypeId, payload: UpdateAutoType) -> ServiceFuture<AutoType> {
        let user_id = self.dynamic_context.user_id;
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |conn| {
            let auto_types_repo = repo_factory.create_auto_types_repo(&*conn, user_id);
            conn.transaction::<AutoType, FailureError, _>(move || {
                let auto_type = found(auto_types_repo.find(id)?, "Auto type", id)?;
                if let Some(ref slug) = payload.slug {
                    if *slug != auto_type.slug {
                        check_slug(&*auto_types_repo, slug)?;
                    }
                }
                auto_types_repo.update(id, payload)
            }).map_err(|e| e.context("Service AutoTypes, update endpoint error occurred.").into())
        })
    }
}

fn check_slug(auto_types_repo: &AutoTypesRepo, slug: &str) -> Result<(), FailureError> {
    if auto_types_repo.slug_exists(slug.to_string())? {
        Err(invalid(
            "slug",
            "Auto type with this slug already exists",
            format!("Auto type with slug '{}' already exists.", slug),
        ))
    } else {
        Ok(())
    }
}
