//! Services is a core layer for the app business logic like
//! validation, authorization, etc.

pub mod auto_brands;
pub mod auto_models;
pub mod auto_types;
pub mod cart;
pub mod notifications;
pub mod offers;
pub mod order_requests;
pub mod orders;
pub mod organizations;
pub mod product_branches;
pub mod product_groups;
pub mod products;
pub mod scheduler;
pub mod types;
pub mod user_roles;

pub use self::auto_brands::*;
pub use self::auto_models::*;
pub use self::auto_types::*;
pub use self::cart::*;
pub use self::notifications::*;
pub use self::offers::*;
pub use self::order_requests::*;
pub use self::orders::*;
pub use self::organizations::*;
pub use self::product_branches::*;
pub use self::product_groups::*;
pub use self::products::*;
pub use self::scheduler::*;
pub use self::types::*;
pub use self::user_roles::*;

use std::fmt::Display;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::{Error as FailureError, Fail};
use r2d2::{ManageConnection, PooledConnection};
use validator::ValidationErrors;

use controller::context::{DynamicContext, StaticContext};
use errors::Error;
use repos::repo_factory::*;
use types::UserId;

/// Service
pub struct Service<
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
> {
    pub static_context: StaticContext<T, M, F>,
    pub dynamic_context: DynamicContext,
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > Service<T, M, F>
{
    /// Create a new service
    pub fn new(static_context: StaticContext<T, M, F>, dynamic_context: DynamicContext) -> Self {
        Self {
            static_context,
            dynamic_context,
        }
    }

    /// Runs `f` on the cpu pool with a connection from the db pool
    pub fn spawn_on_pool<R, Func>(&self, f: Func) -> ServiceFuture<R>
    where
        Func: FnOnce(PooledConnection<M>) -> Result<R, FailureError> + Send + 'static,
        R: Send + 'static,
    {
        let db_pool = self.static_context.db_pool.clone();
        let cpu_pool = self.static_context.cpu_pool.clone();
        Box::new(cpu_pool.spawn_fn(move || {
            db_pool
                .get()
                .map_err(|e| e.context(Error::Connection).into())
                .and_then(f)
        }))
    }
}

/// Unwraps a lookup or fails with `NotFound`
pub fn found<V, I: Display>(value: Option<V>, entity: &str, id: I) -> Result<V, FailureError> {
    value.ok_or_else(|| format_err!("{} with id {} not found", entity, id).context(Error::NotFound).into())
}

/// Validation failure of a single field
pub fn invalid(field: &'static str, message: &'static str, details: String) -> FailureError {
    format_err!("{}", details)
        .context(Error::Validate(validation_errors!({ field: [field => message] })))
        .into()
}

pub fn forbidden(details: String) -> FailureError {
    format_err!("{}", details).context(Error::Forbidden).into()
}

/// Operations on own data need an authenticated user
pub fn current_user(user_id: Option<UserId>) -> Result<UserId, FailureError> {
    user_id.ok_or_else(|| forbidden("Anonymous user is not allowed to do this.".to_string()))
}

pub fn validation_failed(errors: ValidationErrors) -> FailureError {
    format_err!("Validation of payload failed").context(Error::Validate(errors)).into()
}
