//! RolesCache is a module that caches received from db information about user and his roles
use std::sync::Arc;

use failure::Error as FailureError;

use cache::Cache;
use types::{MarketRole, UserId};

#[derive(Clone)]
pub struct RolesCacheImpl {
    inner: Arc<Box<Cache<Vec<MarketRole>> + Send + Sync>>,
}

impl RolesCacheImpl {
    pub fn new<C>(cache: C) -> Self
    where
        C: Cache<Vec<MarketRole>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Box::new(cache)),
        }
    }

    pub fn get(&self, user_id: UserId) -> Option<Vec<MarketRole>> {
        debug!("Getting roles from cache for user id {}", user_id);
        self.inner.get(&user_id.to_string()).unwrap_or_else(|err| {
            warn!("Failed to read roles of user {} from cache: {}", user_id, err);
            None
        })
    }

    pub fn remove(&self, user_id: UserId) -> bool {
        debug!("Removing roles from cache for user id {}", user_id);
        self.inner.remove(&user_id.to_string()).unwrap_or_else(|err| {
            warn!("Failed to remove roles of user {} from cache: {}", user_id, err);
            false
        })
    }

    pub fn set(&self, user_id: UserId, roles: &[MarketRole]) -> Result<(), FailureError> {
        debug!("Setting roles in cache for user id {}", user_id);
        self.inner.set(&user_id.to_string(), roles.to_vec())
    }
}
