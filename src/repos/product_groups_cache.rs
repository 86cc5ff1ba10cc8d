//! Cache of the product groups tree
use std::sync::Arc;

use cache::Cache;
use models::ProductGroupNode;

const TREE_KEY: &str = "tree";

#[derive(Clone)]
pub struct ProductGroupsCacheImpl {
    inner: Arc<Box<Cache<Vec<ProductGroupNode>> + Send + Sync>>,
}

impl ProductGroupsCacheImpl {
    pub fn new<C>(cache: C) -> Self
    where
        C: Cache<Vec<ProductGroupNode>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Box::new(cache)),
        }
    }

    pub fn get(&self) -> Option<Vec<ProductGroupNode>> {
        debug!("Getting product groups tree from cache");
        self.inner.get(TREE_KEY).unwrap_or_else(|err| {
            warn!("Failed to read product groups tree from cache: {}", err);
            None
        })
    }

    pub fn set(&self, tree: Vec<ProductGroupNode>) {
        debug!("Setting product groups tree in cache");
        if let Err(err) = self.inner.set(TREE_KEY, tree) {
            warn!("Failed to store product groups tree in cache: {}", err);
        }
    }

    pub fn clear(&self) {
        debug!("Clearing product groups tree in cache");
        if let Err(err) = self.inner.remove(TREE_KEY) {
            warn!("Failed to clear product groups tree in cache: {}", err);
        }
    }
}
