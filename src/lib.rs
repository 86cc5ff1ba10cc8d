//! Autoparts is a marketplace microservice: vehicle catalog, products placed
//! into that catalog, sellers, carts, order requests, offers and orders.
//! The layered structure of the app is
//!
//! `Application -> Controller -> Service -> Repo`
//!
//! Each layer can throw Error with context or cover occurred error with
//! Error in the context. When error is not covered with Error it will
//! be translated to code 500 in the http answer "Internal server error" of microservice.

#![allow(proc_macro_derive_resolution_fallback)]
#![recursion_limit = "128"]
extern crate chrono;
extern crate config as config_crate;
#[macro_use]
extern crate diesel;
#[macro_use]
extern crate failure;
extern crate futures;
extern crate futures_cpupool;
extern crate hyper;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate num_traits;
extern crate r2d2;
extern crate r2d2_redis;
extern crate regex;
extern crate rust_decimal;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;
extern crate serde_urlencoded;
extern crate tokio;
extern crate tokio_core;
extern crate tokio_signal;
extern crate tracing_subscriber;
extern crate validator;
#[macro_use]
extern crate validator_derive;

#[macro_use]
pub mod macros;
pub mod cache;
pub mod config;
pub mod controller;
pub mod errors;
pub mod http;
pub mod loaders;
pub mod logging;
pub mod models;
pub mod repos;
pub mod schema;
pub mod services;
pub mod types;

use std::process;
use std::sync::Arc;
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use failure::Error as FailureError;
use futures::{future, Future, Stream};
use futures_cpupool::CpuPool;
use hyper::server::Http;
use r2d2_redis::RedisConnectionManager;
use tokio_core::reactor::Core;

use cache::{NullCache, RedisCache, TypedCache};
use config::{Config, PRODUCT_GROUPS_CACHE_NAMESPACE, ROLES_CACHE_NAMESPACE};
use controller::context::{DynamicContext, StaticContext};
use errors::Error;
use http::Application;
use loaders::scheduler::{self, SchedulerContext};
use repos::acl::RolesCacheImpl;
use repos::product_groups_cache::ProductGroupsCacheImpl;
use repos::repo_factory::ReposFactoryImpl;
use services::{OrderRequestsService, ProductBranchesService, Service};

pub type AppStaticContext = StaticContext<PgConnection, ConnectionManager<PgConnection>, ReposFactoryImpl>;

/// Builds database pool, caches and the repo factory shared by all entry points
fn create_static_context(config: Config, thread_count: usize) -> AppStaticContext {
    // Prepare database pool
    let database_url: String = config.server.database.parse().expect("Database URL must be set in configuration");
    let db_manager = ConnectionManager::<PgConnection>::new(database_url);
    let db_pool = r2d2::Pool::builder()
        .build(db_manager)
        .expect("Failed to create DB connection pool");

    // Prepare CPU pool
    let cpu_pool = CpuPool::new(thread_count);

    // Prepare caches
    let (roles_cache, product_groups_cache) = match &config.server.redis {
        Some(redis_url) => {
            // Prepare Redis pool
            let redis_manager = RedisConnectionManager::new(redis_url.as_str()).expect("Failed to create Redis connection manager");
            let redis_pool = r2d2::Pool::builder()
                .build(redis_manager)
                .expect("Failed to create Redis connection pool");

            let ttl = Duration::from_secs(config.server.cache_ttl_sec);

            let roles_cache = RolesCacheImpl::new(TypedCache::new(
                RedisCache::new(redis_pool.clone(), ROLES_CACHE_NAMESPACE.to_string()).with_ttl(ttl),
            ));
            let product_groups_cache = ProductGroupsCacheImpl::new(TypedCache::new(
                RedisCache::new(redis_pool, PRODUCT_GROUPS_CACHE_NAMESPACE.to_string()).with_ttl(ttl),
            ));

            (roles_cache, product_groups_cache)
        }
        None => (
            RolesCacheImpl::new(NullCache::new()),
            ProductGroupsCacheImpl::new(NullCache::new()),
        ),
    };

    // Repo factory
    let repo_factory = ReposFactoryImpl::new(roles_cache, product_groups_cache);

    StaticContext::new(db_pool, cpu_pool, Arc::new(config), repo_factory)
}

/// Same context with repos that skip the ACL checks, for background jobs
fn create_system_context(config: Config, thread_count: usize) -> AppStaticContext {
    let context = create_static_context(config, thread_count);
    StaticContext {
        repo_factory: context.repo_factory.clone().with_system_acl(),
        ..context
    }
}

/// Starts new web service from provided `Config`
pub fn start_server<F: FnOnce() + 'static>(config: Config, port: &Option<String>, callback: F) {
    // Prepare reactor
    let mut core = Core::new().expect("Unexpected error creating event loop core");
    let handle = Arc::new(core.handle());

    let thread_count = config.server.thread_count;

    // Prepare server
    let address = {
        let port = port.as_ref().unwrap_or(&config.server.port);
        format!("{}:{}", config.server.host, port).parse().expect("Could not parse address")
    };

    let context = create_static_context(config, thread_count);

    let serve = Http::new()
        .serve_addr_handle(&address, &handle, move || {
            // Prepare application
            let controller = controller::ControllerImpl::new(context.clone());
            let app = Application::<Error>::new(controller);

            Ok(app)
        }).unwrap_or_else(|why| {
            error!("Http Server Initialization Error: {}", why);
            process::exit(1);
        });

    let handle_arc2 = handle.clone();
    handle.spawn(
        serve
            .for_each(move |conn| {
                handle_arc2.spawn(conn.map(|_| ()).map_err(|why| error!("Server Error: {}", why)));
                Ok(())
            }).map_err(|_| ()),
    );

    info!("Listening on http://{}, threads: {}", address, thread_count);
    handle.spawn_fn(move || {
        callback();
        future::ok(())
    });

    core.run(tokio_signal::ctrl_c().flatten_stream().take(1u64).for_each(|()| {
        info!("Ctrl+C received. Exit");

        Ok(())
    })).unwrap();
}

/// Periodic expiration and reward tasks. Runs until the interval stream fails.
pub fn start_scheduler(config: Config) -> impl Future<Item = (), Error = FailureError> {
    let scheduler_config = config.scheduler.clone().expect("Scheduler config not found");

    let interval = Duration::from_secs(scheduler_config.interval_s);
    let static_context = create_system_context(config, scheduler_config.thread_count);

    scheduler::run(SchedulerContext { static_context, interval })
}

/// Rebuilds product branches, then recomputes the sellers of open order requests
pub fn run_reconcile(config: Config) -> Result<(), FailureError> {
    let mut core = Core::new()?;
    let thread_count = config.server.thread_count;
    let service = Service::new(create_system_context(config, thread_count), DynamicContext::default());

    info!("Started rebuilding product branches");
    let branches_report = core.run(service.transform_products_branches())?;
    info!("Product branches rebuilt: {:?}", branches_report);

    info!("Started matching sellers of open order requests");
    let orders_report = core.run(service.transform_orders())?;
    info!("Order requests rematched: {:?}", orders_report);

    Ok(())
}
