//! Http plumbing shared by the controller: hyper application,
//! request helpers, error responses and routing.

pub mod controller;
pub mod errors;
pub mod request_util;
pub mod router;

pub use self::controller::{Application, Controller, ControllerFuture};
pub use self::router::RouteParser;
