//! Glue between hyper and the app controller: runs the controller future
//! and renders its outcome as a json response.

use std::marker::PhantomData;

use failure::{Error as FailureError, Fail};
use futures::future;
use futures::Future;
use hyper;
use hyper::header::{ContentLength, ContentType};
use hyper::server::{Request, Response, Service};
use hyper::StatusCode;
use serde_json;

use super::errors::{error_chain_to_string, error_code, error_message, Codeable, PayloadCarrier};

/// Controller result: serialized json body
pub type ControllerFuture = Box<Future<Item = String, Error = FailureError>>;

/// Handles a request and gets a future response
pub trait Controller {
    fn call(&self, request: Request) -> ControllerFuture;
}

/// hyper `Service` serving a `Controller`. `E` is the app error kind used to pick the status code.
pub struct Application<E> {
    pub controller: Box<Controller>,
    phantom: PhantomData<E>,
}

impl<E> Application<E>
where
    E: Fail + Codeable + PayloadCarrier,
{
    pub fn new<C: Controller + 'static>(controller: C) -> Self {
        Self {
            controller: Box::new(controller),
            phantom: PhantomData,
        }
    }
}

impl<E> Service for Application<E>
where
    E: Fail + Codeable + PayloadCarrier,
{
    type Request = Request;
    type Response = Response;
    type Error = hyper::Error;
    type Future = Box<Future<Item = Response, Error = hyper::Error>>;

    fn call(&self, req: Request) -> Self::Future {
        debug!("Received request: {} {}", req.method(), req.uri());

        Box::new(self.controller.call(req).then(|res| match res {
            Ok(data) => future::ok::<_, hyper::Error>(response_with_json(StatusCode::Ok, data)),
            Err(err) => future::ok::<_, hyper::Error>(response_with_error::<E>(&err)),
        }))
    }
}

pub fn response_with_json(status: StatusCode, body: String) -> Response {
    Response::new()
        .with_status(status)
        .with_header(ContentLength(body.len() as u64))
        .with_header(ContentType::json())
        .with_body(body)
}

pub fn response_with_error<E: Fail + Codeable + PayloadCarrier>(err: &FailureError) -> Response {
    let message = error_message::<E>(err);
    if message.code >= 500 {
        error!("Request failed: {}", error_chain_to_string(err));
    } else {
        warn!("Request rejected with {}: {}", message.code, error_chain_to_string(err));
    }

    let status = error_code::<E>(err);
    let body = serde_json::to_string(&message).unwrap_or_else(|_| "{}".to_string());
    response_with_json(status, body)
}
