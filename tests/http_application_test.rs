extern crate autoparts_lib;
#[macro_use]
extern crate failure;
extern crate futures;
extern crate hyper;
extern crate serde_json;

use std::str::FromStr;

use futures::future;
use futures::Future;
use hyper::server::{Request, Service};
use hyper::{Method, StatusCode, Uri};

use autoparts_lib::controller::routes::{create_route_parser, Route};
use autoparts_lib::errors::Error;
use autoparts_lib::http::errors::ErrorMessage;
use autoparts_lib::http::request_util::{get_user_id, read_body, serialize_future};
use autoparts_lib::http::{Application, Controller, ControllerFuture, RouteParser};
use autoparts_lib::types::*;

/// Answers from the route table without touching the database
struct RoutesController {
    route_parser: RouteParser<Route>,
}

impl Controller for RoutesController {
    fn call(&self, req: Request) -> ControllerFuture {
        let user_id = get_user_id(req.headers());
        match (req.method().clone(), self.route_parser.test(req.path())) {
            (Method::Get, Some(Route::Healthcheck)) => serialize_future(future::ok::<_, failure::Error>("Ok")),
            (Method::Get, Some(Route::Product(product_id))) => serialize_future(future::ok::<_, failure::Error>(product_id)),
            (Method::Get, Some(Route::Cart)) => match user_id {
                Some(user_id) => serialize_future(future::ok::<_, failure::Error>(user_id)),
                None => Box::new(future::err(format_err!("Anonymous cart").context(Error::Forbidden).into())),
            },
            (Method::Post, Some(Route::Offers)) => Box::new(future::err(format_err!("Database is down"))),
            _ => Box::new(future::err(format_err!("No route").context(Error::NotFound).into())),
        }
    }
}

fn app() -> Application<Error> {
    Application::<Error>::new(RoutesController {
        route_parser: create_route_parser(),
    })
}

fn request(method: Method, path: &str, user_id: Option<&str>) -> (StatusCode, String) {
    let mut req = Request::new(method, Uri::from_str(&format!("http://localhost{}", path)).unwrap());
    if let Some(user_id) = user_id {
        req.headers_mut().set(hyper::header::Authorization(user_id.to_string()));
    }
    let response = app().call(req).wait().unwrap();
    let status = response.status();
    let body = read_body(response.body()).wait().unwrap();
    (status, body)
}

#[test]
fn healthcheck_is_served() {
    assert_eq!(request(Method::Get, "/healthcheck", None), (StatusCode::Ok, "\"Ok\"".to_string()));
}

#[test]
fn ids_are_taken_from_the_path() {
    assert_eq!(request(Method::Get, "/products/42", None), (StatusCode::Ok, "42".to_string()));
}

#[test]
fn user_is_taken_from_authorization() {
    assert_eq!(request(Method::Get, "/cart", Some("7")), (StatusCode::Ok, "7".to_string()));

    let (status, body) = request(Method::Get, "/cart", None);
    assert_eq!(status, StatusCode::Forbidden);
    let message = serde_json::from_str::<ErrorMessage>(&body).unwrap();
    assert_eq!(message.code, 403);
}

#[test]
fn unknown_routes_are_not_found() {
    let (status, body) = request(Method::Get, "/stores/1", None);
    assert_eq!(status, StatusCode::NotFound);
    let message = serde_json::from_str::<ErrorMessage>(&body).unwrap();
    assert_eq!(message.description, "Not found");
    assert_eq!(message.payload, None);
}

#[test]
fn unexpected_failures_hide_details() {
    let (status, body) = request(Method::Post, "/offers", Some("1"));
    assert_eq!(status, StatusCode::InternalServerError);
    let message = serde_json::from_str::<ErrorMessage>(&body).unwrap();
    assert_eq!(message.description, "Internal server error");
}

#[test]
fn typed_ids_round_trip_through_the_router() {
    let router = create_route_parser();
    assert_eq!(router.test("/order_requests/5/offers"), Some(Route::OrderRequestOffers(OrderRequestId(5))));
}
