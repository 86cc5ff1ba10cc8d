extern crate autoparts_lib;
extern crate futures;
extern crate hyper;
extern crate rand;
#[macro_use]
extern crate serde_json;
extern crate tokio_core;

use std::sync::mpsc::channel;
use std::thread;

#[allow(unused_imports)]
use futures::Future;
use hyper::client::HttpConnector;
use hyper::header::{Authorization, ContentLength, ContentType};
use hyper::{Client, Method, Request, StatusCode, Uri};
use rand::Rng;
use tokio_core::reactor::Core;

use autoparts_lib::http::request_util::read_body;

type HttpClient = Client<HttpConnector>;

/// Running server with a client. The test database must have user 1 as superadmin.
pub struct Context {
    pub client: HttpClient,
    pub base_url: String,
    pub core: Core,
}

pub fn setup() -> Context {
    let (tx, rx) = channel::<bool>();
    let mut rng = rand::thread_rng();
    let port = rng.gen_range(50000, 60000);
    thread::spawn(move || {
        let config = autoparts_lib::config::Config::new().expect("Can't load app config!");
        autoparts_lib::start_server(config, &Some(port.to_string()), move || {
            let _ = tx.send(true);
        });
    });
    rx.recv().unwrap();
    let core = Core::new().expect("Unexpected error creating event loop core");
    let client = Client::new(&core.handle());
    Context {
        client,
        base_url: format!("http://localhost:{}", port),
        core,
    }
}

/// Sends a request as `user_id` and returns the status with the raw body
#[allow(dead_code)]
pub fn send(context: &mut Context, method: Method, path: &str, user_id: Option<i32>, body: Option<String>) -> (StatusCode, String) {
    let url = format!("{}{}", context.base_url, path).parse::<Uri>().unwrap();
    let mut req = Request::new(method, url);
    if let Some(user_id) = user_id {
        req.headers_mut().set(Authorization(user_id.to_string()));
    }
    if let Some(body) = body {
        req.headers_mut().set(ContentType::json());
        req.headers_mut().set(ContentLength(body.len() as u64));
        req.set_body(body);
    }
    context
        .core
        .run(context.client.request(req).and_then(|res| {
            let status = res.status();
            read_body(res.body()).map(move |body| (status, body))
        })).unwrap()
}

/// Random lowercase slug, unique enough between test runs
#[allow(dead_code)]
pub fn random_slug() -> String {
    rand::thread_rng().gen_ascii_chars().take(10).collect::<String>().to_lowercase()
}
