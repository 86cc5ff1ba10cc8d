use failure::{Error as FailureError, Fail};
use futures::future::{Future, IntoFuture};
use futures::Stream;
use hyper;
use hyper::header::{Authorization, Headers};
use serde::de::DeserializeOwned;
use serde::ser::Serialize;
use serde_json;
use serde_urlencoded;

use errors::Error;
use types::UserId;

use super::controller::ControllerFuture;

/// Reads the whole body into a string
pub fn read_body(body: hyper::Body) -> Box<Future<Item = String, Error = hyper::Error>> {
    Box::new(body.concat2().map(|chunk| String::from_utf8_lossy(&chunk).into_owned()))
}

/// Reads the body and deserializes it from json
pub fn parse_body<T>(body: hyper::Body) -> Box<Future<Item = T, Error = FailureError>>
where
    T: DeserializeOwned + 'static,
{
    Box::new(
        read_body(body)
            .map_err(|e| e.context("Failed to read request body").context(Error::Parse).into())
            .and_then(|body| {
                serde_json::from_str::<T>(&body).map_err(|e| {
                    e.context(format!("Failed to parse request body: {}", body))
                        .context(Error::Parse)
                        .into()
                })
            }),
    )
}

/// Deserializes the query string, a missing query is treated as empty
pub fn parse_query<T: DeserializeOwned>(query: Option<&str>) -> Result<T, FailureError> {
    let query = query.unwrap_or_default();
    serde_urlencoded::from_str::<T>(query).map_err(|e| {
        e.context(format!("Failed to parse query: {}", query))
            .context(Error::Parse)
            .into()
    })
}

/// User id passed by the gateway in the `Authorization` header
pub fn get_user_id(headers: &Headers) -> Option<UserId> {
    headers
        .get::<Authorization<String>>()
        .and_then(|auth| auth.0.trim().parse::<UserId>().ok())
}

/// Serializes the result of a service call into the response body
pub fn serialize_future<T, F>(f: F) -> ControllerFuture
where
    T: Serialize,
    F: IntoFuture<Item = T, Error = FailureError>,
    F::Future: 'static,
{
    Box::new(
        f.into_future()
            .and_then(|resp| serde_json::to_string(&resp).map_err(|e| e.context("Failed to serialize response").into())),
    )
}

#[cfg(test)]
mod tests {
    use futures::Future;
    use hyper::header::{Authorization, Headers};

    use super::*;
    use types::UserId;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pagination {
        from: Option<i32>,
        count: Option<i64>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        name: String,
    }

    #[test]
    fn query_is_parsed() {
        let query = parse_query::<Pagination>(Some("from=3&count=10")).unwrap();
        assert_eq!(
            query,
            Pagination {
                from: Some(3),
                count: Some(10)
            }
        );
        let empty = parse_query::<Pagination>(None).unwrap();
        assert_eq!(empty, Pagination { from: None, count: None });
        assert!(parse_query::<Pagination>(Some("from=abc")).is_err());
    }

    #[test]
    fn body_is_parsed() {
        let body = hyper::Body::from(r#"{"name": "wheel"}"#);
        let payload = parse_body::<Payload>(body).wait().unwrap();
        assert_eq!(payload.name, "wheel");

        let broken = hyper::Body::from("{");
        assert!(parse_body::<Payload>(broken).wait().is_err());
    }

    #[test]
    fn user_id_is_read_from_authorization() {
        let mut headers = Headers::new();
        assert_eq!(get_user_id(&headers), None);
        headers.set(Authorization("12".to_string()));
        assert_eq!(get_user_id(&headers), Some(UserId(12)));
        headers.set(Authorization("Bearer token".to_string()));
        assert_eq!(get_user_id(&headers), None);
    }
}
