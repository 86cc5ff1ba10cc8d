//! Translation of failures into http error responses

use failure::{Context, Error as FailureError, Fail};
use hyper::StatusCode;
use serde_json;

/// Errors that know their http status
pub trait Codeable {
    fn code(&self) -> StatusCode;
}

/// Errors that carry extra json for the client, e.g. validation details
pub trait PayloadCarrier {
    fn payload(&self) -> Option<serde_json::Value>;
}

/// Body of every error response
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorMessage {
    pub code: u16,
    pub description: String,
    pub payload: Option<serde_json::Value>,
}

/// Finds the outermost `E` in the cause chain, bare or attached as a context
pub fn find_error<E: Fail>(err: &FailureError) -> Option<&E> {
    err.iter_chain().filter_map(|cause| {
        cause
            .downcast_ref::<E>()
            .or_else(|| cause.downcast_ref::<Context<E>>().map(|ctx| ctx.get_context()))
    }).next()
}

/// Status code of the failure, 500 when no known kind is found
pub fn error_code<E: Fail + Codeable>(err: &FailureError) -> StatusCode {
    find_error::<E>(err).map(|e| e.code()).unwrap_or(StatusCode::InternalServerError)
}

/// Builds the response message. Failures without a known kind become 500.
pub fn error_message<E: Fail + Codeable + PayloadCarrier>(err: &FailureError) -> ErrorMessage {
    match find_error::<E>(err) {
        Some(e) => {
            let code = e.code();
            let description = if code == StatusCode::InternalServerError {
                "Internal server error".to_string()
            } else {
                e.to_string()
            };
            ErrorMessage {
                code: code.as_u16(),
                description,
                payload: e.payload(),
            }
        }
        None => ErrorMessage {
            code: StatusCode::InternalServerError.as_u16(),
            description: "Internal server error".to_string(),
            payload: None,
        },
    }
}

/// Renders the whole cause chain on one line for logs
pub fn error_chain_to_string(err: &FailureError) -> String {
    err.iter_chain().map(|cause| cause.to_string()).collect::<Vec<_>>().join(" | ")
}

#[cfg(test)]
mod tests {
    use failure::Fail;
    use hyper::StatusCode;

    use super::*;
    use errors::Error;

    #[test]
    fn finds_kind_attached_as_context() {
        let err: FailureError = format_err!("Product 1 not found").context(Error::NotFound).into();
        let err: FailureError = err.context("Service Products, get endpoint error occurred.").into();
        let message = error_message::<Error>(&err);
        assert_eq!(message.code, StatusCode::NotFound.as_u16());
        assert_eq!(message.description, "Not found");
    }

    #[test]
    fn finds_bare_kind() {
        let err: FailureError = Error::Forbidden.into();
        assert_eq!(error_message::<Error>(&err).code, 403);
    }

    #[test]
    fn validation_payload_is_exposed() {
        let err: FailureError = Error::Validate(validation_errors!({"quantity": ["quantity" => "Quantity must be positive"]})).into();
        let message = error_message::<Error>(&err);
        assert_eq!(message.code, 400);
        assert!(message.payload.is_some());
    }

    #[test]
    fn unknown_failures_are_internal() {
        let err = format_err!("boom");
        let message = error_message::<Error>(&err);
        assert_eq!(message.code, 500);
        assert_eq!(message.description, "Internal server error");
        assert!(error_chain_to_string(&err).contains("boom"));
    }
}
