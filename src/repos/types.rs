use failure::Error as FailureError;

use models::authorization::*;
use repos::acl::Acl;

pub type RepoResult<T> = Result<T, FailureError>;
pub type RepoAcl<T> = Acl<Resource, Action, Scope, FailureError, T>;
