//! Scope of a permission

/// `All` grants access to any object, `Owned` only to objects the user
/// is tied to (own cart, own organization, requests matched to it, ...)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scope {
    All,
    Owned,
}
