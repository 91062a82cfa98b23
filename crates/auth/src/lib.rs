//! `stockledger-auth`: tenant access boundary.
//!
//! Resolves an actor plus a requested operation into a single access decision.
//! This crate is decoupled from HTTP, tokens and storage: the auth layer hands
//! over an already-authenticated [`Actor`].

pub mod guard;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use guard::{AccessDecision, AuthzError, Operation, RolePolicy, TenantAccessGuard};
pub use permissions::Permission;
pub use principal::{Actor, PrincipalId};
pub use roles::Role;
