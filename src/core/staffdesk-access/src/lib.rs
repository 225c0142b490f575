//! # Staffdesk Access
//!
//! Access control primitives for the Staffdesk console.
//!
//! This crate is pure: no I/O, no global mutable state. It provides:
//! - The closed set of staff [`Role`]s and [`Capability`] flags
//! - The canonical role table (capabilities, modules, routes, dashboard)
//! - Route rules with an explicit ADMIN bypass
//! - The [`RouteGuard`] navigation state machine
//! - The post-login redirector

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod guard;
pub mod redirect;
pub mod role;
pub mod route;
pub mod table;

pub use error::AccessError;
pub use guard::{GuardOutcome, GuardState, LoginRedirect, Resolution, RouteGuard, LOGIN_PATH};
pub use redirect::{dashboard_route, is_staff_route, post_login_redirect, STAFF_PREFIXES};
pub use role::{Capability, Module, Role, RoleMatch};
pub use route::{RoutePattern, RouteRule, RouteTable};
pub use table::{can_access_module, has_permission, has_role, RoleProfile};
