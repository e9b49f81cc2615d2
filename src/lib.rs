//! Route access guards for protected pages of the learning platform.
//!
//! A `RouteGuard` fetches the current user's authorization state, evaluates
//! one access predicate, and redirects to the unauthorized error page when the
//! predicate denies. The `routes` module runs the guards as an axum gateway in
//! front of the frontend's static pages.

pub mod config;
pub mod guard;
pub mod identity;
pub mod navigation;
pub mod policy;
pub mod registry;
pub mod routes;
pub mod state;
