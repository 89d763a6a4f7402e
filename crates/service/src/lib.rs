//! Service layer: marketplace business rules on top of `models`.
//! - Each operation takes the resolved [`principal::Principal`] and enforces its role and ownership rules.
//! - Multi-statement writes go through an explicit [`uow::UnitOfWork`].
//! - Errors are [`errors::ServiceError`]; the HTTP crate maps them to status codes.

pub mod errors;
pub mod auth;
pub mod principal;
pub mod uow;
pub mod pagination;
pub mod catalog;
pub mod users;
pub mod professionals;
pub mod documents;
pub mod lifecycle;
pub mod rating;
pub mod stats;
pub mod jobs;
pub mod runtime;
#[cfg(test)]
pub mod test_support;
#[cfg(test)]
mod tests;
