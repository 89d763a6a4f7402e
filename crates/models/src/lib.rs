pub mod errors;
pub mod db;
pub mod validation;
pub mod user;
pub mod user_credentials;
pub mod customer;
pub mod professional;
pub mod catalog;
pub mod professional_document;
pub mod service_request;
pub mod review;

#[cfg(test)]
mod tests;
