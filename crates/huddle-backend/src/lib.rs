//! # huddle-backend
//!
//! HTTP adapters for the hosted backend.
//!
//! - [`RestBackend`] implements [`huddle_core::ChatBackend`] against the query API
//! - [`StorageUploader`] implements [`huddle_core::FileUploader`] against the
//!   object storage service
//!
//! Both share one [`HttpClient`] carrying the project key and the signed-in
//! user's bearer token.

pub mod http;
pub mod rest;
pub mod storage;

pub use http::{HttpClient, HttpError};
pub use rest::RestBackend;
pub use storage::StorageUploader;
