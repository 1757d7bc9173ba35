//! REST API client module for the HR backend.
//!
//! This module provides the `ApiClient` for talking to the backend and the
//! `Backend` trait it implements. Responses from every endpoint go through
//! `response::interpret`; authenticated calls from views go through
//! `AuthContext::request`, which adds session teardown on a rejected token.
//!
//! The API uses bearer token authentication obtained from the login
//! endpoint.

pub mod backend;
pub mod client;
pub mod error;
pub mod response;

pub use backend::{ApiRequest, Backend};
pub use client::ApiClient;
pub use error::ApiError;
