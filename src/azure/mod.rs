//! Azure Repos backend.
//!
//! [`AzureReposClient`] implements [`VcsClient`](crate::VcsClient) on top of
//! the Azure DevOps REST API. SDK access is abstracted behind the traits in
//! [`traits`], raw HTTP calls live in the `http` module.

mod client;
mod http;
mod mappers;
pub mod traits;

pub use client::{AzureReposClient, flatten_threads};
pub use http::AzureEndpoint;
pub use traits::{GitOperations, RealGitOperations};
