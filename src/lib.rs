//! # vcsclient
//!
//! A uniform client interface over VCS hosting providers. Callers program
//! against the [`VcsClient`] trait; a provider backend maps each operation
//! onto its REST API and normalizes the results into the shared models.
//!
//! This crate ships the Azure Repos backend:
//!
//! - repository, branch and commit queries
//! - branch snapshot download into a local directory
//! - pull request creation, listing and comments
//! - explicit `Unsupported` errors for operations Azure Repos lacks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use vcsclient::{ClientBuilder, models::VcsProvider};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClientBuilder::new(VcsProvider::AzureRepos)
//!     .api_endpoint("https://dev.azure.com/my-org/")
//!     .token("my-pat")
//!     .project("my-project")
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! let commit = client.get_latest_commit(&cancel, "", "my-repo", "main").await?;
//! println!("main is at {}", commit.hash);
//! # Ok(())
//! # }
//! ```

pub mod azure;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod parsed_property;
pub mod utils;

// Re-export commonly used types for convenience
pub use azure::AzureReposClient;
pub use client::{ClientBuilder, VcsClient};
pub use config::Config;
pub use error::{ErrorKind, VcsError, VcsResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
