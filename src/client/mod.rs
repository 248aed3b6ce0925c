//! Client for the remote site registry
//!
//! The registry serves site configs page by page; `sync` turns them into a
//! local sites file.

pub mod sites;
pub mod types;

pub use sites::{build_sites_file, merge_sites, SitesClient, DEFAULT_SITES_API_URL};
pub use types::{RemoteAction, RemoteSite, RemoteSiteConfig, RemoteValidation, SitesPage};
