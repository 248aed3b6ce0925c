use reqwest::header::ACCEPT;
use tracing::{debug, info};

use crate::client::types::{RemoteSite, SitesPage};
use crate::site::SitesFile;

pub const DEFAULT_SITES_API_URL: &str = "http://49.13.237.126/api/sites";

/// Entries requested per page; a shorter page is the last one
pub const PAGE_LIMIT: usize = 100;

pub const MAX_PAGES: u32 = 50;

/// `defaultWaitTime` of a freshly synced sites file
pub const SYNCED_DEFAULT_WAIT_TIME: u64 = 1000;

pub struct SitesClient {
    client: reqwest::Client,
    url: String,
}

impl SitesClient {
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
        }
    }

    pub async fn fetch_page(
        &self,
        page: u32,
        store_id: Option<u64>,
    ) -> anyhow::Result<Vec<RemoteSite>> {
        let mut query = vec![("page", page.to_string()), ("limit", PAGE_LIMIT.to_string())];
        if let Some(id) = store_id {
            query.push(("store_id", id.to_string()));
        }

        debug!("Fetching {} page {}", self.url, page);
        let response = self
            .client
            .get(&self.url)
            .query(&query)
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;

        let result: SitesPage = response.json().await?;
        Ok(result.data)
    }

    /// Every registry entry, page by page
    pub async fn fetch_all(&self) -> anyhow::Result<Vec<RemoteSite>> {
        let mut sites = Vec::new();

        for page in 1..=MAX_PAGES {
            let batch = self.fetch_page(page, None).await?;
            let last = batch.len() < PAGE_LIMIT;
            info!(page, count = batch.len(), "Fetched sites page");
            sites.extend(batch);
            if last {
                break;
            }
        }

        Ok(sites)
    }

    /// The registry entry of one store, if it has one
    pub async fn fetch_store(&self, store_id: u64) -> anyhow::Result<Option<RemoteSite>> {
        let sites = self.fetch_page(1, Some(store_id)).await?;
        Ok(sites.into_iter().next())
    }
}

/// A fresh sites file holding `remote`
pub fn build_sites_file(remote: &[RemoteSite]) -> SitesFile {
    let mut sites = SitesFile {
        default_wait_time: Some(SYNCED_DEFAULT_WAIT_TIME),
        ..SitesFile::default()
    };
    merge_sites(&mut sites, remote);
    sites
}

/// Add or replace entries by store domain. Returns the domains written;
/// entries without a domain are skipped.
pub fn merge_sites(sites: &mut SitesFile, remote: &[RemoteSite]) -> Vec<String> {
    let mut written = Vec::new();

    for site in remote {
        let Some(domain) = site.store_domain.as_deref().filter(|d| !d.is_empty()) else {
            debug!("Skipping registry entry without store_domain");
            continue;
        };
        sites
            .sites
            .insert(domain.to_string(), site.config.to_entry());
        written.push(domain.to_string());
    }

    written
}
