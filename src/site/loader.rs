//! Sites file loader
//!
//! Resolves the `SiteConfig` for one run: an inline override wins over the
//! domain lookup, then the product URL override is applied and the result is
//! validated. Every failure here is a configuration error and stops the run
//! before any browser or network work starts.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::{SiteConfig, SitesFile};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required parameter: --{0}")]
    MissingParameter(&'static str),

    #[error("Invalid JSON in --config: {0}")]
    InvalidInlineJson(serde_json::Error),

    #[error("Domain \"{0}\" not found in sites file")]
    UnknownDomain(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {file}: {error}")]
    Parse { file: String, error: String },

    #[error("Invalid site config for \"{domain}\": {reason}")]
    Invalid { domain: String, reason: String },
}

/// What the caller asked for
#[derive(Debug, Clone, Default)]
pub struct SiteSelection {
    pub domain: String,

    /// Raw JSON `SiteConfig` taking precedence over the sites file
    pub inline_config: Option<String>,

    /// Replaces the resolved `productUrl`
    pub product_url: Option<String>,
}

impl SiteSelection {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    pub fn with_inline_config(mut self, json: impl Into<String>) -> Self {
        self.inline_config = Some(json.into());
        self
    }

    pub fn with_product_url(mut self, url: impl Into<String>) -> Self {
        self.product_url = Some(url.into());
        self
    }
}

pub struct SitesLoader;

impl SitesLoader {
    /// Load a sites file, JSON or YAML depending on the extension
    pub fn load_file(path: &Path) -> Result<SitesFile, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str());
        let parse_error = |error: String| ConfigError::Parse {
            file: path.display().to_string(),
            error,
        };

        match ext {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))
            }
            _ => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        }
    }

    /// Resolve the site config for one run.
    ///
    /// The sites file is only read when there is no inline override.
    pub fn resolve(sites_path: &Path, selection: &SiteSelection) -> Result<SiteConfig, ConfigError> {
        require("domain", &selection.domain)?;

        let site = match &selection.inline_config {
            Some(json) => serde_json::from_str::<SiteConfig>(json)
                .map_err(ConfigError::InvalidInlineJson)?,
            None => {
                let sites = Self::load_file(sites_path)?;
                Self::lookup(&sites, &selection.domain)?
            }
        };

        let site = match &selection.product_url {
            Some(url) => site.with_product_url(url.clone()),
            None => site,
        };

        site.validate().map_err(|reason| ConfigError::Invalid {
            domain: selection.domain.clone(),
            reason,
        })?;

        Ok(site)
    }

    /// Exact domain lookup. Only the selected entry is typed.
    pub fn lookup(sites: &SitesFile, domain: &str) -> Result<SiteConfig, ConfigError> {
        let raw = sites
            .sites
            .get(domain)
            .ok_or_else(|| ConfigError::UnknownDomain(domain.to_string()))?;
        Self::entry(sites, domain, raw)
    }

    /// Type and validate every entry, stopping at the first invalid one
    pub fn check(sites: &SitesFile) -> Result<BTreeMap<String, SiteConfig>, ConfigError> {
        let mut typed = BTreeMap::new();
        for (domain, raw) in &sites.sites {
            let site = Self::entry(sites, domain, raw)?;
            site.validate().map_err(|reason| ConfigError::Invalid {
                domain: domain.clone(),
                reason,
            })?;
            typed.insert(domain.clone(), site);
        }
        Ok(typed)
    }

    /// Write a sites file, JSON or YAML depending on the extension
    pub fn save_file(path: &Path, sites: &SitesFile) -> Result<(), ConfigError> {
        let serialize_error = |error: String| ConfigError::Parse {
            file: path.display().to_string(),
            error,
        };

        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => {
                serde_yaml::to_string(sites).map_err(|e| serialize_error(e.to_string()))?
            }
            _ => serde_json::to_string_pretty(sites).map_err(|e| serialize_error(e.to_string()))?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    fn entry(sites: &SitesFile, domain: &str, raw: &Value) -> Result<SiteConfig, ConfigError> {
        let mut raw = raw.clone();
        if let (Some(default), Some(entry)) = (sites.default_wait_time, raw.as_object_mut()) {
            entry
                .entry("waitTime")
                .or_insert_with(|| Value::from(default));
        }

        serde_json::from_value(raw).map_err(|e| ConfigError::Invalid {
            domain: domain.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Reject an absent or empty required parameter
pub fn require(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::MissingParameter(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::SiteKind;
    use std::fs;
    use tempfile::tempdir;

    const SITES_JSON: &str = r##"{
        "sites": {
            "shop.example": {
                "productUrl": "https://shop.example/p/1",
                "waitTime": 1000,
                "actions": [
                    { "name": "Type", "type": "fill", "selectors": ["#code"] }
                ],
                "codeValidation": { "element": "#msg", "validText": "Success" }
            },
            "api.example": {
                "type": "api",
                "apiUrl": "https://api.example/coupon",
                "params": { "code": "{{COUPON}}" },
                "codeValidation": { "validText": "valid" }
            }
        }
    }"##;

    fn write_sites(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("actions.json");
        fs::write(&path, SITES_JSON).unwrap();
        path
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempdir().unwrap();
        let sites = SitesLoader::load_file(&write_sites(dir.path())).unwrap();
        assert_eq!(sites.sites.len(), 2);
        let site = SitesLoader::lookup(&sites, "api.example").unwrap();
        assert_eq!(site.kind, SiteKind::Api);
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sites.yaml");
        fs::write(
            &path,
            r##"
sites:
  shop.example:
    productUrl: https://shop.example
    actions:
      - name: Apply
        type: click
        selectors: ["#apply"]
    codeValidation:
      element: "#msg"
      validText: ok
"##,
        )
        .unwrap();

        let sites = SitesLoader::load_file(&path).unwrap();
        let site = SitesLoader::lookup(&sites, "shop.example").unwrap();
        assert_eq!(site.kind, SiteKind::Session);
        assert_eq!(site.actions[0].selectors, vec!["#apply"]);
    }

    #[test]
    fn test_resolve_by_domain() {
        let dir = tempdir().unwrap();
        let path = write_sites(dir.path());
        let site = SitesLoader::resolve(&path, &SiteSelection::new("shop.example")).unwrap();
        assert_eq!(site.product_url.as_deref(), Some("https://shop.example/p/1"));
    }

    #[test]
    fn test_unknown_domain() {
        let dir = tempdir().unwrap();
        let path = write_sites(dir.path());
        let err = SitesLoader::resolve(&path, &SiteSelection::new("SHOP.example")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDomain(d) if d == "SHOP.example"));
    }

    #[test]
    fn test_inline_override_wins() {
        let dir = tempdir().unwrap();
        let path = write_sites(dir.path());
        let selection = SiteSelection::new("shop.example").with_inline_config(
            r##"{ "type": "api", "apiUrl": "http://inline", "codeValidation": { "validText": "v" } }"##,
        );
        let site = SitesLoader::resolve(&path, &selection).unwrap();
        assert_eq!(site.kind, SiteKind::Api);
        assert_eq!(site.api_url.as_deref(), Some("http://inline"));
    }

    #[test]
    fn test_inline_override_without_sites_file() {
        let dir = tempdir().unwrap();
        let selection = SiteSelection::new("anything").with_inline_config(
            r##"{ "productUrl": "http://x", "codeValidation": { "element": "#m", "validText": "v" } }"##,
        );
        let site = SitesLoader::resolve(&dir.path().join("missing.json"), &selection).unwrap();
        assert_eq!(site.kind, SiteKind::Session);
    }

    #[test]
    fn test_invalid_inline_json() {
        let dir = tempdir().unwrap();
        let path = write_sites(dir.path());
        let selection = SiteSelection::new("shop.example").with_inline_config("{not json");
        let err = SitesLoader::resolve(&path, &selection).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInlineJson(_)));
        assert!(err.to_string().starts_with("Invalid JSON in --config"));
    }

    #[test]
    fn test_product_url_override() {
        let dir = tempdir().unwrap();
        let path = write_sites(dir.path());
        let selection =
            SiteSelection::new("shop.example").with_product_url("https://shop.example/other");
        let site = SitesLoader::resolve(&path, &selection).unwrap();
        assert_eq!(site.product_url.as_deref(), Some("https://shop.example/other"));
    }

    #[test]
    fn test_missing_domain() {
        let dir = tempdir().unwrap();
        let err = SitesLoader::resolve(&write_sites(dir.path()), &SiteSelection::new("")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingParameter("domain")));
    }

    #[test]
    fn test_missing_sites_file() {
        let dir = tempdir().unwrap();
        let err = SitesLoader::resolve(
            &dir.path().join("missing.json"),
            &SiteSelection::new("shop.example"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_unknown_action_type_is_invalid_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("actions.json");
        fs::write(
            &path,
            r##"{ "sites": { "a": {
                "productUrl": "http://a",
                "actions": [{ "type": "teleport", "selectors": ["#x"] }],
                "codeValidation": { "element": "#m", "validText": "v" }
            } } }"##,
        )
        .unwrap();
        assert!(SitesLoader::load_file(&path).is_ok());

        let err = SitesLoader::resolve(&path, &SiteSelection::new("a")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref domain, .. } if domain == "a"));
        assert!(err.to_string().contains("teleport"));
    }

    #[test]
    fn test_broken_entry_does_not_affect_other_domains() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("actions.json");
        fs::write(
            &path,
            r##"{ "sites": {
                "good.example": {
                    "productUrl": "http://good",
                    "actions": [{ "type": "click", "selectors": ["#apply"] }],
                    "codeValidation": { "element": "#m", "validText": "v" }
                },
                "bad.example": {
                    "productUrl": "http://bad",
                    "actions": [{ "type": "press", "selectors": ["#x"] }],
                    "codeValidation": { "element": "#m", "validText": "v" }
                }
            } }"##,
        )
        .unwrap();

        let site = SitesLoader::resolve(&path, &SiteSelection::new("good.example")).unwrap();
        assert_eq!(site.actions.len(), 1);

        let sites = SitesLoader::load_file(&path).unwrap();
        let err = SitesLoader::check(&sites).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref domain, .. } if domain == "bad.example"));
    }

    #[test]
    fn test_default_wait_time_fills_missing_entries() {
        let sites: SitesFile = serde_json::from_str(
            r##"{
                "defaultWaitTime": 1000,
                "sites": {
                    "a": { "productUrl": "http://a", "codeValidation": { "element": "#m", "validText": "v" } },
                    "b": { "productUrl": "http://b", "waitTime": 250, "codeValidation": { "element": "#m", "validText": "v" } }
                }
            }"##,
        )
        .unwrap();

        let a = SitesLoader::lookup(&sites, "a").unwrap();
        let b = SitesLoader::lookup(&sites, "b").unwrap();
        assert_eq!(a.wait_time(), std::time::Duration::from_millis(1000));
        assert_eq!(b.wait_time(), std::time::Duration::from_millis(250));
    }

    #[test]
    fn test_promo_code_aliases() {
        let sites: SitesFile = serde_json::from_str(
            r##"{ "sites": { "a": {
                "productUrl": "http://a",
                "promoCode": { "elementAlert": ".alert", "validText": "applied" }
            } } }"##,
        )
        .unwrap();

        let site = SitesLoader::lookup(&sites, "a").unwrap();
        assert_eq!(site.code_validation.element.as_deref(), Some(".alert"));
        assert_eq!(site.code_validation.valid_text, "applied");
    }

    #[test]
    fn test_save_file_keeps_entries() {
        let dir = tempdir().unwrap();
        let path = write_sites(dir.path());
        let sites = SitesLoader::load_file(&path).unwrap();

        let copy = dir.path().join("copy.yaml");
        SitesLoader::save_file(&copy, &sites).unwrap();
        let reloaded = SitesLoader::load_file(&copy).unwrap();

        assert_eq!(reloaded.sites, sites.sites);
        assert!(SitesLoader::check(&reloaded).is_ok());
    }

    #[test]
    fn test_check_reports_domain() {
        let sites: SitesFile = serde_json::from_str(
            r##"{ "sites": { "broken.example": { "type": "api", "codeValidation": { "validText": "v" } } } }"##,
        )
        .unwrap();
        let err = SitesLoader::check(&sites).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref domain, .. } if domain == "broken.example"));
    }
}
