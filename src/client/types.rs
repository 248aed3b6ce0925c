use serde::Deserialize;
use serde_json::{json, Value};

/// `waitTime` written for registry entries that have none
pub const DEFAULT_WAIT_TIME: u64 = 5000;

/// `waitAfter` written for registry actions that have none
pub const DEFAULT_WAIT_AFTER: u64 = 5000;

/// One page of `GET /api/sites`
#[derive(Debug, Clone, Deserialize)]
pub struct SitesPage {
    #[serde(default)]
    pub data: Vec<RemoteSite>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSite {
    #[serde(default)]
    pub store_domain: Option<String>,
    #[serde(default)]
    pub config: RemoteSiteConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSiteConfig {
    #[serde(default)]
    pub product_url: String,
    #[serde(default)]
    pub wait_time: Option<u64>,
    #[serde(default)]
    pub actions: Vec<RemoteAction>,
    #[serde(default)]
    pub code_validation: RemoteValidation,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAction {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub selectors: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub wait_after: Option<u64>,
    #[serde(default)]
    pub event: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteValidation {
    #[serde(default)]
    pub element: String,
    #[serde(default)]
    pub valid_text: String,
}

impl RemoteSiteConfig {
    /// Sites file entry for this config.
    ///
    /// The entry is left untyped; an action type this crate does not know
    /// only surfaces when the domain is looked up.
    pub fn to_entry(&self) -> Value {
        let actions: Vec<Value> = self
            .actions
            .iter()
            .map(|action| {
                json!({
                    "name": action.name,
                    "selectors": action.selectors,
                    "type": action.kind.as_deref().unwrap_or("click"),
                    "waitAfter": action.wait_after.unwrap_or(DEFAULT_WAIT_AFTER),
                    "event": action.event,
                })
            })
            .collect();

        let mut validation = json!({ "validText": self.code_validation.valid_text });
        if !self.code_validation.element.is_empty() {
            validation["element"] = json!(self.code_validation.element);
        }

        json!({
            "productUrl": self.product_url,
            "waitTime": self.wait_time.unwrap_or(DEFAULT_WAIT_TIME),
            "actions": actions,
            "codeValidation": validation,
        })
    }
}
