/// Blocked-site list and the block decision shared by both enforcement points

use crate::settings::Settings;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use uuid::Uuid;

/// One user-entered domain fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedSite {
    #[serde(default = "new_id", deserialize_with = "id_from_value")]
    pub id: String,
    pub url: String,
}

impl BlockedSite {
    pub fn new(url: &str) -> BlockedSite {
        BlockedSite {
            id: new_id(),
            url: url.trim().to_lowercase(),
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Imported lists may carry numeric ids
fn id_from_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        Value::Null => Ok(new_id()),
        other => Err(de::Error::custom(format!("unsupported site id: {}", other))),
    }
}

/// The `blockedSites` record: a plain JSON array of entries.
///
/// Entries that cannot be read are skipped one by one, so a single bad
/// entry never switches off blocking for the rest of the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BlockList {
    pub sites: Vec<BlockedSite>,
}

impl<'de> Deserialize<'de> for BlockList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<Value>::deserialize(deserializer)?;
        let sites = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<BlockedSite>(entry) {
                Ok(site) => Some(site),
                Err(e) => {
                    log::warn!("Skipping unreadable blocked site: {}", e);
                    None
                }
            })
            .collect();
        Ok(BlockList { sites })
    }
}

impl BlockList {
    pub fn new() -> Self {
        BlockList { sites: Vec::new() }
    }

    /// Add an entry typed by the user. Blank input is ignored.
    pub fn add(&mut self, input: &str) -> Option<&BlockedSite> {
        if input.trim().is_empty() {
            return None;
        }
        self.sites.push(BlockedSite::new(input));
        self.sites.last()
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let original_len = self.sites.len();
        self.sites.retain(|s| s.id != id);
        self.sites.len() < original_len
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }
}

impl From<Vec<BlockedSite>> for BlockList {
    fn from(sites: Vec<BlockedSite>) -> Self {
        BlockList { sites }
    }
}

/// Drop a leading `www.`
pub fn normalize(domain: &str) -> &str {
    domain.strip_prefix("www.").unwrap_or(domain)
}

/// Substring match of the target against every entry.
///
/// Matching is deliberately loose: `example.com` also catches
/// `mail.example.com` and `notexample.com.evil.org`. Empty entries never
/// match anything.
pub fn matches_blocklist(target_domain: &str, blocked_sites: &[BlockedSite]) -> bool {
    let target = normalize(target_domain);
    blocked_sites.iter().any(|site| {
        let entry = normalize(&site.url);
        !entry.is_empty() && target.contains(entry)
    })
}

/// The block decision. Always false while focus mode is switched off.
pub fn is_blocked(target_domain: &str, blocked_sites: &[BlockedSite], settings: &Settings) -> bool {
    settings.focus_enabled() && matches_blocklist(target_domain, blocked_sites)
}

/// Lower-cased hostname of an `http`/`https` URL.
///
/// Browser-internal pages (`chrome://`, `about:`, extension pages) and
/// unparsable URLs yield `None` and are never blocked.
pub fn hostname_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(|host| host.to_lowercase())
}
