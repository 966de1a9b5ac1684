use serde::Deserialize;
use std::path::Path;

/// Read-only lookup of legitimate sender identifiers.
///
/// Matching is exact and case-sensitive on purpose: normalizing here would
/// let "surepay" or "SUREPAY" pass for the registered "SurePay" and open
/// the door to lookalike spoofing.
pub trait KnownSenderSource {
    fn is_known(&self, sender_id: &str) -> bool;
}

/// In-memory sender set, typically seeded from the config file.
#[derive(Debug, Clone)]
pub struct StaticSenderSet {
    senders: Vec<String>,
}

impl StaticSenderSet {
    pub fn new(senders: Vec<String>) -> Self {
        Self { senders }
    }
}

impl KnownSenderSource for StaticSenderSet {
    fn is_known(&self, sender_id: &str) -> bool {
        self.senders.iter().any(|s| s == sender_id)
    }
}

#[derive(Debug, Deserialize)]
struct SenderRecord {
    #[serde(default)]
    sender_id: Option<String>,
}

/// Sender set backed by a JSON file of `[{"sender_id": "..."}, ...]` records.
///
/// Loaded once at startup; records without a `sender_id` field are skipped.
#[derive(Debug, Clone)]
pub struct JsonSenderStore {
    senders: Vec<String>,
}

impl JsonSenderStore {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<SenderRecord> = serde_json::from_str(&content)?;
        let senders: Vec<String> = records.into_iter().filter_map(|r| r.sender_id).collect();
        log::debug!("Loaded {} sender ids from {}", senders.len(), path.display());
        Ok(Self { senders })
    }
}

impl KnownSenderSource for JsonSenderStore {
    fn is_known(&self, sender_id: &str) -> bool {
        self.senders.iter().any(|s| s == sender_id)
    }
}

/// The sender source variant selected at startup: a JSON store when one is
/// configured and readable, otherwise the static set from the config file.
#[derive(Debug, Clone)]
pub enum SenderSource {
    Static(StaticSenderSet),
    Store(JsonSenderStore),
}

impl KnownSenderSource for SenderSource {
    fn is_known(&self, sender_id: &str) -> bool {
        match self {
            SenderSource::Static(set) => set.is_known(sender_id),
            SenderSource::Store(store) => store.is_known(sender_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_static_set_exact_match() {
        let set = StaticSenderSet::new(vec!["HELB".to_string(), "SurePay".to_string()]);
        assert!(set.is_known("HELB"));
        assert!(set.is_known("SurePay"));
        assert!(!set.is_known("Equity"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let set = StaticSenderSet::new(vec!["HELB".to_string()]);
        assert!(!set.is_known("helb"));
        assert!(!set.is_known("Helb"));
    }

    #[test]
    fn test_json_store_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"sender_id": "HELB"}}, {{"sender_id": "5122"}}, {{"name": "no id"}}]"#
        )
        .unwrap();

        let store = JsonSenderStore::load(file.path()).unwrap();
        assert!(store.is_known("HELB"));
        assert!(store.is_known("5122"));
        assert!(!store.is_known("no id"));
    }

    #[test]
    fn test_json_store_missing_file() {
        assert!(JsonSenderStore::load(Path::new("/nonexistent/sender_ids.json")).is_err());
    }
}
