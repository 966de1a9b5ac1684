use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Organization name used in advisory text.
    pub organization: String,
    /// Exact sender identifiers the organization sends from. Matching is
    /// case-sensitive everywhere these are used.
    pub known_senders: Vec<String>,
    /// Optional path to a JSON sender store (`[{"sender_id": "..."}]`).
    /// When set and readable it replaces `known_senders` for lookups.
    pub sender_store: Option<String>,
    /// Directory holding uploaded screenshots, swept before each run.
    pub upload_dir: String,
    /// Uploads older than this many days are removed by the sweep.
    pub retention_days: u64,
    /// Tesseract language code.
    pub ocr_language: String,
    /// Persist a copy of the normalized header image next to the input
    /// for inspection.
    pub save_preprocessed: bool,
    /// VirusTotal API key; falls back to the VT_API_KEY environment
    /// variable when unset.
    pub virustotal_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            organization: "HELB".to_string(),
            known_senders: vec![
                "HELB".to_string(),
                "SurePay".to_string(),
                "5122".to_string(),
            ],
            sender_store: None,
            upload_dir: "uploads".to_string(),
            retention_days: 1,
            ocr_language: "eng".to_string(),
            save_preprocessed: false,
            virustotal_api_key: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// API key from the config file, or the VT_API_KEY environment
    /// variable as a fallback.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.virustotal_api_key
            .clone()
            .or_else(|| std::env::var("VT_API_KEY").ok())
    }
}
