use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const VT_URL_ENDPOINT: &str = "https://www.virustotal.com/api/v3/urls";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Malicious,
    Suspicious,
    Clean,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlVerdict {
    pub verdict: Verdict,
    pub details: String,
}

impl UrlVerdict {
    pub fn error(details: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Error,
            details: details.into(),
        }
    }
}

/// Map vendor analysis counts onto a verdict. Malicious flags take
/// precedence over suspicious ones; zero flags of either kind is clean.
pub fn verdict_from_stats(malicious: u32, suspicious: u32) -> UrlVerdict {
    if malicious > 0 {
        UrlVerdict {
            verdict: Verdict::Malicious,
            details: format!("Flagged by {malicious} security vendors"),
        }
    } else if suspicious > 0 {
        UrlVerdict {
            verdict: Verdict::Suspicious,
            details: format!("Flagged as suspicious by {suspicious} security vendors"),
        }
    } else {
        UrlVerdict {
            verdict: Verdict::Clean,
            details: "No security vendors flagged this URL".to_string(),
        }
    }
}

/// Stable identifier for a URL: URL-safe base64 of the raw string with
/// padding stripped, as required by the VirusTotal v3 URL endpoint.
pub fn url_identifier(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(url.as_bytes())
}

/// Reputation lookup capability. Implementations must never fail the
/// request as a whole; every outcome maps to a verdict, including `Error`.
#[allow(async_fn_in_trait)]
pub trait UrlReputation {
    async fn check_url(&self, url: &str) -> UrlVerdict;
}

#[derive(Debug, Default, Deserialize)]
struct VtAnalysisStats {
    #[serde(default)]
    malicious: u32,
    #[serde(default)]
    suspicious: u32,
}

#[derive(Debug, Default, Deserialize)]
struct VtAttributes {
    #[serde(default)]
    last_analysis_stats: VtAnalysisStats,
}

#[derive(Debug, Default, Deserialize)]
struct VtData {
    #[serde(default)]
    attributes: VtAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct VtResponse {
    #[serde(default)]
    data: VtData,
}

/// VirusTotal-backed reputation client.
pub struct VirusTotalClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl VirusTotalClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("smishscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            endpoint: VT_URL_ENDPOINT.to_string(),
        }
    }

    #[cfg(test)]
    fn with_endpoint(api_key: Option<String>, endpoint: &str) -> Self {
        let mut client = Self::new(api_key);
        client.endpoint = endpoint.to_string();
        client
    }

    async fn query(&self, url: &str, api_key: &str) -> Result<UrlVerdict, reqwest::Error> {
        let endpoint = format!("{}/{}", self.endpoint, url_identifier(url));
        let response = self
            .client
            .get(&endpoint)
            .header("x-apikey", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            log::debug!("Reputation lookup for {url} returned {}", response.status());
            return Ok(UrlVerdict::error("API request failed"));
        }

        let body: VtResponse = response.json().await?;
        let stats = body.data.attributes.last_analysis_stats;
        Ok(verdict_from_stats(stats.malicious, stats.suspicious))
    }
}

impl UrlReputation for VirusTotalClient {
    /// Check one URL. Missing credentials and transport failures degrade
    /// to an `Error` verdict for this URL only; they never propagate.
    async fn check_url(&self, url: &str) -> UrlVerdict {
        let Some(api_key) = self.api_key.as_deref() else {
            return UrlVerdict::error("Missing API key");
        };

        match self.query(url, api_key).await {
            Ok(verdict) => verdict,
            Err(e) => {
                log::debug!("Reputation lookup failed for {url}: {e}");
                UrlVerdict::error(e.to_string())
            }
        }
    }
}
