use std::collections::BTreeMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub per_path: BTreeMap<String, u64>,
    pub per_recording: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub id: String,
    pub source: String,
    pub priority: i32,
    pub load_index: usize,
    pub path: String,
    pub exact_path: bool,
    pub status: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    pub version: String,
    pub status: String,
    pub recordings: usize,
}

/// Client for the Troxy admin API.
pub struct TroxyClient {
    client: Client,
    admin_url: String,
    api_key: Option<String>,
}

impl TroxyClient {
    /// `server_url` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(server_url: &str) -> Self {
        Self::with_prefix(server_url, "/troxy/api")
    }

    /// Use a non-default admin path prefix.
    pub fn with_prefix(server_url: &str, prefix: &str) -> Self {
        Self {
            client: Client::builder().no_proxy().build().unwrap_or_default(),
            admin_url: format!("{}{}", server_url.trim_end_matches('/'), prefix),
            api_key: None,
        }
    }

    /// Send `Authorization: Bearer <key>` with every admin request.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let resp = self
            .authorized(self.client.get(format!("{}/{}", self.admin_url, endpoint)))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(format!("Admin API returned error status {}: {}", status, text).into());
        }

        Ok(serde_json::from_str(&text)?)
    }

    pub async fn status(&self) -> Result<ServerStatus, Box<dyn std::error::Error>> {
        self.get_json("status").await
    }

    pub async fn recordings(&self) -> Result<Vec<RecordingSummary>, Box<dyn std::error::Error>> {
        self.get_json("recordings").await
    }

    pub async fn statistics(&self) -> Result<Statistics, Box<dyn std::error::Error>> {
        self.get_json("statistics").await
    }

    pub async fn request_counter_per_path(
        &self,
    ) -> Result<BTreeMap<String, u64>, Box<dyn std::error::Error>> {
        self.get_json("statistics/paths").await
    }

    pub async fn request_counter_per_recording(
        &self,
    ) -> Result<BTreeMap<String, u64>, Box<dyn std::error::Error>> {
        self.get_json("statistics/recordings").await
    }

    /// Zero every counter on the server.
    pub async fn reset_statistics(&self) -> Result<(), Box<dyn std::error::Error>> {
        let resp = self
            .authorized(self.client.delete(format!("{}/statistics", self.admin_url)))
            .send()
            .await?;

        match resp.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            status => Err(format!("Admin API returned error status {}", status).into()),
        }
    }
}
