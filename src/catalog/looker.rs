use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

use super::{Catalog, DashboardRecord};
use crate::config::CatalogConfig;
use crate::error::{MatchError, Result};

/// Catalog served by the Looker 4.0 REST API.
///
/// Logs in lazily with API3 client credentials and reuses the access token
/// for the lifetime of the catalog.
pub struct LookerCatalog {
    base_url: String,
    client_id: String,
    client_secret: String,
    folder_ids: Vec<String>,
    token: OnceCell<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct FolderDashboard {
    #[serde(default)]
    id: Option<String>,
}

impl LookerCatalog {
    pub fn new(config: &CatalogConfig, folder_ids: Vec<String>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            folder_ids,
            token: OnceCell::new(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn access_token(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| async {
                let response = self
                    .client
                    .post(format!("{}/api/4.0/login", self.base_url))
                    .form(&[
                        ("client_id", self.client_id.as_str()),
                        ("client_secret", self.client_secret.as_str()),
                    ])
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let text = response.text().await.unwrap_or_default();
                    return Err(MatchError::Catalog(format!(
                        "Login returned {}: {}",
                        status, text
                    )));
                }

                let login: LoginResponse = response.json().await?;
                Ok::<String, MatchError>(login.access_token)
            })
            .await?;
        Ok(token.as_str())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(format!("{}/api/4.0/{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MatchError::Catalog(format!(
                "GET {} returned {}: {}",
                path, status, text
            )));
        }

        Ok(response.json().await?)
    }

    async fn folder_dashboards(&self, folder_id: &str) -> Result<Vec<FolderDashboard>> {
        self.get_json(&format!("folders/{}/dashboards?fields=id,folder", folder_id))
            .await
    }
}

#[async_trait]
impl Catalog for LookerCatalog {
    async fn list_dashboard_ids(&self) -> Vec<String> {
        let listings = futures::future::try_join_all(
            self.folder_ids
                .iter()
                .map(|folder| self.folder_dashboards(folder)),
        )
        .await;

        match listings {
            Ok(folders) => folders
                .into_iter()
                .flatten()
                .filter_map(|d| d.id)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not list catalog dashboards");
                Vec::new()
            }
        }
    }

    async fn fetch_dashboard(&self, id: &str) -> Result<DashboardRecord> {
        self.get_json(&format!("dashboards/{}", id)).await
    }
}
