pub mod looker;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};

pub use looker::LookerCatalog;

/// A dashboard as returned by the catalog API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dashboard_elements: Option<Vec<ElementRecord>>,
}

/// One tile of a dashboard (chart, text tile, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle_text: Option<String>,
    #[serde(default)]
    pub note_text: Option<String>,
    #[serde(default)]
    pub body_text: Option<String>,
    #[serde(default)]
    pub result_maker: Option<ResultMaker>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMaker {
    #[serde(default)]
    pub filterables: Option<Vec<Filterable>>,
}

/// A filter group; `listen` names the dashboard filters the element reacts to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filterable {
    #[serde(default)]
    pub listen: Option<Vec<FilterListener>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterListener {
    #[serde(default)]
    pub dashboard_filter_name: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
}

/// Source of raw dashboard data.
///
/// `list_dashboard_ids` never fails: a catalog that cannot be listed is an
/// empty catalog. Individual fetches may fail and callers decide what a
/// failure means for them.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_dashboard_ids(&self) -> Vec<String>;

    async fn fetch_dashboard(&self, id: &str) -> Result<DashboardRecord>;
}

/// Catalog backed by a JSON export (an array of dashboard records)
pub struct FileCatalog {
    dashboards: Vec<DashboardRecord>,
}

impl FileCatalog {
    pub fn new(dashboards: Vec<DashboardRecord>) -> Self {
        Self { dashboards }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let dashboards: Vec<DashboardRecord> = serde_json::from_str(&content)?;
        Ok(Self::new(dashboards))
    }
}

#[async_trait]
impl Catalog for FileCatalog {
    async fn list_dashboard_ids(&self) -> Vec<String> {
        self.dashboards
            .iter()
            .filter_map(|d| d.id.clone())
            .collect()
    }

    async fn fetch_dashboard(&self, id: &str) -> Result<DashboardRecord> {
        self.dashboards
            .iter()
            .find(|d| d.id.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| MatchError::Catalog(format!("Dashboard {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[
        {"id": "1", "title": "Sales", "description": null, "dashboard_elements": [
            {"id": "10", "title": "Revenue", "body_text": null,
             "result_maker": {"filterables": [{"listen": [{"dashboard_filter_name": "Region"}]}]}}
        ]},
        {"title": "No id"},
        {"id": "2", "title": "Ops"}
    ]"#;

    #[tokio::test]
    async fn test_file_catalog_lists_only_identified_dashboards() {
        let dashboards: Vec<DashboardRecord> = serde_json::from_str(EXPORT).unwrap();
        let catalog = FileCatalog::new(dashboards);
        assert_eq!(catalog.list_dashboard_ids().await, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_file_catalog_fetch() {
        let dashboards: Vec<DashboardRecord> = serde_json::from_str(EXPORT).unwrap();
        let catalog = FileCatalog::new(dashboards);

        let sales = catalog.fetch_dashboard("1").await.unwrap();
        let elements = sales.dashboard_elements.unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].title.as_deref(), Some("Revenue"));

        assert!(matches!(
            catalog.fetch_dashboard("404").await,
            Err(MatchError::Catalog(_))
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("dashboards.json");
        std::fs::write(&path, EXPORT).unwrap();
        let catalog = FileCatalog::load(&path).unwrap();
        assert_eq!(catalog.dashboards.len(), 3);
    }
}
