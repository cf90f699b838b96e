//! Corpus building: walk the catalog and turn every dashboard into one or more
//! embeddable metadata units.
//!
//! A dashboard without elements yields a single [`MetadataUnit::DashboardOnly`];
//! a dashboard with N elements yields N [`MetadataUnit::DashboardElement`]
//! units, each carrying the dashboard's own fields.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, DashboardRecord, ElementRecord};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetadata {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementMetadata {
    #[serde(default)]
    pub element_id: Option<String>,
    pub dashboard_id: String,
    #[serde(default)]
    pub body_text: Vec<String>,
    #[serde(default)]
    pub note_text: Option<String>,
    #[serde(default)]
    pub subtitle_text: Option<String>,
    #[serde(default)]
    pub element_title: Option<String>,
    #[serde(default)]
    pub filterables: Vec<Option<String>>,
}

/// One embeddable record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetadataUnit {
    DashboardOnly {
        dashboard: DashboardMetadata,
    },
    DashboardElement {
        dashboard: DashboardMetadata,
        element: ElementMetadata,
    },
}

/// Flattened view used for the embedding text and the summary prompt
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FlatRecord<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dashboard_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    element_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body_text: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subtitle_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    element_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filterables: Option<&'a [Option<String>]>,
}

impl MetadataUnit {
    pub fn dashboard(&self) -> &DashboardMetadata {
        match self {
            Self::DashboardOnly { dashboard } | Self::DashboardElement { dashboard, .. } => {
                dashboard
            }
        }
    }

    pub fn element(&self) -> Option<&ElementMetadata> {
        match self {
            Self::DashboardOnly { .. } => None,
            Self::DashboardElement { element, .. } => Some(element),
        }
    }

    /// Identifier of the owning dashboard
    pub fn dashboard_id(&self) -> &str {
        &self.dashboard().id
    }

    /// Element title, falling back to the element id
    pub fn best_element_label(&self) -> Option<&str> {
        let element = self.element()?;
        element
            .element_title
            .as_deref()
            .or(element.element_id.as_deref())
    }

    /// JSON form sent to the embedding backend and the summary prompt
    pub fn to_embedding_text(&self) -> Result<String> {
        let dashboard = self.dashboard();
        let mut flat = FlatRecord {
            id: &dashboard.id,
            title: dashboard.title.as_deref(),
            description: dashboard.description.as_deref(),
            dashboard_id: None,
            element_id: None,
            body_text: None,
            note_text: None,
            subtitle_text: None,
            element_title: None,
            filterables: None,
        };

        if let Some(element) = self.element() {
            flat.dashboard_id = Some(&element.dashboard_id);
            flat.element_id = element.element_id.as_deref();
            flat.body_text = Some(element.body_text.as_slice());
            flat.note_text = element.note_text.as_deref();
            flat.subtitle_text = element.subtitle_text.as_deref();
            flat.element_title = element.element_title.as_deref();
            flat.filterables = Some(element.filterables.as_slice());
        }

        Ok(serde_json::to_string(&flat)?)
    }
}

/// Split element body text into tokens, dropping the empties
pub fn extract_text_from_body_text(body_text: &str) -> Vec<String> {
    body_text.split_whitespace().map(str::to_string).collect()
}

/// Dashboard filter names the element listens to (first filter group only).
/// Listeners without a filter name are kept as `None`.
pub fn extract_filterables(element: &ElementRecord) -> Vec<Option<String>> {
    element
        .result_maker
        .as_ref()
        .and_then(|rm| rm.filterables.as_ref())
        .and_then(|groups| groups.first())
        .and_then(|group| group.listen.as_ref())
        .map(|listeners| {
            listeners
                .iter()
                .map(|l| l.dashboard_filter_name.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Turn one fetched dashboard into its metadata units.
/// `requested_id` is used when the record carries no id of its own.
pub fn units_from_record(requested_id: &str, record: &DashboardRecord) -> Vec<MetadataUnit> {
    let dashboard = DashboardMetadata {
        id: record
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| requested_id.to_string()),
        title: record.title.clone(),
        description: record.description.clone(),
    };

    let elements = record.dashboard_elements.as_deref().unwrap_or_default();
    if elements.is_empty() {
        return vec![MetadataUnit::DashboardOnly { dashboard }];
    }

    elements
        .iter()
        .map(|element| MetadataUnit::DashboardElement {
            dashboard: dashboard.clone(),
            element: ElementMetadata {
                element_id: element.id.clone(),
                dashboard_id: requested_id.to_string(),
                body_text: element
                    .body_text
                    .as_deref()
                    .map(extract_text_from_body_text)
                    .unwrap_or_default(),
                note_text: element.note_text.clone(),
                subtitle_text: element.subtitle_text.clone(),
                element_title: element.title.clone(),
                filterables: extract_filterables(element),
            },
        })
        .collect()
}

/// Fetch the given dashboards and build their units.
///
/// Best effort: a dashboard that fails to fetch is logged and skipped.
/// Output order follows `dashboard_ids`.
pub async fn build_corpus(catalog: &dyn Catalog, dashboard_ids: &[String]) -> Vec<MetadataUnit> {
    let fetched = futures::future::join_all(dashboard_ids.iter().map(|id| async move {
        match catalog.fetch_dashboard(id).await {
            Ok(record) => Some(units_from_record(id, &record)),
            Err(e) => {
                tracing::warn!(dashboard_id = %id, error = %e, "skipping dashboard");
                None
            }
        }
    }))
    .await;

    fetched.into_iter().flatten().flatten().collect()
}

/// List the catalog and build the corpus for every dashboard in it
pub async fn build_catalog_corpus(catalog: &dyn Catalog) -> Vec<MetadataUnit> {
    let ids = catalog.list_dashboard_ids().await;
    tracing::debug!(dashboards = ids.len(), "building corpus");
    build_corpus(catalog, &ids).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FileCatalog, FilterListener, Filterable, ResultMaker};

    fn element(id: &str, title: &str, body: Option<&str>) -> ElementRecord {
        ElementRecord {
            id: Some(id.into()),
            title: Some(title.into()),
            body_text: body.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_body_text_drops_empty_tokens() {
        assert_eq!(
            extract_text_from_body_text("Revenue  by Region"),
            vec!["Revenue", "by", "Region"]
        );
        assert!(extract_text_from_body_text("   ").is_empty());
    }

    #[test]
    fn test_filterables_read_first_group_only() {
        let mut el = element("e1", "Chart", None);
        el.result_maker = Some(ResultMaker {
            filterables: Some(vec![
                Filterable {
                    listen: Some(vec![
                        FilterListener {
                            dashboard_filter_name: Some("Region".into()),
                            field: Some("orders.region".into()),
                        },
                        FilterListener {
                            dashboard_filter_name: None,
                            field: Some("orders.date".into()),
                        },
                    ]),
                },
                Filterable {
                    listen: Some(vec![FilterListener {
                        dashboard_filter_name: Some("Ignored".into()),
                        field: None,
                    }]),
                },
            ]),
        });
        assert_eq!(extract_filterables(&el), vec![Some("Region".to_string()), None]);
    }

    #[test]
    fn test_filterables_missing_result_maker() {
        assert!(extract_filterables(&element("e1", "Chart", None)).is_empty());
    }

    #[test]
    fn test_dashboard_without_elements_yields_one_unit() {
        let record = DashboardRecord {
            id: Some("7".into()),
            title: Some("Ops".into()),
            ..Default::default()
        };
        let units = units_from_record("7", &record);
        assert_eq!(units.len(), 1);
        assert!(matches!(units[0], MetadataUnit::DashboardOnly { .. }));
        assert_eq!(units[0].dashboard_id(), "7");
    }

    #[test]
    fn test_elements_fan_out_with_dashboard_fields() {
        let record = DashboardRecord {
            id: Some("3".into()),
            title: Some("Sales".into()),
            description: Some("Quarterly sales".into()),
            dashboard_elements: Some(vec![
                element("a", "Revenue", Some("Revenue  by Region")),
                element("b", "Churn", None),
            ]),
        };
        let units = units_from_record("3", &record);
        assert_eq!(units.len(), 2);
        for unit in &units {
            assert_eq!(unit.dashboard().title.as_deref(), Some("Sales"));
            assert_eq!(unit.element().unwrap().dashboard_id, "3");
        }
        assert_eq!(units[0].element().unwrap().body_text.len(), 3);
        assert!(units[1].element().unwrap().body_text.is_empty());
    }

    #[test]
    fn test_missing_record_id_falls_back_to_requested() {
        let units = units_from_record("99", &DashboardRecord::default());
        assert_eq!(units[0].dashboard_id(), "99");
    }

    #[test]
    fn test_best_label_falls_back_to_element_id() {
        let record = DashboardRecord {
            id: Some("3".into()),
            title: Some("Sales".into()),
            dashboard_elements: Some(vec![ElementRecord {
                id: Some("a".into()),
                note_text: Some("  ".into()),
                body_text: Some("top accounts".into()),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let units = units_from_record("3", &record);
        let unit = &units[0];
        assert_eq!(unit.best_element_label(), Some("a"));
    }

    #[test]
    fn test_embedding_text_is_flat_json() {
        let record = DashboardRecord {
            id: Some("3".into()),
            title: Some("Sales".into()),
            dashboard_elements: Some(vec![element("a", "Revenue", None)]),
            ..Default::default()
        };
        let text = units_from_record("3", &record)[0].to_embedding_text().unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["id"], "3");
        assert_eq!(json["dashboardId"], "3");
        assert_eq!(json["elementTitle"], "Revenue");
        assert!(json.get("kind").is_none());
        assert!(json.get("description").is_none());
    }

    #[tokio::test]
    async fn test_build_corpus_skips_failed_dashboards() {
        let catalog = FileCatalog::new(vec![
            DashboardRecord {
                id: Some("1".into()),
                title: Some("One".into()),
                ..Default::default()
            },
            DashboardRecord {
                id: Some("2".into()),
                dashboard_elements: Some(vec![
                    element("x", "X", None),
                    element("y", "Y", None),
                ]),
                ..Default::default()
            },
        ]);
        let ids = vec!["1".to_string(), "missing".to_string(), "2".to_string()];
        let units = build_corpus(&catalog, &ids).await;
        let owners: Vec<&str> = units.iter().map(|u| u.dashboard_id()).collect();
        assert_eq!(owners, vec!["1", "2", "2"]);
    }
}
