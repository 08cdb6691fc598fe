//! Dashboard panel definitions stored with a project
//!
//! Panels point at metric fields of stored reports. They are persisted as
//! configuration; the only evaluation done here is looking values up.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Report;

/// Full-width panel
pub const DEFAULT_PANEL_SIZE: u8 = 2;

/// Which reports a panel draws from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub metadata_values: BTreeMap<String, String>,
    #[serde(default)]
    pub tag_values: Vec<String>,
}

impl ReportFilter {
    /// Filter that matches every report
    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, report: &Report) -> bool {
        self.metadata_values
            .iter()
            .all(|(k, v)| report.metadata.get(k) == Some(v))
            && self.tag_values.iter().all(|t| report.tags.contains(t))
    }
}

/// Aggregation applied by a counter panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterAgg {
    /// Show the title text only
    None,
    Sum,
    Last,
}

/// Plot kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotType {
    Line,
    Bar,
    Scatter,
    Histogram,
}

/// Reference to one numeric field of a metric result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelValue {
    pub metric_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metric_args: BTreeMap<String, String>,
    pub field_path: String,
    pub legend: String,
}

impl PanelValue {
    pub fn new(
        metric_id: impl Into<String>,
        field_path: impl Into<String>,
        legend: impl Into<String>,
    ) -> Self {
        Self {
            metric_id: metric_id.into(),
            metric_args: BTreeMap::new(),
            field_path: field_path.into(),
            legend: legend.into(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metric_args.insert(key.into(), value.into());
        self
    }

    /// Look the referenced field up in a report
    pub fn resolve(&self, report: &Report) -> Option<f64> {
        let metric = report.metric(&self.metric_id, &self.metric_args)?;
        let value = serde_json::to_value(metric).ok()?;

        let field = self
            .field_path
            .split('.')
            .try_fold(&value, |node, segment| node.get(segment))?;

        match field {
            serde_json::Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            other => other.as_f64(),
        }
    }
}

/// Single-number panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterPanel {
    pub title: String,
    pub filter: ReportFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<PanelValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub agg: CounterAgg,
    pub size: u8,
}

impl CounterPanel {
    /// Aggregate the panel value over reports in timestamp order
    pub fn evaluate(&self, reports: &[&Report]) -> Option<f64> {
        let value = self.value.as_ref()?;
        let values = reports
            .iter()
            .filter(|r| self.filter.matches(r))
            .filter_map(|r| value.resolve(r));

        match self.agg {
            CounterAgg::None => None,
            CounterAgg::Sum => Some(values.sum()),
            CounterAgg::Last => values.last(),
        }
    }
}

/// Multi-series plot panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPanel {
    pub title: String,
    pub filter: ReportFilter,
    pub values: Vec<PanelValue>,
    pub plot_type: PlotType,
    pub size: u8,
}

impl PlotPanel {
    /// Latest point of every series
    pub fn latest(&self, reports: &[&Report]) -> BTreeMap<String, Option<f64>> {
        let matching: Vec<&&Report> = reports.iter().filter(|r| self.filter.matches(r)).collect();
        self.values
            .iter()
            .map(|v| {
                let latest = matching.iter().rev().find_map(|r| v.resolve(r));
                (v.legend.clone(), latest)
            })
            .collect()
    }
}

/// Dashboard panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardPanel {
    Counter(CounterPanel),
    Plot(PlotPanel),
}

impl DashboardPanel {
    /// Counter panel showing only its title
    pub fn text_counter(title: impl Into<String>) -> Self {
        DashboardPanel::Counter(CounterPanel {
            title: title.into(),
            filter: ReportFilter::any(),
            value: None,
            text: None,
            agg: CounterAgg::None,
            size: DEFAULT_PANEL_SIZE,
        })
    }

    /// Counter panel aggregating one value; `text` doubles as the legend
    pub fn value_counter(
        title: impl Into<String>,
        value: PanelValue,
        agg: CounterAgg,
        size: u8,
    ) -> Self {
        DashboardPanel::Counter(CounterPanel {
            title: title.into(),
            filter: ReportFilter::any(),
            text: Some(value.legend.clone()),
            value: Some(value),
            agg,
            size,
        })
    }

    pub fn plot(
        title: impl Into<String>,
        values: Vec<PanelValue>,
        plot_type: PlotType,
        size: u8,
    ) -> Self {
        DashboardPanel::Plot(PlotPanel {
            title: title.into(),
            filter: ReportFilter::any(),
            values,
            plot_type,
            size,
        })
    }

    pub fn title(&self) -> &str {
        match self {
            DashboardPanel::Counter(c) => &c.title,
            DashboardPanel::Plot(p) => &p.title,
        }
    }
}

/// Ordered panel list of a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub name: String,
    pub panels: Vec<DashboardPanel>,
}

impl DashboardConfig {
    pub fn add_panel(&mut self, panel: DashboardPanel) {
        self.panels.push(panel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{
        DatasetDriftResult, MetricResult, COLUMN_NAME_ARG, ColumnDriftResult,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn report_with_share(share: f64) -> Report {
        Report {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            inputs_hash: String::new(),
            metrics: vec![
                MetricResult::DatasetDriftMetric(DatasetDriftResult {
                    drift_share: 0.5,
                    number_of_columns: 2,
                    number_of_drifted_columns: 1,
                    share_of_drifted_columns: share,
                    dataset_drift: share >= 0.5,
                    drift_by_columns: vec![],
                }),
                MetricResult::ColumnDriftMetric(ColumnDriftResult {
                    column_name: "amount".to_string(),
                    stattest_name: "wasserstein".to_string(),
                    stattest_threshold: 0.1,
                    drift_score: 0.42,
                    drift_detected: true,
                }),
            ],
            tags: vec![],
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_resolve_field_paths() {
        let report = report_with_share(0.25);

        let share = PanelValue::new("DatasetDriftMetric", "share_of_drifted_columns", "share");
        assert_eq!(share.resolve(&report), Some(0.25));

        let flag = PanelValue::new("DatasetDriftMetric", "dataset_drift", "drift");
        assert_eq!(flag.resolve(&report), Some(0.0));

        let score = PanelValue::new("ColumnDriftMetric", "drift_score", "Drift Score")
            .with_arg(COLUMN_NAME_ARG, "amount");
        assert_eq!(score.resolve(&report), Some(0.42));

        let other = PanelValue::new("ColumnDriftMetric", "drift_score", "Drift Score")
            .with_arg(COLUMN_NAME_ARG, "time_passed");
        assert_eq!(other.resolve(&report), None);
    }

    #[test]
    fn test_counter_aggregation() {
        let first = report_with_share(0.25);
        let second = report_with_share(0.75);
        let reports = vec![&first, &second];

        let value = PanelValue::new("DatasetDriftMetric", "share_of_drifted_columns", "share");
        let last = DashboardPanel::value_counter("Share", value.clone(), CounterAgg::Last, 1);
        let sum = DashboardPanel::value_counter("Share", value, CounterAgg::Sum, 1);

        match (last, sum) {
            (DashboardPanel::Counter(last), DashboardPanel::Counter(sum)) => {
                assert_eq!(last.evaluate(&reports), Some(0.75));
                assert_eq!(sum.evaluate(&reports), Some(1.0));
                assert_eq!(last.text.as_deref(), Some("share"));
            }
            _ => panic!("expected counters"),
        }
    }

    #[test]
    fn test_filter_matches_tags() {
        let mut report = report_with_share(0.1);
        let filter = ReportFilter {
            metadata_values: BTreeMap::new(),
            tag_values: vec!["nightly".to_string()],
        };
        assert!(!filter.matches(&report));
        report.tags.push("nightly".to_string());
        assert!(filter.matches(&report));
        assert!(ReportFilter::any().matches(&report));
    }
}
