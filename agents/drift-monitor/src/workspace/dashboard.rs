//! Dashboard of the monitoring project

use crate::contracts::*;

/// Panels attached to the monitoring project, in display order
pub fn monitoring_panels() -> Vec<DashboardPanel> {
    vec![
        DashboardPanel::text_counter("Credit Card Transactions Dataset"),
        DashboardPanel::value_counter(
            "Model Calls",
            PanelValue::new("DatasetMissingValuesMetric", "current.number_of_rows", "count"),
            CounterAgg::Sum,
            1,
        ),
        DashboardPanel::value_counter(
            "Share of Drifted Features",
            PanelValue::new("DatasetDriftMetric", "share_of_drifted_columns", "share"),
            CounterAgg::Last,
            1,
        ),
        DashboardPanel::plot(
            "Dataset Quality",
            vec![
                PanelValue::new("DatasetDriftMetric", "share_of_drifted_columns", "Drift Share"),
                PanelValue::new(
                    "DatasetMissingValuesMetric",
                    "current.share_of_missing_values",
                    "Missing Values Share",
                ),
            ],
            PlotType::Line,
            DEFAULT_PANEL_SIZE,
        ),
        column_drift_plot("Amount: Wasserstein drift distance", AMOUNT_COLUMN),
        column_drift_plot("Time-elapsed: Wasserstein drift distance", TIME_PASSED_COLUMN),
    ]
}

fn column_drift_plot(title: &str, column: &str) -> DashboardPanel {
    DashboardPanel::plot(
        title,
        vec![PanelValue::new("ColumnDriftMetric", "drift_score", "Drift Score")
            .with_arg(COLUMN_NAME_ARG, column)],
        PlotType::Bar,
        1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_panels() {
        let panels = monitoring_panels();
        let titles: Vec<_> = panels.iter().map(|p| p.title()).collect();
        assert_eq!(
            titles,
            vec![
                "Credit Card Transactions Dataset",
                "Model Calls",
                "Share of Drifted Features",
                "Dataset Quality",
                "Amount: Wasserstein drift distance",
                "Time-elapsed: Wasserstein drift distance",
            ]
        );
    }

    #[test]
    fn test_panel_shapes() {
        let panels = monitoring_panels();
        match &panels[1] {
            DashboardPanel::Counter(c) => {
                assert_eq!(c.agg, CounterAgg::Sum);
                assert_eq!(c.size, 1);
                assert_eq!(c.text.as_deref(), Some("count"));
            }
            other => panic!("unexpected panel {:?}", other),
        }
        match &panels[3] {
            DashboardPanel::Plot(p) => {
                assert_eq!(p.plot_type, PlotType::Line);
                assert_eq!(p.values.len(), 2);
                assert_eq!(p.size, DEFAULT_PANEL_SIZE);
            }
            other => panic!("unexpected panel {:?}", other),
        }
        match &panels[5] {
            DashboardPanel::Plot(p) => {
                assert_eq!(p.plot_type, PlotType::Bar);
                assert_eq!(p.values[0].metric_args[COLUMN_NAME_ARG], "time_passed");
            }
            other => panic!("unexpected panel {:?}", other),
        }
        assert!(panels.iter().all(|p| match p {
            DashboardPanel::Counter(c) => c.filter == ReportFilter::any(),
            DashboardPanel::Plot(p) => p.filter == ReportFilter::any(),
        }));
    }
}
