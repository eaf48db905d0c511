// Per-cohort summary statistics: mean, median, sample standard deviation.

use super::cohort::AgePartition;
use crate::records::CohortRecord;
use serde::Serialize;

/// Summary statistics for one metric within one cohort.
///
/// `std_dev` is the sample standard deviation (N - 1 denominator) and is
/// NaN for fewer than two values. All three statistics are NaN when the
/// cohort has records but none carries the metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortStats {
    pub label: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

/// One metric's statistics for every non-empty cohort, in partition order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSummary {
    pub metric: String,
    pub rows: Vec<CohortStats>,
}

impl CohortSummary {
    pub fn row(&self, label: &str) -> Option<&CohortStats> {
        self.rows.iter().find(|r| r.label == label)
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the mean of the two middle values for an even count, NaN for
/// an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (N - 1 denominator); NaN for fewer than two
/// values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub fn summarize(label: impl Into<String>, values: &[f64]) -> CohortStats {
    CohortStats {
        label: label.into(),
        count: values.len(),
        mean: mean(values),
        median: median(values),
        std_dev: sample_std_dev(values),
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Group records by cohort and summarize each requested metric.
///
/// Cohorts with no records are omitted. Records lacking a metric are
/// skipped for that metric only.
pub fn aggregate(
    records: &[CohortRecord<'_>],
    partition: &AgePartition,
    metrics: &[String],
) -> Vec<CohortSummary> {
    let mut groups: Vec<Vec<&CohortRecord<'_>>> = vec![Vec::new(); partition.len()];
    for record in records {
        if let Some(group) = groups.get_mut(record.cohort) {
            group.push(record);
        }
    }

    metrics
        .iter()
        .map(|metric| {
            let rows = groups
                .iter()
                .zip(partition.labels())
                .filter(|(group, _)| !group.is_empty())
                .map(|(group, label)| {
                    let values: Vec<f64> = group
                        .iter()
                        .filter_map(|r| r.record.value(metric))
                        .collect();
                    summarize(label.as_str(), &values)
                })
                .collect();
            CohortSummary {
                metric: metric.clone(),
                rows,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{
        AgedRecord, DerivedRecord, JoinedRecord, PerformanceRecord, PlayerRecord,
    };
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn partition() -> AgePartition {
        AgePartition::new(
            vec![20, 25, 30, 35],
            vec!["20-24".into(), "25-29".into(), "30-34".into()],
        )
        .unwrap()
    }

    /// Build cohort records for (cohort, HR) pairs against one player.
    fn cohort_records<'a>(
        player: &'a PlayerRecord,
        perfs: &'a [PerformanceRecord],
        cohorts: &[usize],
    ) -> Vec<CohortRecord<'a>> {
        perfs
            .iter()
            .zip(cohorts)
            .map(|(performance, &cohort)| CohortRecord {
                record: DerivedRecord {
                    aged: AgedRecord {
                        joined: JoinedRecord { performance, player },
                        age: 20 + 5 * cohort as i32,
                    },
                    derived: BTreeMap::new(),
                },
                cohort,
            })
            .collect()
    }

    fn hr(value: f64) -> PerformanceRecord {
        PerformanceRecord::new("p", Some(2020)).with_stat("HR", value)
    }

    #[test]
    fn basic_statistics() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_eq!(median(&values), 4.5);
        // Sample variance = 32 / 7.
        assert!((sample_std_dev(&values) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn single_value_has_nan_std_dev() {
        let stats = summarize("30-34", &[0.3]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, 0.3);
        assert_eq!(stats.median, 0.3);
        assert!(stats.std_dev.is_nan());
    }

    #[test]
    fn empty_values_are_nan() {
        let stats = summarize("x", &[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.median.is_nan());
        assert!(stats.std_dev.is_nan());
    }

    #[test]
    fn rows_follow_partition_order_and_skip_empty_cohorts() {
        let player = PlayerRecord::new("p", Some(1990));
        let perfs = vec![hr(30.0), hr(10.0), hr(20.0), hr(12.0)];
        // Arrival order: 30-34, 20-24, 30-34, 20-24. Nothing in 25-29.
        let records = cohort_records(&player, &perfs, &[2, 0, 2, 0]);

        let summaries = aggregate(&records, &partition(), &["HR".to_string()]);
        assert_eq!(summaries.len(), 1);
        let rows = &summaries[0].rows;
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["20-24", "30-34"]);
        assert_eq!(rows[0].mean, 11.0);
        assert_eq!(rows[1].mean, 25.0);
        assert!(summaries[0].row("25-29").is_none());
    }

    #[test]
    fn missing_metric_values_are_skipped() {
        let player = PlayerRecord::new("p", Some(1990));
        let perfs = vec![
            hr(10.0),
            PerformanceRecord::new("p", Some(2020)),
            PerformanceRecord::new("p", Some(2020)),
        ];
        let records = cohort_records(&player, &perfs, &[0, 0, 1]);

        let summaries = aggregate(&records, &partition(), &["HR".to_string()]);
        let rows = &summaries[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[0].mean, 10.0);
        // The 25-29 cohort has a record but no HR values.
        assert_eq!(rows[1].label, "25-29");
        assert_eq!(rows[1].count, 0);
        assert!(rows[1].median.is_nan());
    }

    #[test]
    fn one_summary_per_requested_metric() {
        let player = PlayerRecord::new("p", Some(1990));
        let perfs = vec![hr(10.0).with_stat("SB", 4.0)];
        let records = cohort_records(&player, &perfs, &[1]);
        let metrics = vec!["HR".to_string(), "SB".to_string()];

        let summaries = aggregate(&records, &partition(), &metrics);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].metric, "SB");
        assert_eq!(summaries[1].rows[0].mean, 4.0);
    }

    proptest! {
        #[test]
        fn prop_k_cohorts_yield_k_rows_with_group_means(
            k in 1usize..=3,
            per_cohort in 1usize..6,
            values in proptest::collection::vec(0.0f64..100.0, 18),
        ) {
            let player = PlayerRecord::new("p", Some(1990));
            let n = k * per_cohort;
            let perfs: Vec<PerformanceRecord> = values[..n].iter().map(|&v| hr(v)).collect();
            let cohorts: Vec<usize> = (0..n).map(|i| i % k).collect();
            let records = cohort_records(&player, &perfs, &cohorts);

            let summaries = aggregate(&records, &partition(), &["HR".to_string()]);
            let rows = &summaries[0].rows;
            prop_assert_eq!(rows.len(), k);
            for (cohort, row) in rows.iter().enumerate() {
                let group: Vec<f64> = (0..n)
                    .filter(|i| i % k == cohort)
                    .map(|i| values[i])
                    .collect();
                let expected = group.iter().sum::<f64>() / group.len() as f64;
                prop_assert!((row.mean - expected).abs() < 1e-9);
                prop_assert_eq!(row.count, per_cohort);
            }
        }
    }
}
