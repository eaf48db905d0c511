// Derived rate metrics (numerator / denominator).

use crate::records::{AgedRecord, DerivedRecord};
use agecurve_core::DerivedMetricConfig;
use std::collections::BTreeMap;

/// Value substituted when a ratio cannot be computed.
pub const FALLBACK: f64 = 0.0;

/// A rate metric computed from two statistics of the same record.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetric {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
    /// Multiplier applied to the quotient (e.g. 27 for per-nine-innings
    /// rates over outs pitched).
    pub scale: f64,
}

impl DerivedMetric {
    pub fn new(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            numerator: numerator.into(),
            denominator: denominator.into(),
            scale: 1.0,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

impl From<&DerivedMetricConfig> for DerivedMetric {
    fn from(config: &DerivedMetricConfig) -> Self {
        Self::new(&config.name, &config.numerator, &config.denominator).with_scale(config.scale)
    }
}

/// The scaled quotient, or `None` when an input is absent, the denominator
/// is zero, or the result is not finite.
pub fn checked_ratio(numerator: Option<f64>, denominator: Option<f64>, scale: f64) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    Some(n / d * scale).filter(|q| q.is_finite())
}

/// Compute every metric for every record. The second element counts the
/// values that fell back to `FALLBACK`.
pub fn derive_metrics<'a>(
    aged: Vec<AgedRecord<'a>>,
    metrics: &[DerivedMetric],
) -> (Vec<DerivedRecord<'a>>, usize) {
    let mut fallbacks = 0;
    let records = aged
        .into_iter()
        .map(|record| {
            let stats = &record.joined.performance.stats;
            let derived: BTreeMap<String, f64> = metrics
                .iter()
                .map(|m| {
                    let ratio = checked_ratio(
                        stats.get(&m.numerator).copied(),
                        stats.get(&m.denominator).copied(),
                        m.scale,
                    );
                    if ratio.is_none() {
                        fallbacks += 1;
                    }
                    (m.name.clone(), ratio.unwrap_or(FALLBACK))
                })
                .collect();
            DerivedRecord {
                aged: record,
                derived,
            }
        })
        .collect();
    (records, fallbacks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{JoinedRecord, PerformanceRecord, PlayerRecord};
    use proptest::prelude::*;

    #[test]
    fn plain_quotient_without_rounding() {
        assert_eq!(checked_ratio(Some(120.0), Some(400.0), 1.0), Some(0.3));
        assert_eq!(checked_ratio(Some(1.0), Some(3.0), 1.0), Some(1.0 / 3.0));
    }

    #[test]
    fn scale_applies() {
        let k9 = checked_ratio(Some(200.0), Some(540.0), 27.0).unwrap();
        assert!((k9 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_or_absent_inputs_are_none() {
        assert_eq!(checked_ratio(Some(5.0), Some(0.0), 1.0), None);
        assert_eq!(checked_ratio(Some(5.0), Some(-0.0), 1.0), None);
        assert_eq!(checked_ratio(None, Some(10.0), 1.0), None);
        assert_eq!(checked_ratio(Some(5.0), None, 1.0), None);
        assert_eq!(checked_ratio(Some(f64::MAX), Some(f64::MIN_POSITIVE), 1.0), None);
    }

    #[test]
    fn derive_metrics_substitutes_fallback() {
        let player = PlayerRecord::new("p", Some(1990));
        let hitter = PerformanceRecord::new("p", Some(2020))
            .with_stat("H", 90.0)
            .with_stat("AB", 300.0);
        let no_at_bats = PerformanceRecord::new("p", Some(2021))
            .with_stat("H", 0.0)
            .with_stat("AB", 0.0);
        let aged = [&hitter, &no_at_bats]
            .into_iter()
            .map(|performance| AgedRecord {
                joined: JoinedRecord { performance, player: &player },
                age: 30,
            })
            .collect();
        let metrics = vec![
            DerivedMetric::new("avg", "H", "AB"),
            DerivedMetric::new("hr_rate", "HR", "AB"),
        ];

        let (derived, fallbacks) = derive_metrics(aged, &metrics);
        assert_eq!(derived[0].value("avg"), Some(0.3));
        assert_eq!(derived[0].value("hr_rate"), Some(FALLBACK));
        assert_eq!(derived[1].value("avg"), Some(FALLBACK));
        assert_eq!(fallbacks, 3);
    }

    #[test]
    fn from_config() {
        let config = DerivedMetricConfig {
            name: "k9".into(),
            numerator: "SO".into(),
            denominator: "IPouts".into(),
            scale: 27.0,
        };
        let metric = DerivedMetric::from(&config);
        assert_eq!(metric, DerivedMetric::new("k9", "SO", "IPouts").with_scale(27.0));
    }

    fn maybe_number() -> impl Strategy<Value = Option<f64>> {
        prop_oneof![
            Just(None),
            Just(Some(0.0)),
            any::<f64>().prop_map(Some),
        ]
    }

    proptest! {
        #[test]
        fn prop_derived_value_is_always_finite(
            numerator in maybe_number(),
            denominator in maybe_number(),
            scale in prop_oneof![Just(1.0), Just(27.0), any::<f64>()],
        ) {
            let player = PlayerRecord::new("p", Some(1990));
            let mut performance = PerformanceRecord::new("p", Some(2020));
            if let Some(n) = numerator {
                performance = performance.with_stat("SO", n);
            }
            if let Some(d) = denominator {
                performance = performance.with_stat("IPouts", d);
            }
            let aged = vec![AgedRecord {
                joined: JoinedRecord { performance: &performance, player: &player },
                age: 30,
            }];
            let metrics = [DerivedMetric::new("k9", "SO", "IPouts").with_scale(scale)];

            let (derived, fallbacks) = derive_metrics(aged, &metrics);
            let value = derived[0].value("k9").unwrap();
            prop_assert!(value.is_finite());
            let computable = checked_ratio(numerator, denominator, scale).is_some();
            prop_assert_eq!(fallbacks, usize::from(!computable));
        }
    }
}
