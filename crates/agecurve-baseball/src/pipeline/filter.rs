// Pre-aggregation record filters (volume floors and validity bounds).

use crate::records::DerivedRecord;
use agecurve_core::{Comparison, FilterConfig};

/// `field <op> value`; a record with no value for `field` fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub field: String,
    pub op: Comparison,
    pub value: f64,
}

impl Threshold {
    pub fn new(field: impl Into<String>, op: Comparison, value: f64) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn passes(&self, record: &DerivedRecord<'_>) -> bool {
        record
            .value(&self.field)
            .is_some_and(|v| self.op.holds(v, self.value))
    }
}

impl From<&FilterConfig> for Threshold {
    fn from(config: &FilterConfig) -> Self {
        Self::new(&config.field, config.op, config.value)
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.op.symbol(), self.value)
    }
}

/// Keep records passing every threshold. The second element counts the
/// records dropped.
pub fn apply_filters<'a>(
    records: Vec<DerivedRecord<'a>>,
    thresholds: &[Threshold],
) -> (Vec<DerivedRecord<'a>>, usize) {
    let before = records.len();
    let kept: Vec<DerivedRecord<'a>> = records
        .into_iter()
        .filter(|record| thresholds.iter().all(|t| t.passes(record)))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{AgedRecord, JoinedRecord, PerformanceRecord, PlayerRecord};
    use std::collections::BTreeMap;

    fn derived<'a>(player: &'a PlayerRecord, perf: &'a PerformanceRecord) -> DerivedRecord<'a> {
        DerivedRecord {
            aged: AgedRecord {
                joined: JoinedRecord {
                    performance: perf,
                    player,
                },
                age: 28,
            },
            derived: BTreeMap::new(),
        }
    }

    #[test]
    fn minimum_volume_is_strict_for_gt() {
        let player = PlayerRecord::new("p", Some(1990));
        let at_floor = PerformanceRecord::new("p", Some(2018)).with_stat("AB", 100.0);
        let above = PerformanceRecord::new("p", Some(2018)).with_stat("AB", 101.0);
        let min_ab = Threshold::new("AB", Comparison::Gt, 100.0);

        assert!(!min_ab.passes(&derived(&player, &at_floor)));
        assert!(min_ab.passes(&derived(&player, &above)));
    }

    #[test]
    fn strict_and_inclusive_zero_bounds() {
        let player = PlayerRecord::new("p", Some(1990));
        let zero_era = PerformanceRecord::new("p", Some(2018)).with_stat("ERA", 0.0);
        let record = derived(&player, &zero_era);

        assert!(!Threshold::new("ERA", Comparison::Gt, 0.0).passes(&record));
        assert!(Threshold::new("ERA", Comparison::Ge, 0.0).passes(&record));
    }

    #[test]
    fn absent_field_fails() {
        let player = PlayerRecord::new("p", Some(1990));
        let perf = PerformanceRecord::new("p", Some(2018));
        assert!(!Threshold::new("AB", Comparison::Ge, 0.0).passes(&derived(&player, &perf)));
    }

    #[test]
    fn filters_are_and_combined() {
        let player = PlayerRecord::new("p", Some(1990));
        let both = PerformanceRecord::new("p", Some(2018))
            .with_stat("IPouts", 300.0)
            .with_stat("ERA", 3.1);
        let low_volume = PerformanceRecord::new("p", Some(2018))
            .with_stat("IPouts", 30.0)
            .with_stat("ERA", 3.1);
        let zero_era = PerformanceRecord::new("p", Some(2018))
            .with_stat("IPouts", 300.0)
            .with_stat("ERA", 0.0);
        let records = vec![
            derived(&player, &both),
            derived(&player, &low_volume),
            derived(&player, &zero_era),
        ];
        let thresholds = vec![
            Threshold::new("IPouts", Comparison::Ge, 150.0),
            Threshold::new("ERA", Comparison::Gt, 0.0),
        ];

        let (kept, dropped) = apply_filters(records, &thresholds);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 2);
        assert_eq!(kept[0].value("IPouts"), Some(300.0));
    }

    #[test]
    fn no_filters_keeps_everything() {
        let player = PlayerRecord::new("p", Some(1990));
        let perf = PerformanceRecord::new("p", Some(2018));
        let (kept, dropped) = apply_filters(vec![derived(&player, &perf)], &[]);
        assert_eq!(kept.len(), 1);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn display_reads_like_a_condition() {
        let t = Threshold::new("AB", Comparison::Gt, 100.0);
        assert_eq!(t.to_string(), "AB > 100");
    }
}
