// Record types carried through the age-cohort pipeline.
//
// Loaded records (`PlayerRecord`, `PerformanceRecord`) are owned and
// immutable; every later stage borrows them and layers its own field on top.

use agecurve_core::Discipline;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

// ---------------------------------------------------------------------------
// Loaded records
// ---------------------------------------------------------------------------

/// Biographical reference data for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub player_id: String,
    pub birth_year: Option<i32>,
    pub birth_month: Option<u32>,
    pub birth_day: Option<u32>,
}

impl PlayerRecord {
    pub fn new(player_id: impl Into<String>, birth_year: Option<i32>) -> Self {
        Self {
            player_id: player_id.into(),
            birth_year,
            birth_month: None,
            birth_day: None,
        }
    }

    pub fn with_birth_date(mut self, month: u32, day: u32) -> Self {
        self.birth_month = Some(month);
        self.birth_day = Some(day);
        self
    }
}

/// Players keyed by identifier. Later duplicates replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct PlayerIndex {
    by_id: HashMap<String, PlayerRecord>,
}

impl PlayerIndex {
    pub fn from_records(records: impl IntoIterator<Item = PlayerRecord>) -> Self {
        let mut by_id = HashMap::new();
        for record in records {
            if by_id.contains_key(&record.player_id) {
                warn!("duplicate player record for '{}', using latest", record.player_id);
            }
            by_id.insert(record.player_id.clone(), record);
        }
        Self { by_id }
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerRecord> {
        self.by_id.get(player_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// One season line for one player in one discipline.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    pub player_id: String,
    pub season: Option<i32>,
    /// Numeric statistics by column name. Absent cells have no entry.
    pub stats: BTreeMap<String, f64>,
}

impl PerformanceRecord {
    pub fn new(player_id: impl Into<String>, season: Option<i32>) -> Self {
        Self {
            player_id: player_id.into(),
            season,
            stats: BTreeMap::new(),
        }
    }

    pub fn with_stat(mut self, name: impl Into<String>, value: f64) -> Self {
        self.stats.insert(name.into(), value);
        self
    }

    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied()
    }
}

/// A loaded performance source. `columns` comes from the header, so a
/// column exists even when every cell in it is empty.
#[derive(Debug, Clone)]
pub struct StatTable {
    pub discipline: Discipline,
    pub columns: BTreeSet<String>,
    pub records: Vec<PerformanceRecord>,
}

impl StatTable {
    pub fn new<S: Into<String>>(
        discipline: Discipline,
        columns: impl IntoIterator<Item = S>,
        records: Vec<PerformanceRecord>,
    ) -> Self {
        Self {
            discipline,
            columns: columns.into_iter().map(Into::into).collect(),
            records,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }
}

// ---------------------------------------------------------------------------
// Pipeline stage records
// ---------------------------------------------------------------------------

/// A performance record paired with its player.
#[derive(Debug, Clone, Copy)]
pub struct JoinedRecord<'a> {
    pub performance: &'a PerformanceRecord,
    pub player: &'a PlayerRecord,
}

#[derive(Debug, Clone, Copy)]
pub struct AgedRecord<'a> {
    pub joined: JoinedRecord<'a>,
    pub age: i32,
}

#[derive(Debug, Clone)]
pub struct DerivedRecord<'a> {
    pub aged: AgedRecord<'a>,
    pub derived: BTreeMap<String, f64>,
}

impl DerivedRecord<'_> {
    /// Look up a field, preferring derived metrics over raw statistics.
    pub fn value(&self, field: &str) -> Option<f64> {
        self.derived
            .get(field)
            .copied()
            .or_else(|| self.aged.joined.performance.stat(field))
    }

    pub fn player_id(&self) -> &str {
        &self.aged.joined.player.player_id
    }

    pub fn age(&self) -> i32 {
        self.aged.age
    }
}

/// A derived record placed in a cohort of the report's partition.
#[derive(Debug, Clone)]
pub struct CohortRecord<'a> {
    pub record: DerivedRecord<'a>,
    /// Index into the partition's labels.
    pub cohort: usize,
}
