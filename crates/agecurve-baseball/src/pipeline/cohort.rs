// Age cohort partition and bucketing.
//
// A partition of boundaries b0 < b1 < ... < bn defines n half-open cohorts
// [b(i-1), b(i)). Ages below b0 or at/above bn belong to no cohort.

use super::PipelineError;
use crate::records::{CohortRecord, DerivedRecord};
use agecurve_core::PartitionConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgePartition {
    boundaries: Vec<i32>,
    labels: Vec<String>,
}

impl AgePartition {
    pub fn new(boundaries: Vec<i32>, labels: Vec<String>) -> Result<Self, PipelineError> {
        if boundaries.len() < 2 {
            return Err(PipelineError::InvalidPartition(
                "at least two boundaries are required".into(),
            ));
        }
        if boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PipelineError::InvalidPartition(format!(
                "boundaries must be strictly increasing: {boundaries:?}"
            )));
        }
        if labels.len() != boundaries.len() - 1 {
            return Err(PipelineError::InvalidPartition(format!(
                "{} boundaries need {} labels, got {}",
                boundaries.len(),
                boundaries.len() - 1,
                labels.len()
            )));
        }
        Ok(Self { boundaries, labels })
    }

    /// Index of the cohort containing `age`, if any.
    pub fn locate(&self, age: i32) -> Option<usize> {
        let first = *self.boundaries.first()?;
        let last = *self.boundaries.last()?;
        if age < first || age >= last {
            return None;
        }
        Some(self.boundaries.partition_point(|&b| b <= age) - 1)
    }

    pub fn label(&self, cohort: usize) -> Option<&str> {
        self.labels.get(cohort).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn boundaries(&self) -> &[i32] {
        &self.boundaries
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Place every record in its cohort. The second element counts records
    /// whose age falls outside the partition.
    pub fn assign<'a>(&self, records: Vec<DerivedRecord<'a>>) -> (Vec<CohortRecord<'a>>, usize) {
        let mut bucketed = Vec::with_capacity(records.len());
        let mut unbucketed = 0;
        for record in records {
            match self.locate(record.age()) {
                Some(cohort) => bucketed.push(CohortRecord { record, cohort }),
                None => unbucketed += 1,
            }
        }
        (bucketed, unbucketed)
    }
}

impl TryFrom<&PartitionConfig> for AgePartition {
    type Error = PipelineError;

    fn try_from(config: &PartitionConfig) -> Result<Self, Self::Error> {
        Self::new(config.boundaries.clone(), config.labels.clone())
    }
}
