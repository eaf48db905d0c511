// Inner join of performance records onto players by identifier.

use crate::records::{JoinedRecord, PerformanceRecord, PlayerIndex};

/// Pair every performance record with its player.
///
/// Records whose identifier has no player are dropped; the second element
/// of the result counts them. Duplicate performance records are kept and
/// joined independently.
pub fn inner_join<'a>(
    players: &'a PlayerIndex,
    records: &'a [PerformanceRecord],
) -> (Vec<JoinedRecord<'a>>, usize) {
    let mut joined = Vec::with_capacity(records.len());
    let mut unmatched = 0;
    for performance in records {
        match players.get(&performance.player_id) {
            Some(player) => joined.push(JoinedRecord {
                performance,
                player,
            }),
            None => unmatched += 1,
        }
    }
    (joined, unmatched)
}
