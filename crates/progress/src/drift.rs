//! Structural drift detection between a completion snapshot and the live
//! training structure.

use std::collections::HashMap;
use waypoint_core::{SnapshotRow, Step, StepId};

/// Whether the live structure drifted from the snapshot.
///
/// Every mandatory live step needs exactly one snapshot row with the same
/// typology, entity and position; nested steps also need the row's parent
/// to match the live parent on those three fields. A mandatory snapshot row
/// with no mandatory live counterpart is drift as well.
pub fn detect_drift(live: &[Step], snapshot: &[SnapshotRow]) -> bool {
    let rows_by_id: HashMap<StepId, &SnapshotRow> = snapshot.iter().map(|r| (r.id, r)).collect();

    for step in live.iter().filter(|s| s.mandatory) {
        let matches = snapshot
            .iter()
            .filter(|row| row_matches(row, step, &rows_by_id))
            .count();
        if matches != 1 {
            tracing::debug!(
                "Step {} ({} {}) matches {} snapshot rows",
                step.id,
                step.typology,
                step.content_id,
                matches
            );
            return true;
        }
    }

    for row in snapshot.iter().filter(|r| r.mandatory) {
        let present = live.iter().any(|s| {
            s.mandatory
                && s.typology == row.typology
                && s.content_id == row.entity_id
                && s.position == row.position
        });
        if !present {
            tracing::debug!("Snapshot row {} has no live mandatory step", row.id);
            return true;
        }
    }

    false
}

fn row_matches(row: &SnapshotRow, step: &Step, rows_by_id: &HashMap<StepId, &SnapshotRow>) -> bool {
    if let Some(parent) = &step.parent {
        let row_parent = row.parent_id.and_then(|id| rows_by_id.get(&id));
        match row_parent {
            Some(p)
                if p.typology == parent.typology
                    && p.entity_id == parent.content_id
                    && p.position == parent.position => {}
            _ => return false,
        }
    }

    row.typology == step.typology && row.entity_id == step.content_id && row.position == step.position
}
