use super::*;
use crate::backend::{LayoutBackend, LayoutChange, LayoutFilter};
use crate::geometry::SECTION_CAPACITY;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A change the backend refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveFailure {
    pub change: LayoutChange,
    pub reason: String,
}

/// Per-row outcome of a save. Accepted rows are not rolled back when a
/// later row fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    pub applied: Vec<LayoutChange>,
    pub failures: Vec<SaveFailure>,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub report: SaveReport,
    /// Snapshot reloaded from the backend after the save. When the reload
    /// fails this is the caller's store with the applied rows settled
    /// instead, and `reload_error` is set.
    pub store: SectionLayoutStore,
    pub reload_error: Option<BackendError>,
}

impl SaveOutcome {
    /// True when the snapshot came from the backend.
    pub fn is_fresh(&self) -> bool {
        self.reload_error.is_none()
    }
}

impl SectionLayoutStore {
    /// Loads a store from the backend's stored rows.
    pub fn load<B: LayoutBackend + ?Sized>(backend: &B, filter: &LayoutFilter) -> Result<Self> {
        let rooms = backend.list_layout(filter)?;
        Ok(Self::from_rooms(rooms))
    }

    /// Diffs lifecycle markers into backend calls. Rows both added and
    /// removed before a save produce nothing.
    pub fn pending_changes(&self) -> Vec<LayoutChange> {
        self.rooms()
            .filter_map(|room| match (room.pending_add, room.pending_remove) {
                (true, true) => None,
                (true, false) => Some(LayoutChange::Insert { room: room.clone() }),
                (false, true) => Some(LayoutChange::Delete {
                    id: room.id.clone(),
                }),
                (false, false) if room.pending_edit => Some(LayoutChange::Update {
                    id: room.id.clone(),
                    patch: RoomPatch {
                        floor_id: Some(room.floor_id),
                        section: Some(room.section),
                        room_type: Some(room.room_type),
                        price: Some(room.price),
                    },
                }),
                (false, false) => None,
            })
            .collect()
    }

    pub fn has_pending_changes(&self) -> bool {
        self.rooms().any(|r| !r.is_persisted_clean())
    }

    /// Re-checks every section's capacity sum. Type edits do not go through
    /// placement, so this is where an over-full section is caught.
    pub fn validate_capacity(&self) -> Result<()> {
        for ((floor_id, section), rooms) in &self.sections {
            let live: Vec<&Room> = validator::live_rooms(rooms, *floor_id, *section).collect();
            let total: u32 = live.iter().map(|r| r.capacity()).sum();
            if total > SECTION_CAPACITY {
                let requested = live.last().map(|r| r.capacity()).unwrap_or(0);
                return Err(Rejection::CapacityExceeded {
                    current: total - requested,
                    requested,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Sends one save call per changed room and reloads the layout.
    ///
    /// `self` is never modified; the reloaded snapshot is returned in the
    /// outcome alongside the per-row report.
    pub fn save<B: LayoutBackend + ?Sized>(&self, backend: &B) -> Result<SaveOutcome> {
        self.validate_capacity()?;

        let mut report = SaveReport::default();
        for change in self.pending_changes() {
            let ack = backend.save_layout(&change);
            if ack.accepted {
                debug!(room_id = change.room_id(), "layout change accepted");
                report.applied.push(change);
            } else {
                let reason = ack.reason.unwrap_or_else(|| "refused".to_string());
                warn!(room_id = change.room_id(), %reason, "layout change refused");
                report.failures.push(SaveFailure { change, reason });
            }
        }

        info!(
            applied = report.applied.len(),
            failed = report.failures.len(),
            "layout saved"
        );

        let (store, reload_error) = match backend.list_layout(&LayoutFilter::default()) {
            Ok(rooms) => (Self::from_rooms(rooms), None),
            Err(err) => {
                warn!(error = %err, "reload after save failed; keeping settled working copy");
                (self.settled(&report), Some(err))
            }
        };
        Ok(SaveOutcome {
            report,
            store,
            reload_error,
        })
    }

    /// Copy of the store with every applied change taken out of the pending
    /// set. Inserted and deleted rows are dropped, since only the backend
    /// knows their stored form; refused rows keep their markers for a retry.
    pub fn settled(&self, report: &SaveReport) -> Self {
        let applied: HashSet<&str> = report.applied.iter().map(|c| c.room_id()).collect();
        let mut store = self.clone();
        for rooms in store.sections.values_mut() {
            rooms.retain(|r| {
                let never_saved = r.pending_add && r.pending_remove;
                let gone = applied.contains(r.id.as_str()) && (r.pending_add || r.pending_remove);
                !never_saved && !gone
            });
            for room in rooms.iter_mut() {
                if applied.contains(room.id.as_str()) {
                    room.pending_edit = false;
                }
            }
        }
        store
    }
}
