//! The backing collaborator the engine saves to and lists from.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutFilter {
    #[serde(default)]
    pub floor_id: Option<FloorId>,
    #[serde(default)]
    pub section: Option<Section>,
}

impl LayoutFilter {
    pub fn floor(floor_id: FloorId) -> Self {
        Self {
            floor_id: Some(floor_id),
            section: None,
        }
    }

    pub fn matches(&self, room: &Room) -> bool {
        self.floor_id.map_or(true, |f| room.floor_id == f)
            && self.section.map_or(true, |s| room.section == s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationFilter {
    #[serde(default)]
    pub room_ids: Option<Vec<String>>,
}

impl ReservationFilter {
    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.room_ids
            .as_ref()
            .map_or(true, |ids| ids.iter().any(|id| *id == reservation.room_id))
    }
}

/// One changed room, sent as a single save call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LayoutChange {
    Insert { room: Room },
    Update { id: String, patch: RoomPatch },
    Delete { id: String },
}

impl LayoutChange {
    pub fn room_id(&self) -> &str {
        match self {
            LayoutChange::Insert { room } => &room.id,
            LayoutChange::Update { id, .. } | LayoutChange::Delete { id } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveAck {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SaveAck {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub fn refused(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
        }
    }
}

/// Storage the layout engine reads from and writes to.
///
/// Calls are atomic request/response operations; the engine never retries.
pub trait LayoutBackend {
    /// Stored rooms matching the filter; grid positions are not guaranteed.
    fn list_layout(&self, filter: &LayoutFilter) -> std::result::Result<Vec<Room>, BackendError>;

    fn save_layout(&self, change: &LayoutChange) -> SaveAck;

    fn list_reservations(
        &self,
        filter: &ReservationFilter,
    ) -> std::result::Result<Vec<Reservation>, BackendError>;
}

#[derive(Debug, Default)]
struct Tables {
    rooms: Vec<Room>,
    reservations: Vec<Reservation>,
    next_id: u64,
}

/// Mutex-guarded in-process backend, used by the API server and in tests.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: Mutex<Tables>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the backend; every row is treated as already persisted.
    pub fn from_dataset(dataset: Dataset) -> Self {
        let rooms: Vec<Room> = dataset
            .rooms
            .into_iter()
            .map(|mut room| {
                room.pending_add = false;
                room.pending_remove = false;
                room.pending_edit = false;
                room
            })
            .collect();
        let next_id = rooms
            .iter()
            .filter_map(|r| r.id.strip_prefix("R-")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            tables: Mutex::new(Tables {
                rooms,
                reservations: dataset.reservations,
                next_id,
            }),
        }
    }

    pub fn add_reservation(&self, reservation: Reservation) -> std::result::Result<(), BackendError> {
        self.lock()?.reservations.push(reservation);
        Ok(())
    }

    /// Sets a room's status, standing in for the external booking flow.
    pub fn set_status(
        &self,
        room_id: &str,
        status: RoomStatus,
    ) -> std::result::Result<bool, BackendError> {
        let mut tables = self.lock()?;
        match tables.rooms.iter_mut().find(|r| r.id == room_id) {
            Some(room) => {
                room.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Tables>, BackendError> {
        self.tables
            .lock()
            .map_err(|_| BackendError::Unavailable("in-memory tables poisoned".to_string()))
    }

    fn apply(tables: &mut Tables, change: &LayoutChange) -> SaveAck {
        match change {
            LayoutChange::Insert { room } => {
                tables.next_id += 1;
                let mut stored = room.clone();
                stored.id = format!("R-{}", tables.next_id);
                stored.pending_add = false;
                stored.pending_remove = false;
                stored.pending_edit = false;
                debug!(temp_id = %room.id, id = %stored.id, "inserted room");
                tables.rooms.push(stored);
                SaveAck::accepted()
            }
            LayoutChange::Update { id, patch } => {
                let Some(room) = tables.rooms.iter_mut().find(|r| r.id == *id) else {
                    return SaveAck::refused(format!("room '{id}' does not exist"));
                };
                if let Some(floor_id) = patch.floor_id {
                    room.floor_id = floor_id;
                }
                if let Some(section) = patch.section {
                    room.section = section;
                }
                if let Some(room_type) = patch.room_type {
                    room.room_type = room_type;
                }
                if let Some(price) = patch.price {
                    room.price = price;
                }
                SaveAck::accepted()
            }
            LayoutChange::Delete { id } => {
                let Some(pos) = tables.rooms.iter().position(|r| r.id == *id) else {
                    return SaveAck::refused(format!("room '{id}' does not exist"));
                };
                if tables.rooms[pos].is_occupied() {
                    return SaveAck::refused(format!("room '{id}' is in use"));
                }
                tables.rooms.remove(pos);
                SaveAck::accepted()
            }
        }
    }
}

impl LayoutBackend for InMemoryBackend {
    fn list_layout(&self, filter: &LayoutFilter) -> std::result::Result<Vec<Room>, BackendError> {
        let tables = self.lock()?;
        Ok(tables
            .rooms
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn save_layout(&self, change: &LayoutChange) -> SaveAck {
        match self.lock() {
            Ok(mut tables) => Self::apply(&mut tables, change),
            Err(err) => SaveAck::refused(err.to_string()),
        }
    }

    fn list_reservations(
        &self,
        filter: &ReservationFilter,
    ) -> std::result::Result<Vec<Reservation>, BackendError> {
        let tables = self.lock()?;
        Ok(tables
            .reservations
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, floor: &str, section: Section) -> Room {
        Room {
            id: id.to_string(),
            floor_id: floor.parse().unwrap(),
            section,
            room_type: RoomType::Single,
            price: 100,
            status: RoomStatus::Available,
            room_index: None,
            col: 0,
            row: 0,
            col_span: 1,
            row_span: 1,
            pending_add: false,
            pending_remove: false,
            pending_edit: false,
        }
    }

    #[test]
    fn test_empty_filter_lists_everything() {
        let backend = InMemoryBackend::from_dataset(Dataset {
            rooms: vec![
                room("a", "1F", Section::A),
                room("b", "2F", Section::B),
                room("c", "2F", Section::C),
            ],
            reservations: vec![],
        });

        assert_eq!(backend.list_layout(&LayoutFilter::default()).unwrap().len(), 3);
        assert_eq!(
            backend
                .list_layout(&LayoutFilter::floor("2F".parse().unwrap()))
                .unwrap()
                .len(),
            2
        );
        let only_c = LayoutFilter {
            floor_id: None,
            section: Some(Section::C),
        };
        assert_eq!(backend.list_layout(&only_c).unwrap()[0].id, "c");
    }

    #[test]
    fn test_insert_assigns_permanent_id_and_clears_flags() {
        let backend = InMemoryBackend::new();
        let mut fresh = room("tmp-1", "1F", Section::A);
        fresh.pending_add = true;

        let ack = backend.save_layout(&LayoutChange::Insert { room: fresh });
        assert!(ack.accepted);

        let stored = backend.list_layout(&LayoutFilter::default()).unwrap();
        assert_eq!(stored[0].id, "R-1");
        assert!(stored[0].is_persisted_clean());
    }

    #[test]
    fn test_unknown_and_occupied_rows_are_refused() {
        let mut busy = room("busy", "1F", Section::A);
        busy.status = RoomStatus::Occupied;
        let backend = InMemoryBackend::from_dataset(Dataset {
            rooms: vec![busy],
            reservations: vec![],
        });

        let ack = backend.save_layout(&LayoutChange::Delete {
            id: "missing".to_string(),
        });
        assert!(!ack.accepted);

        let ack = backend.save_layout(&LayoutChange::Delete {
            id: "busy".to_string(),
        });
        assert_eq!(ack.reason.as_deref(), Some("room 'busy' is in use"));
    }
}
