//! Occupancy figures per floor, section and room type.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub total: u32,
    pub available: u32,
}

impl Counts {
    fn tally(&mut self, available: bool) {
        self.total += 1;
        if available {
            self.available += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub total: u32,
    pub available: u32,
    /// Always carries all four room types, zeroed when absent.
    pub by_type: BTreeMap<RoomType, Counts>,
}

impl Default for SectionSummary {
    fn default() -> Self {
        Self {
            total: 0,
            available: 0,
            by_type: RoomType::ALL
                .iter()
                .map(|t| (*t, Counts::default()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorSummary {
    pub floor_id: FloorId,
    pub total_rooms: u32,
    pub available_rooms: u32,
    /// Always carries sections A, B and C.
    pub per_section: BTreeMap<Section, SectionSummary>,
}

impl FloorSummary {
    fn empty(floor_id: FloorId) -> Self {
        Self {
            floor_id,
            total_rooms: 0,
            available_rooms: 0,
            per_section: Section::ALL
                .iter()
                .map(|s| (*s, SectionSummary::default()))
                .collect(),
        }
    }
}

/// Ids of rooms some reservation currently holds.
fn blocked_rooms(reservations: &[Reservation]) -> HashSet<&str> {
    reservations
        .iter()
        .filter(|r| r.status.blocks_room())
        .map(|r| r.room_id.as_str())
        .collect()
}

/// Tallies the rooms of one floor. A room is available unless a reservation
/// marks it Occupied or In Use; rooms marked for removal are not counted.
///
/// `Room::status` is not consulted: an Occupied room with no blocking
/// reservation still counts as available.
pub fn summarize(floor_id: FloorId, rooms: &[Room], reservations: &[Reservation]) -> FloorSummary {
    let blocked = blocked_rooms(reservations);
    let mut summary = FloorSummary::empty(floor_id);

    for section in Section::ALL {
        let entry = summary.per_section.entry(section).or_default();
        for room in rooms
            .iter()
            .filter(|r| r.floor_id == floor_id && r.section == section && !r.pending_remove)
        {
            let available = !blocked.contains(room.id.as_str());
            entry.total += 1;
            if available {
                entry.available += 1;
            }
            entry.by_type.entry(room.room_type).or_default().tally(available);
        }
        summary.total_rooms += entry.total;
        summary.available_rooms += entry.available;
    }

    summary
}

/// One summary per floor present in `rooms`, ordered by floor.
pub fn summarize_all(rooms: &[Room], reservations: &[Reservation]) -> Vec<FloorSummary> {
    let floors: BTreeSet<FloorId> = rooms.iter().map(|r| r.floor_id).collect();
    floors
        .into_iter()
        .map(|floor_id| summarize(floor_id, rooms, reservations))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(id: &str, floor: &str, section: Section, room_type: RoomType) -> Room {
        Room {
            id: id.to_string(),
            floor_id: floor.parse().unwrap(),
            section,
            room_type,
            price: 0,
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

    fn reservation(room_id: &str, status: ReservationStatus) -> Reservation {
        Reservation {
            id: format!("rsv-{room_id}"),
            room_id: room_id.to_string(),
            status,
        }
    }

    #[test]
    fn test_empty_floor_is_all_zero() {
        let summary = summarize("1F".parse().unwrap(), &[], &[]);
        assert_eq!(summary.total_rooms, 0);
        assert_eq!(summary.available_rooms, 0);
        assert_eq!(summary.per_section.len(), 3);
        for section in summary.per_section.values() {
            assert_eq!(section.total, 0);
            assert_eq!(section.by_type.len(), 4);
            assert!(section.by_type.values().all(|c| *c == Counts::default()));
        }
    }

    #[test]
    fn test_counts_by_section_and_type() {
        let rooms = vec![
            room("a1", "2F", Section::A, RoomType::Single),
            room("a2", "2F", Section::A, RoomType::Single),
            room("a3", "2F", Section::A, RoomType::Quad),
            room("b1", "2F", Section::B, RoomType::Eight),
            room("x1", "3F", Section::A, RoomType::Single),
        ];
        let reservations = vec![
            reservation("a1", ReservationStatus::Occupied),
            reservation("b1", ReservationStatus::InUse),
            reservation("a2", ReservationStatus::Cancelled),
            reservation("a3", ReservationStatus::Reserved),
        ];

        let summary = summarize("2F".parse().unwrap(), &rooms, &reservations);
        assert_eq!(summary.total_rooms, 4);
        assert_eq!(summary.available_rooms, 2);

        let a = &summary.per_section[&Section::A];
        assert_eq!((a.total, a.available), (3, 2));
        assert_eq!(
            a.by_type[&RoomType::Single],
            Counts {
                total: 2,
                available: 1
            }
        );
        assert_eq!(a.by_type[&RoomType::Quad].available, 1);

        let b = &summary.per_section[&Section::B];
        assert_eq!(
            b.by_type[&RoomType::Eight],
            Counts {
                total: 1,
                available: 0
            }
        );
        assert_eq!(summary.per_section[&Section::C].total, 0);
    }

    #[test]
    fn test_room_status_alone_does_not_block() {
        let mut busy = room("a1", "1F", Section::A, RoomType::Single);
        busy.status = RoomStatus::Occupied;
        let summary = summarize("1F".parse().unwrap(), &[busy], &[]);
        assert_eq!(summary.available_rooms, 1);
    }

    #[test]
    fn test_removed_rooms_are_not_counted() {
        let mut gone = room("a1", "1F", Section::A, RoomType::Double);
        gone.pending_remove = true;
        let summary = summarize("1F".parse().unwrap(), &[gone], &[]);
        assert_eq!(summary.total_rooms, 0);
    }

    #[test]
    fn test_summarize_all_orders_floors_numerically() {
        let rooms = vec![
            room("a", "10F", Section::A, RoomType::Single),
            room("b", "2F", Section::A, RoomType::Single),
        ];
        let floors: Vec<String> = summarize_all(&rooms, &[])
            .iter()
            .map(|s| s.floor_id.to_string())
            .collect();
        assert_eq!(floors, vec!["2F", "10F"]);
    }

    #[test]
    fn test_serialized_shape() {
        let summary = summarize("1F".parse().unwrap(), &[], &[]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["floorId"], "1F");
        assert_eq!(json["totalRooms"], 0);
        assert_eq!(json["perSection"]["C"]["byType"]["Eight"]["available"], 0);
    }
}
