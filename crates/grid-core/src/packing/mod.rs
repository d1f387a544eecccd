//! Booking-side reconstruction of a section grid from position-free rooms.

use crate::geometry::{self, SLOT_COUNT};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::warn;

#[cfg(test)]
mod tests;

/// Content of one of the eight grid slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Slot {
    #[serde(rename_all = "camelCase")]
    Room {
        room_id: String,
        room_type: RoomType,
        /// True on the room's top-left slot.
        anchor: bool,
    },
    /// Placeholder for a cell no room covers; never reservable.
    #[serde(rename_all = "camelCase")]
    Empty { placeholder_id: String },
}

impl Slot {
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Slot::Room { room_id, .. } => Some(room_id.as_str()),
            Slot::Empty { .. } => None,
        }
    }

    pub fn is_reservable(&self) -> bool {
        matches!(self, Slot::Room { .. })
    }
}

/// A fully tiled section ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedSection {
    pub floor_id: FloorId,
    pub section: Section,
    /// Placed rooms with their derived `col`, `row` and spans.
    pub rooms: Vec<Room>,
    /// Always `SLOT_COUNT` entries, indexed by `row * 2 + col`.
    pub slots: Vec<Slot>,
    /// Rooms that could not be fitted and are left out of the render.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<String>,
}

impl PackedSection {
    pub fn empty_slots(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_reservable()).count()
    }
}

/// Assigns rooms to slots, largest first, so that identical input always
/// produces the identical grid.
///
/// A larger room without a hint can take the slot a smaller room hinted at.
#[derive(Debug, Clone)]
pub struct SlotPacker {
    /// Every in-bounds (anchor, shape) per room type, in scan order.
    candidates: BTreeMap<RoomType, Vec<(usize, Shape)>>,
}

impl Default for SlotPacker {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotPacker {
    pub fn new() -> Self {
        let mut candidates = BTreeMap::new();
        for room_type in RoomType::ALL {
            let mut runs = Vec::new();
            for anchor in 0..SLOT_COUNT {
                for shape in geometry::legal_shapes(room_type) {
                    if geometry::slots_for(anchor, *shape).is_some() {
                        runs.push((anchor, *shape));
                    }
                }
            }
            candidates.insert(room_type, runs);
        }
        Self { candidates }
    }

    /// Packs the rooms of one (floor, section). Rooms from other sections or
    /// marked for removal are ignored.
    pub fn pack_section(&self, floor_id: FloorId, section: Section, rooms: &[Room]) -> PackedSection {
        let mut ordered: Vec<&Room> = rooms
            .iter()
            .filter(|r| r.floor_id == floor_id && r.section == section && !r.pending_remove)
            .collect();
        ordered.sort_by(|a, b| packing_order(a, b));

        let mut owners: [Option<usize>; SLOT_COUNT] = [None; SLOT_COUNT];
        let mut placed: Vec<Room> = Vec::new();
        let mut dropped = Vec::new();

        for room in ordered {
            match self.find_run(room, &owners) {
                Some((anchor, shape, slots)) => {
                    for slot in slots {
                        owners[slot] = Some(placed.len());
                    }
                    let (col, row) = geometry::slot_position(anchor);
                    placed.push(Room {
                        col,
                        row,
                        col_span: shape.col_span,
                        row_span: shape.row_span,
                        ..room.clone()
                    });
                }
                None => {
                    warn!(
                        room_id = %room.id,
                        floor = %floor_id,
                        section = %section,
                        room_type = %room.room_type,
                        "no free run for room; omitted from section grid"
                    );
                    dropped.push(room.id.clone());
                }
            }
        }

        let slots = owners
            .iter()
            .enumerate()
            .map(|(slot, owner)| match owner {
                Some(idx) => {
                    let room = &placed[*idx];
                    Slot::Room {
                        room_id: room.id.clone(),
                        room_type: room.room_type,
                        anchor: geometry::slot_index(room.col, room.row) == slot,
                    }
                }
                None => Slot::Empty {
                    placeholder_id: format!("{floor_id}-{section}-empty-{slot}"),
                },
            })
            .collect();

        PackedSection {
            floor_id,
            section,
            rooms: placed,
            slots,
            dropped,
        }
    }

    /// Packs all three sections of a floor.
    pub fn pack_floor(&self, floor_id: FloorId, rooms: &[Room]) -> Vec<PackedSection> {
        Section::ALL
            .iter()
            .map(|section| self.pack_section(floor_id, *section, rooms))
            .collect()
    }

    /// Picks the first free run for a room. The room's own slot hint is
    /// tried first, with its recorded shape ahead of the other legal ones.
    fn find_run(
        &self,
        room: &Room,
        owners: &[Option<usize>; SLOT_COUNT],
    ) -> Option<(usize, Shape, Vec<usize>)> {
        let runs = self.candidates.get(&room.room_type)?;
        let hint = room
            .room_index
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < SLOT_COUNT);
        let own_shape = room.shape();

        let mut preferred: Vec<(usize, Shape)> = runs
            .iter()
            .copied()
            .filter(|(anchor, _)| Some(*anchor) == hint)
            .collect();
        preferred.sort_by_key(|(_, shape)| *shape != own_shape);

        preferred
            .into_iter()
            .chain(runs.iter().copied())
            .find_map(|(anchor, shape)| {
                let slots = geometry::slots_for(anchor, shape)?;
                slots
                    .iter()
                    .all(|s| owners[*s].is_none())
                    .then_some((anchor, shape, slots))
            })
    }
}

/// Largest class first; within a class by slot hint (ties broken by id),
/// then rooms without a hint in input order.
fn packing_order(a: &Room, b: &Room) -> Ordering {
    b.capacity()
        .cmp(&a.capacity())
        .then_with(|| match (a.room_index, b.room_index) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

pub fn pack_section(floor_id: FloorId, section: Section, rooms: &[Room]) -> PackedSection {
    SlotPacker::new().pack_section(floor_id, section, rooms)
}

pub fn pack_floor(floor_id: FloorId, rooms: &[Room]) -> Vec<PackedSection> {
    SlotPacker::new().pack_floor(floor_id, rooms)
}
