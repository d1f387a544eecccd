//! Acceptance rules for placing, removing and editing rooms.
//!
//! These functions never partially apply: on rejection the room and the
//! surrounding section are left exactly as they were.

use crate::geometry::{self, SECTION_CAPACITY};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// A room the administrator drew on a section grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRequest {
    pub floor_id: FloorId,
    pub section: Section,
    pub rect: CellRect,
    #[serde(default)]
    pub price: u32,
}

/// What happened to a room accepted for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoveOutcome {
    /// The room was never saved and can be dropped outright.
    Discarded,
    /// The room is persisted and now carries `pending_remove`.
    MarkedForRemoval,
}

/// Rooms of one (floor, section) that still count towards the layout.
pub fn live_rooms<'a>(
    rooms: &'a [Room],
    floor_id: FloorId,
    section: Section,
) -> impl Iterator<Item = &'a Room> + 'a {
    rooms
        .iter()
        .filter(move |r| r.floor_id == floor_id && r.section == section && !r.pending_remove)
}

pub fn section_capacity(rooms: &[Room], floor_id: FloorId, section: Section) -> u32 {
    live_rooms(rooms, floor_id, section)
        .map(|r| r.capacity())
        .sum()
}

/// Checks a drawn rectangle against the existing rooms and, if every rule
/// holds, returns the new room. Rules are checked in order: shape, bounds,
/// overlap, capacity.
pub fn try_place(
    id: impl Into<String>,
    request: &PlacementRequest,
    existing: &[Room],
) -> std::result::Result<Room, Rejection> {
    let (room_type, shape) = geometry::resolve_shape(&request.rect)?;

    if !geometry::in_bounds(&request.rect) {
        return Err(Rejection::OutOfBounds { rect: request.rect });
    }

    if let Some(hit) = live_rooms(existing, request.floor_id, request.section)
        .find(|r| r.footprint().intersects(&request.rect))
    {
        return Err(Rejection::Overlap {
            room_id: hit.id.clone(),
        });
    }

    let current = section_capacity(existing, request.floor_id, request.section);
    if current + room_type.capacity() > SECTION_CAPACITY {
        return Err(Rejection::CapacityExceeded {
            current,
            requested: room_type.capacity(),
        });
    }

    // in_bounds guarantees both corners fit in u8
    let col = request.rect.col_start as u8;
    let row = request.rect.row_start as u8;

    Ok(Room {
        id: id.into(),
        floor_id: request.floor_id,
        section: request.section,
        room_type,
        price: request.price,
        status: RoomStatus::Available,
        room_index: Some(geometry::slot_index(col, row) as u32),
        col,
        row,
        col_span: shape.col_span,
        row_span: shape.row_span,
        pending_add: true,
        pending_remove: false,
        pending_edit: false,
    })
}

/// Rejects occupied rooms; otherwise reports how the removal should apply
/// and marks persisted rooms as `pending_remove`.
pub fn try_remove(room: &mut Room) -> std::result::Result<RemoveOutcome, Rejection> {
    if room.is_occupied() {
        return Err(Rejection::InUse {
            room_id: room.id.clone(),
        });
    }
    if room.pending_add {
        return Ok(RemoveOutcome::Discarded);
    }
    room.pending_remove = true;
    Ok(RemoveOutcome::MarkedForRemoval)
}

/// Applies a non-geometric edit. The shape is left alone even when the room
/// type changes; capacity is checked again on save.
/// Occupied rooms accept price edits only.
pub fn try_edit_field(room: &mut Room, edit: RoomEdit) -> std::result::Result<(), Rejection> {
    if room.is_occupied() && !matches!(edit, RoomEdit::Price(_)) {
        return Err(Rejection::InUse {
            room_id: room.id.clone(),
        });
    }

    match edit {
        RoomEdit::Price(price) => room.price = price,
        RoomEdit::RoomType(room_type) => room.room_type = room_type,
        RoomEdit::Section(section) => room.section = section,
        RoomEdit::FloorId(floor_id) => room.floor_id = floor_id,
    }

    if !room.pending_add && !room.pending_remove {
        room.pending_edit = true;
    }
    Ok(())
}
