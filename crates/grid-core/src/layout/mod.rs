use crate::geometry;
use crate::types::*;
use crate::validator::{self, PlacementRequest, RemoveOutcome};
use std::collections::BTreeMap;
use tracing::debug;

mod save;

pub use save::{SaveFailure, SaveOutcome, SaveReport};

type SectionKey = (FloorId, Section);

/// Authoring-side working copy of the rooms on every floor and section.
///
/// Mutations go through the placement validator and leave the store
/// untouched when rejected. The store is reconciled with the backend only
/// on [`SectionLayoutStore::save`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionLayoutStore {
    sections: BTreeMap<SectionKey, Vec<Room>>,
    next_temp_id: u64,
}

impl SectionLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from plain records, re-deriving shapes from room types
    /// where the stored spans are missing or illegal.
    pub fn from_rooms(rooms: impl IntoIterator<Item = Room>) -> Self {
        let mut store = Self::new();
        for room in rooms {
            store.add(room);
        }
        store
    }

    pub fn floors(&self) -> Vec<FloorId> {
        let mut floors: Vec<FloorId> = self.sections.keys().map(|(f, _)| *f).collect();
        floors.dedup();
        floors
    }

    pub fn has_floor(&self, floor_id: FloorId) -> bool {
        self.sections.contains_key(&(floor_id, Section::A))
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.sections.values().flatten()
    }

    pub fn get(&self, id: &str) -> Option<&Room> {
        self.rooms().find(|r| r.id == id)
    }

    pub fn list_by_section(&self, floor_id: FloorId, section: Section) -> &[Room] {
        self.sections
            .get(&(floor_id, section))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sum of capacity classes over the rooms not marked for removal.
    pub fn total_capacity(&self, floor_id: FloorId, section: Section) -> u32 {
        validator::section_capacity(self.list_by_section(floor_id, section), floor_id, section)
    }

    /// Inserts a record as-is, apart from re-deriving its shape.
    pub fn add(&mut self, mut room: Room) {
        normalize_shape(&mut room);
        self.ensure_floor(room.floor_id);
        self.sections
            .entry((room.floor_id, room.section))
            .or_default()
            .push(room);
    }

    /// Physically drops a row from the working copy.
    pub fn remove(&mut self, id: &str) -> Option<Room> {
        let (key, idx) = self.locate(id)?;
        self.sections.get_mut(&key).map(|rooms| rooms.remove(idx))
    }

    /// Applies a patch in place, moving the row between buckets when its
    /// floor or section changes and re-deriving its shape from its type.
    pub fn update(&mut self, id: &str, patch: &RoomPatch) -> Result<&Room> {
        let mut room = self
            .get(id)
            .cloned()
            .ok_or_else(|| LayoutError::RoomNotFound(id.to_string()))?;
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
        normalize_shape(&mut room);
        self.replace(id, room)
    }

    /// Validates a drawn rectangle and adds the resulting room with a
    /// temporary id.
    pub fn place(&mut self, request: &PlacementRequest) -> Result<&Room> {
        let id = format!("tmp-{}", self.next_temp_id + 1);
        let existing = self.list_by_section(request.floor_id, request.section);
        let room = validator::try_place(id, request, existing)?;
        self.next_temp_id += 1;
        debug!(
            room_id = %room.id,
            floor = %room.floor_id,
            section = %room.section,
            room_type = %room.room_type,
            "placed room"
        );
        Ok(self.insert(room))
    }

    /// Places a room of the given type using its default shape anchored at
    /// `(col, row)`.
    pub fn place_type(
        &mut self,
        floor_id: FloorId,
        section: Section,
        room_type: RoomType,
        col: i32,
        row: i32,
        price: u32,
    ) -> Result<&Room> {
        let shape = geometry::default_shape(room_type);
        self.place(&PlacementRequest {
            floor_id,
            section,
            rect: CellRect::anchored(col, row, shape),
            price,
        })
    }

    pub fn remove_room(&mut self, id: &str) -> Result<RemoveOutcome> {
        let (key, idx) = self
            .locate(id)
            .ok_or_else(|| LayoutError::RoomNotFound(id.to_string()))?;
        let rooms = self
            .sections
            .get_mut(&key)
            .ok_or_else(|| LayoutError::RoomNotFound(id.to_string()))?;

        let outcome = validator::try_remove(&mut rooms[idx])?;
        if outcome == RemoveOutcome::Discarded {
            rooms.remove(idx);
        }
        Ok(outcome)
    }

    pub fn edit_room(&mut self, id: &str, edit: RoomEdit) -> Result<&Room> {
        let mut edited = self
            .get(id)
            .cloned()
            .ok_or_else(|| LayoutError::RoomNotFound(id.to_string()))?;
        validator::try_edit_field(&mut edited, edit)?;
        self.replace(id, edited)
    }

    /// Registers an empty floor with its three section buckets.
    pub fn create_floor(&mut self, floor_id: FloorId) -> Result<()> {
        if self.has_floor(floor_id) {
            return Err(LayoutError::FloorExists(floor_id));
        }
        self.ensure_floor(floor_id);
        Ok(())
    }

    /// Marks every room on the floor for removal. Rejected without any
    /// change if a room on the floor is occupied.
    pub fn delete_floor(&mut self, floor_id: FloorId) -> Result<usize> {
        if !self.has_floor(floor_id) {
            return Err(LayoutError::FloorNotFound(floor_id));
        }
        if let Some(busy) = self
            .rooms()
            .find(|r| r.floor_id == floor_id && r.is_occupied())
        {
            return Err(Rejection::InUse {
                room_id: busy.id.clone(),
            }
            .into());
        }

        let mut marked = 0;
        for section in Section::ALL {
            if let Some(rooms) = self.sections.get_mut(&(floor_id, section)) {
                rooms.retain(|r| !r.pending_add);
                for room in rooms.iter_mut().filter(|r| !r.pending_remove) {
                    room.pending_remove = true;
                    marked += 1;
                }
            }
        }
        Ok(marked)
    }

    fn ensure_floor(&mut self, floor_id: FloorId) {
        for section in Section::ALL {
            self.sections.entry((floor_id, section)).or_default();
        }
    }

    fn insert(&mut self, room: Room) -> &Room {
        self.ensure_floor(room.floor_id);
        let rooms = self
            .sections
            .entry((room.floor_id, room.section))
            .or_default();
        rooms.push(room);
        &rooms[rooms.len() - 1]
    }

    /// Swaps the row with `id` for `room`, keeping its position in the
    /// bucket unless the room moved to another floor or section.
    fn replace(&mut self, id: &str, room: Room) -> Result<&Room> {
        let (key, idx) = self
            .locate(id)
            .ok_or_else(|| LayoutError::RoomNotFound(id.to_string()))?;

        if key != (room.floor_id, room.section) {
            self.remove(id);
            return Ok(self.insert(room));
        }

        let rooms = self
            .sections
            .get_mut(&key)
            .ok_or_else(|| LayoutError::RoomNotFound(id.to_string()))?;
        rooms[idx] = room;
        Ok(&rooms[idx])
    }

    fn locate(&self, id: &str) -> Option<(SectionKey, usize)> {
        self.sections.iter().find_map(|(key, rooms)| {
            rooms
                .iter()
                .position(|r| r.id == id)
                .map(|idx| (*key, idx))
        })
    }
}

/// Resets the spans to the type's default shape unless they already form a
/// legal shape for it.
fn normalize_shape(room: &mut Room) {
    if !geometry::is_legal(room.room_type, room.shape()) {
        let shape = geometry::default_shape(room.room_type);
        room.col_span = shape.col_span;
        room.row_span = shape.row_span;
    }
}
