use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Floor identifier of the form `"<positive integer>F"`, e.g. `3F`.
///
/// Floors order numerically, so `2F` sorts before `10F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FloorId(u32);

impl FloorId {
    pub fn new(level: u32) -> Result<Self> {
        if level == 0 {
            return Err(LayoutError::InvalidFloorId("0F".to_string()));
        }
        Ok(Self(level))
    }

    pub fn level(&self) -> u32 {
        self.0
    }
}

impl FromStr for FloorId {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LayoutError::InvalidFloorId(s.to_string());
        let digits = s.trim().strip_suffix('F').ok_or_else(invalid)?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let level: u32 = digits.parse().map_err(|_| invalid())?;
        if level == 0 {
            return Err(invalid());
        }
        Ok(Self(level))
    }
}

impl TryFrom<String> for FloorId {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<FloorId> for String {
    fn from(value: FloorId) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FloorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}F", self.0)
    }
}

impl PartialOrd for FloorId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloorId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// One of the three fixed sections of a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    A,
    B,
    C,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::A, Section::B, Section::C];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::A => write!(f, "A"),
            Section::B => write!(f, "B"),
            Section::C => write!(f, "C"),
        }
    }
}

impl FromStr for Section {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" | "a" => Ok(Section::A),
            "B" | "b" => Ok(Section::B),
            "C" | "c" => Ok(Section::C),
            other => Err(LayoutError::InvalidInput(format!(
                "unknown section '{other}'"
            ))),
        }
    }
}

/// Room type; each maps to a capacity class of 1, 2, 4 or 8 cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomType {
    Single,
    Double,
    Quad,
    Eight,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [
        RoomType::Single,
        RoomType::Double,
        RoomType::Quad,
        RoomType::Eight,
    ];

    pub fn capacity(&self) -> u32 {
        match self {
            RoomType::Single => 1,
            RoomType::Double => 2,
            RoomType::Quad => 4,
            RoomType::Eight => 8,
        }
    }

    pub fn from_capacity(capacity: u32) -> Option<Self> {
        match capacity {
            1 => Some(RoomType::Single),
            2 => Some(RoomType::Double),
            4 => Some(RoomType::Quad),
            8 => Some(RoomType::Eight),
            _ => None,
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomType::Single => write!(f, "Single"),
            RoomType::Double => write!(f, "Double"),
            RoomType::Quad => write!(f, "Quad"),
            RoomType::Eight => write!(f, "Eight"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
}

/// Footprint of a room in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub col_span: u8,
    pub row_span: u8,
}

impl Shape {
    pub const fn new(col_span: u8, row_span: u8) -> Self {
        Self { col_span, row_span }
    }

    pub fn cells(&self) -> u32 {
        u32::from(self.col_span) * u32::from(self.row_span)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.col_span, self.row_span)
    }
}

/// Inclusive cell range drawn by the administrator.
///
/// Coordinates are signed so a drag that leaves the grid can still be
/// represented and rejected as out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRect {
    pub col_start: i32,
    pub row_start: i32,
    pub col_end: i32,
    pub row_end: i32,
}

impl CellRect {
    /// Normalizes the two corners so that start <= end on both axes.
    pub fn new(col_a: i32, row_a: i32, col_b: i32, row_b: i32) -> Self {
        Self {
            col_start: col_a.min(col_b),
            row_start: row_a.min(row_b),
            col_end: col_a.max(col_b),
            row_end: row_a.max(row_b),
        }
    }

    /// Saturates at the edge of the coordinate range; such a rectangle is
    /// then rejected by shape or bounds checks.
    pub fn anchored(col: i32, row: i32, shape: Shape) -> Self {
        Self {
            col_start: col,
            row_start: row,
            col_end: col.saturating_add(i32::from(shape.col_span) - 1),
            row_end: row.saturating_add(i32::from(shape.row_span) - 1),
        }
    }

    pub fn col_span(&self) -> i64 {
        i64::from(self.col_end) - i64::from(self.col_start) + 1
    }

    pub fn row_span(&self) -> i64 {
        i64::from(self.row_end) - i64::from(self.row_start) + 1
    }

    pub fn intersects(&self, other: &CellRect) -> bool {
        self.col_start <= other.col_end
            && other.col_start <= self.col_end
            && self.row_start <= other.row_end
            && other.row_start <= self.row_end
    }
}

impl fmt::Display for CellRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.col_start, self.row_start, self.col_end, self.row_end
        )
    }
}

/// The unit of reservable space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub floor_id: FloorId,
    pub section: Section,
    pub room_type: RoomType,
    #[serde(default)]
    pub price: u32,
    #[serde(default)]
    pub status: RoomStatus,
    /// Slot hint for the packer; the authoring store writes the top-left slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_index: Option<u32>,
    #[serde(default)]
    pub col: u8,
    #[serde(default)]
    pub row: u8,
    #[serde(default)]
    pub col_span: u8,
    #[serde(default)]
    pub row_span: u8,
    #[serde(default)]
    pub pending_add: bool,
    #[serde(default)]
    pub pending_remove: bool,
    #[serde(default)]
    pub pending_edit: bool,
}

impl Room {
    pub fn shape(&self) -> Shape {
        Shape::new(self.col_span, self.row_span)
    }

    pub fn footprint(&self) -> CellRect {
        CellRect::anchored(i32::from(self.col), i32::from(self.row), self.shape())
    }

    pub fn capacity(&self) -> u32 {
        self.room_type.capacity()
    }

    pub fn is_occupied(&self) -> bool {
        self.status == RoomStatus::Occupied
    }

    /// True when the row has no pending lifecycle marker.
    pub fn is_persisted_clean(&self) -> bool {
        !self.pending_add && !self.pending_remove && !self.pending_edit
    }
}

/// A non-geometric edit applied through the placement validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum RoomEdit {
    Price(u32),
    RoomType(RoomType),
    Section(Section),
    FloorId(FloorId),
}

/// Partial update sent to the backing collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_id: Option<FloorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<RoomType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
}

impl RoomPatch {
    pub fn is_empty(&self) -> bool {
        self.floor_id.is_none()
            && self.section.is_none()
            && self.room_type.is_none()
            && self.price.is_none()
    }
}

impl From<RoomEdit> for RoomPatch {
    fn from(edit: RoomEdit) -> Self {
        let mut patch = RoomPatch::default();
        match edit {
            RoomEdit::Price(price) => patch.price = Some(price),
            RoomEdit::RoomType(room_type) => patch.room_type = Some(room_type),
            RoomEdit::Section(section) => patch.section = Some(section),
            RoomEdit::FloorId(floor_id) => patch.floor_id = Some(floor_id),
        }
        patch
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Reserved,
    Occupied,
    InUse,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Whether a reservation in this state makes its room unavailable.
    pub fn blocks_room(&self) -> bool {
        matches!(self, ReservationStatus::Occupied | ReservationStatus::InUse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub room_id: String,
    pub status: ReservationStatus,
}

/// Rooms and reservations as loaded from a data file or seed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
}

/// Reason a shape could not be resolved from a drawn rectangle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("invalid cell count: {0}")]
    InvalidCellCount(i64),

    #[error("class {capacity} must be {allowed}")]
    IllegalShape {
        capacity: u32,
        drawn: String,
        allowed: String,
    },
}

/// Validation failure raised by the placement validator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("invalid shape: {0}")]
    InvalidShape(#[from] ShapeError),

    #[error("cells {rect} fall outside the 2x4 section grid")]
    OutOfBounds { rect: CellRect },

    #[error("overlaps room '{room_id}'")]
    Overlap { room_id: String },

    #[error("section capacity exceeded: {current} + {requested} > 8")]
    CapacityExceeded { current: u32, requested: u32 },

    #[error("room '{room_id}' is in use")]
    InUse { room_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}

/// Error type for layout operations
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Invalid floor id '{0}', expected <positive integer>F")]
    InvalidFloorId(String),

    #[error("Floor {0} already exists")]
    FloorExists(FloorId),

    #[error("Floor {0} not found")]
    FloorNotFound(FloorId),

    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
