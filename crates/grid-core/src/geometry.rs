//! Legal room footprints on the fixed 2x4 section grid.
//!
//! Every rule about which shapes a capacity class may take lives in
//! [`LEGAL_SHAPES`]; the validator and the packer both read from it.

use crate::types::*;

pub const GRID_COLS: u8 = 2;
pub const GRID_ROWS: u8 = 4;
pub const SLOT_COUNT: usize = (GRID_COLS as usize) * (GRID_ROWS as usize);
/// Maximum sum of capacity classes per section.
pub const SECTION_CAPACITY: u32 = 8;

/// Legal shapes per room type, in preference order. The first entry is the
/// shape used when a room is created from its type alone.
const LEGAL_SHAPES: [(RoomType, &[Shape]); 4] = [
    (RoomType::Single, &[Shape::new(1, 1)]),
    (RoomType::Double, &[Shape::new(2, 1), Shape::new(1, 2)]),
    (RoomType::Quad, &[Shape::new(2, 2), Shape::new(1, 4)]),
    (RoomType::Eight, &[Shape::new(2, 4)]),
];

pub fn legal_shapes(room_type: RoomType) -> &'static [Shape] {
    LEGAL_SHAPES
        .iter()
        .find(|(t, _)| *t == room_type)
        .map(|(_, shapes)| *shapes)
        .unwrap_or(&[])
}

pub fn default_shape(room_type: RoomType) -> Shape {
    legal_shapes(room_type)
        .first()
        .copied()
        .unwrap_or(Shape::new(1, 1))
}

pub fn is_legal(room_type: RoomType, shape: Shape) -> bool {
    legal_shapes(room_type).contains(&shape)
}

/// Resolves a drawn rectangle to its capacity class and canonical shape.
pub fn resolve_shape(rect: &CellRect) -> std::result::Result<(RoomType, Shape), ShapeError> {
    let col_span = rect.col_span();
    let row_span = rect.row_span();
    let size = col_span.saturating_mul(row_span);

    let room_type = u32::try_from(size)
        .ok()
        .and_then(RoomType::from_capacity)
        .filter(|_| col_span > 0 && row_span > 0)
        .ok_or(ShapeError::InvalidCellCount(size))?;

    let drawn = match (u8::try_from(col_span), u8::try_from(row_span)) {
        (Ok(c), Ok(r)) => Some(Shape::new(c, r)),
        _ => None,
    };

    match drawn {
        Some(shape) if is_legal(room_type, shape) => Ok((room_type, shape)),
        _ => Err(ShapeError::IllegalShape {
            capacity: room_type.capacity(),
            drawn: format!("{col_span}x{row_span}"),
            allowed: describe_legal(room_type),
        }),
    }
}

/// Human-readable list of legal shapes, e.g. `"1x4 or 2x2"`.
pub fn describe_legal(room_type: RoomType) -> String {
    let mut shapes: Vec<String> = legal_shapes(room_type)
        .iter()
        .map(|s| s.to_string())
        .collect();
    shapes.sort();
    shapes.join(" or ")
}

pub fn in_bounds(rect: &CellRect) -> bool {
    rect.col_start >= 0
        && rect.row_start >= 0
        && rect.col_end < i32::from(GRID_COLS)
        && rect.row_end < i32::from(GRID_ROWS)
}

pub fn slot_index(col: u8, row: u8) -> usize {
    usize::from(row) * usize::from(GRID_COLS) + usize::from(col)
}

pub fn slot_position(slot: usize) -> (u8, u8) {
    let cols = usize::from(GRID_COLS);
    ((slot % cols) as u8, (slot / cols) as u8)
}

/// Slots covered by a footprint anchored at `anchor`, or `None` if it
/// would leave the grid.
pub fn slots_for(anchor: usize, shape: Shape) -> Option<Vec<usize>> {
    if anchor >= SLOT_COUNT {
        return None;
    }
    let (col, row) = slot_position(anchor);
    let rect = CellRect::anchored(i32::from(col), i32::from(row), shape);
    if !in_bounds(&rect) {
        return None;
    }

    let mut slots = Vec::with_capacity(shape.cells() as usize);
    for r in row..row + shape.row_span {
        for c in col..col + shape.col_span {
            slots.push(slot_index(c, r));
        }
    }
    Some(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_legal_shape_resolves_to_its_class() {
        for room_type in RoomType::ALL {
            for shape in legal_shapes(room_type) {
                let rect = CellRect::anchored(0, 0, *shape);
                assert_eq!(resolve_shape(&rect), Ok((room_type, *shape)));
            }
        }
    }

    #[test]
    fn test_illegal_shapes_of_legal_size_are_rejected() {
        // 4x1 and 8x1 have legal sizes but no legal shape
        for (cols, rows) in [(4, 1), (1, 8), (4, 2), (8, 1)] {
            let rect = CellRect::new(0, 0, cols - 1, rows - 1);
            assert!(matches!(
                resolve_shape(&rect),
                Err(ShapeError::IllegalShape { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_cell_counts() {
        for (cols, rows) in [(1, 3), (2, 3), (3, 1), (3, 2)] {
            let rect = CellRect::new(0, 0, cols - 1, rows - 1);
            assert_eq!(
                resolve_shape(&rect),
                Err(ShapeError::InvalidCellCount(i64::from(cols * rows)))
            );
        }
    }

    #[test]
    fn test_extreme_coordinates_are_rejected_without_overflow() {
        let whole_range = CellRect {
            col_start: i32::MIN,
            row_start: 0,
            col_end: i32::MAX,
            row_end: 0,
        };
        assert!(matches!(
            resolve_shape(&whole_range),
            Err(ShapeError::InvalidCellCount(_))
        ));

        let huge = CellRect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(resolve_shape(&huge), Err(ShapeError::InvalidCellCount(i64::MAX)));

        let at_edge = CellRect::anchored(i32::MAX, i32::MAX, Shape::new(2, 4));
        assert_eq!(at_edge.col_end, i32::MAX);
        assert!(!in_bounds(&at_edge));
    }

    #[test]
    fn test_class_specific_message() {
        let err = resolve_shape(&CellRect::new(0, 0, 3, 0)).unwrap_err();
        assert_eq!(err.to_string(), "class 4 must be 1x4 or 2x2");
    }

    #[test]
    fn test_slot_mapping() {
        assert_eq!(slot_index(1, 3), 7);
        assert_eq!(slot_position(5), (1, 2));
        assert_eq!(slots_for(0, Shape::new(2, 2)), Some(vec![0, 1, 2, 3]));
        assert_eq!(slots_for(1, Shape::new(1, 4)), Some(vec![1, 3, 5, 7]));
        assert_eq!(slots_for(1, Shape::new(2, 1)), None);
        assert_eq!(slots_for(6, Shape::new(1, 2)), None);
        assert_eq!(slots_for(0, Shape::new(2, 4)).map(|s| s.len()), Some(8));
    }
}
