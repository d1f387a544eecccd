//! SVG and terminal renderings of a packed section.

use crate::geometry::{self, GRID_COLS, GRID_ROWS};
use crate::packing::{PackedSection, Slot};
use crate::types::RoomType;
use std::fmt::{self, Write};

const CELL_WIDTH: f64 = 120.0;
const CELL_HEIGHT: f64 = 80.0;
const MARGIN: f64 = 20.0;

fn fill_for(room_type: RoomType) -> &'static str {
    match room_type {
        RoomType::Single => "#4CAF50",
        RoomType::Double => "#2196F3",
        RoomType::Quad => "#FF9800",
        RoomType::Eight => "#9C27B0",
    }
}

/// Draws the 2x4 grid: one rectangle per placed room, grey cells for
/// placeholders.
pub fn render_svg(packed: &PackedSection) -> Result<String, fmt::Error> {
    let mut svg = String::new();
    let grid_width = CELL_WIDTH * f64::from(GRID_COLS);
    let grid_height = CELL_HEIGHT * f64::from(GRID_ROWS);
    let svg_width = grid_width + 2.0 * MARGIN;
    let svg_height = grid_height + 3.0 * MARGIN;

    writeln!(&mut svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        &mut svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        svg_width, svg_height, svg_width, svg_height
    )?;
    writeln!(
        &mut svg,
        r##"  <rect width="100%" height="100%" fill="#f5f5f5"/>"##
    )?;
    writeln!(
        &mut svg,
        r##"  <text x="{}" y="{}" font-family="Arial" font-size="14" fill="#333">{} / {}</text>"##,
        MARGIN,
        MARGIN + 4.0,
        packed.floor_id,
        packed.section
    )?;

    let top = MARGIN * 2.0;

    for (slot, content) in packed.slots.iter().enumerate() {
        if let Slot::Empty { .. } = content {
            let (col, row) = geometry::slot_position(slot);
            writeln!(
                &mut svg,
                r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="#e0e0e0" stroke="#bdbdbd" stroke-width="1"/>"##,
                MARGIN + f64::from(col) * CELL_WIDTH,
                top + f64::from(row) * CELL_HEIGHT,
                CELL_WIDTH,
                CELL_HEIGHT
            )?;
        }
    }

    for room in &packed.rooms {
        let x = MARGIN + f64::from(room.col) * CELL_WIDTH;
        let y = top + f64::from(room.row) * CELL_HEIGHT;
        let w = f64::from(room.col_span) * CELL_WIDTH;
        let h = f64::from(room.row_span) * CELL_HEIGHT;

        writeln!(
            &mut svg,
            r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="#333" stroke-width="1" opacity="0.8"/>"##,
            x,
            y,
            w,
            h,
            fill_for(room.room_type)
        )?;
        writeln!(
            &mut svg,
            r##"  <text x="{}" y="{}" font-family="Arial" font-size="11" fill="#fff" text-anchor="middle">{} ({})</text>"##,
            x + w / 2.0,
            y + h / 2.0 + 4.0,
            room.id,
            room.room_type
        )?;
    }

    writeln!(&mut svg, "</svg>")?;

    Ok(svg)
}

/// Compact grid for terminals, one line per row.
pub fn render_text(packed: &PackedSection) -> String {
    let width = packed
        .slots
        .iter()
        .filter_map(|s| s.room_id())
        .map(str::len)
        .max()
        .unwrap_or(1)
        .max(1);

    let mut out = format!("{} / {}\n", packed.floor_id, packed.section);
    for row in 0..GRID_ROWS {
        let cells: Vec<String> = (0..GRID_COLS)
            .map(|col| {
                let label = packed
                    .slots
                    .get(geometry::slot_index(col, row))
                    .and_then(|s| s.room_id())
                    .unwrap_or(".");
                format!("{label:<width$}")
            })
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}
