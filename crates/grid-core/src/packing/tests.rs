use super::*;
use crate::layout::SectionLayoutStore;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn floor() -> FloorId {
    "5F".parse().unwrap()
}

fn room(id: &str, room_type: RoomType, room_index: Option<u32>) -> Room {
    Room {
        id: id.to_string(),
        floor_id: floor(),
        section: Section::A,
        room_type,
        price: 0,
        status: RoomStatus::Available,
        room_index,
        col: 0,
        row: 0,
        col_span: 0,
        row_span: 0,
        pending_add: false,
        pending_remove: false,
        pending_edit: false,
    }
}

fn occupants(packed: &PackedSection) -> Vec<Option<&str>> {
    packed.slots.iter().map(|s| s.room_id()).collect()
}

#[test]
fn test_empty_section_is_all_placeholders() {
    let packed = pack_section(floor(), Section::B, &[]);
    assert_eq!(packed.slots.len(), SLOT_COUNT);
    assert_eq!(packed.empty_slots(), SLOT_COUNT);
    assert_eq!(
        packed.slots[3],
        Slot::Empty {
            placeholder_id: "5F-B-empty-3".to_string()
        }
    );
}

#[test]
fn test_eight_fills_whole_grid_and_blocks_others() {
    let rooms = vec![
        room("single", RoomType::Single, Some(1)),
        room("eight", RoomType::Eight, Some(0)),
    ];
    let packed = pack_section(floor(), Section::A, &rooms);

    assert!(packed.slots.iter().all(|s| s.room_id() == Some("eight")));
    assert_eq!(packed.dropped, vec!["single".to_string()]);
    assert_eq!(packed.rooms[0].shape(), Shape::new(2, 4));
}

#[test]
fn test_larger_class_packs_before_earlier_hint() {
    let rooms = vec![
        room("s1", RoomType::Single, Some(0)),
        room("s0", RoomType::Single, Some(0)),
        room("q1", RoomType::Quad, Some(4)),
        room("d1", RoomType::Double, None),
    ];
    let packed = pack_section(floor(), Section::A, &rooms);

    assert_eq!(
        occupants(&packed),
        vec![
            Some("d1"),
            Some("d1"),
            Some("s0"),
            Some("s1"),
            Some("q1"),
            Some("q1"),
            Some("q1"),
            Some("q1"),
        ]
    );
}

#[test]
fn test_second_eight_is_dropped() {
    let rooms = vec![
        room("e1", RoomType::Eight, Some(0)),
        room("e2", RoomType::Eight, Some(0)),
    ];
    let packed = pack_section(floor(), Section::A, &rooms);
    assert_eq!(packed.rooms.len(), 1);
    assert_eq!(packed.dropped, vec!["e2".to_string()]);
}

#[test]
fn test_two_quads_stack_as_squares() {
    let rooms = vec![
        room("q1", RoomType::Quad, None),
        room("q2", RoomType::Quad, None),
    ];
    let packed = pack_section(floor(), Section::A, &rooms);

    assert_eq!(
        occupants(&packed),
        vec![
            Some("q1"),
            Some("q1"),
            Some("q1"),
            Some("q1"),
            Some("q2"),
            Some("q2"),
            Some("q2"),
            Some("q2"),
        ]
    );
    assert!(packed.dropped.is_empty());
}

#[test]
fn test_over_full_section_drops_overflow() {
    let rooms = vec![
        room("q1", RoomType::Quad, None),
        room("q2", RoomType::Quad, None),
        room("q3", RoomType::Quad, None),
    ];
    let packed = pack_section(floor(), Section::A, &rooms);
    assert_eq!(packed.dropped, vec!["q3".to_string()]);
    assert_eq!(packed.empty_slots(), 0);
}

#[test]
fn test_slot_hint_is_preferred() {
    let rooms = vec![
        room("s1", RoomType::Single, Some(5)),
        room("d1", RoomType::Double, Some(6)),
    ];
    let packed = pack_section(floor(), Section::A, &rooms);

    assert_eq!(packed.slots[5].room_id(), Some("s1"));
    assert_eq!(packed.slots[6].room_id(), Some("d1"));
    assert_eq!(packed.slots[7].room_id(), Some("d1"));
    assert_eq!(packed.empty_slots(), 5);
}

#[test]
fn test_taken_hint_falls_back_to_first_free_run() {
    let rooms = vec![
        room("d1", RoomType::Double, Some(0)),
        room("d2", RoomType::Double, Some(0)),
    ];
    let packed = pack_section(floor(), Section::A, &rooms);

    assert_eq!(packed.slots[0].room_id(), Some("d1"));
    assert_eq!(packed.slots[1].room_id(), Some("d1"));
    assert_eq!(packed.slots[2].room_id(), Some("d2"));
    assert_eq!(packed.slots[3].room_id(), Some("d2"));
}

#[test]
fn test_anchor_flag_marks_top_left() {
    let packed = pack_section(floor(), Section::A, &[room("q", RoomType::Quad, Some(2))]);
    let anchors: Vec<bool> = packed
        .slots
        .iter()
        .map(|s| matches!(s, Slot::Room { anchor: true, .. }))
        .collect();
    assert_eq!(
        anchors,
        vec![false, false, true, false, false, false, false, false]
    );
    assert_eq!((packed.rooms[0].col, packed.rooms[0].row), (0, 1));
}

#[test]
fn test_other_sections_and_removed_rooms_are_ignored() {
    let mut elsewhere = room("b1", RoomType::Single, Some(0));
    elsewhere.section = Section::B;
    let mut removed = room("gone", RoomType::Single, Some(1));
    removed.pending_remove = true;

    let packed = pack_section(floor(), Section::A, &[elsewhere, removed]);
    assert_eq!(packed.empty_slots(), SLOT_COUNT);
    assert!(packed.dropped.is_empty());
}

#[test]
fn test_authored_layout_round_trips() {
    let mut store = SectionLayoutStore::new();
    for (col, row, shape) in [
        (0, 0, Shape::new(1, 4)),
        (1, 0, Shape::new(1, 1)),
        (1, 1, Shape::new(1, 2)),
        (1, 3, Shape::new(1, 1)),
    ] {
        store
            .place(&crate::validator::PlacementRequest {
                floor_id: floor(),
                section: Section::A,
                rect: CellRect::anchored(col, row, shape),
                price: 0,
            })
            .unwrap();
    }

    let authored: Vec<Room> = store.rooms().cloned().collect();
    let packed = pack_section(floor(), Section::A, &authored);
    assert!(packed.dropped.is_empty());
    for original in &authored {
        let placed = packed.rooms.iter().find(|r| r.id == original.id).unwrap();
        assert_eq!(placed.footprint(), original.footprint());
    }
}

#[test]
fn test_pack_floor_covers_every_section() {
    let mut c = room("c1", RoomType::Double, None);
    c.section = Section::C;
    let packed = pack_floor(floor(), &[room("a1", RoomType::Single, None), c]);

    assert_eq!(packed.len(), 3);
    assert_eq!(packed[0].section, Section::A);
    assert_eq!(packed[1].empty_slots(), SLOT_COUNT);
    assert_eq!(packed[2].rooms[0].id, "c1");
}

#[test]
fn test_packing_is_deterministic_under_permutation() {
    let mut rng = StdRng::seed_from_u64(42);
    let packer = SlotPacker::new();

    for round in 0..100 {
        let mut rooms: Vec<Room> = (0..rng.gen_range(1..8))
            .map(|i| {
                let room_type = RoomType::ALL[rng.gen_range(0..4)];
                let index = rng.gen_bool(0.8).then(|| rng.gen_range(0..10));
                room(&format!("r{round}-{i}"), room_type, index)
            })
            .collect();
        // permutation invariance only holds when every room carries a hint
        for (i, r) in rooms.iter_mut().enumerate() {
            r.room_index.get_or_insert(i as u32 + 20);
        }

        let first = packer.pack_section(floor(), Section::A, &rooms);
        let again = packer.pack_section(floor(), Section::A, &rooms);
        assert_eq!(first, again);

        rooms.shuffle(&mut rng);
        let shuffled = packer.pack_section(floor(), Section::A, &rooms);
        assert_eq!(first.slots, shuffled.slots);
        assert_eq!(first.dropped, shuffled.dropped);

        assert_eq!(first.slots.len(), SLOT_COUNT);
        let covered: u32 = first.rooms.iter().map(|r| r.capacity()).sum();
        assert_eq!(covered as usize + first.empty_slots(), SLOT_COUNT);
        assert_eq!(first.rooms.len() + first.dropped.len(), rooms.len());
    }
}
