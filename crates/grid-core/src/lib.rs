//! Section grid layout engine for a shared-office reservation portal.
//!
//! Administrators draw rooms onto a fixed 2x4 grid per floor section
//! ([`SectionLayoutStore`], [`validator`]); the booking side rebuilds a
//! deterministic grid from stored rooms ([`packing`]) and reports occupancy
//! ([`summary`]).

pub mod backend;
pub mod geometry;
pub mod layout;
pub mod packing;
pub mod render;
pub mod summary;
pub mod types;
pub mod validator;

pub use backend::{
    InMemoryBackend, LayoutBackend, LayoutChange, LayoutFilter, ReservationFilter, SaveAck,
};
pub use layout::{SaveFailure, SaveOutcome, SaveReport, SectionLayoutStore};
pub use packing::{pack_floor, pack_section, PackedSection, Slot, SlotPacker};
pub use summary::{summarize, summarize_all, Counts, FloorSummary, SectionSummary};
pub use types::*;
pub use validator::{try_edit_field, try_place, try_remove, PlacementRequest, RemoveOutcome};
