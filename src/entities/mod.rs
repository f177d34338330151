//! Match entities: cards, zones, typed fields, and the registry that
//! holds them.
//!
//! Entities are the only mutable state a rule can touch. Their ids are
//! stable strings assigned at setup; everything else (zone contents,
//! fields, tags, reveal state) changes as commands execute.

mod card;
mod fields;
mod game;
mod zone;

pub use card::{Card, CardData, FieldData, RevealState};
pub use fields::{FieldKind, FieldValue};
pub use game::Game;
pub use zone::{Zone, ZoneData, ZonePlacement};
