//! Organization-scoped entities: the department roster.

pub mod roster;

pub use roster::{Depart, DepartRoster, RosterError, DEPART_NAME_MAX};
