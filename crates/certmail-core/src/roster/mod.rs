//! Participant roster: rows read from a spreadsheet or CSV table and the
//! name index built from them.

mod index;
mod model;
mod reader;

pub use index::RosterIndex;
pub use model::{Contact, RosterRow};
pub use reader::{RosterError, parse_csv, read_roster};
