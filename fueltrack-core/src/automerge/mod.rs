//! Automerge-backed document store.
//!
//! Each document is one Automerge file in the data directory, laid out by
//! its path:
//!
//! ```text
//! <data_dir>/users/{uid}.automerge
//! <data_dir>/users/{uid}/meals/{mealId}.automerge
//! <data_dir>/users/{uid}/mealPlans/{dateKey}.automerge
//! ```
//!
//! Field maps are stored at the document root, so merge writes touch only
//! the fields they carry and leave concurrent edits to other fields intact.

mod reader;
mod storage;
mod writer;

pub use reader::read_fields;
pub use storage::AutomergeStore;
pub use writer::write_fields;
