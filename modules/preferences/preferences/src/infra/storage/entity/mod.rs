//! Tables of the relational graph layout.
//!
//! `pref_view`, `pref_entry`, `pref_column` and `pref_filter` hold the nodes;
//! `pref_relationship` holds the typed edges between them.

pub mod column;
pub mod entry;
pub mod filter;
pub mod relationship;
pub mod view;
