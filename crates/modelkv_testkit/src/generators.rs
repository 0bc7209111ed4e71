//! Property-based test generators using proptest.

use crate::fixtures::Note;
use modelkv_core::{Cursor, Direction};
use proptest::prelude::*;

/// Strategy for entity ids, including characters that are special in keys.
pub fn id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9!_.:-]{1,24}").expect("Invalid regex")
}

/// Strategy for valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for unsaved notes with distinct ids.
pub fn notes_strategy(max: usize) -> impl Strategy<Value = Vec<Note>> {
    prop::collection::btree_map(id_strategy(), ".{0,64}", 0..=max).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, text)| Note::new(id, text))
            .collect()
    })
}

/// Strategy for page windows.
pub fn cursor_strategy() -> impl Strategy<Value = Cursor> {
    (
        prop_oneof![Just(Direction::Head), Just(Direction::Tail)],
        0usize..12,
        prop::option::of(0usize..8),
    )
        .prop_map(|(direction, offset, limit)| Cursor {
            direction,
            offset,
            limit,
        })
}
