//! Scroll list filtering.
//!
//! Pure functions over a borrowed collection; order is always preserved.

use crate::entity::{Note, Realm};

/// Notes whose title or content contains `query`, ignoring case.
///
/// An empty query returns every note.
///
/// # Examples
///
/// ```ignore
/// let hits = filter(&notes, "筑基");
/// assert!(hits.iter().all(|n| n.title.contains("筑基") || n.content.contains("筑基")));
/// ```
pub fn filter<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    if query.is_empty() {
        return notes.iter().collect();
    }
    let needle = query.to_lowercase();
    notes
        .iter()
        .filter(|note| {
            note.title.to_lowercase().contains(&needle)
                || note.content.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Narrow an already filtered list to one realm.
pub fn filter_by_realm<'a>(notes: Vec<&'a Note>, realm: Option<Realm>) -> Vec<&'a Note> {
    match realm {
        Some(realm) => notes.into_iter().filter(|n| n.realm == realm).collect(),
        None => notes,
    }
}
