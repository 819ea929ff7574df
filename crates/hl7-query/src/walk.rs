//! Direct tree walk.
//!
//! Resolves a query by descending the live tree with bounds checks at
//! every level. Used when the index strategy is off, when the index is
//! stale and cannot be rebuilt (shared reads), for segment-level queries,
//! and to explain why a strict lookup found nothing.

use hl7_location::LocationKey;

use crate::error::Level;
use crate::node::NodePath;
use crate::result::{Branch, Miss};
use crate::tree::{Field, Segment, Structure};

/// Returns the segments a key selects, with their slots, in document order.
///
/// Segments are filtered by name (ignoring case) and, if the key gives an
/// occurrence index, by a running per-name occurrence counter.
pub(crate) fn segments_matching<'s>(structure: &'s Structure, key: &LocationKey) -> Vec<(usize, &'s Segment)> {
    let named = structure
        .segments()
        .iter()
        .enumerate()
        .filter(|(_, segment)| key.names_segment(segment.name()));

    match key.segment_index() {
        Some(occurrence) => named.skip(occurrence).take(1).collect(),
        None => named.collect(),
    }
}

/// Resolves a field-level (or deeper) query, one branch per segment
/// occurrence and repetition visited.
///
/// With `first_only` the walk stops at the first hit.
pub(crate) fn walk(structure: &Structure, key: &LocationKey, roll_up: bool, first_only: bool) -> Vec<Branch> {
    let Some(position) = key.field() else {
        return vec![Err(Miss::NotFound)];
    };

    let segments = segments_matching(structure, key);
    if segments.is_empty() {
        return vec![Err(missing_segment(structure, key))];
    }

    let mut branches = Vec::new();
    for (slot, segment) in segments {
        let Some(repeating) = segment.field(position) else {
            branches.push(Err(Miss::out_of_range(Level::Field, position, segment.len())));
            continue;
        };

        let repetitions = match key.repetition() {
            Some(r) if r >= repeating.len() => {
                branches.push(Err(Miss::out_of_range(Level::Repetition, r, repeating.len())));
                continue;
            }
            Some(r) => r..r + 1,
            None if repeating.is_empty() => {
                branches.push(Err(Miss::NotFound));
                continue;
            }
            None => 0..repeating.len(),
        };

        for repetition in repetitions {
            let Some(field) = repeating.field(repetition) else {
                continue;
            };
            let branch = descend(field, NodePath::field(slot, position, repetition), key, roll_up);
            let hit = branch.is_ok();
            branches.push(branch);
            if first_only && hit {
                return branches;
            }
        }
    }
    branches
}

fn descend(field: &Field, path: NodePath, key: &LocationKey, roll_up: bool) -> Branch {
    let Some(c) = key.component() else {
        return Ok(path);
    };

    if field.is_base() {
        // A base field stands in for its own first component
        if roll_up && c == 0 && !key.has_subcomponent() {
            return Ok(path);
        }
        return Err(Miss::NotFound);
    }

    let Some(component) = field.component(c) else {
        return Err(Miss::out_of_range(Level::Component, c, field.components().len()));
    };
    let path = path.with_component(c);

    let Some(s) = key.subcomponent() else {
        return Ok(path);
    };
    if component.is_base() {
        return Err(Miss::NotFound);
    }
    match component.subcomponent(s) {
        Some(_) => Ok(path.with_subcomponent(s)),
        None => Err(Miss::out_of_range(
            Level::Subcomponent,
            s,
            component.subcomponents().len(),
        )),
    }
}

fn missing_segment(structure: &Structure, key: &LocationKey) -> Miss {
    let Some(occurrence) = key.segment_index() else {
        return Miss::NotFound;
    };
    let present = structure
        .segments()
        .iter()
        .filter(|segment| key.names_segment(segment.name()))
        .count();
    if present == 0 {
        Miss::NotFound
    } else {
        Miss::out_of_range(Level::Segment, occurrence, present)
    }
}
