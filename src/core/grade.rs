// src/core/grade.rs

//! Aggregation of per-endpoint grades into the single grade reported for a site.

use crate::core::models::GRADE_NOT_FOUND;

/// Reduces endpoint grades to one site grade by plain lexical ordering.
///
/// The grades are sorted ascending as byte strings and the last element wins.
/// An empty list, or a last element that is the empty string, yields
/// `"not found"`.
///
/// This is not a security ranking: `"A+"` sorts before `"B"` only because of
/// ASCII order, and `"T"` (untrusted) sorts above every letter grade. Callers
/// that rely on the reported grade depend on exactly this ordering, so keep it
/// isolated here if a semantic ordering is ever introduced.
pub fn lexical_max_grade<S: AsRef<str>>(grades: &[S]) -> String {
    let mut sorted: Vec<&str> = grades.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    match sorted.last() {
        Some(last) if !last.is_empty() => (*last).to_string(),
        _ => GRADE_NOT_FOUND.to_string(),
    }
}
