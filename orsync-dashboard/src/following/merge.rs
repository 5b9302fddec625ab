//! Merge of a followed-ID list with a batch summary response

use orsync_common::{orcid_id, FollowEntry, ResearcherSummary};
use std::collections::{HashMap, HashSet};

/// Comparison key: bare identifier, so URI-form IDs match bare ones
fn match_key(id: &str) -> String {
    orcid_id::clean(id).unwrap_or_else(|_| id.to_string())
}

/// Build one entry per requested ID, in request order
///
/// Summaries may arrive in any order, may omit IDs and may contain IDs that
/// were not requested. Requested IDs without a summary become placeholder
/// rows carrying only the ID. Repeated IDs in `requested` keep their first
/// position only.
pub fn reconcile(requested: &[String], summaries: Vec<ResearcherSummary>) -> Vec<FollowEntry> {
    let mut by_id: HashMap<String, ResearcherSummary> = HashMap::with_capacity(summaries.len());
    for summary in summaries {
        by_id.entry(match_key(&summary.id)).or_insert(summary);
    }

    let mut seen = HashSet::with_capacity(requested.len());
    let mut placeholders = 0usize;

    let entries: Vec<FollowEntry> = requested
        .iter()
        .filter(|id| seen.insert(match_key(id)))
        .map(|id| match by_id.remove(&match_key(id)) {
            Some(summary) => FollowEntry {
                researcher_id: id.clone(),
                name: summary.name,
                institution: summary.institution,
            },
            None => {
                placeholders += 1;
                FollowEntry::placeholder(id.clone())
            }
        })
        .collect();

    if placeholders > 0 {
        tracing::debug!(
            requested = requested.len(),
            placeholders,
            "No public summary for some followed researchers"
        );
    }

    entries
}
