//! Artifact drift detection
//!
//! Compares a published schema artifact with a fresh composition of the
//! fragments. Any textual difference counts as drift: the artifact is meant
//! to be byte-identical to what composition produces.

use similar::{ChangeTag, TextDiff};

use crate::checksum::Checksum;

/// Line-level difference between a published artifact and a fresh one
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactDrift {
    pub lines_added: usize,
    pub lines_removed: usize,
    pub published: Checksum,
    pub fresh: Checksum,
    /// Unified diff, published → fresh
    pub diff: String,
}

impl ArtifactDrift {
    pub fn summary(&self) -> String {
        format!(
            "{} line(s) added, {} line(s) removed ({} → {})",
            self.lines_added,
            self.lines_removed,
            self.published.short(),
            self.fresh.short()
        )
    }
}

/// Drift between `published` and `fresh`, or `None` when identical
pub fn detect_drift(published: &str, fresh: &str) -> Option<ArtifactDrift> {
    let fresh_sum = Checksum::from_text(fresh);
    if fresh_sum.verify(published) {
        return None;
    }
    let published_sum = Checksum::from_text(published);

    let diff = TextDiff::from_lines(published, fresh);
    let mut lines_added = 0;
    let mut lines_removed = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => lines_added += 1,
            ChangeTag::Delete => lines_removed += 1,
            ChangeTag::Equal => {}
        }
    }

    let unified = diff
        .unified_diff()
        .context_radius(3)
        .header("published", "composed")
        .to_string();

    Some(ArtifactDrift {
        lines_added,
        lines_removed,
        published: published_sum,
        fresh: fresh_sum,
        diff: unified,
    })
}
