// src/checker/regex_match.rs

use regex::RegexBuilder;

/// Applies patterns to a fixed text with find-all semantics.
#[derive(Debug, Clone, Copy)]
pub struct RegexEvaluator {
    size_limit: usize,
}

impl Default for RegexEvaluator {
    fn default() -> Self {
        Self { size_limit: 1 << 20 }
    }
}

impl RegexEvaluator {
    /// `size_limit` bounds the compiled program; larger patterns count as invalid.
    pub fn new(size_limit: usize) -> Self {
        Self { size_limit }
    }

    /// Every non-overlapping match of `pattern` in `text`, in scan order.
    ///
    /// An invalid pattern yields no matches, same as a pattern that never matches.
    pub fn matches(&self, pattern: &str, text: &str) -> Vec<String> {
        let regex = match RegexBuilder::new(pattern).size_limit(self.size_limit).build() {
            Ok(regex) => regex,
            Err(e) => {
                tracing::debug!("Rejected pattern {:?}: {}", pattern, e);
                return Vec::new();
            }
        };

        regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Whether `candidate` is accepted against `reference` on `text`.
    ///
    /// Accepts when the candidate matches something, matches as many times as
    /// the reference, and each of its matches is among the reference's matches.
    /// This is a count check plus membership, not full multiset equality.
    pub fn accepts(&self, candidate: &str, reference: &str, text: &str) -> bool {
        let candidate_matches = self.matches(candidate, text);
        let reference_matches = self.matches(reference, text);
        match_sets_agree(&candidate_matches, &reference_matches)
    }
}

/// Convenience wrapper using the default size limit.
pub fn matches(pattern: &str, text: &str) -> Vec<String> {
    RegexEvaluator::default().matches(pattern, text)
}

pub(crate) fn match_sets_agree(candidate: &[String], reference: &[String]) -> bool {
    !candidate.is_empty()
        && candidate.len() == reference.len()
        && candidate.iter().all(|m| reference.contains(m))
}
