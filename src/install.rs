//! Proactive installation recommendation. Pure: nothing here installs
//! anything, it only says whether doing so is warranted.

use serde::Serialize;

pub const DEFAULT_COMPLEXITY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstallPolicy {
    pub complexity_threshold: f64,
    pub relevance_threshold: f64,
}

impl Default for InstallPolicy {
    fn default() -> Self {
        Self {
            complexity_threshold: DEFAULT_COMPLEXITY_THRESHOLD,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallDecision {
    pub entry_name: String,
    pub should_install: bool,
    pub reason: String,
}

impl InstallPolicy {
    /// Recommend installing `entry_name` when the task is complex enough,
    /// the entry is relevant enough, and the entry will be used again
    /// (an ongoing project or an explicitly reusable need).
    pub fn decide(
        &self,
        entry_name: &str,
        complexity_score: f64,
        top_relevance_score: f64,
        is_ongoing: bool,
        reusable: bool,
    ) -> InstallDecision {
        let complex = complexity_score > self.complexity_threshold;
        let relevant = top_relevance_score > self.relevance_threshold;
        let lasting = is_ongoing || reusable;

        let reason = if complex && relevant && lasting {
            let context = if is_ongoing {
                "ongoing project"
            } else {
                "reusable need"
            };
            format!(
                "complexity {complexity_score:.2} > {:.2}, relevance \
                 {top_relevance_score:.2} > {:.2}, {context}",
                self.complexity_threshold, self.relevance_threshold
            )
        } else if !complex {
            format!(
                "complexity {complexity_score:.2} does not exceed {:.2}",
                self.complexity_threshold
            )
        } else if !relevant {
            format!(
                "relevance {top_relevance_score:.2} does not exceed {:.2}",
                self.relevance_threshold
            )
        } else {
            "one-off task; neither ongoing nor reusable".to_string()
        };

        InstallDecision {
            entry_name: entry_name.to_string(),
            should_install: complex && relevant && lasting,
            reason,
        }
    }
}
