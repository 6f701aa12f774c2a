//! Viability rules for merging a missed pillar into its dependent.
//!
//! A merge moves the missed work onto the dependent's day. That only makes
//! sense when the dependent does not need an artifact the missed task was
//! supposed to have finished beforehand. Tasks declare what they `produce`
//! and `require` as tags; rules match on those tags, never on titles.

use std::collections::HashSet;

use crate::domain::models::{ProtocolConfig, Task};

/// Result of assessing one dependent against one missed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viability {
    Viable,
    NotViable { reason: String },
}

impl Viability {
    pub fn is_viable(&self) -> bool {
        matches!(self, Self::Viable)
    }
}

/// Tag-matching rule set.
#[derive(Debug, Clone, Default)]
pub struct ViabilityPolicy {
    /// Tags whose production can share a day with their consumption.
    same_day_tags: HashSet<String>,
}

impl ViabilityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self::with_same_day_tags(config.same_day_tags.iter().cloned())
    }

    pub fn with_same_day_tags(tags: impl IntoIterator<Item = String>) -> Self {
        Self {
            same_day_tags: tags.into_iter().map(|t| normalize(&t)).collect(),
        }
    }

    /// Decide whether `dependent` can absorb `missed` on its own day.
    pub fn assess(&self, dependent: &Task, missed: &Task) -> Viability {
        let (Some(required), Some(produced)) = (&dependent.requires, &missed.produces) else {
            return Viability::Viable;
        };

        let required = normalize(required);
        if required != normalize(produced) || self.same_day_tags.contains(&required) {
            return Viability::Viable;
        }

        Viability::NotViable {
            reason: format!(
                "'{}' requires '{}', which '{}' had to produce beforehand",
                dependent.title, required, missed.title
            ),
        }
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TaskKind;

    #[test]
    fn test_untagged_tasks_are_viable() {
        let policy = ViabilityPolicy::new();
        let missed = Task::new("Create Teaser Video", TaskKind::Pillar, 3);
        let dependent = Task::new("Post Teaser Video", TaskKind::Pillar, 4);
        assert!(policy.assess(&dependent, &missed).is_viable());
    }

    #[test]
    fn test_required_artifact_blocks_merge() {
        let policy = ViabilityPolicy::new();
        let missed = Task::new("Record", TaskKind::Pillar, 3).producing("teaser_video");
        let dependent = Task::new("Publish", TaskKind::Pillar, 4).requiring("teaser_video");

        match policy.assess(&dependent, &missed) {
            Viability::NotViable { reason } => assert!(reason.contains("teaser_video")),
            Viability::Viable => panic!("merge should not be viable"),
        }
    }

    #[test]
    fn test_unrelated_tags_are_viable() {
        let policy = ViabilityPolicy::new();
        let missed = Task::new("Outline", TaskKind::Pillar, 1).producing("outline");
        let dependent = Task::new("Publish", TaskKind::Pillar, 2).requiring("teaser_video");
        assert!(policy.assess(&dependent, &missed).is_viable());
    }

    #[test]
    fn test_same_day_tags_override() {
        let policy = ViabilityPolicy::with_same_day_tags(vec!["Outline".to_string()]);
        let missed = Task::new("Outline", TaskKind::Pillar, 1).producing("outline");
        let dependent = Task::new("Draft", TaskKind::Pillar, 2).requiring(" OUTLINE ");
        assert!(policy.assess(&dependent, &missed).is_viable());
    }

    #[test]
    fn test_titles_are_ignored() {
        let policy = ViabilityPolicy::new();
        let missed = Task::new("teaser_video", TaskKind::Pillar, 1);
        let dependent = Task::new("teaser_video", TaskKind::Pillar, 2).requiring("teaser_video");
        assert!(policy.assess(&dependent, &missed).is_viable());
    }
}
