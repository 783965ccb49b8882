//! # Phase Classifier
//!
//! Infers a workspace's lifecycle phase from the wording of its current tasks.
//! Classification is stateless: every call recomputes from task content, so a
//! "phase transition" is simply a different answer on a later call.

use std::collections::HashMap;

use crate::constants::Phase;
use crate::models::Task;

const PLANNING_KEYWORDS: &[&str] = &[
    "plan", "design", "roadmap", "requirement", "spec", "scope", "outline", "strategy",
];
const ANALYSIS_KEYWORDS: &[&str] = &[
    "analy", "research", "investigat", "review", "evaluat", "assess", "study", "explor",
];
const IMPLEMENTATION_KEYWORDS: &[&str] = &[
    "implement", "build", "code", "develop", "create", "refactor", "integrat", "feature",
];
const TESTING_KEYWORDS: &[&str] = &["test", "qa", "verif", "validat", "debug", "bug", "coverage"];
const DEPLOYMENT_KEYWORDS: &[&str] = &[
    "deploy", "release", "launch", "ship", "rollout", "publish", "provision",
];
const MAINTENANCE_KEYWORDS: &[&str] = &[
    "maintain", "maintenance", "monitor", "patch", "upgrade", "support", "cleanup", "hotfix",
];

#[derive(Debug, Clone)]
pub struct PhaseClassifier {
    keywords: Vec<(Phase, &'static [&'static str])>,
}

impl Default for PhaseClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseClassifier {
    pub fn new() -> Self {
        Self {
            keywords: vec![
                (Phase::Planning, PLANNING_KEYWORDS),
                (Phase::Analysis, ANALYSIS_KEYWORDS),
                (Phase::Implementation, IMPLEMENTATION_KEYWORDS),
                (Phase::Testing, TESTING_KEYWORDS),
                (Phase::Deployment, DEPLOYMENT_KEYWORDS),
                (Phase::Maintenance, MAINTENANCE_KEYWORDS),
            ],
        }
    }

    /// Phase with the most keyword hits across the tasks.
    ///
    /// Ties for the top score and task sets without any hit yield `Planning`.
    pub fn classify(&self, tasks: &[Task]) -> Phase {
        let texts: Vec<String> = tasks.iter().map(Task::searchable_text).collect();
        self.classify_texts(texts.iter().map(String::as_str))
    }

    pub fn classify_texts<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Phase {
        let scores = self.score_texts(texts);

        let top = scores.values().copied().max().unwrap_or(0);
        if top == 0 {
            return Phase::Planning;
        }

        let mut leaders = Phase::ALL
            .iter()
            .copied()
            .filter(|phase| scores.get(phase).copied().unwrap_or(0) == top);
        match (leaders.next(), leaders.next()) {
            (Some(phase), None) => phase,
            _ => Phase::Planning,
        }
    }

    /// Keyword hit count per phase; a word counts once per phase it matches
    pub fn score_texts<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> HashMap<Phase, usize> {
        let mut scores: HashMap<Phase, usize> = Phase::ALL.iter().map(|p| (*p, 0)).collect();

        for text in texts {
            let lowered = text.to_lowercase();
            for word in lowered
                .split(|c: char| !c.is_alphanumeric())
                .filter(|word| !word.is_empty())
            {
                for (phase, keywords) in &self.keywords {
                    if keywords.iter().any(|keyword| word.starts_with(keyword)) {
                        *scores.entry(*phase).or_insert(0) += 1;
                    }
                }
            }
        }

        scores
    }
}
