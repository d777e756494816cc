// BillExact - core/narrative.rs
//
// Narrative quality scoring. A quick 0-100 heuristic that tells a
// timekeeper how reviewable a description is before it reaches the
// compliance check.

use crate::util::constants;
use serde::Serialize;

/// Quality grade bucket for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    Good,
    Fair,
    Poor,
}

impl QualityGrade {
    pub fn from_score(score: u32) -> Self {
        if score >= constants::QUALITY_GOOD_THRESHOLD {
            QualityGrade::Good
        } else if score >= constants::QUALITY_FAIR_THRESHOLD {
            QualityGrade::Fair
        } else {
            QualityGrade::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityGrade::Good => "Good",
            QualityGrade::Fair => "Fair",
            QualityGrade::Poor => "Poor",
        }
    }
}

/// Result of analysing one narrative.
///
/// `issues[i]` is paired with `suggestions[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityAnalysis {
    pub score: u32,
    pub grade: QualityGrade,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl QualityAnalysis {
    /// Score expressed as 0-5 stars.
    pub fn stars(&self) -> u32 {
        ((f64::from(self.score) / 100.0) * 5.0).round() as u32
    }
}

/// Score a narrative.
pub fn analyze(narrative: &str) -> QualityAnalysis {
    let lower = narrative.to_lowercase();
    let mut issues = Vec::new();
    let mut suggestions = Vec::new();
    let mut penalty: u32 = 0;

    for phrase in constants::QUALITY_VAGUE_PHRASES {
        if lower.contains(phrase) {
            issues.push(format!("Vague term: \"{phrase}\""));
            suggestions.push(format!(
                "Replace \"{phrase}\" with specific actions or outcomes"
            ));
            penalty += constants::QUALITY_VAGUE_PENALTY;
        }
    }

    if narrative.chars().count() < constants::QUALITY_MIN_CHARS {
        issues.push("Narrative is too short".to_string());
        suggestions.push("Add more detail about what was accomplished".to_string());
        penalty += constants::QUALITY_SHORT_PENALTY;
    }

    if !has_action_verb(&lower) {
        issues.push("Missing action verbs".to_string());
        suggestions.push(
            "Use strong action verbs like developed, implemented, optimized".to_string(),
        );
        penalty += constants::QUALITY_NO_VERB_PENALTY;
    }

    let score = 100u32.saturating_sub(penalty);
    QualityAnalysis {
        score,
        grade: QualityGrade::from_score(score),
        issues,
        suggestions,
    }
}

/// Whole-word search for any action verb in an already-lowercased text.
fn has_action_verb(lower: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| constants::QUALITY_ACTION_VERBS.contains(&word))
}
