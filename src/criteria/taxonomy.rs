// SPDX-License-Identifier: PMPL-1.0-or-later
//! WCAG 2.1 taxonomy: principles, guidelines and the 78 success criteria.

use serde::{Deserialize, Serialize};

use crate::finding::WcagLevel;

/// The four WCAG principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Principle {
    Perceivable,
    Operable,
    Understandable,
    Robust,
}

impl Principle {
    pub const ALL: [Principle; 4] = [
        Principle::Perceivable,
        Principle::Operable,
        Principle::Understandable,
        Principle::Robust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Principle::Perceivable => "perceivable",
            Principle::Operable => "operable",
            Principle::Understandable => "understandable",
            Principle::Robust => "robust",
        }
    }

    /// Infer the principle a module identifier belongs to, e.g.
    /// `"wcag_perceivable_analysis"` or `"1_robust"`
    pub fn from_identifier(identifier: &str) -> Option<Principle> {
        let lower = identifier.to_ascii_lowercase();
        Principle::ALL.into_iter().find(|p| lower.contains(p.as_str()))
    }

    /// Guideline keys of this principle, in numbering order
    pub fn guidelines(&self) -> &'static [&'static str] {
        match self {
            Principle::Perceivable => &["text_alternatives", "time_based_media", "adaptable", "distinguishable"],
            Principle::Operable => &[
                "keyboard_accessible",
                "enough_time",
                "seizures",
                "navigable",
                "input_modalities",
            ],
            Principle::Understandable => &["readable", "predictable", "input_assistance"],
            Principle::Robust => &["compatible"],
        }
    }
}

impl std::fmt::Display for Principle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One success criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriterionInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub level: WcagLevel,
    pub principle: Principle,
    pub guideline: &'static str,
}

macro_rules! criterion {
    ($id:expr, $name:expr, $level:ident, $principle:ident, $guideline:expr) => {
        CriterionInfo {
            id: $id,
            name: $name,
            level: WcagLevel::$level,
            principle: Principle::$principle,
            guideline: $guideline,
        }
    };
}

/// Every WCAG 2.1 success criterion, in numbering order
pub const CRITERIA: &[CriterionInfo] = &[
    criterion!("1.1.1", "Non-text Content", A, Perceivable, "text_alternatives"),
    criterion!("1.2.1", "Audio-only and Video-only (Prerecorded)", A, Perceivable, "time_based_media"),
    criterion!("1.2.2", "Captions (Prerecorded)", A, Perceivable, "time_based_media"),
    criterion!("1.2.3", "Audio Description or Media Alternative (Prerecorded)", A, Perceivable, "time_based_media"),
    criterion!("1.2.4", "Captions (Live)", AA, Perceivable, "time_based_media"),
    criterion!("1.2.5", "Audio Description (Prerecorded)", AA, Perceivable, "time_based_media"),
    criterion!("1.2.6", "Sign Language (Prerecorded)", AAA, Perceivable, "time_based_media"),
    criterion!("1.2.7", "Extended Audio Description (Prerecorded)", AAA, Perceivable, "time_based_media"),
    criterion!("1.2.8", "Media Alternative (Prerecorded)", AAA, Perceivable, "time_based_media"),
    criterion!("1.2.9", "Audio-only (Live)", AAA, Perceivable, "time_based_media"),
    criterion!("1.3.1", "Info and Relationships", A, Perceivable, "adaptable"),
    criterion!("1.3.2", "Meaningful Sequence", A, Perceivable, "adaptable"),
    criterion!("1.3.3", "Sensory Characteristics", A, Perceivable, "adaptable"),
    criterion!("1.3.4", "Orientation", AA, Perceivable, "adaptable"),
    criterion!("1.3.5", "Identify Input Purpose", AA, Perceivable, "adaptable"),
    criterion!("1.3.6", "Identify Purpose", AAA, Perceivable, "adaptable"),
    criterion!("1.4.1", "Use of Color", A, Perceivable, "distinguishable"),
    criterion!("1.4.2", "Audio Control", A, Perceivable, "distinguishable"),
    criterion!("1.4.3", "Contrast (Minimum)", AA, Perceivable, "distinguishable"),
    criterion!("1.4.4", "Resize text", AA, Perceivable, "distinguishable"),
    criterion!("1.4.5", "Images of Text", AA, Perceivable, "distinguishable"),
    criterion!("1.4.6", "Contrast (Enhanced)", AAA, Perceivable, "distinguishable"),
    criterion!("1.4.7", "Low or No Background Audio", AAA, Perceivable, "distinguishable"),
    criterion!("1.4.8", "Visual Presentation", AAA, Perceivable, "distinguishable"),
    criterion!("1.4.9", "Images of Text (No Exception)", AAA, Perceivable, "distinguishable"),
    criterion!("1.4.10", "Reflow", AA, Perceivable, "distinguishable"),
    criterion!("1.4.11", "Non-text Contrast", AA, Perceivable, "distinguishable"),
    criterion!("1.4.12", "Text Spacing", AA, Perceivable, "distinguishable"),
    criterion!("1.4.13", "Content on Hover or Focus", AA, Perceivable, "distinguishable"),
    criterion!("2.1.1", "Keyboard", A, Operable, "keyboard_accessible"),
    criterion!("2.1.2", "No Keyboard Trap", A, Operable, "keyboard_accessible"),
    criterion!("2.1.3", "Keyboard (No Exception)", AAA, Operable, "keyboard_accessible"),
    criterion!("2.1.4", "Character Key Shortcuts", A, Operable, "keyboard_accessible"),
    criterion!("2.2.1", "Timing Adjustable", A, Operable, "enough_time"),
    criterion!("2.2.2", "Pause, Stop, Hide", A, Operable, "enough_time"),
    criterion!("2.2.3", "No Timing", AAA, Operable, "enough_time"),
    criterion!("2.2.4", "Interruptions", AAA, Operable, "enough_time"),
    criterion!("2.2.5", "Re-authenticating", AAA, Operable, "enough_time"),
    criterion!("2.2.6", "Timeouts", AAA, Operable, "enough_time"),
    criterion!("2.3.1", "Three Flashes or Below Threshold", A, Operable, "seizures"),
    criterion!("2.3.2", "Three Flashes", AAA, Operable, "seizures"),
    criterion!("2.3.3", "Animation from Interactions", AAA, Operable, "seizures"),
    criterion!("2.4.1", "Bypass Blocks", A, Operable, "navigable"),
    criterion!("2.4.2", "Page Titled", A, Operable, "navigable"),
    criterion!("2.4.3", "Focus Order", A, Operable, "navigable"),
    criterion!("2.4.4", "Link Purpose (In Context)", A, Operable, "navigable"),
    criterion!("2.4.5", "Multiple Ways", AA, Operable, "navigable"),
    criterion!("2.4.6", "Headings and Labels", AA, Operable, "navigable"),
    criterion!("2.4.7", "Focus Visible", AA, Operable, "navigable"),
    criterion!("2.4.8", "Location", AAA, Operable, "navigable"),
    criterion!("2.4.9", "Link Purpose (Link Only)", AAA, Operable, "navigable"),
    criterion!("2.4.10", "Section Headings", AAA, Operable, "navigable"),
    criterion!("2.5.1", "Pointer Gestures", A, Operable, "input_modalities"),
    criterion!("2.5.2", "Pointer Cancellation", A, Operable, "input_modalities"),
    criterion!("2.5.3", "Label in Name", A, Operable, "input_modalities"),
    criterion!("2.5.4", "Motion Actuation", A, Operable, "input_modalities"),
    criterion!("2.5.5", "Target Size", AAA, Operable, "input_modalities"),
    criterion!("2.5.6", "Concurrent Input Mechanisms", AAA, Operable, "input_modalities"),
    criterion!("3.1.1", "Language of Page", A, Understandable, "readable"),
    criterion!("3.1.2", "Language of Parts", AA, Understandable, "readable"),
    criterion!("3.1.3", "Unusual Words", AAA, Understandable, "readable"),
    criterion!("3.1.4", "Abbreviations", AAA, Understandable, "readable"),
    criterion!("3.1.5", "Reading Level", AAA, Understandable, "readable"),
    criterion!("3.1.6", "Pronunciation", AAA, Understandable, "readable"),
    criterion!("3.2.1", "On Focus", A, Understandable, "predictable"),
    criterion!("3.2.2", "On Input", A, Understandable, "predictable"),
    criterion!("3.2.3", "Consistent Navigation", AA, Understandable, "predictable"),
    criterion!("3.2.4", "Consistent Identification", AA, Understandable, "predictable"),
    criterion!("3.2.5", "Change on Request", AAA, Understandable, "predictable"),
    criterion!("3.3.1", "Error Identification", A, Understandable, "input_assistance"),
    criterion!("3.3.2", "Labels or Instructions", A, Understandable, "input_assistance"),
    criterion!("3.3.3", "Error Suggestion", AA, Understandable, "input_assistance"),
    criterion!("3.3.4", "Error Prevention (Legal, Financial, Data)", AA, Understandable, "input_assistance"),
    criterion!("3.3.5", "Help", AAA, Understandable, "input_assistance"),
    criterion!("3.3.6", "Error Prevention (All)", AAA, Understandable, "input_assistance"),
    criterion!("4.1.1", "Parsing", A, Robust, "compatible"),
    criterion!("4.1.2", "Name, Role, Value", A, Robust, "compatible"),
    criterion!("4.1.3", "Status Messages", AA, Robust, "compatible"),
];

/// Look up a criterion by id, e.g. `"1.4.3"`
pub fn criterion(id: &str) -> Option<&'static CriterionInfo> {
    CRITERIA.iter().find(|c| c.id == id)
}

/// Criteria of one principle
pub fn criteria_of(principle: Principle) -> impl Iterator<Item = &'static CriterionInfo> {
    CRITERIA.iter().filter(move |c| c.principle == principle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_taxonomy_is_complete() {
        assert_eq!(CRITERIA.len(), 78);
        let ids: HashSet<&str> = CRITERIA.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 78);

        let count = |level| CRITERIA.iter().filter(|c| c.level == level).count();
        assert_eq!(count(WcagLevel::A), 30);
        assert_eq!(count(WcagLevel::AA), 20);
        assert_eq!(count(WcagLevel::AAA), 28);
    }

    #[test]
    fn test_guidelines_belong_to_their_principle() {
        for c in CRITERIA {
            assert!(
                c.principle.guidelines().contains(&c.guideline),
                "{} has guideline {} outside {}",
                c.id,
                c.guideline,
                c.principle
            );
            let first = c.id.split('.').next().unwrap_or_default();
            let expected = match c.principle {
                Principle::Perceivable => "1",
                Principle::Operable => "2",
                Principle::Understandable => "3",
                Principle::Robust => "4",
            };
            assert_eq!(first, expected);
        }
    }

    #[test]
    fn test_lookup_and_inference() {
        let contrast = criterion("1.4.3").unwrap();
        assert_eq!(contrast.level, WcagLevel::AA);
        assert_eq!(contrast.guideline, "distinguishable");
        assert!(criterion("9.9.9").is_none());

        assert_eq!(Principle::from_identifier("wcag_operable_analysis"), Some(Principle::Operable));
        assert_eq!(Principle::from_identifier("Robust"), Some(Principle::Robust));
        assert_eq!(Principle::from_identifier("seo"), None);
    }
}
