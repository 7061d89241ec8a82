// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast - WCAG 1.4.3 Contrast (Minimum), Level AA
//! Text spacing - WCAG 1.4.12 Text Spacing, Level AA
//!
//! Both read the samples the extractor computed; the ratio math lives in
//! [`crate::color`].

use super::{Check, CheckError};
use crate::finding::{Finding, Severity, WcagLevel};
use crate::model::PageSnapshot;

/// Minimum line-height relative to font size
const MIN_LINE_HEIGHT_RATIO: f64 = 1.5;

pub struct ContrastCheck;

impl Check for ContrastCheck {
    fn name(&self) -> &str {
        "contrast"
    }

    fn description(&self) -> &str {
        "Text meets the minimum contrast ratio (WCAG 1.4.3)"
    }

    fn level(&self) -> WcagLevel {
        WcagLevel::AA
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let samples = &page.styling.contrast_samples;
        let stats = &page.styling.contrast_stats;
        let mut findings = Vec::new();

        for sample in samples.iter().filter(|s| !s.passes) {
            let severity = if sample.ratio < sample.required_ratio - 1.5 {
                Severity::Major
            } else {
                Severity::Moderate
            };
            findings.push(
                Finding::violation(
                    "color_contrast",
                    &format!(
                        "Contrast {:.2}:1 is below {:.1}:1 for {} text \"{}\" ({} on {})",
                        sample.ratio,
                        sample.required_ratio,
                        if sample.large_text { "large" } else { "normal" },
                        sample.text,
                        sample.foreground,
                        sample.background
                    ),
                    &page.url,
                )
                .with_severity(severity)
                .with_element(&sample.source)
                .with_suggestion(&format!(
                    "Darken the text or lighten the background to reach at least {:.1}:1",
                    sample.required_ratio
                )),
            );
        }

        if !samples.is_empty() && findings.is_empty() {
            let mut message = format!(
                "{} text elements meet contrast requirements",
                stats.elements_checked
            );
            if stats.capped {
                message.push_str(" (sampled)");
            }
            findings.push(Finding::passed("color_contrast", &message, &page.url));
        }
        Ok(findings)
    }
}

pub struct TextSpacingCheck;

impl Check for TextSpacingCheck {
    fn name(&self) -> &str {
        "text_spacing"
    }

    fn description(&self) -> &str {
        "Text blocks use readable line and letter spacing (WCAG 1.4.12)"
    }

    fn level(&self) -> WcagLevel {
        WcagLevel::AA
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let samples = &page.styling.text_spacing;
        let mut findings = Vec::new();

        let tight: Vec<_> = samples
            .iter()
            .filter(|s| {
                s.line_height_ratio.map(|r| r < MIN_LINE_HEIGHT_RATIO).unwrap_or(false)
                    || s.letter_spacing_ratio.map(|r| r < 0.0).unwrap_or(false)
                    || s.word_spacing_ratio.map(|r| r < 0.0).unwrap_or(false)
            })
            .collect();

        if let Some(first) = tight.first() {
            findings.push(
                Finding::warning(
                    "text_spacing",
                    &format!(
                        "{} of {} text blocks use line-height below {}x or negative spacing",
                        tight.len(),
                        samples.len(),
                        MIN_LINE_HEIGHT_RATIO
                    ),
                    &page.url,
                )
                .with_severity(Severity::Minor)
                .with_element(&first.source)
                .with_suggestion("Use line-height of at least 1.5 and avoid negative letter or word spacing"),
            );
        } else if !samples.is_empty() {
            findings.push(Finding::passed(
                "text_spacing",
                &format!("{} text blocks use adequate spacing", samples.len()),
                &page.url,
            ));
        }
        Ok(findings)
    }
}
