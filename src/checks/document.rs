// SPDX-License-Identifier: PMPL-1.0-or-later
//! Document-level checks: language (3.1.1, 3.1.2), viewport and zoom
//! (1.4.4, 1.4.10), page title (2.4.2) and timing (2.2.1, 2.2.2).

use std::sync::OnceLock;

use regex::Regex;

use super::{Check, CheckError};
use crate::finding::{Finding, Severity, WcagLevel};
use crate::model::PageSnapshot;

/// Titles that identify nothing
const GENERIC_TITLES: &[&str] = &[
    "untitled",
    "untitled document",
    "home",
    "index",
    "page",
    "document",
    "new page",
    "welcome",
    "default",
];

fn lang_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{1,8})*$").expect("valid regex"))
}

/// Whether a `lang` value is a well-formed BCP 47 tag
pub fn is_valid_lang(value: &str) -> bool {
    lang_regex().is_match(value.trim())
}

pub struct LanguageCheck;

impl Check for LanguageCheck {
    fn name(&self) -> &str {
        "language"
    }

    fn description(&self) -> &str {
        "Page and passage languages are declared (WCAG 3.1.1, 3.1.2)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let mut findings = Vec::new();

        match page.language.as_deref().map(str::trim) {
            None | Some("") => findings.push(
                Finding::violation("missing_lang", "The <html> element has no lang attribute", &page.url)
                    .with_severity(Severity::Major)
                    .with_suggestion("Add lang=\"en\" (or the page's language) to <html>"),
            ),
            Some(lang) if !is_valid_lang(lang) => findings.push(
                Finding::violation(
                    "invalid_lang",
                    &format!("lang=\"{}\" is not a valid language tag", lang),
                    &page.url,
                )
                .with_severity(Severity::Major)
                .with_suggestion("Use a BCP 47 tag such as \"en\" or \"fr-CA\""),
            ),
            Some(_) => {}
        }

        for lang in page.accessibility.language_changes.iter().filter(|l| !is_valid_lang(l)) {
            findings.push(
                Finding::warning(
                    "invalid_lang_part",
                    &format!("Passage declares an invalid language \"{}\"", lang),
                    &page.url,
                )
                .with_severity(Severity::Minor),
            );
        }

        if findings.is_empty() {
            findings.push(Finding::passed(
                "page_language",
                &format!("Page language is {}", page.language.as_deref().unwrap_or_default()),
                &page.url,
            ));
        }
        Ok(findings)
    }
}

pub struct ViewportCheck;

impl Check for ViewportCheck {
    fn name(&self) -> &str {
        "viewport"
    }

    fn description(&self) -> &str {
        "Page can be zoomed and reflows on small screens (WCAG 1.4.4, 1.4.10)"
    }

    fn level(&self) -> WcagLevel {
        WcagLevel::AA
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let hints = &page.styling.responsive;
        let mut findings = Vec::new();

        if !hints.has_viewport_meta {
            findings.push(
                Finding::warning("missing_viewport", "No viewport meta tag; the page may not reflow", &page.url)
                    .with_severity(Severity::Moderate)
                    .with_suggestion("Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"),
            );
        } else if hints.zoom_disabled {
            findings.push(
                Finding::violation(
                    "viewport_zoom_disabled",
                    &format!(
                        "Viewport \"{}\" prevents users from zooming",
                        page.meta.viewport.as_deref().unwrap_or_default()
                    ),
                    &page.url,
                )
                .with_severity(Severity::Critical)
                .with_suggestion("Remove user-scalable=no and any maximum-scale below 2"),
            );
        }

        if findings.is_empty() {
            let detail = if hints.media_queries > 0 {
                format!("Viewport allows zoom; {} media queries", hints.media_queries)
            } else {
                "Viewport allows zoom".to_string()
            };
            findings.push(Finding::passed("responsive_viewport", &detail, &page.url));
        }
        Ok(findings)
    }
}

pub struct TitleCheck;

impl Check for TitleCheck {
    fn name(&self) -> &str {
        "title"
    }

    fn description(&self) -> &str {
        "Page has a descriptive title (WCAG 2.4.2)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let title = page.title.as_deref().map(str::trim).unwrap_or_default();
        let finding = if title.is_empty() {
            Finding::violation("missing_title", "Page has no <title>", &page.url)
                .with_severity(Severity::Major)
                .with_suggestion("Add a <title> naming the page and the site")
        } else if title.chars().count() < 3
            || GENERIC_TITLES.contains(&title.to_lowercase().as_str())
            || title.starts_with("http://")
            || title.starts_with("https://")
        {
            Finding::warning("poor_title", &format!("Page title \"{}\" is not descriptive", title), &page.url)
                .with_severity(Severity::Moderate)
                .with_suggestion("Describe the page's topic or purpose, e.g. \"Pricing - Acme\"")
        } else {
            Finding::passed("page_title", &format!("Page title: {}", title), &page.url)
        };
        Ok(vec![finding])
    }
}

/// Seconds before a `<meta http-equiv="refresh">` fires
fn refresh_delay(content: &str) -> Option<f64> {
    content.split([';', ',']).next()?.trim().parse::<f64>().ok()
}

pub struct TimingCheck;

impl Check for TimingCheck {
    fn name(&self) -> &str {
        "timing"
    }

    fn description(&self) -> &str {
        "No unannounced time limits or moving content (WCAG 2.2.1, 2.2.2)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let mut findings = Vec::new();

        if let Some(refresh) = page.meta.refresh.as_deref() {
            match refresh_delay(refresh) {
                Some(delay) if delay > 0.0 => findings.push(
                    Finding::violation(
                        "meta_refresh",
                        &format!("Page refreshes or redirects automatically after {} seconds", delay),
                        &page.url,
                    )
                    .with_severity(Severity::Major)
                    .with_suggestion("Remove the timed refresh or let users turn it off"),
                ),
                _ => findings.push(Finding::passed(
                    "timing",
                    "Meta refresh redirects immediately",
                    &page.url,
                )),
            }
        }

        if page.meta.moving_elements > 0 {
            findings.push(
                Finding::violation(
                    "moving_content",
                    &format!(
                        "{} <marquee>/<blink> elements move without a way to pause them",
                        page.meta.moving_elements
                    ),
                    &page.url,
                )
                .with_severity(Severity::Major)
                .with_suggestion("Replace marquee/blink with static content"),
            );
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{snapshot, types};
    use crate::finding::FindingKind;

    #[test]
    fn test_lang_validation() {
        assert!(is_valid_lang("en"));
        assert!(is_valid_lang("en-US"));
        assert!(is_valid_lang("zh-Hant-TW"));
        assert!(!is_valid_lang("english"));
        assert!(!is_valid_lang("e"));
        assert!(!is_valid_lang("en_US"));
    }

    #[test]
    fn test_language_check() {
        let page = snapshot("<html><body><p>x</p></body></html>");
        assert_eq!(types(&LanguageCheck.run(&page).unwrap()), vec!["missing_lang"]);

        let page = snapshot(r#"<html lang="english"><body><p>x</p></body></html>"#);
        assert_eq!(types(&LanguageCheck.run(&page).unwrap()), vec!["invalid_lang"]);

        let page = snapshot(r#"<html lang="en"><body><p lang="fr">Bonjour</p></body></html>"#);
        assert_eq!(types(&LanguageCheck.run(&page).unwrap()), vec!["page_language"]);
    }

    #[test]
    fn test_viewport_check() {
        let page = snapshot("<p>no viewport</p>");
        assert_eq!(types(&ViewportCheck.run(&page).unwrap()), vec!["missing_viewport"]);

        let page = snapshot(
            r#"<head><meta name="viewport" content="width=device-width, user-scalable=no"></head><p>x</p>"#,
        );
        let findings = ViewportCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["viewport_zoom_disabled"]);
        assert_eq!(findings[0].severity, Severity::Critical);

        let page = snapshot(r#"<head><meta name="viewport" content="width=device-width, initial-scale=1"></head>"#);
        assert_eq!(types(&ViewportCheck.run(&page).unwrap()), vec!["responsive_viewport"]);
    }

    #[test]
    fn test_title_check() {
        let page = snapshot("<p>x</p>");
        assert_eq!(types(&TitleCheck.run(&page).unwrap()), vec!["missing_title"]);

        let page = snapshot("<head><title>Untitled Document</title></head>");
        assert_eq!(types(&TitleCheck.run(&page).unwrap()), vec!["poor_title"]);

        let page = snapshot("<head><title>Pricing - Acme Widgets</title></head>");
        let findings = TitleCheck.run(&page).unwrap();
        assert_eq!(findings[0].kind, FindingKind::Passed);
    }

    #[test]
    fn test_timing_check() {
        let page = snapshot(
            r#"<head><meta http-equiv="refresh" content="30; url=/next"></head><marquee>News</marquee>"#,
        );
        assert_eq!(types(&TimingCheck.run(&page).unwrap()), vec!["meta_refresh", "moving_content"]);

        let page = snapshot(r#"<head><meta http-equiv="refresh" content="0; url=/moved"></head>"#);
        assert_eq!(types(&TimingCheck.run(&page).unwrap()), vec!["timing"]);

        assert!(TimingCheck.run(&snapshot("<p>calm</p>")).unwrap().is_empty());
    }
}
