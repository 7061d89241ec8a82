// SPDX-License-Identifier: PMPL-1.0-or-later
//! Link names - WCAG 2.4.4 Link Purpose (In Context), 4.1.2 Name, Role, Value

use std::collections::BTreeMap;

use super::{Check, CheckError};
use crate::finding::{Finding, Severity};
use crate::model::PageSnapshot;

/// Link texts that say nothing about the destination
const AMBIGUOUS_LINK_TEXTS: &[&str] = &[
    "click here",
    "click",
    "here",
    "read more",
    "more",
    "learn more",
    "link",
    "this",
    "this link",
    "continue",
    "details",
    "go",
];

pub struct LinkNameCheck;

impl Check for LinkNameCheck {
    fn name(&self) -> &str {
        "links"
    }

    fn description(&self) -> &str {
        "Links have names that describe their destination (WCAG 2.4.4)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let links = &page.structure.links;
        let mut findings = Vec::new();
        // accessible name -> distinct destinations
        let mut destinations: BTreeMap<String, Vec<&str>> = BTreeMap::new();

        for link in links {
            let name = link.accessible_name.trim();
            if name.is_empty() {
                findings.push(
                    Finding::violation("empty_link", "Link has no accessible name", &page.url)
                        .with_severity(Severity::Critical)
                        .with_element(&link.source)
                        .with_suggestion("Add link text, or aria-label for icon-only links"),
                );
                continue;
            }

            let normalized = name.to_lowercase();
            let normalized = normalized.trim_end_matches(['.', '!', '\u{2026}', '>', '\u{bb}']).trim();
            if AMBIGUOUS_LINK_TEXTS.contains(&normalized) {
                findings.push(
                    Finding::warning(
                        "ambiguous_link_text",
                        &format!("Link text \"{}\" does not describe its destination", name),
                        &page.url,
                    )
                    .with_severity(Severity::Moderate)
                    .with_element(&link.source)
                    .with_suggestion("Name the destination, e.g. \"Read more about pricing\""),
                );
            }

            if let Some(href) = link.href.as_deref() {
                let hrefs = destinations.entry(normalized.to_string()).or_default();
                if !hrefs.contains(&href) {
                    hrefs.push(href);
                }
            }
        }

        for (name, hrefs) in destinations.iter().filter(|(_, h)| h.len() > 1) {
            if AMBIGUOUS_LINK_TEXTS.contains(&name.as_str()) {
                continue;
            }
            findings.push(
                Finding::warning(
                    "ambiguous_link_text",
                    &format!("{} links named \"{}\" lead to different pages", hrefs.len(), name),
                    &page.url,
                )
                .with_severity(Severity::Minor),
            );
        }

        if !links.is_empty() && findings.is_empty() {
            findings.push(Finding::passed(
                "link_names",
                &format!("All {} links have descriptive names", links.len()),
                &page.url,
            ));
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{snapshot, types};

    #[test]
    fn test_empty_and_ambiguous_links() {
        let page = snapshot(
            r#"<a href="/a"></a><a href="/b">Click here</a><a href="/c"><img src="i.png" alt="Contact us"></a>
            <a href="/d">Read more...</a>"#,
        );
        let findings = LinkNameCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["empty_link", "ambiguous_link_text", "ambiguous_link_text"]);
    }

    #[test]
    fn test_same_name_different_destination() {
        let page = snapshot(r#"<a href="/x">Pricing</a><a href="/y">Pricing</a>"#);
        let findings = LinkNameCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["ambiguous_link_text"]);
        assert!(findings[0].message.contains("2 links"));
    }

    #[test]
    fn test_links_pass() {
        let page = snapshot(r#"<a href="/pricing">Pricing plans</a><a href="/pricing">Pricing plans</a>"#);
        assert_eq!(types(&LinkNameCheck.run(&page).unwrap()), vec!["link_names"]);
    }
}
