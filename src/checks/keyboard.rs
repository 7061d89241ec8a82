// SPDX-License-Identifier: PMPL-1.0-or-later
//! Keyboard access - WCAG 2.1.1 Keyboard, 2.1.2 No Keyboard Trap,
//! 2.4.1 Bypass Blocks, 2.4.3 Focus Order, 2.4.7 Focus Visible

use super::{Check, CheckError};
use crate::finding::{Finding, Severity, WcagLevel};
use crate::model::PageSnapshot;

/// Roles whose elements must be operable from the keyboard
const WIDGET_ROLES: &[&str] = &[
    "button", "link", "checkbox", "radio", "tab", "menuitem", "switch", "slider", "option",
];

/// Tags that are interactive without scripting
const NATIVE_CONTROLS: &[&str] = &["a", "button", "input", "select", "textarea", "summary"];

/// Pages with at least this many links need a way to bypass them
const BYPASS_LINK_THRESHOLD: usize = 10;

/// A skip link this deep in the focus order is hard to reach
const SKIP_LINK_MAX_POSITION: usize = 3;

pub struct KeyboardCheck;

impl Check for KeyboardCheck {
    fn name(&self) -> &str {
        "keyboard"
    }

    fn description(&self) -> &str {
        "Interactive elements are keyboard operable and focus can leave them (WCAG 2.1.1, 2.1.2, 2.4.3)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let interactive = &page.structure.interactive;
        let mut findings = Vec::new();

        for el in interactive {
            if el.disabled || el.aria_hidden {
                continue;
            }
            let widget = el
                .role
                .as_deref()
                .map(|r| WIDGET_ROLES.contains(&r))
                .unwrap_or(false);
            let scripted = el.has_click_handler && !NATIVE_CONTROLS.contains(&el.tag.as_str());
            if (widget || scripted) && !el.focusable {
                findings.push(
                    Finding::violation(
                        "keyboard_inaccessible",
                        &format!(
                            "<{}> acts as a control but cannot receive keyboard focus",
                            el.tag
                        ),
                        &page.url,
                    )
                    .with_severity(Severity::Critical)
                    .with_element(&el.source)
                    .with_suggestion("Use a native <button> or <a>, or add tabindex=\"0\" and key handlers"),
                );
            } else if scripted && !el.has_key_handler && el.role.is_none() {
                findings.push(
                    Finding::warning(
                        "keyboard_inaccessible",
                        &format!("<{}> has a click handler but no keyboard handler", el.tag),
                        &page.url,
                    )
                    .with_severity(Severity::Moderate)
                    .with_element(&el.source)
                    .with_suggestion("Handle Enter and Space, or use a native control"),
                );
            }
        }

        for el in interactive.iter().filter(|el| el.tabindex.map(|t| t > 0).unwrap_or(false)) {
            findings.push(
                Finding::warning(
                    "positive_tabindex",
                    &format!(
                        "tabindex=\"{}\" overrides the natural focus order",
                        el.tabindex.unwrap_or_default()
                    ),
                    &page.url,
                )
                .with_severity(Severity::Moderate)
                .with_element(&el.source)
                .with_suggestion("Use tabindex=\"0\" and order the markup to match the visual order"),
            );
        }

        for trap in &page.accessibility.keyboard_traps {
            findings.push(
                Finding::violation("keyboard_trap", &format!("Possible keyboard trap: {}", trap.description), &page.url)
                    .with_severity(Severity::Critical)
                    .with_element(&trap.source)
                    .with_suggestion("Let Tab and Shift+Tab move focus out of the component"),
            );
        }

        if !interactive.is_empty() && findings.is_empty() {
            findings.push(Finding::passed(
                "keyboard_access",
                &format!("All {} interactive elements are keyboard reachable", interactive.len()),
                &page.url,
            ));
        }
        Ok(findings)
    }
}

pub struct SkipLinkCheck;

impl Check for SkipLinkCheck {
    fn name(&self) -> &str {
        "skip_links"
    }

    fn description(&self) -> &str {
        "Repeated blocks can be bypassed (WCAG 2.4.1)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let skip_links = &page.accessibility.skip_links;
        let has_nav = page.structure.landmarks.iter().any(|l| l.role == "navigation");
        let has_main = page.structure.landmarks.iter().any(|l| l.role == "main");
        let needs_bypass = has_nav || page.structure.links.len() >= BYPASS_LINK_THRESHOLD;
        let mut findings = Vec::new();

        if skip_links.is_empty() {
            if !needs_bypass {
                return Ok(findings);
            }
            let finding = if has_main {
                Finding::warning(
                    "missing_skip_link",
                    "No skip link; only the main landmark lets users bypass navigation",
                    &page.url,
                )
                .with_severity(Severity::Minor)
            } else {
                Finding::violation(
                    "missing_skip_link",
                    "No skip link or main landmark to bypass repeated navigation",
                    &page.url,
                )
                .with_severity(Severity::Major)
            };
            findings.push(
                finding.with_suggestion("Add <a href=\"#main\">Skip to main content</a> as the first focusable element"),
            );
            return Ok(findings);
        }

        for link in skip_links {
            if !link.target_exists {
                findings.push(
                    Finding::violation(
                        "broken_skip_link",
                        &format!("Skip link \"{}\" points to missing target {}", link.text, link.href),
                        &page.url,
                    )
                    .with_severity(Severity::Major)
                    .with_element(&link.source)
                    .with_suggestion("Give the main content an id matching the skip link"),
                );
            } else if link.focus_position >= SKIP_LINK_MAX_POSITION {
                findings.push(
                    Finding::warning(
                        "skip_link_position",
                        &format!(
                            "Skip link \"{}\" is focus stop {}, it should be among the first",
                            link.text,
                            link.focus_position + 1
                        ),
                        &page.url,
                    )
                    .with_severity(Severity::Minor)
                    .with_element(&link.source),
                );
            }
        }

        if findings.is_empty() {
            findings.push(Finding::passed("skip_link", "Skip link present and working", &page.url));
        }
        Ok(findings)
    }
}

pub struct FocusVisibleCheck;

impl Check for FocusVisibleCheck {
    fn name(&self) -> &str {
        "focus_visible"
    }

    fn description(&self) -> &str {
        "Keyboard focus indicator stays visible (WCAG 2.4.7)"
    }

    fn level(&self) -> WcagLevel {
        WcagLevel::AA
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let focus = &page.styling.focus;
        let mut findings = Vec::new();

        for selector in &focus.outline_removed {
            findings.push(
                Finding::violation(
                    "focus_not_visible",
                    &format!("Rule `{}` removes the focus outline without a replacement", selector),
                    &page.url,
                )
                .with_severity(Severity::Major)
                .with_suggestion("Provide a visible :focus-visible style (outline, border or box-shadow)"),
            );
        }
        for source in &focus.inline_outline_removed {
            findings.push(
                Finding::violation(
                    "focus_not_visible",
                    "Inline style removes the focus outline of a focusable element",
                    &page.url,
                )
                .with_severity(Severity::Major)
                .with_element(source),
            );
        }

        let has_focusable = page.structure.interactive.iter().any(|el| el.focusable);
        if findings.is_empty() && focus.inspected && has_focusable {
            findings.push(Finding::passed(
                "focus_visible",
                "No styles suppress the focus indicator",
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
    use crate::finding::FindingKind;

    #[test]
    fn test_click_only_div_is_inaccessible() {
        let page = snapshot(
            r#"<div onclick="go()">Open</div><span role="button">Menu</span>
            <div onclick="x()" tabindex="0" onkeydown="x()">Fine</div><button>Native</button>"#,
        );
        let findings = KeyboardCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["keyboard_inaccessible", "keyboard_inaccessible"]);
        assert!(findings.iter().all(|f| f.kind == FindingKind::Violation));
    }

    #[test]
    fn test_positive_tabindex_and_trap() {
        let page = snapshot(
            r#"<input tabindex="3"><div tabindex="0" onkeydown="if (e.key == 'Tab') e.preventDefault()">w</div>"#,
        );
        let findings = KeyboardCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["positive_tabindex", "keyboard_trap"]);
    }

    #[test]
    fn test_keyboard_passes() {
        let page = snapshot(r#"<a href="/">Home</a><button>Go</button>"#);
        assert_eq!(types(&KeyboardCheck.run(&page).unwrap()), vec!["keyboard_access"]);
    }

    #[test]
    fn test_missing_skip_link() {
        let page = snapshot(r#"<nav><a href="/a">A</a><a href="/b">B</a></nav><div>content</div>"#);
        let findings = SkipLinkCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["missing_skip_link"]);
        assert_eq!(findings[0].kind, FindingKind::Violation);

        let page = snapshot(r#"<nav><a href="/a">A</a></nav><main>content</main>"#);
        let findings = SkipLinkCheck.run(&page).unwrap();
        assert_eq!(findings[0].kind, FindingKind::Warning);
    }

    #[test]
    fn test_skip_link_target() {
        let page = snapshot(r##"<a href="#content">Skip to content</a><nav><a href="/">Home</a></nav><main id="content">x</main>"##);
        assert_eq!(types(&SkipLinkCheck.run(&page).unwrap()), vec!["skip_link"]);

        let page = snapshot(r##"<a href="#gone">Skip to content</a><nav><a href="/">Home</a></nav>"##);
        assert_eq!(types(&SkipLinkCheck.run(&page).unwrap()), vec!["broken_skip_link"]);
    }

    #[test]
    fn test_small_page_needs_no_skip_link() {
        let page = snapshot(r#"<p>Just text with <a href="/a">one link</a></p>"#);
        assert!(SkipLinkCheck.run(&page).unwrap().is_empty());
    }

    #[test]
    fn test_focus_visible() {
        let page = snapshot(r#"<style>a:focus { outline: none }</style><a href="/">x</a>"#);
        assert_eq!(types(&FocusVisibleCheck.run(&page).unwrap()), vec!["focus_not_visible"]);

        let page = snapshot(r#"<style>a:focus { outline: 3px solid orange }</style><a href="/">x</a>"#);
        assert_eq!(types(&FocusVisibleCheck.run(&page).unwrap()), vec!["focus_visible"]);
    }
}
