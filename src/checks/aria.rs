// SPDX-License-Identifier: PMPL-1.0-or-later
//! ARIA and name/role/value - WCAG 4.1.1 Parsing, 4.1.2 Name, Role, Value
//!
//! - Roles must come from the ARIA 1.1 role list
//! - Roles with required states must declare them
//! - aria-hidden content must not be focusable
//! - Frames need a title, ids must be unique

use super::{Check, CheckError};
use crate::finding::{Finding, Severity};
use crate::model::PageSnapshot;

/// WAI-ARIA 1.1 roles, abstract roles excluded
const VALID_ROLES: &[&str] = &[
    "alert", "alertdialog", "application", "article", "banner", "button", "cell", "checkbox",
    "columnheader", "combobox", "complementary", "contentinfo", "definition", "dialog", "directory",
    "document", "feed", "figure", "form", "grid", "gridcell", "group", "heading", "img", "link",
    "list", "listbox", "listitem", "log", "main", "marquee", "math", "menu", "menubar", "menuitem",
    "menuitemcheckbox", "menuitemradio", "navigation", "none", "note", "option", "presentation",
    "progressbar", "radio", "radiogroup", "region", "row", "rowgroup", "rowheader", "scrollbar",
    "search", "searchbox", "separator", "slider", "spinbutton", "status", "switch", "tab", "table",
    "tablist", "tabpanel", "term", "textbox", "timer", "toolbar", "tooltip", "tree", "treegrid",
    "treeitem",
];

/// States a role cannot work without
const REQUIRED_STATES: &[(&str, &str)] = &[
    ("checkbox", "aria-checked"),
    ("radio", "aria-checked"),
    ("switch", "aria-checked"),
    ("menuitemcheckbox", "aria-checked"),
    ("menuitemradio", "aria-checked"),
    ("slider", "aria-valuenow"),
    ("scrollbar", "aria-valuenow"),
    ("heading", "aria-level"),
];

/// States a role is expected to expose
const RECOMMENDED_STATES: &[(&str, &str)] = &[
    ("combobox", "aria-expanded"),
    ("listbox", "aria-expanded"),
    ("textbox", "aria-expanded"),
];

/// WAI-ARIA 1.1 states and properties
const VALID_ATTRIBUTES: &[&str] = &[
    "aria-activedescendant", "aria-atomic", "aria-autocomplete", "aria-busy", "aria-checked",
    "aria-colcount", "aria-colindex", "aria-colspan", "aria-controls", "aria-current",
    "aria-describedby", "aria-details", "aria-disabled", "aria-dropeffect", "aria-errormessage",
    "aria-expanded", "aria-flowto", "aria-grabbed", "aria-haspopup", "aria-hidden", "aria-invalid",
    "aria-keyshortcuts", "aria-label", "aria-labelledby", "aria-level", "aria-live", "aria-modal",
    "aria-multiline", "aria-multiselectable", "aria-orientation", "aria-owns", "aria-placeholder",
    "aria-posinset", "aria-pressed", "aria-readonly", "aria-relevant", "aria-required",
    "aria-roledescription", "aria-rowcount", "aria-rowindex", "aria-rowspan", "aria-selected",
    "aria-setsize", "aria-sort", "aria-valuemax", "aria-valuemin", "aria-valuenow", "aria-valuetext",
];

pub struct AriaRoleCheck;

impl Check for AriaRoleCheck {
    fn name(&self) -> &str {
        "aria"
    }

    fn description(&self) -> &str {
        "ARIA roles, states and properties are valid (WCAG 4.1.2)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let elements = &page.accessibility.aria;
        let mut findings = Vec::new();

        for el in elements {
            if let Some(role) = el.role.as_deref() {
                if !VALID_ROLES.contains(&role) {
                    findings.push(
                        Finding::violation(
                            "invalid_aria_role",
                            &format!("role=\"{}\" is not a valid ARIA role", role),
                            &page.url,
                        )
                        .with_severity(Severity::Major)
                        .with_element(&el.source)
                        .with_suggestion("Use a role from the WAI-ARIA specification, or a native element"),
                    );
                }

                // heading has an implicit level when native
                let native_heading = role == "heading"
                    && matches!(el.source.tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6");
                for (_, state) in REQUIRED_STATES.iter().filter(|(r, _)| *r == role) {
                    if !el.attributes.contains_key(*state) && !native_heading && !native_state(&el.source.tag, state) {
                        findings.push(
                            Finding::violation(
                                "aria_missing_state",
                                &format!("role=\"{}\" requires {}", role, state),
                                &page.url,
                            )
                            .with_severity(Severity::Major)
                            .with_element(&el.source)
                            .with_suggestion(&format!("Add {} and keep it in sync with the widget", state)),
                        );
                    }
                }
                for (_, state) in RECOMMENDED_STATES.iter().filter(|(r, _)| *r == role) {
                    if !el.attributes.contains_key(*state) {
                        findings.push(
                            Finding::warning(
                                "aria_missing_state",
                                &format!("role=\"{}\" should expose {}", role, state),
                                &page.url,
                            )
                            .with_severity(Severity::Minor)
                            .with_element(&el.source),
                        );
                    }
                }
            }

            let hidden = el
                .attributes
                .get("aria-hidden")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false);
            if hidden && el.focusable {
                findings.push(
                    Finding::violation(
                        "aria_hidden_focusable",
                        "Focusable element is hidden from assistive technology",
                        &page.url,
                    )
                    .with_severity(Severity::Major)
                    .with_element(&el.source)
                    .with_suggestion("Remove aria-hidden or take the element out of the focus order"),
                );
            }

            for name in el.attributes.keys().filter(|k| !VALID_ATTRIBUTES.contains(&k.as_str())) {
                findings.push(
                    Finding::violation(
                        "invalid_aria_attribute",
                        &format!("{} is not a valid ARIA attribute", name),
                        &page.url,
                    )
                    .with_severity(Severity::Moderate)
                    .with_element(&el.source),
                );
            }
        }

        if !elements.is_empty() && findings.is_empty() {
            findings.push(Finding::passed(
                "aria_roles",
                &format!("{} elements use ARIA correctly", elements.len()),
                &page.url,
            ));
        }
        Ok(findings)
    }
}

/// Native controls whose checked/value state the browser exposes
fn native_state(tag: &str, state: &str) -> bool {
    tag == "input" && matches!(state, "aria-checked" | "aria-valuenow")
}

pub struct FrameTitleCheck;

impl Check for FrameTitleCheck {
    fn name(&self) -> &str {
        "frames"
    }

    fn description(&self) -> &str {
        "Frames have a title (WCAG 4.1.2)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let frames: Vec<_> = page.structure.iframes.iter().filter(|f| !f.aria_hidden).collect();
        let mut findings = Vec::new();

        for frame in &frames {
            if frame.title.is_none() && frame.aria_label.is_none() {
                findings.push(
                    Finding::violation(
                        "missing_iframe_title",
                        &format!("Frame {} has no title", frame.src.as_deref().unwrap_or("(no src)")),
                        &page.url,
                    )
                    .with_severity(Severity::Major)
                    .with_element(&frame.source)
                    .with_suggestion("Add title=\"...\" describing the frame's content"),
                );
            }
        }

        if !frames.is_empty() && findings.is_empty() {
            findings.push(Finding::passed(
                "frame_titles",
                &format!("All {} frames are titled", frames.len()),
                &page.url,
            ));
        }
        Ok(findings)
    }
}

pub struct DuplicateIdCheck;

impl Check for DuplicateIdCheck {
    fn name(&self) -> &str {
        "duplicate_ids"
    }

    fn description(&self) -> &str {
        "Element ids are unique (WCAG 4.1.1)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let ids = &page.accessibility;
        if ids.duplicate_ids.is_empty() {
            if ids.id_count == 0 {
                return Ok(Vec::new());
            }
            return Ok(vec![Finding::passed(
                "unique_ids",
                &format!("All {} element ids are unique", ids.id_count),
                &page.url,
            )]);
        }
        let duplicates = &ids.duplicate_ids;

        Ok(duplicates
            .iter()
            .map(|id| {
                Finding::violation(
                    "duplicate_id",
                    &format!("id=\"{}\" is used more than once", id),
                    &page.url,
                )
                .with_severity(Severity::Moderate)
                .with_suggestion("Give every element a unique id; label and ARIA references resolve to the first")
            })
            .collect())
    }
}
