// SPDX-License-Identifier: PMPL-1.0-or-later
//! Document structure - WCAG 1.3.1 Info and Relationships, 2.4.6 Headings
//! and Labels

use super::{Check, CheckError};
use crate::finding::{Finding, FindingKind, Severity};
use crate::model::PageSnapshot;

pub struct HeadingCheck;

impl Check for HeadingCheck {
    fn name(&self) -> &str {
        "headings"
    }

    fn description(&self) -> &str {
        "Headings form a logical outline (WCAG 1.3.1, 2.4.6)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let headings = &page.structure.headings;
        let mut findings = Vec::new();

        let h1_count = headings.iter().filter(|h| h.level == 1).count();
        if h1_count == 0 {
            findings.push(
                Finding::violation("missing_h1", "Page has no level-one heading", &page.url)
                    .with_severity(Severity::Moderate)
                    .with_suggestion("Add a single <h1> describing the page"),
            );
        } else if h1_count > 1 {
            findings.push(
                Finding::warning(
                    "multiple_h1",
                    &format!("Page has {} level-one headings", h1_count),
                    &page.url,
                )
                .with_severity(Severity::Minor),
            );
        }

        let mut last_level = 0u8;
        for heading in headings {
            if heading.level > last_level + 1 {
                let message = if last_level == 0 {
                    format!("First heading is h{} (\"{}\")", heading.level, heading.text)
                } else {
                    format!(
                        "Heading level skipped: h{} follows h{} (\"{}\")",
                        heading.level, last_level, heading.text
                    )
                };
                findings.push(
                    Finding::violation("heading_hierarchy", &message, &page.url)
                        .with_severity(Severity::Moderate)
                        .with_element(&heading.source)
                        .with_suggestion(&format!(
                            "Use h{} here, or restructure the outline",
                            last_level + 1
                        )),
                );
            }
            last_level = heading.level;

            if heading.text.trim().is_empty() {
                findings.push(
                    Finding::violation(
                        "empty_heading",
                        &format!("h{} has no text", heading.level),
                        &page.url,
                    )
                    .with_severity(Severity::Major)
                    .with_element(&heading.source),
                );
            }
        }

        let outline_sound = !findings.iter().any(|f| f.kind == FindingKind::Violation);
        if !headings.is_empty() && outline_sound {
            findings.push(Finding::passed(
                "heading_structure",
                &format!("{} headings in a consistent hierarchy", headings.len()),
                &page.url,
            ));
        }
        Ok(findings)
    }
}

pub struct LandmarkCheck;

impl Check for LandmarkCheck {
    fn name(&self) -> &str {
        "landmarks"
    }

    fn description(&self) -> &str {
        "Page regions are exposed as landmarks (WCAG 1.3.1)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let landmarks = &page.structure.landmarks;
        let mut findings = Vec::new();

        if landmarks.is_empty() {
            findings.push(
                Finding::violation("missing_landmarks", "Page defines no landmark regions", &page.url)
                    .with_severity(Severity::Moderate)
                    .with_suggestion("Wrap regions in <header>, <nav>, <main> and <footer>"),
            );
            return Ok(findings);
        }

        let mains = landmarks.iter().filter(|l| l.role == "main").count();
        if mains == 0 {
            findings.push(
                Finding::warning("missing_main_landmark", "Page has no main landmark", &page.url)
                    .with_severity(Severity::Moderate)
                    .with_suggestion("Wrap the primary content in <main>"),
            );
        } else if mains > 1 {
            findings.push(
                Finding::warning(
                    "missing_main_landmark",
                    &format!("Page has {} main landmarks; exactly one is expected", mains),
                    &page.url,
                )
                .with_severity(Severity::Minor),
            );
        }

        if findings.is_empty() {
            let mut roles: Vec<&str> = landmarks.iter().map(|l| l.role.as_str()).collect();
            roles.dedup();
            findings.push(Finding::passed(
                "landmarks",
                &format!("Landmarks present: {}", roles.join(", ")),
                &page.url,
            ));
        }
        Ok(findings)
    }
}

pub struct TableCheck;

impl Check for TableCheck {
    fn name(&self) -> &str {
        "tables"
    }

    fn description(&self) -> &str {
        "Data tables expose headers and captions (WCAG 1.3.1)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let data_tables: Vec<_> = page
            .structure
            .tables
            .iter()
            .filter(|t| !t.is_layout && t.data_cells > 0)
            .collect();
        let mut findings = Vec::new();

        for table in &data_tables {
            if table.header_cells == 0 {
                findings.push(
                    Finding::violation(
                        "missing_table_headers",
                        &format!("Data table with {} rows has no header cells", table.rows),
                        &page.url,
                    )
                    .with_severity(Severity::Major)
                    .with_element(&table.source)
                    .with_suggestion("Mark header cells with <th>"),
                );
                continue;
            }
            if table.scoped_header_cells == 0 && !table.has_thead {
                findings.push(
                    Finding::warning(
                        "table_header_scope",
                        "Table headers have no scope and no <thead>",
                        &page.url,
                    )
                    .with_severity(Severity::Minor)
                    .with_element(&table.source)
                    .with_suggestion("Add scope=\"col\" or scope=\"row\" to <th> cells"),
                );
            }
            if table.caption.is_none() && table.aria_label.is_none() && table.summary.is_none() {
                findings.push(
                    Finding::warning("missing_table_caption", "Data table has no caption", &page.url)
                        .with_severity(Severity::Minor)
                        .with_element(&table.source)
                        .with_suggestion("Add a <caption> describing the table"),
                );
            }
        }

        if !data_tables.is_empty() && findings.is_empty() {
            findings.push(Finding::passed(
                "table_structure",
                &format!("{} data tables are properly structured", data_tables.len()),
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
    fn test_heading_skip_h2_to_h4() {
        let page = snapshot("<h1>A</h1><h2>B</h2><h4>C</h4>");
        let findings = HeadingCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["heading_hierarchy"]);
        assert!(findings[0].message.contains("h4 follows h2"));
    }

    #[test]
    fn test_heading_sequence_ok() {
        let page = snapshot("<h1>A</h1><h2>B</h2><h3>C</h3><h2>D</h2>");
        assert_eq!(types(&HeadingCheck.run(&page).unwrap()), vec!["heading_structure"]);
    }

    #[test]
    fn test_last_level_updates_after_every_heading() {
        // h1 -> h3 is one skip; h3 -> h4 is fine because h3 became the last level
        let page = snapshot("<h1>A</h1><h3>B</h3><h4>C</h4><h6>D</h6>");
        let findings = HeadingCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["heading_hierarchy", "heading_hierarchy"]);
    }

    #[test]
    fn test_missing_multiple_and_empty_headings() {
        let page = snapshot("<h2>Only</h2>");
        assert!(types(&HeadingCheck.run(&page).unwrap()).contains(&"missing_h1"));

        let page = snapshot("<h1>A</h1><h1>B</h1><h2></h2>");
        let findings = HeadingCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["multiple_h1", "empty_heading"]);
    }

    #[test]
    fn test_multiple_h1_keeps_sound_outline_passing() {
        let page = snapshot("<h1>A</h1><h1>B</h1><h2>C</h2>");
        let findings = HeadingCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["multiple_h1", "heading_structure"]);
    }

    #[test]
    fn test_landmarks() {
        let page = snapshot("<div>no regions</div>");
        assert_eq!(types(&LandmarkCheck.run(&page).unwrap()), vec!["missing_landmarks"]);

        let page = snapshot("<header>h</header><nav>n</nav><footer>f</footer>");
        assert_eq!(types(&LandmarkCheck.run(&page).unwrap()), vec!["missing_main_landmark"]);

        let page = snapshot("<header>h</header><main>m</main>");
        assert_eq!(types(&LandmarkCheck.run(&page).unwrap()), vec!["landmarks"]);
    }

    #[test]
    fn test_tables() {
        let page = snapshot("<table><tr><td>1</td><td>2</td></tr></table>");
        assert_eq!(types(&TableCheck.run(&page).unwrap()), vec!["missing_table_headers"]);

        let page = snapshot(
            "<table><caption>Scores</caption><tr><th scope=\"col\">Name</th></tr><tr><td>A</td></tr></table>",
        );
        assert_eq!(types(&TableCheck.run(&page).unwrap()), vec!["table_structure"]);

        let page = snapshot("<table role=\"presentation\"><tr><td>layout</td></tr></table>");
        assert!(TableCheck.run(&page).unwrap().is_empty());
    }
}
