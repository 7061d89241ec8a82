// SPDX-License-Identifier: PMPL-1.0-or-later
//! Form accessibility - WCAG 1.3.5 Identify Input Purpose, 3.3.1 Error
//! Identification, 3.3.2 Labels or Instructions, 3.3.3 Error Suggestion

use super::{contains_any, Check, CheckError};
use crate::finding::{Finding, Severity};
use crate::model::{LabelSource, PageSnapshot};

/// Input types that collect personal data and should declare autocomplete
const PERSONAL_INPUT_TYPES: &[&str] = &["email", "tel", "url", "password"];

/// Field names that imply a personal-data purpose
const PERSONAL_NAME_HINTS: &[&str] = &[
    "name", "email", "phone", "tel", "address", "street", "city", "zip", "postal", "country",
    "birthday", "username",
];

pub struct FormLabelCheck;

impl Check for FormLabelCheck {
    fn name(&self) -> &str {
        "form_labels"
    }

    fn description(&self) -> &str {
        "Form controls have programmatic labels (WCAG 1.3.5, 3.3.2)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let fields: Vec<_> = page
            .structure
            .all_fields()
            .filter(|f| f.label_source != LabelSource::NotRequired)
            .collect();
        let mut findings = Vec::new();

        for field in &fields {
            let name = field
                .name
                .as_deref()
                .or(field.id.as_deref())
                .unwrap_or(field.input_type.as_str());
            match field.label_source {
                LabelSource::None => findings.push(
                    Finding::violation(
                        "missing_form_label",
                        &format!("Form field \"{}\" has no label", name),
                        &page.url,
                    )
                    .with_severity(Severity::Critical)
                    .with_element(&field.source)
                    .with_suggestion("Associate a <label for> with the field, or add aria-label"),
                ),
                LabelSource::PlaceholderOnly => findings.push(
                    Finding::violation(
                        "placeholder_label",
                        &format!("Form field \"{}\" is labelled only by its placeholder", name),
                        &page.url,
                    )
                    .with_severity(Severity::Major)
                    .with_element(&field.source)
                    .with_suggestion("Placeholders vanish on input; add a visible <label>"),
                ),
                _ => {}
            }

            let lower_name = name.to_ascii_lowercase();
            let personal = PERSONAL_INPUT_TYPES.contains(&field.input_type.as_str())
                || PERSONAL_NAME_HINTS.iter().any(|h| lower_name.contains(h));
            if personal && field.autocomplete.is_none() && field.tag == "input" {
                findings.push(
                    Finding::warning(
                        "missing_autocomplete",
                        &format!("Personal-data field \"{}\" does not declare autocomplete", name),
                        &page.url,
                    )
                    .with_severity(Severity::Minor)
                    .with_element(&field.source)
                    .with_suggestion("Add an autocomplete token such as \"email\" or \"given-name\""),
                );
            }
        }

        if !fields.is_empty() && findings.is_empty() {
            findings.push(Finding::passed(
                "form_labels",
                &format!("All {} form fields are labelled", fields.len()),
                &page.url,
            ));
        }
        Ok(findings)
    }
}

pub struct FormValidationCheck;

impl Check for FormValidationCheck {
    fn name(&self) -> &str {
        "form_validation"
    }

    fn description(&self) -> &str {
        "Errors are identified and described (WCAG 3.3.1, 3.3.3)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let mut findings = Vec::new();
        let mut inspected = 0usize;

        for form in &page.structure.forms {
            let validated: Vec<_> = form
                .fields
                .iter()
                .filter(|f| f.required || f.aria_required || f.pattern.is_some() || f.aria_invalid)
                .collect();
            if validated.is_empty() {
                continue;
            }
            inspected += 1;

            for field in &validated {
                let name = field.name.as_deref().or(field.id.as_deref()).unwrap_or(field.input_type.as_str());
                if field.aria_invalid && !field.description_target_exists {
                    findings.push(
                        Finding::violation(
                            "error_not_associated",
                            &format!("Invalid field \"{}\" has no associated error message", name),
                            &page.url,
                        )
                        .with_severity(Severity::Major)
                        .with_element(&field.source)
                        .with_suggestion("Point aria-describedby or aria-errormessage at the error text"),
                    );
                }
                if field.pattern.is_some() && field.aria_describedby.is_none() {
                    findings.push(
                        Finding::warning(
                            "missing_error_suggestion",
                            &format!("Field \"{}\" enforces a pattern without describing it", name),
                            &page.url,
                        )
                        .with_severity(Severity::Moderate)
                        .with_element(&field.source)
                        .with_suggestion("Describe the expected format next to the field"),
                    );
                }
                let label_marks_required = field
                    .label
                    .as_deref()
                    .map(|l| contains_any(l, &["*", "required", "mandatory"]))
                    .unwrap_or(false);
                if field.required && !field.aria_required && !label_marks_required {
                    findings.push(
                        Finding::warning(
                            "required_not_indicated",
                            &format!("Required field \"{}\" is not marked as required in its label", name),
                            &page.url,
                        )
                        .with_severity(Severity::Minor)
                        .with_element(&field.source),
                    );
                }
            }

            if form.novalidate && form.live_regions == 0 {
                findings.push(
                    Finding::warning(
                        "error_not_associated",
                        "Form disables native validation and has no live region for errors",
                        &page.url,
                    )
                    .with_severity(Severity::Moderate)
                    .with_element(&form.source)
                    .with_suggestion("Announce errors with role=\"alert\" or aria-live"),
                );
            }
        }

        if inspected > 0 && findings.is_empty() {
            findings.push(Finding::passed(
                "form_validation",
                &format!("{} forms identify and describe input errors", inspected),
                &page.url,
            ));
        }
        Ok(findings)
    }
}
