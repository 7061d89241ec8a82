// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image alt text - WCAG 1.1.1 Non-text Content (Level A)
//!
//! - Every image needs a text alternative or an explicit decorative marker
//! - Alt text must be descriptive (not generic like "image", "photo")
//! - Alt text must not be a file name

use super::{Check, CheckError};
use crate::finding::{Finding, Severity};
use crate::model::PageSnapshot;

/// Generic alt text values that say nothing about the image
const GENERIC_ALT_VALUES: &[&str] = &[
    "image",
    "photo",
    "picture",
    "icon",
    "graphic",
    "img",
    "banner",
    "logo",
    "untitled",
    "screenshot",
    "thumbnail",
    "placeholder",
];

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".avif", ".bmp"];

pub struct ImageAltCheck;

impl Check for ImageAltCheck {
    fn name(&self) -> &str {
        "images"
    }

    fn description(&self) -> &str {
        "Images have meaningful text alternatives (WCAG 1.1.1)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let images = &page.structure.images;
        let mut findings = Vec::new();

        for img in images {
            if img.is_decorative() && !img.in_link {
                continue;
            }
            if !img.has_text_alternative() {
                let message = if img.in_link {
                    "Linked image has no text alternative, so the link has no name"
                } else {
                    "Image is missing an alt attribute"
                };
                findings.push(
                    Finding::violation("missing_alt", message, &page.url)
                        .with_severity(Severity::Critical)
                        .with_element(&img.source)
                        .with_suggestion(
                            "Add alt=\"description\" for informative images or alt=\"\" for decorative ones",
                        ),
                );
                continue;
            }

            let alt = img.alt.as_deref().unwrap_or_default().trim().to_lowercase();
            if GENERIC_ALT_VALUES.contains(&alt.as_str()) {
                findings.push(
                    Finding::violation(
                        "generic_alt",
                        &format!("Image alt text \"{}\" is generic and does not describe the image", alt),
                        &page.url,
                    )
                    .with_severity(Severity::Moderate)
                    .with_element(&img.source)
                    .with_suggestion("Describe what the image shows or what it is for"),
                );
            } else if IMAGE_EXTENSIONS.iter().any(|ext| alt.ends_with(ext)) {
                findings.push(
                    Finding::violation(
                        "filename_alt",
                        &format!("Image alt text \"{}\" is a file name", alt),
                        &page.url,
                    )
                    .with_severity(Severity::Major)
                    .with_element(&img.source)
                    .with_suggestion("Replace the file name with a description of the image"),
                );
            }
        }

        if !images.is_empty() && findings.is_empty() {
            findings.push(Finding::passed(
                "image_alt",
                &format!("All {} images have appropriate text alternatives", images.len()),
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
    fn test_accessible_images() {
        let page = snapshot(
            r#"<img src="logo.png" alt="Company logo"><img src="divider.png" alt="">
            <img src="chart.png" alt="Bar chart showing Q4 revenue growth of 15%">"#,
        );
        let findings = ImageAltCheck.run(&page).unwrap();
        assert_eq!(types(&findings), vec!["image_alt"]);
        assert_eq!(findings[0].kind, FindingKind::Passed);
    }

    #[test]
    fn test_missing_generic_and_filename_alt() {
        let page = snapshot(
            r#"<img src="a.png"><img src="b.png" alt="photo"><img src="c.png" alt="IMG_2041.JPG">
            <img src="d.png" aria-label="Sales chart"><a href="/"><img src="home.png"></a>"#,
        );
        let findings = ImageAltCheck.run(&page).unwrap();
        assert_eq!(
            types(&findings),
            vec!["missing_alt", "generic_alt", "filename_alt", "missing_alt"]
        );
        assert_eq!(findings[0].severity, Severity::Critical);
        assert!(findings[3].message.contains("link"));
        assert_eq!(findings[0].element_info.as_ref().unwrap().tag, "img");
    }

    #[test]
    fn test_no_images_no_findings() {
        let page = snapshot("<p>text only</p>");
        assert!(ImageAltCheck.run(&page).unwrap().is_empty());
    }
}
