// SPDX-License-Identifier: PMPL-1.0-or-later
//! Fixed lookup from finding types to WCAG success criteria.

/// Finding type -> criterion id. Types absent from this table are
/// uncategorized.
const TYPE_CRITERIA: &[(&str, &str)] = &[
    // 1.1.1 Non-text Content
    ("missing_alt", "1.1.1"),
    ("generic_alt", "1.1.1"),
    ("filename_alt", "1.1.1"),
    ("image_alt", "1.1.1"),
    // 1.2 Time-based media
    ("missing_transcript", "1.2.1"),
    ("missing_captions", "1.2.2"),
    ("media_alternatives", "1.2.2"),
    ("missing_audio_description", "1.2.3"),
    // 1.3 Adaptable
    ("heading_hierarchy", "1.3.1"),
    ("empty_heading", "1.3.1"),
    ("missing_h1", "1.3.1"),
    ("heading_structure", "1.3.1"),
    ("missing_landmarks", "1.3.1"),
    ("missing_main_landmark", "1.3.1"),
    ("landmarks", "1.3.1"),
    ("missing_table_headers", "1.3.1"),
    ("table_header_scope", "1.3.1"),
    ("missing_table_caption", "1.3.1"),
    ("table_structure", "1.3.1"),
    ("missing_autocomplete", "1.3.5"),
    // 1.4 Distinguishable
    ("autoplay_audio", "1.4.2"),
    ("color_contrast", "1.4.3"),
    ("viewport_zoom_disabled", "1.4.4"),
    ("responsive_viewport", "1.4.4"),
    ("missing_viewport", "1.4.10"),
    ("text_spacing", "1.4.12"),
    // 2.1 Keyboard accessible
    ("keyboard_inaccessible", "2.1.1"),
    ("keyboard_access", "2.1.1"),
    ("keyboard_trap", "2.1.2"),
    // 2.2 Enough time
    ("meta_refresh", "2.2.1"),
    ("timing", "2.2.1"),
    ("moving_content", "2.2.2"),
    // 2.4 Navigable
    ("missing_skip_link", "2.4.1"),
    ("broken_skip_link", "2.4.1"),
    ("skip_link_position", "2.4.1"),
    ("skip_link", "2.4.1"),
    ("missing_title", "2.4.2"),
    ("poor_title", "2.4.2"),
    ("page_title", "2.4.2"),
    ("positive_tabindex", "2.4.3"),
    ("empty_link", "2.4.4"),
    ("ambiguous_link_text", "2.4.4"),
    ("link_names", "2.4.4"),
    ("multiple_h1", "2.4.6"),
    ("focus_not_visible", "2.4.7"),
    ("focus_visible", "2.4.7"),
    // 3.1 Readable
    ("missing_lang", "3.1.1"),
    ("invalid_lang", "3.1.1"),
    ("page_language", "3.1.1"),
    ("invalid_lang_part", "3.1.2"),
    // 3.3 Input assistance
    ("error_not_associated", "3.3.1"),
    ("form_validation", "3.3.1"),
    ("missing_form_label", "3.3.2"),
    ("placeholder_label", "3.3.2"),
    ("required_not_indicated", "3.3.2"),
    ("form_labels", "3.3.2"),
    ("missing_error_suggestion", "3.3.3"),
    // 4.1 Compatible
    ("duplicate_id", "4.1.1"),
    ("unique_ids", "4.1.1"),
    ("invalid_aria_role", "4.1.2"),
    ("aria_missing_state", "4.1.2"),
    ("aria_hidden_focusable", "4.1.2"),
    ("invalid_aria_attribute", "4.1.2"),
    ("aria_roles", "4.1.2"),
    ("missing_iframe_title", "4.1.2"),
    ("frame_titles", "4.1.2"),
];

/// Criterion a finding type belongs to
pub fn criterion_for(finding_type: &str) -> Option<&'static str> {
    TYPE_CRITERIA
        .iter()
        .find(|(t, _)| *t == finding_type)
        .map(|(_, id)| *id)
}

/// All finding types mapped to a criterion
pub fn finding_types_for(criterion_id: &str) -> Vec<&'static str> {
    TYPE_CRITERIA
        .iter()
        .filter(|(_, id)| *id == criterion_id)
        .map(|(t, _)| *t)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{CHECK_ERROR, PAGE_UNAVAILABLE};
    use crate::criteria::taxonomy::criterion;

    #[test]
    fn test_every_mapping_targets_a_real_criterion() {
        for (finding_type, id) in TYPE_CRITERIA {
            assert!(criterion(id).is_some(), "{} maps to unknown {}", finding_type, id);
        }
    }

    #[test]
    fn test_known_mappings() {
        assert_eq!(criterion_for("missing_alt"), Some("1.1.1"));
        assert_eq!(criterion_for("skip_link_position"), Some("2.4.1"));
        assert_eq!(criterion_for("heading_structure"), Some("1.3.1"));
        assert_eq!(criterion_for("color_contrast"), Some("1.4.3"));
        assert!(finding_types_for("2.4.7").contains(&"focus_not_visible"));
    }

    #[test]
    fn test_runner_types_are_uncategorized() {
        assert_eq!(criterion_for(CHECK_ERROR), None);
        assert_eq!(criterion_for(PAGE_UNAVAILABLE), None);
        assert_eq!(criterion_for("something_new"), None);
    }
}
