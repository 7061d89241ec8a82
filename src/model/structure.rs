// SPDX-License-Identifier: PMPL-1.0-or-later
//! Structural records: headings, landmarks, forms, images, links, tables,
//! lists, iframes, media and interactive elements.

use super::ElementSource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageStructure {
    pub headings: Vec<Heading>,
    pub landmarks: Vec<Landmark>,
    pub forms: Vec<FormRecord>,
    /// Form controls outside any `<form>`
    pub standalone_fields: Vec<FormField>,
    pub images: Vec<ImageRecord>,
    pub links: Vec<LinkRecord>,
    pub tables: Vec<TableRecord>,
    pub lists: Vec<ListRecord>,
    pub iframes: Vec<Iframe>,
    pub media: Vec<MediaElement>,
    pub interactive: Vec<InteractiveElement>,
}

impl PageStructure {
    /// All form fields, inside forms or not
    pub fn all_fields(&self) -> impl Iterator<Item = &FormField> {
        self.forms
            .iter()
            .flat_map(|f| f.fields.iter())
            .chain(self.standalone_fields.iter())
    }
}

/// `<h1>`..`<h6>` or `role="heading"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: Option<String>,
    pub source: ElementSource,
}

/// A landmark region, native or ARIA
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landmark {
    /// Landmark role: banner, navigation, main, complementary, contentinfo, search, form, region
    pub role: String,
    pub label: Option<String>,
    pub source: ElementSource,
}

/// How a form control obtains its accessible name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    /// `<label for>` pointing at the control
    Explicit,
    /// Control nested inside `<label>`
    Wrapping,
    AriaLabel,
    AriaLabelledby,
    Title,
    /// Only a placeholder, which disappears on input
    PlaceholderOnly,
    /// Control type that needs no label (hidden, submit, ...)
    NotRequired,
    None,
}

impl LabelSource {
    pub fn is_labelled(&self) -> bool {
        !matches!(self, LabelSource::PlaceholderOnly | LabelSource::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    /// input, select, textarea
    pub tag: String,
    /// `type` attribute for inputs, tag name otherwise
    pub input_type: String,
    pub name: Option<String>,
    pub id: Option<String>,
    /// Resolved label text
    pub label: Option<String>,
    pub label_source: LabelSource,
    pub required: bool,
    pub aria_required: bool,
    pub aria_invalid: bool,
    pub aria_describedby: Option<String>,
    /// Whether `aria-describedby`/`aria-errormessage` targets exist in the page
    pub description_target_exists: bool,
    pub autocomplete: Option<String>,
    pub pattern: Option<String>,
    pub placeholder: Option<String>,
    pub source: ElementSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    pub id: Option<String>,
    pub action: Option<String>,
    pub method: Option<String>,
    pub novalidate: bool,
    pub fields: Vec<FormField>,
    pub has_submit: bool,
    /// Elements with `role="alert"` or `aria-live` inside the form
    pub live_regions: usize,
    pub source: ElementSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub src: Option<String>,
    /// `None` when the attribute is absent, `Some("")` when empty
    pub alt: Option<String>,
    pub role: Option<String>,
    pub aria_label: Option<String>,
    pub aria_labelledby: Option<String>,
    pub aria_hidden: bool,
    pub title: Option<String>,
    /// Image is the only content of a link
    pub in_link: bool,
    pub source: ElementSource,
}

impl ImageRecord {
    /// Explicitly marked as decorative
    pub fn is_decorative(&self) -> bool {
        self.alt.as_deref() == Some("")
            || self.aria_hidden
            || matches!(self.role.as_deref(), Some("presentation") | Some("none"))
    }

    /// Has a non-empty accessible name from some source
    pub fn has_text_alternative(&self) -> bool {
        self.alt.as_deref().map(|a| !a.trim().is_empty()).unwrap_or(false)
            || self.aria_label.as_deref().map(|a| !a.trim().is_empty()).unwrap_or(false)
            || self.aria_labelledby.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub href: Option<String>,
    /// Visible text
    pub text: String,
    /// Computed accessible name (aria-label, text, image alt, title)
    pub accessible_name: String,
    pub target: Option<String>,
    /// Same-site link
    pub is_internal: bool,
    pub source: ElementSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub caption: Option<String>,
    pub aria_label: Option<String>,
    pub summary: Option<String>,
    pub has_thead: bool,
    pub header_cells: usize,
    pub scoped_header_cells: usize,
    pub data_cells: usize,
    pub rows: usize,
    /// `role="presentation"`/`none`
    pub is_layout: bool,
    pub source: ElementSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Ordered,
    Unordered,
    Description,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    pub kind: ListKind,
    pub items: usize,
    /// Direct children that are not list items
    pub invalid_children: usize,
    pub source: ElementSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iframe {
    pub src: Option<String>,
    pub title: Option<String>,
    pub aria_label: Option<String>,
    pub aria_hidden: bool,
    pub source: ElementSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaElement {
    pub kind: MediaKind,
    pub src: Option<String>,
    /// `<track kind="captions|subtitles">`
    pub has_captions: bool,
    /// `<track kind="descriptions">`
    pub has_descriptions: bool,
    /// A nearby link or element mentioning a transcript
    pub has_transcript: bool,
    pub autoplay: bool,
    pub muted: bool,
    pub controls: bool,
    pub source: ElementSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveElement {
    pub tag: String,
    pub role: Option<String>,
    pub tabindex: Option<i32>,
    /// Natively focusable or made focusable with tabindex >= 0
    pub focusable: bool,
    pub has_click_handler: bool,
    pub has_key_handler: bool,
    pub accessible_name: Option<String>,
    pub aria_hidden: bool,
    pub disabled: bool,
    pub source: ElementSource,
}
