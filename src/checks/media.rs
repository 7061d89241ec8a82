// SPDX-License-Identifier: PMPL-1.0-or-later
//! Time-based media - WCAG 1.2.1 Audio-only and Video-only, 1.2.2 Captions,
//! 1.2.3 Audio Description or Media Alternative, 1.4.2 Audio Control

use super::{Check, CheckError};
use crate::finding::{Finding, Severity};
use crate::model::{MediaKind, PageSnapshot};

pub struct MediaCheck;

impl Check for MediaCheck {
    fn name(&self) -> &str {
        "media"
    }

    fn description(&self) -> &str {
        "Audio and video have captions, transcripts and no unmuted autoplay (WCAG 1.2.x, 1.4.2)"
    }

    fn run(&self, page: &PageSnapshot) -> Result<Vec<Finding>, CheckError> {
        let media = &page.structure.media;
        let mut findings = Vec::new();

        for item in media {
            let src = item.src.as_deref().unwrap_or("(inline source)");
            match item.kind {
                MediaKind::Video => {
                    if !item.has_captions {
                        findings.push(
                            Finding::violation(
                                "missing_captions",
                                &format!("Video {} has no captions track", src),
                                &page.url,
                            )
                            .with_severity(Severity::Critical)
                            .with_element(&item.source)
                            .with_suggestion("Add <track kind=\"captions\" src=\"...\">"),
                        );
                    }
                    if !item.has_descriptions && !item.has_transcript {
                        findings.push(
                            Finding::warning(
                                "missing_audio_description",
                                &format!("Video {} has no audio description or transcript", src),
                                &page.url,
                            )
                            .with_severity(Severity::Moderate)
                            .with_element(&item.source),
                        );
                    }
                }
                MediaKind::Audio => {
                    if !item.has_transcript {
                        findings.push(
                            Finding::violation(
                                "missing_transcript",
                                &format!("Audio {} has no transcript", src),
                                &page.url,
                            )
                            .with_severity(Severity::Major)
                            .with_element(&item.source)
                            .with_suggestion("Link a text transcript next to the player"),
                        );
                    }
                }
            }

            if item.autoplay && !item.muted {
                findings.push(
                    Finding::violation(
                        "autoplay_audio",
                        &format!("Media {} plays sound automatically", src),
                        &page.url,
                    )
                    .with_severity(if item.controls { Severity::Moderate } else { Severity::Major })
                    .with_element(&item.source)
                    .with_suggestion("Remove autoplay or start muted"),
                );
            }
        }

        if !media.is_empty() && findings.is_empty() {
            findings.push(Finding::passed(
                "media_alternatives",
                &format!("{} media elements provide text alternatives", media.len()),
                &page.url,
            ));
        }
        Ok(findings)
    }
}
