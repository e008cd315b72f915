mod selector;
mod tree;

use scraper::ElementRef;

use crate::error::ParseError;
use crate::formats::{ParagraphStyle, ParsedFragment};

pub use selector::SelectorEngine;
pub use tree::TreeEngine;

pub(crate) const TITLE_CLASS: &str = "SubDebate-H";
pub(crate) const SUBTITLE_CLASS: &str = "SubSubDebate-H";
pub(crate) const SPEAKER_CLASSES: [&str; 3] = ["MemberSpeech-H", "MemberUpper-H", "OfficeUpper-H"];
pub(crate) const TIME_CLASS: &str = "Time-H";

const PLAIN_CLASS: &str = "Normal-P";
const BOLD_CLASS: &str = "NormalBold-P";
const ITALIC_CLASS: &str = "NormalItalics-P";

/// Turns fragment markup into title, subtitle and blocks. Every implementation
/// must produce identical output for identical input.
pub trait FragmentEngine: Send + Sync {
    fn name(&self) -> &'static str;
    fn parse(&self, html: &str) -> Result<ParsedFragment, ParseError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ParseEngine {
    /// CSS selectors over the parsed fragment.
    #[default]
    Selector,
    /// Hand-written class walk over the parsed fragment.
    Tree,
}

impl ParseEngine {
    pub const ALL: [ParseEngine; 2] = [ParseEngine::Selector, ParseEngine::Tree];

    pub fn engine(self) -> &'static dyn FragmentEngine {
        match self {
            Self::Selector => &SelectorEngine,
            Self::Tree => &TreeEngine,
        }
    }

    pub fn parse(self, html: &str) -> Result<ParsedFragment, ParseError> {
        self.engine().parse(html)
    }

    pub fn as_str(self) -> &'static str {
        self.engine().name()
    }
}

/// What a `<p>` element contributes to the block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParagraphRole {
    Speech,
    Body(ParagraphStyle),
    Skip,
}

pub(crate) fn classify_paragraph(
    classes: &[&str],
    contains_speaker: bool,
) -> ParagraphRole {
    if contains_speaker {
        return ParagraphRole::Speech;
    }
    let has = |name: &str| classes.iter().any(|c| *c == name);
    if has(ITALIC_CLASS) {
        ParagraphRole::Body(ParagraphStyle::Italic)
    } else if has(BOLD_CLASS) {
        ParagraphRole::Body(ParagraphStyle::Bold)
    } else if has(PLAIN_CLASS) {
        ParagraphRole::Body(ParagraphStyle::Plain)
    } else {
        ParagraphRole::Skip
    }
}

pub(crate) fn has_class(el: &ElementRef<'_>, name: &str) -> bool {
    el.value().classes().any(|c| c == name)
}

pub(crate) fn is_speaker(el: &ElementRef<'_>) -> bool {
    SPEAKER_CLASSES.iter().any(|name| has_class(el, name))
}

/// Joins text runs with single spaces and collapses whitespace.
pub(crate) fn normalize_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in parts.into_iter().flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

pub(crate) fn ensure_markup(html: &str) -> Result<(), ParseError> {
    if html.trim().is_empty() || !html.contains('<') {
        return Err(ParseError::NotMarkup);
    }
    Ok(())
}
