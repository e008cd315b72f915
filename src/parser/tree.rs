use scraper::{ElementRef, Html};

use super::{
    FragmentEngine, ParagraphRole, SUBTITLE_CLASS, TIME_CLASS, TITLE_CLASS, classify_paragraph,
    ensure_markup, has_class, is_speaker, normalize_text,
};
use crate::error::ParseError;
use crate::formats::{ContentBlock, ParsedFragment};

#[derive(Debug, Clone, Copy, Default)]
pub struct TreeEngine;

impl FragmentEngine for TreeEngine {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn parse(&self, html: &str) -> Result<ParsedFragment, ParseError> {
        ensure_markup(html)?;
        let fragment = Html::parse_fragment(html);

        let mut paragraphs = Vec::new();
        collect_paragraphs(fragment.root_element(), &mut paragraphs);

        let mut parsed = ParsedFragment::default();
        for paragraph in paragraphs {
            if parsed.title.is_none() && has_class(&paragraph, TITLE_CLASS) {
                parsed.title = Some(text_of(paragraph, &|_| false));
            }
            if parsed.subtitle.is_none() && has_class(&paragraph, SUBTITLE_CLASS) {
                parsed.subtitle = Some(text_of(paragraph, &|_| false));
            }

            let speaker = find_first(paragraph, &is_speaker);
            let classes = paragraph.value().classes().collect::<Vec<_>>();
            match classify_paragraph(&classes, speaker.is_some()) {
                ParagraphRole::Speech => {
                    let Some(speaker) = speaker else {
                        continue;
                    };
                    let time = find_first(paragraph, &|el| has_class(el, TIME_CLASS));
                    let marker = |el: &ElementRef<'_>| is_speaker(el) || has_class(el, TIME_CLASS);
                    parsed.blocks.push(ContentBlock::Speech {
                        speaker: text_of(speaker, &|_| false),
                        time: time.map(|el| text_of(el, &|_| false)),
                        text: text_of(paragraph, &marker),
                    });
                }
                ParagraphRole::Body(style) => parsed.blocks.push(ContentBlock::Paragraph {
                    style,
                    text: text_of(paragraph, &|_| false),
                }),
                ParagraphRole::Skip => {}
            }
        }

        Ok(parsed)
    }
}

fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

fn collect_paragraphs<'a>(el: ElementRef<'a>, out: &mut Vec<ElementRef<'a>>) {
    if el.value().name() == "p" {
        out.push(el);
    }
    for child in child_elements(el) {
        collect_paragraphs(child, out);
    }
}

/// First strict descendant of `el` (pre-order) matching `pred`.
fn find_first<'a>(
    el: ElementRef<'a>,
    pred: &dyn Fn(&ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    for child in child_elements(el) {
        if pred(&child) {
            return Some(child);
        }
        if let Some(found) = find_first(child, pred) {
            return Some(found);
        }
    }
    None
}

fn text_of<'a>(el: ElementRef<'a>, skip: &dyn Fn(&ElementRef<'a>) -> bool) -> String {
    let mut parts = Vec::new();
    collect_text(el, skip, &mut parts);
    normalize_text(parts)
}

fn collect_text<'a>(
    el: ElementRef<'a>,
    skip: &dyn Fn(&ElementRef<'a>) -> bool,
    out: &mut Vec<&'a str>,
) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push(&**text);
        } else if let Some(child_el) = ElementRef::wrap(child)
            && !skip(&child_el)
        {
            collect_text(child_el, skip, out);
        }
    }
}
