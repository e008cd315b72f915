use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::{
    FragmentEngine, ParagraphRole, SPEAKER_CLASSES, SUBTITLE_CLASS, TIME_CLASS, TITLE_CLASS,
    classify_paragraph, ensure_markup, normalize_text,
};
use crate::error::ParseError;
use crate::formats::{ContentBlock, ParsedFragment};

static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector(&format!("p.{TITLE_CLASS}")));
static SUBTITLE: LazyLock<Selector> = LazyLock::new(|| selector(&format!("p.{SUBTITLE_CLASS}")));
static SPEAKER: LazyLock<Selector> = LazyLock::new(|| {
    let list = SPEAKER_CLASSES
        .iter()
        .map(|class| format!(".{class}"))
        .collect::<Vec<_>>()
        .join(", ");
    selector(&list)
});
static TIME: LazyLock<Selector> = LazyLock::new(|| selector(&format!(".{TIME_CLASS}")));

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|err| panic!("invalid built-in selector {css:?}: {err}"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorEngine;

impl FragmentEngine for SelectorEngine {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn parse(&self, html: &str) -> Result<ParsedFragment, ParseError> {
        ensure_markup(html)?;
        let fragment = Html::parse_fragment(html);
        // Scoped to the root element so matches come back in document order.
        let root = fragment.root_element();

        let title = root.select(&TITLE).next().map(|el| element_text(&el));
        let subtitle = root.select(&SUBTITLE).next().map(|el| element_text(&el));

        let mut blocks = Vec::new();
        for paragraph in root.select(&PARAGRAPH) {
            let speaker = paragraph.select(&SPEAKER).next();
            let classes = paragraph.value().classes().collect::<Vec<_>>();

            match classify_paragraph(&classes, speaker.is_some()) {
                ParagraphRole::Speech => {
                    let Some(speaker) = speaker else {
                        continue;
                    };
                    let time = paragraph.select(&TIME).next();
                    blocks.push(ContentBlock::Speech {
                        speaker: element_text(&speaker),
                        time: time.map(|el| element_text(&el)),
                        text: speech_text(&paragraph),
                    });
                }
                ParagraphRole::Body(style) => blocks.push(ContentBlock::Paragraph {
                    style,
                    text: element_text(&paragraph),
                }),
                ParagraphRole::Skip => {}
            }
        }

        Ok(ParsedFragment {
            title,
            subtitle,
            blocks,
        })
    }
}

fn element_text(el: &ElementRef<'_>) -> String {
    normalize_text(el.text())
}

/// Paragraph text minus everything inside speaker and time markers.
fn speech_text(paragraph: &ElementRef<'_>) -> String {
    let excluded = paragraph
        .select(&SPEAKER)
        .chain(paragraph.select(&TIME))
        .map(|el| (*el).id())
        .collect::<Vec<_>>();

    let parts = paragraph.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let inside_excluded = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != (**paragraph).id())
            .any(|ancestor| excluded.contains(&ancestor.id()));
        (!inside_excluded).then_some(&**text)
    });
    normalize_text(parts)
}
