//! Lyrics extraction from a fetched song page.
//!
//! The lyrics site rearranges its markup regularly, so the body is located by
//! an ordered chain of structural heuristics, from the explicit container
//! attribute down to a paragraph-concatenation fallback. Each heuristic is a
//! pure `&Html -> Option<String>` probe.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

/// Used when the page carries no usable heading. Missing titles are never a
/// hard failure.
pub const FALLBACK_TITLE: &str = "Неизвестная песня";

/// Minimum text length for the structural-keyword heuristic.
const KEYWORD_BLOCK_MIN_CHARS: usize = 100;

/// Minimum text length for a paragraph picked up by the fallback heuristic.
const PARAGRAPH_MIN_CHARS: usize = 10;

/// Lowercase markers that distinguish song text from unrelated long blocks.
const SONG_KEYWORDS: [&str; 4] = ["verse", "chorus", "bridge", "refrain"];

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no lyrics body recognized on the page")]
    LyricsNotFound,
}

/// The (title, lyrics, source URL) triple handed to the renderer.
#[derive(Debug, Clone)]
pub struct LyricsRecord {
    pub title: String,
    pub lyrics: String,
    pub url: String,
}

static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("heading selector"));
static FLAGGED: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[data-lyrics-container="true"]"#).expect("flagged container selector")
});
static CLASS_HINT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="lyric"], [class*="Lyric"]"#).expect("class hint selector")
});
static BLOCK_ELEMENTS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div, section, article").expect("block selector"));
static CONTENT_ROOT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("main, article, body").expect("content root selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("paragraph selector"));

const HEURISTICS: [fn(&Html) -> Option<String>; 4] = [
    flagged_container,
    class_hint_container,
    keyword_block,
    paragraph_fallback,
];

/// Extract title and lyrics body from a song page. Heuristics run in order
/// until one yields non-empty text; the body is then normalized so that no
/// run of more than one blank line remains.
pub fn extract(html: &str, url: &str) -> Result<LyricsRecord, ExtractError> {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&HEADING)
        .next()
        .map(|h| h.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    for probe in HEURISTICS {
        if let Some(body) = probe(&doc) {
            let lyrics = collapse_blank_runs(&body);
            if !lyrics.is_empty() {
                return Ok(LyricsRecord {
                    title,
                    lyrics,
                    url: url.to_string(),
                });
            }
        }
    }
    Err(ExtractError::LyricsNotFound)
}

/// Heuristic 1: containers explicitly flagged with `data-lyrics-container`.
fn flagged_container(doc: &Html) -> Option<String> {
    collect_containers(doc, &FLAGGED)
}

/// Heuristic 2: containers whose class mentions lyrics in any casing.
fn class_hint_container(doc: &Html) -> Option<String> {
    collect_containers(doc, &CLASS_HINT)
}

fn collect_containers(doc: &Html, selector: &Selector) -> Option<String> {
    let parts: Vec<String> = doc
        .select(selector)
        .map(|el| text_with_breaks(&el))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Heuristic 3: any long block element whose text mentions a structural song
/// keyword. The keyword guard keeps unrelated long prose out.
fn keyword_block(doc: &Html) -> Option<String> {
    for el in doc.select(&BLOCK_ELEMENTS) {
        let text = text_with_breaks(&el);
        let trimmed = text.trim();
        if trimmed.chars().count() <= KEYWORD_BLOCK_MIN_CHARS {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if SONG_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return Some(trimmed.to_string());
        }
    }
    None
}

/// Heuristic 4: concatenate the main content region's longer paragraphs.
fn paragraph_fallback(doc: &Html) -> Option<String> {
    let root = doc.select(&CONTENT_ROOT).next()?;
    let parts: Vec<String> = root
        .select(&PARAGRAPH)
        .map(|p| text_with_breaks(&p))
        .map(|t| t.trim().to_string())
        .filter(|t| t.chars().count() > PARAGRAPH_MIN_CHARS)
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// Element text with `<br>` rendered as a newline and block children ending
/// one. scraper's own `.text()` drops both, which destroys the line structure
/// lyrics markup relies on.
fn text_with_breaks(el: &ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(el, &mut out);
    out
}

fn push_text(el: &ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) if e.name() == "br" => out.push('\n'),
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    push_text(&child_ref, out);
                    if is_block_tag(child_ref.value().name()) {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "p" | "div" | "section" | "article" | "li" | "h1" | "h2" | "h3"
    )
}

/// Trim every line, collapse runs of two or more blank lines to exactly one,
/// and drop leading/trailing blanks.
pub fn collapse_blank_runs(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_pending = false;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_pending = !out.is_empty();
        } else {
            if blank_pending {
                out.push("");
                blank_pending = false;
            }
            out.push(line);
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://genius.com/Queen-bohemian-rhapsody-lyrics";

    #[test]
    fn flagged_container_wins() {
        let html = r#"
            <html><body>
              <h1> Bohemian Rhapsody </h1>
              <div class="lyrics-sidebar">ad copy that must not win</div>
              <div data-lyrics-container="true">Is this the real life?<br>Is this just fantasy?</div>
            </body></html>
        "#;
        let rec = extract(html, URL).unwrap();
        assert_eq!(rec.title, "Bohemian Rhapsody");
        assert_eq!(rec.lyrics, "Is this the real life?\nIs this just fantasy?");
        assert_eq!(rec.url, URL);
    }

    #[test]
    fn blank_runs_collapse_to_one() {
        let html = r#"<div data-lyrics-container="true">Line one<br><br><br>Line two</div>"#;
        let rec = extract(html, URL).unwrap();
        assert_eq!(rec.lyrics, "Line one\n\nLine two");
    }

    #[test]
    fn class_hint_used_when_no_flagged_container() {
        let html = r#"
            <html><body>
              <div class="Lyrics__Container-sc-1ynbvzw-1">Mama, just killed a man</div>
            </body></html>
        "#;
        let rec = extract(html, URL).unwrap();
        assert_eq!(rec.lyrics, "Mama, just killed a man");
    }

    #[test]
    fn keyword_block_needs_length_and_keyword() {
        let long_prose = "word ".repeat(40);
        let html = format!(
            r#"<html><body>
                 <section>{long_prose}</section>
                 <section>[Chorus] So you think you can stone me and spit in my eye {long_prose}</section>
               </body></html>"#
        );
        let rec = extract(&html, URL).unwrap();
        assert!(rec.lyrics.contains("Chorus"));

        // Long text without any structural keyword must not match.
        let html = format!("<html><body><section>{long_prose}</section></body></html>");
        assert!(extract(&html, URL).is_err());
    }

    #[test]
    fn paragraph_fallback_joins_long_paragraphs() {
        let html = r#"
            <html><body><main>
              <p>ok</p>
              <p>Is this the real life?</p>
              <p>Is this just fantasy?</p>
            </main></body></html>
        "#;
        let rec = extract(html, URL).unwrap();
        assert_eq!(rec.lyrics, "Is this the real life?\n\nIs this just fantasy?");
    }

    #[test]
    fn missing_title_uses_placeholder() {
        let html = r#"<div data-lyrics-container="true">Some line</div>"#;
        let rec = extract(html, URL).unwrap();
        assert_eq!(rec.title, FALLBACK_TITLE);
    }

    #[test]
    fn no_lyrics_anywhere_is_a_failure() {
        let err = extract("<html><body><h1>404</h1></body></html>", URL).unwrap_err();
        assert!(matches!(err, ExtractError::LyricsNotFound));
    }

    #[test]
    fn collapse_is_idempotent_and_trims() {
        assert_eq!(collapse_blank_runs("Line one\n\n\nLine two"), "Line one\n\nLine two");
        assert_eq!(collapse_blank_runs("\n\n  a  \n\n\n\n b \n\n"), "a\n\nb");
        let once = collapse_blank_runs("x\n\n\ny");
        assert_eq!(collapse_blank_runs(&once), once);
    }

    #[test]
    fn nested_markup_keeps_line_structure() {
        let html = r#"<div data-lyrics-container="true"><a href="/annotation">Is this the real life?</a><br><i>Is this just fantasy?</i></div>"#;
        let rec = extract(html, URL).unwrap();
        assert_eq!(rec.lyrics, "Is this the real life?\nIs this just fantasy?");
    }
}
