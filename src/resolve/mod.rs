//! Song URL resolution.
//!
//! An ordered chain of independent strategies maps a normalized query to a
//! song page URL. Each strategy is best-effort: a miss or an error inside one
//! falls through to the next, and only exhaustion of the whole chain surfaces
//! to the caller.

use crate::config::{KnownSong, SiteConfig};
use crate::fetch::{FetchError, Fetcher};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no matching song page found")]
    NotFound,
    #[error("search failed: {0}")]
    Search(String),
}

/// One self-contained method of mapping a query to a candidate page URL.
/// Reordering the chain is a matter of editing `CHAIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    KnownTable,
    SearchApi,
    SearchPage,
    QueryVariants,
}

const CHAIN: [Strategy; 4] = [
    Strategy::KnownTable,
    Strategy::SearchApi,
    Strategy::SearchPage,
    Strategy::QueryVariants,
];

/// Outcome of one strategy attempt. `Miss` means the site was consulted and
/// genuinely had no match; `Skipped` means the strategy never applied (no
/// table entry); `Failed` is a transport-level error.
enum Attempt {
    Hit(String),
    Miss,
    Skipped,
    Failed(anyhow::Error),
}

fn attempt(result: anyhow::Result<Option<String>>) -> Attempt {
    match result {
        Ok(Some(url)) => Attempt::Hit(url),
        Ok(None) => Attempt::Miss,
        Err(e) => Attempt::Failed(e),
    }
}

pub struct Resolver<'a> {
    fetcher: &'a Fetcher,
    site: &'a SiteConfig,
    known: &'a [KnownSong],
}

impl<'a> Resolver<'a> {
    pub fn new(fetcher: &'a Fetcher, site: &'a SiteConfig, known: &'a [KnownSong]) -> Self {
        Self {
            fetcher,
            site,
            known,
        }
    }

    /// Run the strategy chain in fixed order; first success wins. A clean
    /// miss anywhere reads as "not found"; `Search` is returned only when
    /// the site was never successfully consulted — no strategy completed a
    /// lookup and at least one failed in transport.
    pub async fn resolve(&self, query: &str) -> Result<String, ResolveError> {
        let mut consulted = false;
        let mut last_error = None;

        for strategy in CHAIN {
            match self.run(strategy, query).await {
                Attempt::Hit(url) => {
                    debug!(?strategy, %url, "strategy hit");
                    return Ok(url);
                }
                Attempt::Miss => {
                    debug!(?strategy, "strategy miss");
                    consulted = true;
                }
                Attempt::Skipped => debug!(?strategy, "strategy not applicable"),
                Attempt::Failed(e) => {
                    debug!(?strategy, error = %e, "strategy error, falling through");
                    last_error = Some(e);
                }
            }
        }

        if !consulted
            && let Some(e) = last_error
        {
            return Err(ResolveError::Search(e.to_string()));
        }
        Err(ResolveError::NotFound)
    }

    async fn run(&self, strategy: Strategy, query: &str) -> Attempt {
        match strategy {
            Strategy::KnownTable => self.from_known_table(query).await,
            Strategy::SearchApi => attempt(self.from_search_api(query).await),
            Strategy::SearchPage => attempt(self.from_search_page(query).await),
            Strategy::QueryVariants => self.from_query_variants(query).await,
        }
    }

    /// Strategy 1: fixed pattern table, probed before acceptance so a stale
    /// entry degrades into a miss instead of a dead link. A rejecting status
    /// is a clean miss; a transport error is surfaced as such.
    async fn from_known_table(&self, query: &str) -> Attempt {
        let Some(entry) = match_known(self.known, query) else {
            return Attempt::Skipped;
        };
        let url = format!("{}{}", self.site.base_url, entry.path);
        match self.fetcher.probe(&url).await {
            Ok(()) => Attempt::Hit(url),
            Err(FetchError::Status(code)) => {
                debug!(%url, code, "known-table probe rejected");
                Attempt::Miss
            }
            Err(e) => Attempt::Failed(e.into()),
        }
    }

    /// Strategy 2: structured search API, first hit tagged as a song.
    async fn from_search_api(&self, query: &str) -> anyhow::Result<Option<String>> {
        let url = format!(
            "{}/api/search/song?per_page=5&q={}",
            self.site.base_url,
            urlencoding::encode(query)
        );
        let v = self.fetcher.json(&url).await?;
        Ok(song_path_from_search(&v).map(|p| self.absolutize(&p)))
    }

    /// Strategy 3: scan the rendered search results page for song anchors.
    async fn from_search_page(&self, query: &str) -> anyhow::Result<Option<String>> {
        let url = format!(
            "{}/search?q={}",
            self.site.base_url,
            urlencoding::encode(query)
        );
        let html = self.fetcher.text(&url).await?;
        Ok(scan_search_page(&html).map(|href| self.absolutize(&href)))
    }

    /// Strategy 4: rerun the page scan over a fixed list of query rewrites.
    /// Counts as a miss if any variant completed without a match; failed only
    /// when every variant fetch errored.
    async fn from_query_variants(&self, query: &str) -> Attempt {
        let mut consulted = false;
        let mut last_error = None;
        for variant in query_variants(query) {
            debug!(%variant, "trying query variant");
            match self.from_search_page(&variant).await {
                Ok(Some(url)) => return Attempt::Hit(url),
                Ok(None) => consulted = true,
                Err(e) => last_error = Some(e),
            }
        }
        if !consulted
            && let Some(e) = last_error
        {
            return Attempt::Failed(e);
        }
        Attempt::Miss
    }

    fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.site.base_url, href)
        }
    }
}

/// Substring match in either direction; first table entry wins, collisions
/// are accepted.
fn match_known<'s>(table: &'s [KnownSong], query: &str) -> Option<&'s KnownSong> {
    table.iter().find(|k| {
        let p = k.pattern.as_str();
        query == p || query.contains(p) || p.contains(query)
    })
}

/// Navigate the search API response: response → sections → the section tagged
/// "song" → hits[0] → result.path. Any shape mismatch is a miss, not an error.
fn song_path_from_search(v: &serde_json::Value) -> Option<String> {
    v.pointer("/response/sections")?
        .as_array()?
        .iter()
        .find(|s| s.get("type").and_then(|t| t.as_str()) == Some("song"))?
        .pointer("/hits/0/result/path")?
        .as_str()
        .map(|s| s.to_string())
}

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("anchor selector"));

/// Class-name substrings marking search result cards. An anchor inside one is
/// preferred over a bare first match anywhere on the page.
const CARD_CLASS_HINTS: [&str; 4] = ["search_result", "mini_card", "result", "card"];

/// Scan all anchors for song-shaped hrefs, preferring carded ones.
fn scan_search_page(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let mut bare = None;

    for a in doc.select(&ANCHOR) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        if !is_song_href(href) {
            continue;
        }
        if in_result_card(&a) {
            return Some(href.to_string());
        }
        if bare.is_none() {
            bare = Some(href.to_string());
        }
    }
    bare
}

/// A song page link has a `/songs/…` path; query string and fragment are
/// ignored when checking the shape.
fn is_song_href(href: &str) -> bool {
    let path = href
        .strip_prefix("https://")
        .or_else(|| href.strip_prefix("http://"))
        .and_then(|rest| rest.find('/').map(|i| &rest[i..]))
        .unwrap_or(href);
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.contains("/songs/")
}

fn in_result_card(a: &ElementRef<'_>) -> bool {
    a.ancestors().filter_map(ElementRef::wrap).any(|el| {
        el.value()
            .attr("class")
            .is_some_and(|c| CARD_CLASS_HINTS.iter().any(|hint| c.contains(hint)))
    })
}

/// Fixed rewrite list for the mutation fallback, tried in order: leading
/// "the" stripped, the common lowercase "beatles" spelling corrected, a
/// "lyrics" suffix, and the first token dropped.
fn query_variants(query: &str) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(rest) = query.strip_prefix("the ")
        && !rest.is_empty()
    {
        out.push(rest.to_string());
    }
    if query.contains("beatles") {
        out.push(query.replace("the beatles", "beatles").replace("beatles", "The Beatles"));
    }
    out.push(format!("{query} lyrics"));
    if let Some((_, rest)) = query.split_once(' ') {
        out.push(rest.to_string());
    }
    out
}
