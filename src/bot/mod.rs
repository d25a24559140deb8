//! Request orchestration and user-facing message texts.
//!
//! The chat platform is an external collaborator: this module exposes
//! `handle_query`, which turns one inbound free-text query into the ordered
//! outbound blocks the dispatch layer should deliver. Every failure path
//! yields a short specific chat message; nothing propagates upward.

use crate::config::Config;
use crate::extract::{self, LyricsRecord};
use crate::fetch::Fetcher;
use crate::query;
use crate::render;
use crate::resolve::{ResolveError, Resolver};
use crate::translate::LibreTranslator;
use std::time::Duration;
use tracing::error;

/// Sent by the dispatch layer when the pipeline itself cannot be run; the
/// underlying cause is logged, never shown to the user.
pub const GENERIC_ERROR_MSG: &str = "❌ Произошла ошибка. Попробуйте позже.";

const EMPTY_QUERY_MSG: &str = "Пожалуйста, укажите название песни и исполнителя.";
const NOT_FOUND_MSG: &str = "❌ Песня не найдена. Попробуйте изменить запрос.";
const LYRICS_NOT_FOUND_MSG: &str = "❌ Текст песни не найден.";
const PAGE_FETCH_MSG: &str = "❌ Не удалось загрузить страницу песни. Попробуйте позже.";

pub struct App {
    cfg: Config,
    fetcher: Fetcher,
    translator: LibreTranslator,
}

impl App {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let fetcher = Fetcher::new(
            Duration::from_secs(cfg.site.page_timeout_secs),
            Duration::from_secs(cfg.site.probe_timeout_secs),
        )?;
        let translator = LibreTranslator::new(&cfg.translator)?;
        Ok(Self {
            cfg: cfg.clone(),
            fetcher,
            translator,
        })
    }

    /// Full pipeline for one inbound query: normalize, resolve, fetch,
    /// extract, render.
    pub async fn handle_query(&self, text: &str) -> Vec<String> {
        let query = query::normalize(text);
        if query.is_empty() {
            return vec![EMPTY_QUERY_MSG.to_string()];
        }
        match self.lookup(&query).await {
            Ok(record) => render::render(&record, &self.translator).await,
            Err(message) => vec![message],
        }
    }

    async fn lookup(&self, query: &str) -> Result<LyricsRecord, String> {
        let url = self.resolve(query).await.map_err(|e| match e {
            ResolveError::NotFound => NOT_FOUND_MSG.to_string(),
            ResolveError::Search(detail) => {
                error!(%detail, "song search failed");
                format!("❌ Ошибка при поиске: {detail}")
            }
        })?;

        let html = self.fetcher.text(&url).await.map_err(|e| {
            error!(%url, error = %e, "song page fetch failed");
            PAGE_FETCH_MSG.to_string()
        })?;

        extract::extract(&html, &url).map_err(|_| LYRICS_NOT_FOUND_MSG.to_string())
    }

    /// Headless resolution, used by the CLI.
    pub async fn resolve(&self, query: &str) -> Result<String, ResolveError> {
        Resolver::new(&self.fetcher, &self.cfg.site, &self.cfg.known_songs)
            .resolve(query)
            .await
    }

    /// Headless fetch-and-extract for an already known page URL.
    pub async fn extract_page(&self, url: &str) -> anyhow::Result<LyricsRecord> {
        let html = self
            .fetcher
            .text(url)
            .await
            .map_err(|e| anyhow::anyhow!("fetch {url}: {e}"))?;
        Ok(extract::extract(&html, url)?)
    }
}

pub fn welcome_text() -> &'static str {
    "🎵 Добро пожаловать в Lyrics Bot!\n\n\
     Я помогу найти текст любой песни с Genius.com и переведу его построчно.\n\n\
     Как использовать:\n\
     • Просто напишите название песни и исполнителя\n\
     • Например: \"Bohemian Rhapsody Queen\" или \"Imagine John Lennon\""
}

pub fn help_text() -> &'static str {
    "📖 Справка по использованию\n\n\
     🔍 Поиск текста песни:\n\
     Отправьте название песни и исполнителя в любом формате.\n\n\
     Примеры запросов:\n\
     • \"Bohemian Rhapsody Queen\"\n\
     • \"Imagine John Lennon\"\n\
     • \"Yesterday Beatles\"\n\
     • \"Hotel California Eagles\"\n\n\
     ⚠️ Важно:\n\
     • Указывайте название песни и исполнителя для лучшего поиска\n\
     • Если песня не найдена, попробуйте изменить запрос\n\n\
     🔄 Если нет ответа, попробуйте позже — сайт может быть временно недоступен."
}
