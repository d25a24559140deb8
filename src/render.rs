//! Bilingual rendering and message packing.
//!
//! Each lyrics line is paired with its translation into a "bilingual block",
//! blocks are joined with blank lines, and the whole thing is packed into
//! messages under the delivery channel's hard size limit.

use crate::extract::LyricsRecord;
use crate::translate::Translate;
use tracing::debug;

/// Hard per-message limit of the delivery channel, in characters.
pub const MAX_MESSAGE_LEN: usize = 4000;

/// Lines this short (language tags, "Oh", "Hi") are not worth a round trip
/// to the translator.
const MIN_TRANSLATE_LEN: usize = 3;

/// Render a lyrics record as an ordered sequence of outbound messages, each
/// at most [`MAX_MESSAGE_LEN`] characters.
pub async fn render<T: Translate>(record: &LyricsRecord, translator: &T) -> Vec<String> {
    let blocks = bilingual_blocks(&record.lyrics, translator).await;
    pack_messages(&record.title, &blocks, &record.url)
}

/// One block per non-blank source line: `"{src}\n{ru}"` when translation
/// succeeded and differs from the source, the bare source line otherwise.
/// Per-line translator failures are swallowed; a failing line never aborts
/// the whole rendering.
async fn bilingual_blocks<T: Translate>(lyrics: &str, translator: &T) -> Vec<String> {
    let mut blocks = Vec::new();
    for line in lyrics.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.chars().count() > MIN_TRANSLATE_LEN {
            match translator.translate_line(line).await {
                Ok(translated) if !translated.is_empty() && translated != line => {
                    blocks.push(format!("{line}\n{translated}"));
                    continue;
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "translation failed, keeping source line"),
            }
        }
        blocks.push(line.to_string());
    }
    blocks
}

/// Greedy packing. Blocks are never split across messages; a message is
/// closed as soon as the next block plus separator would push it past the
/// limit. A single block longer than the limit ships as an oversized message.
fn pack_messages(title: &str, blocks: &[String], url: &str) -> Vec<String> {
    let header = format!("🎵 {title}\n\n");
    let single = format!("{header}{}\n\n🔗 {url}", blocks.join("\n\n"));
    if single.chars().count() <= MAX_MESSAGE_LEN {
        return vec![single];
    }

    let mut parts: Vec<String> = Vec::new();
    let mut current = header;
    for block in blocks {
        let chunk = format!("{block}\n\n");
        if current.chars().count() + chunk.chars().count() > MAX_MESSAGE_LEN {
            parts.push(current);
            current = format!("📄 Часть {}:\n{chunk}", parts.len() + 1);
        } else {
            current.push_str(&chunk);
        }
    }
    parts.push(current);
    parts.push(format!("🔗 Полный текст: {url}"));
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://genius.com/John-lennon-imagine-lyrics";

    fn record(lyrics: &str) -> LyricsRecord {
        LyricsRecord {
            title: "Imagine".to_string(),
            lyrics: lyrics.to_string(),
            url: URL.to_string(),
        }
    }

    /// Always differs from the source (pretend French, lowercased).
    struct FrenchLower;
    impl Translate for FrenchLower {
        async fn translate_line(&self, text: &str) -> anyhow::Result<String> {
            Ok(format!("fr: {}", text.to_lowercase()))
        }
    }

    /// Parrots the source back, i.e. "translation" that must be dropped.
    struct Echo;
    impl Translate for Echo {
        async fn translate_line(&self, text: &str) -> anyhow::Result<String> {
            Ok(text.to_string())
        }
    }

    struct AlwaysFails;
    impl Translate for AlwaysFails {
        async fn translate_line(&self, _text: &str) -> anyhow::Result<String> {
            anyhow::bail!("translator down")
        }
    }

    #[tokio::test]
    async fn qualifying_lines_become_two_line_blocks() {
        let rec = record("Hi\nThis is a longer line");
        let messages = render(&rec, &FrenchLower).await;
        assert_eq!(messages.len(), 1);
        let msg = &messages[0];
        // "Hi" is too short to translate, stays single.
        assert!(msg.contains("\n\nHi\n\n"));
        assert!(msg.contains("This is a longer line\nfr: this is a longer line"));
    }

    #[tokio::test]
    async fn identical_translation_is_dropped() {
        let rec = record("Imagine there's no heaven");
        let messages = render(&rec, &Echo).await;
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].contains("Imagine there's no heaven\nImagine there's no heaven"));
    }

    #[tokio::test]
    async fn translator_failure_keeps_source_lines() {
        let rec = record("Imagine there's no heaven\nIt's easy if you try");
        let messages = render(&rec, &AlwaysFails).await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Imagine there's no heaven"));
        assert!(messages[0].contains("It's easy if you try"));
    }

    #[tokio::test]
    async fn single_message_layout() {
        let rec = record("Imagine there's no heaven");
        let messages = render(&rec, &AlwaysFails).await;
        assert_eq!(messages.len(), 1);
        let msg = &messages[0];
        assert!(msg.starts_with("🎵 Imagine\n\n"));
        assert!(msg.contains("Imagine there's no heaven"));
        assert!(msg.ends_with(&format!("🔗 {URL}")));
    }

    #[tokio::test]
    async fn oversized_body_is_split_losslessly() {
        // 200 distinct 30+-char lines, no translation: far past one message.
        let lyrics = (0..200)
            .map(|i| format!("Line {i:03} of a fairly long chorus"))
            .collect::<Vec<_>>()
            .join("\n");
        let rec = record(&lyrics);
        let messages = render(&rec, &Echo).await;

        assert!(messages.len() >= 3, "expected parts plus url message");
        for msg in &messages {
            assert!(msg.chars().count() <= MAX_MESSAGE_LEN, "message over limit");
        }

        let last = messages.last().unwrap();
        assert!(last.starts_with("🔗 Полный текст:"));
        assert!(messages[0].starts_with("🎵 Imagine\n\n"));
        for (i, msg) in messages[1..messages.len() - 1].iter().enumerate() {
            assert!(msg.starts_with(&format!("📄 Часть {}:\n", i + 2)));
        }

        // Concatenation minus headers reconstructs every block in order.
        let mut body = String::new();
        for (i, msg) in messages[..messages.len() - 1].iter().enumerate() {
            let stripped = if i == 0 {
                msg.strip_prefix("🎵 Imagine\n\n").unwrap()
            } else {
                let (_, rest) = msg.split_once('\n').unwrap();
                rest
            };
            body.push_str(stripped);
        }
        let lines: Vec<&str> = body.split("\n\n").filter(|s| !s.is_empty()).collect();
        assert_eq!(lines.len(), 200);
        assert_eq!(lines[0], "Line 000 of a fairly long chorus");
        assert_eq!(lines[199], "Line 199 of a fairly long chorus");
    }
}
