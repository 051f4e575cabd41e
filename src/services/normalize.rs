// src/services/normalize.rs

//! First-post content normalization.
//!
//! Reduces a raw topic page to a canonical text suitable for hashing:
//! the first-post region delimited by known markup markers, with dynamic
//! noise (view counters, CSRF tokens, session ids, the SQL-timing footer)
//! stripped out. Two fetches of unchanged upstream content must normalize
//! to byte-identical text.

use std::sync::LazyLock;

use regex::Regex;

/// Opening tag of the first-post body.
const START_MARKER: &str = r#"<div class="content">"#;

/// First block following the post body.
const END_MARKER: &str = r#"<div class="back2top">"#;

/// Picture view counters: `) 14 просмотров`, `) 1 просмотр`, `) 2 просмотра`.
static VIEW_COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\) \d+ просмотр(?:а|ов)?").expect("valid regex"));

/// Volatile markup: form tokens, session ids and the timing footer.
static VOLATILE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"value="\S{10}""#,
        r#"value="\S{32}""#,
        r#"value="\S{40}""#,
        r"sid=\S{32}&amp;",
        r#"<span class="footer-info"><span title="SQL time:.{120,130}</span></span>"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Result of normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Canonical text
    pub text: String,

    /// True when a delimiter marker was missing and the output is a
    /// best-effort slice rather than the exact first-post region.
    pub degraded: bool,
}

/// Normalize a raw topic page into canonical first-post text.
///
/// Missing markers are an explicit degraded case: the anomaly is logged and
/// the available slice is returned as-is, never blind offset arithmetic.
pub fn normalize(raw: &str) -> Normalized {
    let mut degraded = false;

    let region = match raw.find(START_MARKER) {
        Some(ix) => &raw[ix + START_MARKER.len()..],
        None => {
            log::warn!("normalize: start marker not found, keeping full page");
            degraded = true;
            raw
        }
    };

    let mut text = match region.find(END_MARKER) {
        Some(ix) => {
            let mut slice = region[..ix].to_string();
            // Drop the wrapper closure that sits between the post body and
            // the end marker, then anything past the final tag.
            if let Some(div) = slice.rfind("</div>") {
                slice.truncate(div);
            }
            if let Some(gt) = slice.rfind('>') {
                slice.truncate(gt + 1);
            }
            slice
        }
        None => {
            log::warn!("normalize: end marker not found, keeping tail");
            degraded = true;
            region.to_string()
        }
    };

    text = VIEW_COUNTER.replace_all(&text, ")").into_owned();
    for pattern in VOLATILE.iter() {
        text = pattern.replace_all(&text, "").into_owned();
    }

    Normalized { text, degraded }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!(
            "<html><body><div class=\"content\">{}</div>\n<div class=\"back2top\">top</div></body></html>",
            body
        )
    }

    #[test]
    fn extracts_first_post_region() {
        let raw = page("<p>Пропал человек</p>");
        let result = normalize(&raw);
        assert!(!result.degraded);
        assert_eq!(result.text, "<p>Пропал человек</p>");
    }

    #[test]
    fn missing_start_marker_degrades() {
        let raw = "<html><body>no markers here</body></html>";
        let result = normalize(raw);
        assert!(result.degraded);
        assert_eq!(result.text, raw);
    }

    #[test]
    fn missing_end_marker_degrades_to_tail() {
        let raw = "<div class=\"content\"><p>text</p>";
        let result = normalize(raw);
        assert!(result.degraded);
        assert_eq!(result.text, "<p>text</p>");
    }

    #[test]
    fn strips_view_counters() {
        let raw = page("<p>фото (ул. Ленина) 17 просмотров</p>");
        assert_eq!(normalize(&raw).text, "<p>фото (ул. Ленина)</p>");

        let raw = page("<p>(фото) 1 просмотр</p>");
        assert_eq!(normalize(&raw).text, "<p>(фото)</p>");

        let raw = page("<p>(фото) 2 просмотра</p>");
        assert_eq!(normalize(&raw).text, "<p>(фото)</p>");
    }

    #[test]
    fn strips_volatile_tokens() {
        let token32 = "a".repeat(32);
        let raw = page(&format!(
            "<input value=\"{}\"/><a href=\"./f?sid={}&amp;t=1\">x</a>",
            token32, token32
        ));
        let result = normalize(&raw);
        assert!(!result.text.contains(&token32));
    }

    #[test]
    fn noise_only_change_normalizes_identically() {
        let a = page("<p>текст (фото) 10 просмотров <input value=\"aaaaaaaaaa\"/></p>");
        let b = page("<p>текст (фото) 11 просмотров <input value=\"bbbbbbbbbb\"/></p>");
        assert_eq!(normalize(&a).text, normalize(&b).text);
    }

    #[test]
    fn idempotent_over_own_output() {
        let raw = page("<p>Иванов Иван (фото) 3 просмотра</p><div><p>ещё</p></div>");
        let once = normalize(&raw);
        let twice = normalize(&once.text);
        assert_eq!(once.text, twice.text);
    }
}
