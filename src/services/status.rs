// src/services/status.rs

//! Lifecycle status inference from topic titles.
//!
//! The title is extracted with a two-stage pattern match on the raw page
//! (the forum markup is stable enough that a full HTML parser is not
//! worth the weight). Titles that do not match the expected shape are
//! skipped silently; this is not an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::SearchStatus;

/// Title heading block, bounded to keep backtracking cheap.
static TITLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<h2 class="topic-title"><a href=.{1,500}</a>"#).expect("valid regex"));

/// Anchor text inside the heading block.
static TITLE_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"">(.{1,500})</a>"#).expect("valid regex"));

/// Byte length of `<h2 class="topic-title"><a href=`, skipped before the
/// inner match so the href value cannot shadow the anchor text.
const TITLE_PREFIX_LEN: usize = 32;

static RE_SEARCHING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)пропал").expect("valid regex"));
static RE_ALIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:(?:найден)?.{0,5}жив|\bнж\b)").expect("valid regex"));
static RE_DECEASED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:(?:найден)?.{0,5}пог|\bнп\b)").expect("valid regex"));
static RE_COMPLETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)заверш[её]н").expect("valid regex"));

/// Extract the topic title from a raw page, if it matches the expected shape.
pub fn extract_title(content: &str) -> Option<String> {
    let block = TITLE_BLOCK.find(content)?.as_str();
    let tail = block.get(TITLE_PREFIX_LEN..)?;
    let caps = TITLE_TEXT.captures(tail)?;
    Some(caps[1].to_string())
}

/// Classify a title with ordered, case-insensitive rules; first match wins.
pub fn classify_title(title: &str) -> Option<SearchStatus> {
    if RE_SEARCHING.is_match(title) {
        Some(SearchStatus::Searching)
    } else if RE_ALIVE.is_match(title) {
        Some(SearchStatus::FoundAlive)
    } else if RE_DECEASED.is_match(title) {
        Some(SearchStatus::FoundDeceased)
    } else if RE_COMPLETED.is_match(title) {
        Some(SearchStatus::Completed)
    } else {
        None
    }
}

/// Extract the title from a raw page and classify it.
pub fn classify_status(content: &str) -> Option<SearchStatus> {
    classify_title(&extract_title(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str) -> String {
        format!(
            "<h2 class=\"topic-title\"><a href=\"./viewtopic.php?t=1\">{}</a></h2>",
            title
        )
    }

    #[test]
    fn extracts_title_from_heading() {
        let raw = page("Иванов Иван, 45 лет, г. Москва");
        assert_eq!(
            extract_title(&raw).as_deref(),
            Some("Иванов Иван, 45 лет, г. Москва")
        );
    }

    #[test]
    fn malformed_heading_yields_none() {
        assert_eq!(extract_title("<h2>plain heading</h2>"), None);
        assert_eq!(classify_status("<h2>plain heading</h2>"), None);
    }

    #[test]
    fn missing_person_is_searching() {
        assert_eq!(
            classify_title("Иванов Иван, 45, пропал"),
            Some(SearchStatus::Searching)
        );
        assert_eq!(
            classify_title("ПРОПАЛА Петрова Анна"),
            Some(SearchStatus::Searching)
        );
    }

    #[test]
    fn found_alive_variants() {
        assert_eq!(
            classify_title("Найден, жив Иванов Иван"),
            Some(SearchStatus::FoundAlive)
        );
        assert_eq!(
            classify_title("Иванов Иван, 45 НЖ"),
            Some(SearchStatus::FoundAlive)
        );
        assert_eq!(
            classify_title("Жива Петрова Анна"),
            Some(SearchStatus::FoundAlive)
        );
    }

    #[test]
    fn found_deceased_variants() {
        assert_eq!(
            classify_title("Найден, погиб Иванов Иван"),
            Some(SearchStatus::FoundDeceased)
        );
        assert_eq!(
            classify_title("Иванов Иван, 45 НП"),
            Some(SearchStatus::FoundDeceased)
        );
    }

    #[test]
    fn completed_matches_both_spellings() {
        assert_eq!(
            classify_title("Завершён Иванов Иван"),
            Some(SearchStatus::Completed)
        );
        assert_eq!(
            classify_title("ЗАВЕРШЕН Иванов Иван"),
            Some(SearchStatus::Completed)
        );
    }

    #[test]
    fn searching_rule_wins_over_later_rules() {
        // "пропал" present means the search is still on, whatever else the
        // title mentions.
        assert_eq!(
            classify_title("Пропал Иванов (завершён сбор)"),
            Some(SearchStatus::Searching)
        );
    }

    #[test]
    fn unrecognized_title_is_none() {
        assert_eq!(classify_title("Обсуждение экипировки"), None);
    }

    #[test]
    fn full_page_classification() {
        let raw = page("Найдена, жива Сидорова Мария");
        assert_eq!(classify_status(&raw), Some(SearchStatus::FoundAlive));
    }
}
