// src/services/visibility.rs

//! Topic visibility classification.
//!
//! Scans raw page content for forum marker phrases. A gateway-error marker
//! short-circuits everything else: the topic is transiently unreachable and
//! no visibility record must be persisted for it.

use crate::models::TopicVisibility;

/// Upstream gateway error page served in place of the forum.
const GATEWAY_MARKER: &str = "502 Bad Gateway";

/// Forum message for a permanently deleted topic.
const DELETED_MARKER: &str = "Запрошенной темы не существует.";

/// Forum message for a topic restricted to authorized members.
const HIDDEN_MARKER: &str = "Для просмотра этого форума вы должны быть авторизованы";

/// Classify fetched content as regular, hidden, deleted or unreachable.
pub fn check_visibility(content: &str) -> TopicVisibility {
    if content.contains(GATEWAY_MARKER) {
        return TopicVisibility::Unreachable;
    }
    // Hidden takes precedence when both markers appear on one page.
    if content.contains(HIDDEN_MARKER) {
        return TopicVisibility::Hidden;
    }
    if content.contains(DELETED_MARKER) {
        return TopicVisibility::Deleted;
    }
    TopicVisibility::Regular
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_marker_is_detected() {
        let content = "<html>Запрошенной темы не существует.</html>";
        assert_eq!(check_visibility(content), TopicVisibility::Deleted);
    }

    #[test]
    fn hidden_marker_is_detected() {
        let content = "<html>Для просмотра этого форума вы должны быть авторизованы</html>";
        assert_eq!(check_visibility(content), TopicVisibility::Hidden);
    }

    #[test]
    fn plain_page_is_regular() {
        let content = "<html><div class=\"content\">пост</div></html>";
        assert_eq!(check_visibility(content), TopicVisibility::Regular);
    }

    #[test]
    fn gateway_marker_short_circuits() {
        let content = "<html>502 Bad Gateway. Запрошенной темы не существует.</html>";
        assert_eq!(check_visibility(content), TopicVisibility::Unreachable);
    }
}
