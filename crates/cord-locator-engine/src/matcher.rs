//! Point annotations on text.
//!
//! When a user clicks inside text we keep a window of the surrounding
//! characters. On redisplay the window is searched for again so the pin
//! follows the words even if the page reflowed or text was inserted before
//! it.

use crate::dom::Dom;
use crate::redact::{TextRedactor, matches_hash};
use crate::types::{LocationTextConfig, MATCHING_TEXT_MINIMUM_LENGTH, MATCHING_TEXT_TARGET_LENGTH, Point};
use crate::util::text::{find_utf16, slice_utf16, utf16_len, widen_to_char_boundaries};
use crate::util::{PointToCaretResolver, is_text_node};

/// Fingerprint the text under `(x, y)` inside `target`
pub fn get_text_at_point_config<D: Dom>(
    dom: &D,
    resolver: &dyn PointToCaretResolver<D>,
    target: &D::Node,
    x: f64,
    y: f64,
    redactor: &dyn TextRedactor,
) -> Option<LocationTextConfig> {
    if !redactor.allows_point_fingerprints() {
        return None;
    }
    if !dom
        .child_nodes(target)
        .iter()
        .any(|child| is_text_node(dom, child))
    {
        return None;
    }

    let caret = resolver.caret_at(dom, Point::new(x, y))?;
    let content = dom.text_content(&caret.text_node);
    let caret_rect = dom.caret_rect(&caret.text_node, caret.offset)?;

    let half_window = MATCHING_TEXT_TARGET_LENGTH / 2;
    let (window_start, window_end) = widen_to_char_boundaries(
        &content,
        caret.offset.saturating_sub(half_window),
        caret.offset + half_window,
    );
    let text_to_match = slice_utf16(&content, window_start, window_end);
    if utf16_len(&text_to_match) < MATCHING_TEXT_MINIMUM_LENGTH {
        log::debug!("Not enough text around point to fingerprint: {text_to_match:?}");
        return None;
    }

    Some(LocationTextConfig {
        text_to_match,
        selected_char_offset: caret.offset,
        text_to_match_offset: window_start,
        x_vs_pointer: caret_rect.x() - x,
        y_vs_pointer: caret_rect.y() - y,
        node_index: dom.child_index(&caret.text_node)?,
    })
}

/// Find the fingerprinted text again among `element`'s text children.
///
/// Returns the text node and the click offset inside it, shifted by however
/// far the matched window moved.
pub fn get_text_node_and_offset<D: Dom>(
    dom: &D,
    element: &D::Node,
    text_config: &LocationTextConfig,
) -> Option<(D::Node, usize)> {
    let text_to_match = text_config.text_to_match.as_str();
    let click_in_window = text_config
        .selected_char_offset
        .saturating_sub(text_config.text_to_match_offset);
    let children = dom.child_nodes(element);

    if let Some(child) = children
        .get(text_config.node_index)
        .filter(|child| is_text_node(dom, child))
    {
        let content = dom.text_content(child);
        // Hashed records fingerprint the whole text node
        if matches_hash(&content, text_to_match) {
            return Some((child.clone(), text_config.selected_char_offset));
        }

        let window_end = text_config.text_to_match_offset + utf16_len(text_to_match);
        if slice_utf16(&content, text_config.text_to_match_offset, window_end) == text_to_match {
            return Some((child.clone(), text_config.selected_char_offset));
        }

        if let Some(index) = find_utf16(&content, text_to_match) {
            return Some((child.clone(), index + click_in_window));
        }
    }

    children
        .into_iter()
        .filter(|child| is_text_node(dom, child))
        .find_map(|child| {
            let index = find_utf16(&dom.text_content(&child), text_to_match)?;
            Some((child, index + click_in_window))
        })
}

/// Viewport position of a point annotation, compensating for where inside
/// the character the original click landed
pub fn position_from_text_config<D: Dom>(
    dom: &D,
    element: &D::Node,
    text_config: &LocationTextConfig,
) -> Option<Point> {
    let (text_node, offset) = get_text_node_and_offset(dom, element, text_config)?;
    let caret = dom.caret_rect(&text_node, offset)?;
    Some(Point::new(
        caret.x() - text_config.x_vs_pointer,
        caret.y() - text_config.y_vs_pointer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{ElementInit, MemoryDom};
    use crate::redact::{HashedText, PlainText, sha256_hash_and_salt};
    use crate::tests::{ParagraphPage, TEXT_ORIGIN, paragraph_page, text_layout, viewport};
    use crate::util::CaretRangeResolver;
    use pretty_assertions::assert_eq;

    const SENTENCE: &str = "The quick brown fox jumps over the lazy dog";

    fn capture(page: &ParagraphPage, offset: usize) -> Option<LocationTextConfig> {
        let point = page.point_at_offset(offset);
        get_text_at_point_config(
            &page.dom,
            &CaretRangeResolver,
            &page.paragraph,
            point.x,
            point.y,
            &PlainText,
        )
    }

    #[test]
    fn test_captures_window_around_click() {
        let page = paragraph_page(SENTENCE);

        let config = capture(&page, 30).unwrap();

        assert_eq!(config.selected_char_offset, 30);
        assert_eq!(config.text_to_match_offset, 5);
        assert_eq!(config.text_to_match, "uick brown fox jumps over the lazy dog");
        assert_eq!(config.node_index, 0);
        assert_eq!(config.x_vs_pointer, 0.0);
        assert_eq!(config.y_vs_pointer, -10.0);
    }

    #[test]
    fn test_short_text_is_rejected() {
        let page = paragraph_page("Too short");

        assert_eq!(capture(&page, 5), None);
    }

    #[test]
    fn test_window_of_exactly_minimum_length_is_kept() {
        let page = paragraph_page("fifteen chars!!");

        let config = capture(&page, 5).unwrap();

        assert_eq!(config.text_to_match, "fifteen chars!!");
    }

    #[test]
    fn test_hashing_disables_point_fingerprints() {
        let page = paragraph_page(SENTENCE);
        let point = page.point_at_offset(10);

        let config = get_text_at_point_config(
            &page.dom,
            &CaretRangeResolver,
            &page.paragraph,
            point.x,
            point.y,
            &HashedText,
        );

        assert_eq!(config, None);
    }

    #[test]
    fn test_target_without_text_children() {
        let page = paragraph_page(SENTENCE);
        let point = page.point_at_offset(10);

        let config = get_text_at_point_config(
            &page.dom,
            &CaretRangeResolver,
            &page.dom.body_id(),
            point.x,
            point.y,
            &PlainText,
        );

        assert_eq!(config, None);
    }

    #[test]
    fn test_unchanged_text_keeps_offset() {
        let page = paragraph_page("The quick brown fox jumps");
        let config = capture(&page, 10).unwrap();

        let found = get_text_node_and_offset(&page.dom, &page.paragraph, &config);

        assert_eq!(found, Some((page.text, 10)));
    }

    #[test]
    fn test_prepended_text_shifts_offset() {
        let mut page = paragraph_page("The quick brown fox jumps");
        let config = capture(&page, 10).unwrap();
        page.dom
            .set_text(page.text, "Breaking news!! The quick brown fox jumps");

        let (node, offset) = get_text_node_and_offset(&page.dom, &page.paragraph, &config).unwrap();

        assert_eq!(node, page.text);
        assert_eq!(offset, 10 + 16);
    }

    #[test]
    fn test_text_moved_to_sibling_node() {
        let mut page = paragraph_page("The quick brown fox jumps");
        let config = capture(&page, 10).unwrap();
        page.dom.set_text(page.text, "Replaced intro. ");
        let moved = page.dom.append_text(
            page.paragraph,
            "Yesterday The quick brown fox jumps",
            Some(text_layout(TEXT_ORIGIN)),
        );

        let found = get_text_node_and_offset(&page.dom, &page.paragraph, &config);

        assert_eq!(found, Some((moved, 20)));
    }

    #[test]
    fn test_node_inserted_before_text() {
        let mut page = paragraph_page("The quick brown fox jumps");
        let config = capture(&page, 10).unwrap();
        page.dom
            .insert_text(page.paragraph, 0, "Note: ", Some(text_layout(TEXT_ORIGIN)));

        let found = get_text_node_and_offset(&page.dom, &page.paragraph, &config);

        assert_eq!(found, Some((page.text, 10)));
    }

    #[test]
    fn test_window_keeps_emoji_whole() {
        let mut page = paragraph_page("😀The quick brown fox jumps over the lazy dog");
        let config = capture(&page, 26).unwrap();

        assert_eq!(config.text_to_match_offset, 0);
        assert!(config.text_to_match.starts_with('😀'));
        assert!(!config.text_to_match.contains('\u{FFFD}'));

        page.dom.set_text(
            page.text,
            "Hello! 😀The quick brown fox jumps over the lazy dog",
        );

        let found = get_text_node_and_offset(&page.dom, &page.paragraph, &config);

        assert_eq!(found, Some((page.text, 33)));
    }

    #[test]
    fn test_hashed_fingerprint_matches_whole_node() {
        let mut page = paragraph_page("The quick brown fox jumps");
        let config = LocationTextConfig {
            text_to_match: sha256_hash_and_salt("The quick brown fox jumps"),
            selected_char_offset: 10,
            text_to_match_offset: 0,
            x_vs_pointer: 0.0,
            y_vs_pointer: 0.0,
            node_index: 0,
        };

        let found = get_text_node_and_offset(&page.dom, &page.paragraph, &config);
        assert_eq!(found, Some((page.text, 10)));

        page.dom.set_text(page.text, "The quick brown fox jumped");
        assert_eq!(
            get_text_node_and_offset(&page.dom, &page.paragraph, &config),
            None
        );
    }

    #[test]
    fn test_missing_text_is_not_locatable() {
        let mut page = paragraph_page("The quick brown fox jumps");
        let config = capture(&page, 10).unwrap();
        page.dom
            .set_text(page.text, "Something else entirely was written here");

        assert_eq!(
            get_text_node_and_offset(&page.dom, &page.paragraph, &config),
            None
        );
        assert_eq!(
            position_from_text_config(&page.dom, &page.paragraph, &config),
            None
        );
    }

    #[test]
    fn test_position_round_trip() {
        let page = paragraph_page(SENTENCE);
        let clicked = page.point_at_offset(12);
        let config = capture(&page, 12).unwrap();

        let position = position_from_text_config(&page.dom, &page.paragraph, &config);

        assert_eq!(position, Some(clicked));
    }

    #[test]
    fn test_node_index_counts_all_children() {
        let mut dom = MemoryDom::new(viewport());
        let body = dom.body_id();
        let p = dom.append_element(body, ElementInit::new("p"));
        dom.append_element(p, ElementInit::new("br"));
        let text = dom.append_text(p, SENTENCE, Some(text_layout(TEXT_ORIGIN)));
        let point = Point::new(TEXT_ORIGIN.x + 80.0, TEXT_ORIGIN.y + 5.0);

        let config =
            get_text_at_point_config(&dom, &CaretRangeResolver, &p, point.x, point.y, &PlainText)
                .unwrap();

        assert_eq!(config.node_index, 1);
        assert_eq!(get_text_node_and_offset(&dom, &p, &config), Some((text, 10)));
    }
}
