use cord_locator_engine::dom::{ElementInit, ScrollMetrics, TextLayout, Viewport};
use cord_locator_engine::{
    AnnotationId, BrowserDom, CaretRangeResolver, ChannelMessenger, Dom, DomRange, DomSelection,
    FrameMessage, HashedText, HighlightedTextConfig, LogLogger, MemoryDom, NodeId,
    PathSelectorGenerator, PlainText, Point, PositionRequest, RemoveOutcome, SelectionStyle,
    ShowOutcome, TextHighlighter, TextRedactor, compute_annotation_position_using_heuristics,
    create_highlighted_text_config, find_suitable_element_for_doc_location,
    get_text_at_point_config, get_text_highlight_range, is_highlighted_text_present,
};
use pretty_assertions::assert_eq;

const RIGHT_BOUNDARY: f64 = 1000.0;

fn load_fixture(name: &str) -> MemoryDom {
    let json = std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.json",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap();
    MemoryDom::from_fixture_json(&json).unwrap()
}

fn element(dom: &MemoryDom, selector: &str) -> NodeId {
    dom.query_selector(selector)
        .unwrap_or_else(|| panic!("fixture has no {selector}"))
}

fn first_text(dom: &MemoryDom, selector: &str) -> NodeId {
    dom.child_nodes(&element(dom, selector))[0]
}

fn capture_selection(
    dom: &MemoryDom,
    range: DomRange<NodeId>,
    target: &NodeId,
    redactor: &dyn TextRedactor,
) -> HighlightedTextConfig {
    let selection = DomSelection::new(vec![range]);
    create_highlighted_text_config(
        dom,
        &selection,
        target,
        false,
        redactor,
        &PathSelectorGenerator,
        &LogLogger,
    )
    .unwrap()
    .unwrap()
}

#[test]
fn text_highlight_round_trip() {
    let mut dom = load_fixture("article");
    let lede = element(&dom, "#lede");
    let text = first_text(&dom, "#lede");
    let range = DomRange::new(&dom, text, 4, text, 15).unwrap();

    let config = capture_selection(&dom, range.clone(), &lede, &PlainText);

    insta::assert_json_snapshot!(config, @r###"
    {
      "startElementSelector": "#lede",
      "endElementSelector": "#lede",
      "startNodeIndex": 0,
      "endNodeIndex": 0,
      "startNodeOffset": 4,
      "endNodeOffset": 15,
      "selectedText": "quick brown",
      "textToDisplay": "quick brown"
    }
    "###);
    assert!(is_highlighted_text_present(&dom, &config));
    assert_eq!(get_text_highlight_range(&dom, &config), Some(range.clone()));

    let (messenger, _receiver) = ChannelMessenger::new();
    let mut highlighter = TextHighlighter::new(messenger, SelectionStyle::default());
    let id = AnnotationId::new();
    assert_eq!(
        highlighter.show(&mut dom, id, &config, &[]),
        ShowOutcome::Shown
    );
    assert_eq!(dom.selection().unwrap().range_at(0), Some(&range));

    assert_eq!(highlighter.remove(&mut dom, id), RemoveOutcome::Removed);
    assert_eq!(dom.selection().unwrap().range_count(), 0);
    assert!(dom.body_classes().is_empty());
}

#[test]
fn selection_spanning_inline_elements_round_trips() {
    let dom = load_fixture("article");
    let paragraph = element(&dom, "#feed > p:nth-child(2)");
    let children = dom.child_nodes(&paragraph);
    let (hello, world) = (children[0], children[2]);
    let range = DomRange::new(&dom, hello, 2, world, 3).unwrap();

    let config = capture_selection(&dom, range.clone(), &paragraph, &PlainText);

    assert_eq!(config.start_element_selector, "#feed > p:nth-child(2)");
    assert_eq!(config.end_node_index, 2);
    assert_eq!(config.selected_text, "llo bold wo");
    assert_eq!(get_text_highlight_range(&dom, &config), Some(range));
}

#[test]
fn hashed_highlights_match_like_plain_ones() {
    let mut dom = load_fixture("article");
    let lede = element(&dom, "#lede");
    let text = first_text(&dom, "#lede");
    let range = DomRange::new(&dom, text, 4, text, 15).unwrap();

    let plain = capture_selection(&dom, range.clone(), &lede, &PlainText);
    let hashed = capture_selection(&dom, range, &lede, &HashedText);

    assert!(hashed.selected_text.starts_with("sha256:"));
    assert_eq!(hashed.text_to_display.as_deref(), Some("Annotation"));
    assert!(is_highlighted_text_present(&dom, &plain));
    assert!(is_highlighted_text_present(&dom, &hashed));

    dom.set_text(text, "The slow brown fox jumps over the lazy dog");
    assert!(!is_highlighted_text_present(&dom, &plain));
    assert!(!is_highlighted_text_present(&dom, &hashed));
}

#[test]
fn input_highlights_capture_the_input_selection() {
    let mut dom = load_fixture("article");
    let search = element(&dom, "#search");
    dom.set_input_selection(search, 12, 19);
    let collapsed = DomRange::collapsed(&dom, search, 0).unwrap();

    let config = capture_selection(&dom, collapsed, &search, &PlainText);

    assert_eq!(config.start_element_selector, "#search");
    assert_eq!(config.selected_text, "near me");
    assert!(is_highlighted_text_present(&dom, &config));
}

#[test]
fn point_annotation_follows_its_text() {
    let mut dom = load_fixture("article");
    let lede = element(&dom, "#lede");
    let feed = element(&dom, "#feed");
    let text = first_text(&dom, "#lede");

    let text_config =
        get_text_at_point_config(&dom, &CaretRangeResolver, &lede, 120.0, 130.0, &PlainText)
            .unwrap();
    assert_eq!(text_config.text_to_match, "The quick brown fox jumps over the ");
    let request = PositionRequest {
        target: lede,
        text_config: Some(text_config),
        right_boundary: RIGHT_BOUNDARY,
        x_vs_viewport: 120.0,
        y_vs_viewport: 130.0,
    };

    let position = compute_annotation_position_using_heuristics(&dom, &request).unwrap();
    assert!(position.visible);
    assert!(position.has_inner_scroll_container);
    assert_eq!(position.closest_scroll_parent, feed);
    assert_eq!(
        (
            position.x_vs_closest_scroll_parent,
            position.y_vs_closest_scroll_parent
        ),
        (120.0, 30.0)
    );

    // New words in front of the clicked one
    dom.set_text(text, "Updated: The quick brown fox jumps over the lazy dog");
    let position = compute_annotation_position_using_heuristics(&dom, &request).unwrap();
    assert_eq!(position.x_vs_closest_scroll_parent, 120.0 + 9.0 * 8.0);

    // Scrolling the feed moves the text but not the stored position
    dom.set_scroll(
        feed,
        ScrollMetrics {
            scroll_top: 200.0,
            scroll_height: 1500.0,
            scroll_width: 900.0,
            client_height: 600.0,
            client_width: 900.0,
            ..ScrollMetrics::default()
        },
    );
    dom.set_text_layout(
        text,
        Some(TextLayout {
            origin: Point::new(40.0, -80.0),
            char_width: 8.0,
            line_height: 20.0,
        }),
    );
    let position = compute_annotation_position_using_heuristics(&dom, &request).unwrap();
    assert_eq!(position.y_vs_closest_scroll_parent, 30.0);
    assert!(!position.visible);
}

#[test]
fn visibility_ends_at_the_bottom_of_the_viewport() {
    let dom = load_fixture("article");
    let footer = element(&dom, "#colophon");
    let request = |y: f64| PositionRequest {
        target: footer,
        text_config: None,
        right_boundary: RIGHT_BOUNDARY,
        x_vs_viewport: 100.0,
        y_vs_viewport: y,
    };

    let inside = compute_annotation_position_using_heuristics(&dom, &request(799.0)).unwrap();
    let below = compute_annotation_position_using_heuristics(&dom, &request(800.0)).unwrap();
    let unreachable = compute_annotation_position_using_heuristics(&dom, &request(2100.0));

    assert!(inside.visible);
    assert!(!inside.has_inner_scroll_container);
    assert_eq!(inside.closest_scroll_parent, dom.document_element_id());
    assert!(!below.visible);
    assert_eq!(unreachable, None);

    // A shorter window hides what used to be on screen
    let mut dom = dom;
    dom.set_viewport(Viewport {
        width: 1280.0,
        height: 600.0,
    });
    let shrunk = compute_annotation_position_using_heuristics(&dom, &request(799.0)).unwrap();
    assert!(!shrunk.visible);
}

#[test]
fn unsuitable_anchor_is_replaced_by_nearby_paragraph() {
    let dom = load_fixture("article");
    let body = dom.body_id();

    let replacement = find_suitable_element_for_doc_location(&dom, 50.0, 30.0, &body, None);

    assert_eq!(replacement, Some(element(&dom, "#lede")));
}

#[test]
fn child_frame_shows_highlight_from_parent_message() {
    let mut parent = MemoryDom::new(Viewport {
        width: 1280.0,
        height: 800.0,
    });
    let body = parent.body_id();
    let iframe = parent.append_element(
        body,
        ElementInit::new("iframe").id("embedded-article"),
    );
    let mut child = load_fixture("article");
    let text = first_text(&child, "#lede");
    let lede = element(&child, "#lede");
    let range = DomRange::new(&child, text, 4, text, 15).unwrap();
    let config = capture_selection(&child, range.clone(), &lede, &PlainText);

    let (messenger, receiver) = ChannelMessenger::new();
    let mut parent_highlighter = TextHighlighter::new(messenger, SelectionStyle::default());
    let id = AnnotationId::new();
    let outcome = parent_highlighter.show(
        &mut parent,
        id,
        &config,
        &["#embedded-article".to_string()],
    );
    assert_eq!(outcome, ShowOutcome::DelegatedToIframe);

    let (target, message) = receiver.try_recv().unwrap();
    assert_eq!(target, iframe);
    let wire = message.to_json().unwrap();

    let (child_messenger, _child_receiver) = ChannelMessenger::new();
    let mut child_highlighter = TextHighlighter::new(child_messenger, SelectionStyle::default());
    child_highlighter.handle_message(&mut child, FrameMessage::from_json(&wire).unwrap());

    assert_eq!(child.selection().unwrap().range_at(0), Some(&range));
    assert_eq!(child.body_classes(), vec!["cord-selection".to_string()]);
}
