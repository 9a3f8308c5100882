use anyhow::{Context, Result, anyhow};
use cord_locator_config::{Config, SelectionConfig};
use cord_locator_engine::util::{range_to_string, select_caret_resolver};
use cord_locator_engine::{
    AnnotationId, BrowserDom, ChannelMessenger, Dom, DomRange, DomSelection, HighlightedTextConfig,
    LocationTextConfig, LogLogger, MemoryDom, NodeId, PathSelectorGenerator, PositionRequest,
    SelectionStyle, TextHighlighter, compute_annotation_position_using_heuristics,
    create_highlighted_text_config, get_text_at_point_config, get_text_highlight_display_text,
    is_highlighted_text_present, redactor_for,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::{env, path::Path, process};

const USAGE: &str = "Usage:
  cord-locator-cli capture-point <page.json> <selector> <x> <y>
  cord-locator-cli capture-text <page.json> <selector> <start> <end>
  cord-locator-cli locate <page.json> <annotation.json>";

/// Annotation record as stored by the host application
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAnnotation {
    #[serde(default)]
    highlighted_text_config: Option<HighlightedTextConfig>,
    #[serde(default)]
    location: Option<StoredLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLocation {
    element_selector: String,
    x_vs_viewport: f64,
    y_vs_viewport: f64,
    #[serde(default)]
    text_config: Option<LocationTextConfig>,
}

fn selection_style(config: &SelectionConfig) -> SelectionStyle {
    SelectionStyle {
        class_name: config.class_name.clone(),
        background_color: config.background_color.clone(),
        text_color: config.text_color.clone(),
        placeholder_color: config.placeholder_color.clone(),
    }
}

fn load_page(config: &Config, path: &str) -> Result<MemoryDom> {
    let path = config.resolve_fixture(Path::new(path));
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read page fixture {}", path.display()))?;
    let dom = MemoryDom::from_fixture_json(&json)
        .with_context(|| format!("Invalid page fixture {}", path.display()))?;
    Ok(dom)
}

fn find_element(dom: &MemoryDom, selector: &str) -> Result<NodeId> {
    dom.query_selector(selector)
        .ok_or_else(|| anyhow!("No element matches selector {selector}"))
}

fn parse_number<T: std::str::FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {name}: {value}"))
}

fn capture_point(config: &Config, args: &[String]) -> Result<Value> {
    let dom = load_page(config, &args[0])?;
    let target = find_element(&dom, &args[1])?;
    let x: f64 = parse_number(&args[2], "x")?;
    let y: f64 = parse_number(&args[3], "y")?;

    let resolver = select_caret_resolver(&dom, &LogLogger)
        .ok_or_else(|| anyhow!("Page fixture supports no point-to-caret API"))?;
    let redactor = redactor_for(config.hash_annotations);
    let text_config =
        get_text_at_point_config(&dom, resolver.as_ref(), &target, x, y, redactor.as_ref());
    if text_config.is_none() {
        log::info!("No text fingerprint at ({x}, {y})");
    }

    Ok(json!({
        "location": {
            "elementSelector": &args[1],
            "xVsViewport": x,
            "yVsViewport": y,
            "textConfig": text_config,
        }
    }))
}

fn capture_text(config: &Config, args: &[String]) -> Result<Value> {
    let dom = load_page(config, &args[0])?;
    let element = find_element(&dom, &args[1])?;
    let start: usize = parse_number(&args[2], "start offset")?;
    let end: usize = parse_number(&args[3], "end offset")?;

    let text_node = dom
        .child_nodes(&element)
        .into_iter()
        .find(|child| dom.node_name(child) == "#text")
        .ok_or_else(|| anyhow!("{} has no text to select", args[1]))?;
    let range = DomRange::new(&dom, text_node, start, text_node, end)?;
    let selection = DomSelection::new(vec![range]);

    let redactor = redactor_for(config.hash_annotations);
    let highlighted_text_config = create_highlighted_text_config(
        &dom,
        &selection,
        &element,
        false,
        redactor.as_ref(),
        &PathSelectorGenerator,
        &LogLogger,
    )?;

    Ok(json!({ "highlightedTextConfig": highlighted_text_config }))
}

fn locate(config: &Config, args: &[String]) -> Result<Value> {
    let mut dom = load_page(config, &args[0])?;
    let annotation_json = std::fs::read_to_string(&args[1])
        .with_context(|| format!("Failed to read annotation {}", args[1]))?;
    let annotation: StoredAnnotation =
        serde_json::from_str(&annotation_json).context("Invalid annotation")?;

    let mut result = serde_json::Map::new();

    if let Some(location) = &annotation.location {
        let position = match dom.query_selector(&location.element_selector) {
            Some(target) => {
                let request = PositionRequest {
                    target,
                    text_config: location.text_config.clone(),
                    right_boundary: dom.viewport().width,
                    x_vs_viewport: location.x_vs_viewport,
                    y_vs_viewport: location.y_vs_viewport,
                };
                compute_annotation_position_using_heuristics(&dom, &request).map(|position| {
                    json!({
                        "visible": position.visible,
                        "hasInnerScrollContainer": position.has_inner_scroll_container,
                        "closestScrollParentRect": position.closest_scroll_parent_rect,
                        "xVsClosestScrollParent": position.x_vs_closest_scroll_parent,
                        "yVsClosestScrollParent": position.y_vs_closest_scroll_parent,
                    })
                })
            }
            None => {
                log::warn!("Annotated element {} is gone", location.element_selector);
                None
            }
        };
        result.insert("position".to_string(), json!(position));
    }

    if let Some(text_config) = &annotation.highlighted_text_config {
        let present = is_highlighted_text_present(&dom, text_config);
        let (messenger, _receiver) = ChannelMessenger::new();
        let mut highlighter = TextHighlighter::new(messenger, selection_style(&config.selection));
        let outcome = highlighter.show(&mut dom, AnnotationId::new(), text_config, &[]);
        let selected = dom
            .selection()
            .and_then(|selection| selection.range_at(0).cloned())
            .map(|range| range_to_string(&dom, &range));

        result.insert(
            "highlight".to_string(),
            json!({
                "present": present,
                "outcome": format!("{outcome:?}"),
                "selectedText": selected,
                "displayText": get_text_highlight_display_text(Some(text_config)),
            }),
        );
    }

    Ok(Value::Object(result))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    let command = args.get(1).map(String::as_str);
    let rest = args.get(2..).unwrap_or_default();
    let output = match (command, rest.len()) {
        (Some("capture-point"), 4) => capture_point(&config, rest)?,
        (Some("capture-text"), 4) => capture_text(&config, rest)?,
        (Some("locate"), 2) => locate(&config, rest)?,
        _ => {
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
