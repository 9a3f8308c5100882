use serde::{Deserialize, Serialize};

/// `<style>` id of the injected selection stylesheet
pub const SELECTION_STYLESHEET_ID: &str = "cord-selection-stylesheet";

/// Elements carrying `data-cord-annotation-allowed="false"` keep the
/// browser's native selection colours
pub const CORD_ANNOTATION_ALLOWED_DATA_ATTRIBUTE: &str = "data-cord-annotation-allowed";

/// Look of a shown text highlight.
///
/// The class is put on `<body>` while a highlight is visible, so pages can
/// restyle it with `.cord-selection *::selection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionStyle {
    pub class_name: String,
    pub background_color: String,
    pub text_color: String,
    pub placeholder_color: String,
}

impl Default for SelectionStyle {
    fn default() -> Self {
        Self {
            class_name: "cord-selection".to_string(),
            background_color: "#f5ff5d".to_string(),
            text_color: "#1f1f1f".to_string(),
            placeholder_color: "#696a6c".to_string(),
        }
    }
}

pub fn create_selection_stylesheet(style: &SelectionStyle) -> String {
    let scope = format!(":where(.{})", style.class_name);
    format!(
        r#"{scope} *::selection {{
  background-color: {background};
  color: {text};
}}
{scope} *[{attribute}="false"]::selection {{
  background-color: highlight;
  color: inherit;
}}
{scope} input:placeholder-shown::selection {{
  color: {placeholder};
}}
{scope} textarea:placeholder-shown::selection {{
  color: {placeholder};
}}
{scope} * {{
  user-select: text;
}}
{scope} *::before, {scope} *::after {{
  pointer-events: none;
}}"#,
        background = style.background_color,
        text = style.text_color,
        placeholder = style.placeholder_color,
        attribute = CORD_ANNOTATION_ALLOWED_DATA_ATTRIBUTE,
    )
}
