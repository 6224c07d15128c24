use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Serialized editor document as posted by the rich-text field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    pub root: EditorNode,
}

/// One node of the editor tree. Attributes we don't interpret (format,
/// direction, version, ...) are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<EditorNode>>,
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl EditorNode {
    fn text_leaf(text: &str) -> Self {
        EditorNode {
            kind: "text".to_string(),
            text: Some(text.to_string()),
            children: None,
            attrs: attrs(json!({
                "detail": 0,
                "format": 0,
                "mode": "normal",
                "style": "",
                "version": 1,
            })),
        }
    }

    fn block(kind: &str, children: Vec<EditorNode>) -> Self {
        EditorNode {
            kind: kind.to_string(),
            text: None,
            children: Some(children),
            attrs: attrs(json!({
                "direction": "ltr",
                "format": "",
                "indent": 0,
                "version": 1,
            })),
        }
    }
}

fn attrs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Flatten an editor document to the plain text stored in the sheet.
/// Headings, lists and inline styles are dropped.
pub fn to_plain_text(state: &EditorState) -> String {
    let Some(blocks) = state.root.children.as_ref() else {
        return String::new();
    };

    blocks
        .iter()
        .map(extract_text)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn extract_text(node: &EditorNode) -> String {
    if node.kind == "text" {
        return node.text.clone().unwrap_or_default();
    }

    match &node.children {
        Some(children) => children
            .iter()
            .map(extract_text)
            .collect::<Vec<_>>()
            .join(" "),
        None => String::new(),
    }
}

/// Rehydrate stored text into a single unstyled paragraph.
///
/// The input is trimmed the same way [`to_plain_text`] trims its output, so
/// flattening and rehydrating an already rehydrated document is stable.
pub fn from_plain_text(text: &str) -> EditorState {
    let paragraph = EditorNode::block("paragraph", vec![EditorNode::text_leaf(text.trim())]);
    EditorState {
        root: EditorNode::block("root", vec![paragraph]),
    }
}
