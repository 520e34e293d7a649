use regex::Regex;
use std::sync::LazyLock;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:python)?\s*(.*?)\s*```").expect("code block pattern is valid")
});

static CLASS_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"class\s+(\w+)\s*\(").expect("class pattern is valid"));

const DEFAULT_CLASS_NAME: &str = "Scene";
const RENDERER_LIBRARY: &str = "manim";

/// Scene source pulled out of free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneCode {
    pub code: String,
    pub class_name: String,
}

/// Extract the first fenced code block from `text`.
///
/// The block must reference the renderer library. The class name comes from
/// the first `class Name(` declaration, defaulting to `Scene`.
pub fn extract_scene_code(text: &str) -> Option<SceneCode> {
    let code = CODE_BLOCK.captures(text)?.get(1)?.as_str();

    if !code.contains(RENDERER_LIBRARY) {
        return None;
    }

    Some(SceneCode {
        code: code.to_string(),
        class_name: scene_class_name(code).to_string(),
    })
}

/// Name of the first class declared in `code`, or `Scene`.
pub fn scene_class_name(code: &str) -> &str {
    CLASS_NAME
        .captures(code)
        .and_then(|caps| caps.get(1))
        .map_or(DEFAULT_CLASS_NAME, |m| m.as_str())
}
