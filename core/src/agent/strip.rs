use std::sync::LazyLock;

use regex::Regex;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid regex"));
static THINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?think>").expect("valid regex"));

/// Removes `<think>...</think>` reasoning blocks (across line breaks) and any
/// stray opening or closing tag, then trims. Repeats until nothing matches, so
/// applying it twice changes nothing.
pub fn strip_reasoning(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let without_blocks = THINK_BLOCK.replace_all(&current, "");
        let without_tags = THINK_TAG.replace_all(&without_blocks, "").into_owned();
        if without_tags == current {
            return current.trim().to_string();
        }
        current = without_tags;
    }
}
