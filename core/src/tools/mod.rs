use crate::config::ScriptsConfig;
use crate::traits::Tool;
use serde_json::{Map, Value};
use std::sync::Arc;

pub mod catalog;
pub mod script;

pub use catalog::{CATALOG, ScriptDir, ToolEntry};
pub use script::{ScriptInvocation, ScriptTool, run_script};

/// Every catalog entry as a script-backed tool.
pub fn catalog_tools(scripts: &ScriptsConfig) -> Vec<Arc<dyn Tool>> {
    CATALOG
        .iter()
        .map(|entry| Arc::new(ScriptTool::new(entry, scripts)) as Arc<dyn Tool>)
        .collect()
}

/// Command-line text for a JSON argument: strings raw, everything else as JSON.
pub fn arg_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn required_arg(args: &Map<String, Value>, key: &str) -> Result<String, String> {
    args.get(key)
        .filter(|v| !v.is_null())
        .map(arg_text)
        .ok_or_else(|| format!("missing '{}' parameter", key))
}

pub fn optional_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key).filter(|v| !v.is_null()).map(arg_text)
}

pub fn push_flag(argv: &mut Vec<String>, args: &Map<String, Value>, key: &str, flag: &str) {
    if let Some(value) = optional_arg(args, key) {
        argv.push(flag.to_string());
        argv.push(value);
    }
}
