//! Page rendering.
//!
//! Templating proper is an external concern; `JsonRenderer` emits the page
//! name and its data mapping as a JSON document.

use anyhow::{Context, Result};
use serde_json::json;

use super::traits::BaseRenderer;

#[derive(Clone, Copy, Default)]
pub struct JsonRenderer;

impl BaseRenderer for JsonRenderer {
    fn render(&self, template: &str, data: &serde_json::Value) -> Result<String> {
        serde_json::to_string(&json!({ "template": template, "data": data }))
            .with_context(|| format!("Failed to render {}", template))
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
