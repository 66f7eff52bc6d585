// Template rendering boundary

use crate::error::Error;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Renders a named template with a key-value context.
///
/// Invoked only for routes that declare a template; the handler then
/// produces the view context instead of the response body.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: &Map<String, Value>) -> Result<String, Error>;
}

/// Minimal renderer over registered template strings with `{{key}}`
/// placeholder substitution. Enough for tests and demos; real
/// deployments plug in their own engine behind [`Renderer`].
#[derive(Default)]
pub struct TextRenderer {
    templates: HashMap<String, String>,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.templates.insert(name.into(), body.into());
        self
    }
}

impl Renderer for TextRenderer {
    fn render(&self, template: &str, context: &Map<String, Value>) -> Result<String, Error> {
        let body = self
            .templates
            .get(template)
            .ok_or_else(|| Error::Template(format!("unknown template: {}", template)))?;

        let mut out = body.clone();
        for (key, value) in context {
            let placeholder = format!("{{{{{}}}}}", key);
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out = out.replace(&placeholder, &rendered);
        }
        Ok(out)
    }
}
