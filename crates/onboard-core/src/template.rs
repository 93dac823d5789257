//! File templates.
//!
//! Templates use Go `text/template` syntax and are parsed once, when the
//! configuration is validated. The whole runtime value map is the template's
//! dot, so `{{ .ssid }}` and `{{ index . "ssid" }}` name the same value.

use crate::pipeline::RuntimeValues;
use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fmt;

/// A parsed template, ready to render.
pub struct FileTemplate {
    source: String,
    template: Template,
}

impl FileTemplate {
    /// Parse `source`. The error carries the parser's message.
    pub fn compile(source: &str) -> Result<Self, String> {
        let mut template = Template::default();
        template.parse(source).map_err(|e| e.to_string())?;
        Ok(Self {
            source: source.to_string(),
            template,
        })
    }

    /// Render against every runtime value. Output is not escaped.
    pub fn render(&self, values: &RuntimeValues) -> Result<String, String> {
        let dot: HashMap<String, Value> = values
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.template
            .render(&Context::from(Value::Map(dot)))
            .map_err(|e| e.to_string())
    }
}

impl fmt::Debug for FileTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTemplate")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
