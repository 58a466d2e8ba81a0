//! HTML page rendering for the upload form

use rust_embed::Embed;
use serde::Serialize;
use tera::Tera;
use thiserror::Error;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

const INDEX_TEMPLATE: &str = "index.html";

/// Values the index page is rendered with
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageContext {
    pub errors: Vec<String>,
    pub result_message: Option<String>,
}

impl PageContext {
    pub fn with_errors(errors: Vec<String>) -> Self {
        Self {
            errors,
            result_message: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            errors: Vec::new(),
            result_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

/// Page renderer using Tera over the embedded templates
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    /// Create a renderer with every embedded template registered.
    ///
    /// Templates keep their `.html` names so Tera autoescapes them.
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                let template_str = std::str::from_utf8(&content.data)
                    .map_err(|e| TemplateError::RenderError(format!("{}: {}", filename, e)))?;
                tera.add_raw_template(filename, template_str)
                    .map_err(|e| TemplateError::RenderError(e.to_string()))?;
            }
        }

        if !tera.get_template_names().any(|n| n == INDEX_TEMPLATE) {
            return Err(TemplateError::NotFound(INDEX_TEMPLATE.to_string()));
        }

        Ok(Self { tera })
    }

    /// Render the upload form with any errors or result banner
    pub fn render_index(&self, page: &PageContext) -> Result<String, TemplateError> {
        let context = tera::Context::from_serialize(page)
            .map_err(|e| TemplateError::RenderError(e.to_string()))?;

        self.tera
            .render(INDEX_TEMPLATE, &context)
            .map_err(|e| TemplateError::RenderError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_form() {
        let renderer = PageRenderer::new().unwrap();
        let html = renderer.render_index(&PageContext::default()).unwrap();

        assert!(html.contains("name=\"schema_file\""));
        assert!(html.contains("name=\"json_file\""));
        assert!(!html.contains("Validation Errors"));
    }

    #[test]
    fn test_errors_are_listed() {
        let renderer = PageRenderer::new().unwrap();
        let page = PageContext::with_errors(vec![
            "Payload file must be a JSON file".to_string(),
            "second problem".to_string(),
        ]);

        let html = renderer.render_index(&page).unwrap();
        assert!(html.contains("Validation Errors"));
        assert!(html.contains("<li>Payload file must be a JSON file</li>"));
        assert!(html.contains("<li>second problem</li>"));
    }

    #[test]
    fn test_success_banner() {
        let renderer = PageRenderer::new().unwrap();
        let html = renderer
            .render_index(&PageContext::success("Validation successful!"))
            .unwrap();

        assert!(html.contains("Validation successful!"));
        assert!(!html.contains("Validation Errors"));
    }

    #[test]
    fn test_messages_are_escaped() {
        let renderer = PageRenderer::new().unwrap();
        let page = PageContext::with_errors(vec!["<script>alert(1)</script>".to_string()]);

        let html = renderer.render_index(&page).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
