//! Handlebars registries for the rendered outputs.
//!
//! The HTML registry keeps handlebars' default escaping, so every value
//! interpolated into the report is escaped by the engine. The markdown
//! registry escapes nothing; comment bodies are posted verbatim.

use crate::error::Result;
use handlebars::{no_escape, Handlebars};
use serde::Serialize;

pub const REPORT_TEMPLATE: &str = "report.html";
pub const COMMENT_TEMPLATE: &str = "pr_comment.md";

const REPORT_SOURCE: &str = include_str!("../templates/report.html.hbs");
const COMMENT_SOURCE: &str = include_str!("../templates/pr_comment.md.hbs");

pub struct TemplateEngine {
    html: Handlebars<'static>,
    markdown: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Result<Self> {
        let mut html = Handlebars::new();
        html.register_template_string(REPORT_TEMPLATE, REPORT_SOURCE)?;

        let mut markdown = Handlebars::new();
        markdown.register_escape_fn(no_escape);
        markdown.register_template_string(COMMENT_TEMPLATE, COMMENT_SOURCE)?;

        Ok(Self { html, markdown })
    }

    pub fn render_html<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        Ok(self.html.render(name, context)?)
    }

    pub fn render_markdown<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        Ok(self.markdown.render(name, context)?)
    }
}
