//! Template engine seam.

use crate::error::StaplingError;

/// Turns document text into documents and renders data through a template.
///
/// The template language is whatever the engine understands; nothing here
/// validates it.
pub trait TemplateEngine: Send + Sync {
  type Document;
  type Fragment;

  /// Build a document from its text.
  fn parse_xml(&self, text: &str) -> Result<Self::Document, StaplingError>;

  /// Apply `template` to `data`.
  fn render(
    &self,
    data: &Self::Document,
    template: &Self::Document,
  ) -> Result<Self::Fragment, StaplingError>;
}

/// Engine that renders the data document unchanged.
///
/// Handy for inspecting what templates receive.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoEngine;

impl TemplateEngine for EchoEngine {
  type Document = String;
  type Fragment = String;

  fn parse_xml(&self, text: &str) -> Result<String, StaplingError> {
    Ok(text.to_string())
  }

  fn render(&self, data: &String, _template: &String) -> Result<String, StaplingError> {
    Ok(data.clone())
  }
}
