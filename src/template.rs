//! Template parsing and rendering for prompt templates.
//! Wraps a restricted MiniJinja environment: data substitution, conditionals,
//! loops and a small filter set only, with strict undefined handling.

use std::sync::OnceLock;

use chrono::Local;
use minijinja::value::Value;
use minijinja::{Environment, UndefinedBehavior};
use regex::Regex;

use crate::error::{Error, Result};

/// Context names always injected by the renderer. User-declared placeholders
/// with these names are ignored: the fixed context value wins.
pub const RESERVED_CONTEXT: [&str; 6] = ["now", "user", "app", "range", "dict", "list"];

/// Application label exposed to templates as `{{ app }}`.
pub const APP_LABEL: &str = "PromptForge";

/// Marker prefixed to render failures reported in-band.
pub const TEMPLATE_ERROR_PREFIX: &str = "Template Error: ";

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
///
/// The environment is restricted: strict undefined behavior, no template
/// loader, no I/O. The builtin `default` filter is replaced by one that
/// treats empty strings the same as absent values.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
    /// Label exposed to templates as `{{ user }}`
    user_label: String,
}

impl MiniJinjaRenderer {
    /// Creates a new renderer with the default user label.
    pub fn new() -> Self {
        Self::with_user_label("User")
    }

    /// Creates a new renderer with a custom `{{ user }}` label.
    pub fn with_user_label(user_label: impl Into<String>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_filter("default", default_filter);
        Self { env, user_label: user_label.into() }
    }

    /// Renders a prompt template, reporting failures in-band.
    ///
    /// The context is augmented with the fixed `now`, `user` and `app`
    /// variables before rendering; caller-supplied values for these names are
    /// overwritten. Any rendering failure is returned as a string starting
    /// with [`TEMPLATE_ERROR_PREFIX`] instead of an error.
    pub fn render_prompt(
        &self,
        template: &str,
        context: &serde_json::Map<String, serde_json::Value>,
    ) -> String {
        let enhanced = self.enhance_context(context);
        match self.render(template, &enhanced) {
            Ok(rendered) => rendered,
            Err(Error::MinijinjaError(err)) => {
                format!("{}{}", TEMPLATE_ERROR_PREFIX, err)
            }
            Err(err) => format!("{}{}", TEMPLATE_ERROR_PREFIX, err),
        }
    }

    /// Extracts the free placeholder names referenced by a template.
    ///
    /// Names bound by control constructs and the reserved context names are
    /// excluded. The result is deduplicated and sorted lexicographically.
    /// Malformed templates degrade to a regex scan; this never errors.
    pub fn extract_placeholders(&self, template: &str) -> Vec<String> {
        match self.env.template_from_str(template) {
            Ok(tmpl) => {
                let mut names: Vec<String> = tmpl
                    .undeclared_variables(false)
                    .into_iter()
                    .filter(|name| !RESERVED_CONTEXT.contains(&name.as_str()))
                    .collect();
                names.sort();
                names
            }
            Err(_) => extract_placeholders_regex(template),
        }
    }

    /// Adds the fixed context variables on top of the caller's context.
    fn enhance_context(
        &self,
        context: &serde_json::Map<String, serde_json::Value>,
    ) -> serde_json::Value {
        let mut enhanced = context.clone();
        enhanced.insert(
            "now".to_string(),
            serde_json::Value::String(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        );
        enhanced.insert(
            "user".to_string(),
            serde_json::Value::String(self.user_label.clone()),
        );
        enhanced.insert("app".to_string(), serde_json::Value::String(APP_LABEL.to_string()));
        serde_json::Value::Object(enhanced)
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// # Errors
    /// * `Error::MinijinjaError` if:
    ///   - Template addition fails
    ///   - Template retrieval fails
    ///   - Template rendering fails
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        let mut env = self.env.clone();
        env.add_template("temp", template).map_err(Error::MinijinjaError)?;

        let tmpl = env.get_template("temp").map_err(Error::MinijinjaError)?;

        tmpl.render(context).map_err(Error::MinijinjaError)
    }
}

/// Replacement for the builtin `default` filter: the fallback also applies
/// to empty strings, not just undefined values.
fn default_filter(value: Value, fallback: Option<Value>) -> Value {
    let fallback = fallback.unwrap_or_else(|| Value::from(""));
    if value.is_undefined() || value.is_none() {
        return fallback;
    }
    if value.as_str().is_some_and(str::is_empty) {
        return fallback;
    }
    value
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*(?:\|[^{}]*)?\}\}")
            .expect("placeholder pattern is valid")
    })
}

/// Fallback extraction for templates the parser rejects: scans for
/// `{{ name }}` and `{{ name | filter }}` occurrences.
fn extract_placeholders_regex(template: &str) -> Vec<String> {
    let mut names: Vec<String> = placeholder_regex()
        .captures_iter(template)
        .map(|captures| captures[1].to_string())
        .filter(|name| !RESERVED_CONTEXT.contains(&name.as_str()))
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_fallback_on_broken_syntax() {
        let engine = MiniJinjaRenderer::new();
        // Unclosed block makes the parser fail; the regex scan still finds
        // the well-formed placeholders.
        let template = "{% if x %}{{ city }} and {{ name | upper }}";
        assert_eq!(engine.extract_placeholders(template), vec!["city", "name"]);
    }

    #[test]
    fn test_reserved_names_are_excluded() {
        let engine = MiniJinjaRenderer::new();
        assert!(engine.extract_placeholders("{{ now }} {{ user }} {{ app }}").is_empty());
    }
}
