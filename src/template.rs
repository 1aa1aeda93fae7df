//! Template interpolation for YAML configs
//!
//! Handles `{{ env.NAME }}` interpolation in the ingestion config before it is parsed, so
//! credentials never have to live in the file itself.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ env.NAME }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}").unwrap()
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Environment variables
    pub env: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context holding the current process environment
    pub fn from_env() -> Self {
        Self {
            env: std::env::vars().collect(),
        }
    }

    /// Set one environment variable
    #[must_use]
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Get a value by path (e.g., "env.SNOWFLAKE_TOKEN")
    pub fn get(&self, path: &str) -> Option<String> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["env", name] => self.env.get(*name).cloned(),
            _ => None,
        }
    }
}

/// Render a template string with the given context.
///
/// Every undefined variable is reported at once in a single `UndefinedVariable` error.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut errors: Vec<String> = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let var_path = &cap[1];
        if let Some(value) = ctx.get(var_path) {
            value
        } else {
            if !errors.iter().any(|e| e == var_path) {
                errors.push(var_path.to_string());
            }
            String::new()
        }
    });

    if errors.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TemplateContext {
        TemplateContext::new()
            .with_env("SNOWFLAKE_TOKEN", "tok-123")
            .with_env("SNOWFLAKE_ROLE", "SYSADMIN")
    }

    #[test]
    fn test_render_env() {
        let result = render("token: {{ env.SNOWFLAKE_TOKEN }}", &ctx()).unwrap();
        assert_eq!(result, "token: tok-123");
    }

    #[test]
    fn test_render_without_spaces() {
        let result = render("role: {{env.SNOWFLAKE_ROLE}}", &ctx()).unwrap();
        assert_eq!(result, "role: SYSADMIN");
    }

    #[test]
    fn test_render_repeated_variable() {
        let result = render("{{ env.SNOWFLAKE_ROLE }}/{{ env.SNOWFLAKE_ROLE }}", &ctx()).unwrap();
        assert_eq!(result, "SYSADMIN/SYSADMIN");
    }

    #[test]
    fn test_render_undefined_lists_all() {
        let err = render(
            "{{ env.MISSING_A }} {{ env.SNOWFLAKE_TOKEN }} {{ env.MISSING_B }} {{ env.MISSING_A }}",
            &ctx(),
        )
        .unwrap_err();

        match err {
            Error::UndefinedVariable { variable } => {
                assert_eq!(variable, "env.MISSING_A, env.MISSING_B");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_root_is_undefined() {
        assert!(render("{{ config.api_key }}", &ctx()).is_err());
        assert!(render("{{ env }}", &ctx()).is_err());
        assert!(render("{{ vars.stage.root }}", &ctx()).is_err());
    }

    #[test]
    fn test_plain_text_untouched() {
        let text = "stage:\n  root: \"@my_stage\"\n";
        assert_eq!(render(text, &ctx()).unwrap(), text);
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        let ctx = TemplateContext::from_env();
        // PATH is present in every test environment we run in
        if let Ok(path) = std::env::var("PATH") {
            assert_eq!(ctx.get("env.PATH"), Some(path));
        }
    }
}
