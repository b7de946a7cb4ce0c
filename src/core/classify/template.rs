//! Token substitution and template validation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use std::sync::OnceLock;

/// Tokens understood by the folder classifier
pub const FOLDER_TOKENS: &[&str] = &["year", "month", "day", "camera", "make"];

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("token pattern is valid"))
}

/// Replace every `{token}` the resolver knows; unknown tokens are left intact.
pub(crate) fn substitute<F>(template: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    token_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            resolve(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Names of all `{token}`s in a template, in order of appearance
pub(crate) fn tokens(template: &str) -> Vec<String> {
    token_regex()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Outcome of validating a template without a real file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateValidation {
    pub valid: bool,
    /// The template rendered with sample metadata
    pub example: String,
    pub warnings: Vec<String>,
    pub supported_tokens: Vec<String>,
}

/// Validate a folder template and render a sample.
///
/// The sample uses 2024-03-15 and a Canon EOS R5.
pub fn validate_template(template: &str) -> TemplateValidation {
    let mut warnings = Vec::new();

    if template.trim().is_empty() {
        warnings.push("Template is empty".to_string());
    }

    let found = tokens(template);
    if !found.iter().any(|t| FOLDER_TOKENS.contains(&t.as_str())) {
        warnings.push("Template contains no supported tokens".to_string());
    }
    for token in found.iter().filter(|t| !FOLDER_TOKENS.contains(&t.as_str())) {
        warnings.push(format!("Unknown token: {{{}}}", token));
    }

    if has_unbalanced_braces(template) {
        warnings.push("Template has an unmatched brace".to_string());
    }

    if escapes_root(template) {
        warnings.push("Template must stay inside the target folder".to_string());
    }

    let example = substitute(template, |token| {
        let value = match token {
            "year" => "2024",
            "month" => "03",
            "day" => "15",
            "camera" => "Canon EOS R5",
            "make" => "Canon",
            _ => return None,
        };
        Some(value.to_string())
    });

    TemplateValidation {
        valid: warnings.is_empty(),
        example,
        warnings,
        supported_tokens: FOLDER_TOKENS.iter().map(|t| format!("{{{}}}", t)).collect(),
    }
}

/// Whether joining `folder` onto a root could land outside that root.
///
/// Absolute paths, drive prefixes and `..` components all escape.
pub fn escapes_root(folder: &str) -> bool {
    folder.starts_with('/')
        || folder.starts_with('\\')
        || Path::new(folder)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
}

fn has_unbalanced_braces(template: &str) -> bool {
    let mut open = false;
    for c in template.chars() {
        match c {
            '{' if open => return true,
            '{' => open = true,
            '}' if !open => return true,
            '}' => open = false,
            _ => {}
        }
    }
    open
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_leaves_unknown_tokens() {
        let out = substitute("{year}/{lens}", |t| (t == "year").then(|| "2024".to_string()));
        assert_eq!(out, "2024/{lens}");
    }

    #[test]
    fn tokens_in_order() {
        assert_eq!(tokens("{make}/{year}-{x}"), vec!["make", "year", "x"]);
    }

    #[test]
    fn valid_template_renders_example() {
        let v = validate_template("{year}/{month}-{day}");
        assert!(v.valid);
        assert_eq!(v.example, "2024/03-15");
        assert!(v.warnings.is_empty());
        assert_eq!(v.supported_tokens.len(), FOLDER_TOKENS.len());
    }

    #[test]
    fn camera_tokens_render_sample_values() {
        let v = validate_template("{make}/{camera}");
        assert_eq!(v.example, "Canon/Canon EOS R5");
    }

    #[test]
    fn unknown_token_is_warned() {
        let v = validate_template("{year}/{lens}");
        assert!(!v.valid);
        assert!(v.warnings.iter().any(|w| w.contains("{lens}")));
        assert_eq!(v.example, "2024/{lens}");
    }

    #[test]
    fn template_without_tokens_is_warned() {
        let v = validate_template("photos");
        assert!(!v.valid);
        assert!(v.warnings.iter().any(|w| w.contains("no supported tokens")));
    }

    #[test]
    fn unmatched_brace_is_warned() {
        assert!(!validate_template("{year/{month}").valid);
        assert!(!validate_template("{year}}").valid);
        assert!(has_unbalanced_braces("{year"));
        assert!(!has_unbalanced_braces("{year}/{month}"));
    }

    #[test]
    fn escaping_target_is_warned() {
        assert!(!validate_template("../{year}").valid);
        assert!(!validate_template("/{year}").valid);
    }
}
