//! Placeholder extraction.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Matches `{{name}}` where `name` is one or more ASCII letters, digits, or underscores.
pub(super) static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder pattern is a valid regex")
});

/// Extract the distinct placeholder names in `text`, in first-occurrence order.
///
/// Unbalanced or malformed braces (`{{name}`, `{{ name }}`, `{{}}`) are not
/// placeholders and are ignored. Text without placeholders yields an empty list.
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_first_occurrence_order() {
        let names = extract_variables("{{b}} then {{a}} then {{b}} and {{c_1}}");
        assert_eq!(names, vec!["b", "a", "c_1"]);
    }

    #[test]
    fn no_placeholders_is_empty() {
        assert!(extract_variables("plain text, no braces").is_empty());
        assert!(extract_variables("").is_empty());
    }

    #[test]
    fn malformed_braces_are_ignored() {
        let names = extract_variables("{{open} {close}} {{ spaced }} {{}} {{bad-name}} {{ok}}");
        assert_eq!(names, vec!["ok"]);
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_eq!(extract_variables("{{Name}} {{name}}"), vec!["Name", "name"]);
    }

    #[test]
    fn nested_braces_take_the_inner_placeholder() {
        assert_eq!(extract_variables("{{{x}}}"), vec!["x"]);
    }
}
