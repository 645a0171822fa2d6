//! Description builder.

use std::collections::HashMap;

use regex::Captures;
use uuid::Uuid;

use super::variables::PLACEHOLDER;
use crate::entity::template;

/// Maximum description length accepted by YouTube, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

/// One template in a composition chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Template this fragment came from; `None` for ad-hoc text.
    pub template_id: Option<Uuid>,
    pub content: String,
}

impl Fragment {
    /// A fragment not tied to a stored template. Only shared bindings apply.
    pub fn unscoped(content: impl Into<String>) -> Self {
        Self {
            template_id: None,
            content: content.into(),
        }
    }

    pub fn for_template(template_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            template_id: Some(template_id),
            content: content.into(),
        }
    }
}

impl From<&template::Model> for Fragment {
    fn from(model: &template::Model) -> Self {
        Self::for_template(model.id, model.content.clone())
    }
}

/// Variable values available to a composition.
///
/// Values bound to a specific template apply only to that template's
/// placeholders. Shared values apply to every fragment and are consulted after
/// the template-scoped ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableBindings {
    shared: HashMap<String, String>,
    scoped: HashMap<Uuid, HashMap<String, String>>,
}

impl VariableBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings applied to every fragment regardless of template.
    pub fn shared<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            shared: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            scoped: HashMap::new(),
        }
    }

    /// Bind `name` for one template.
    pub fn bind(&mut self, template_id: Uuid, name: impl Into<String>, value: impl Into<String>) {
        self.scoped
            .entry(template_id)
            .or_default()
            .insert(name.into(), value.into());
    }

    /// Bind `name` for every template.
    pub fn bind_shared(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.shared.insert(name.into(), value.into());
    }

    pub fn get(&self, template_id: Option<Uuid>, name: &str) -> Option<&str> {
        template_id
            .and_then(|id| self.scoped.get(&id))
            .and_then(|vars| vars.get(name))
            .or_else(|| self.shared.get(name))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.shared.is_empty() && self.scoped.values().all(HashMap::is_empty)
    }
}

/// Value a placeholder takes when the video has no binding for it.
pub fn builtin_default(name: &str, remote_video_id: &str) -> Option<String> {
    match name {
        "video_id" => Some(remote_video_id.to_string()),
        "video_url" => Some(format!("https://youtu.be/{remote_video_id}")),
        _ => None,
    }
}

/// Compose a description from ordered fragments.
///
/// Each `{{name}}` resolves to the bound value, else the built-in default,
/// else the empty string. Resolved fragments are joined with `separator`.
/// Zero fragments produce an empty string. The result is not truncated; see
/// [`exceeds_platform_limit`].
pub fn build_description(
    fragments: &[Fragment],
    bindings: &VariableBindings,
    separator: &str,
    remote_video_id: &str,
) -> String {
    fragments
        .iter()
        .map(|fragment| {
            PLACEHOLDER
                .replace_all(&fragment.content, |caps: &Captures<'_>| {
                    let name = &caps[1];
                    bindings
                        .get(fragment.template_id, name)
                        .map(str::to_string)
                        .or_else(|| builtin_default(name, remote_video_id))
                        .unwrap_or_default()
                })
                .into_owned()
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Whether `description` is longer than YouTube accepts.
pub fn exceeds_platform_limit(description: &str) -> bool {
    description.chars().count() > MAX_DESCRIPTION_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unscoped(parts: &[&str]) -> Vec<Fragment> {
        parts.iter().map(|p| Fragment::unscoped(*p)).collect()
    }

    #[test]
    fn substitutes_bound_values_and_joins() {
        let bindings = VariableBindings::shared([("name", "Sam")]);
        let out = build_description(&unscoped(&["Hi {{name}}", "Bye"]), &bindings, " | ", "abc");
        assert_eq!(out, "Hi Sam | Bye");
    }

    #[test]
    fn missing_values_become_empty() {
        let out = build_description(
            &unscoped(&["{{name}}", "Bye"]),
            &VariableBindings::new(),
            " | ",
            "abc",
        );
        assert_eq!(out, " | Bye");
        assert!(!out.contains("{{"));
    }

    #[test]
    fn zero_fragments_is_empty() {
        assert_eq!(
            build_description(&[], &VariableBindings::new(), "\n", "abc"),
            ""
        );
    }

    #[test]
    fn separator_may_be_empty_or_multichar() {
        let parts = unscoped(&["a", "b", "c"]);
        let bindings = VariableBindings::new();
        assert_eq!(build_description(&parts, &bindings, "", "x"), "abc");
        assert_eq!(build_description(&parts, &bindings, "\n---\n", "x"), "a\n---\nb\n---\nc");
    }

    #[test]
    fn builtin_defaults_fill_unbound_names() {
        let out = build_description(
            &unscoped(&["Watch {{video_url}} ({{video_id}})"]),
            &VariableBindings::new(),
            "",
            "dQw4w9WgXcQ",
        );
        assert_eq!(out, "Watch https://youtu.be/dQw4w9WgXcQ (dQw4w9WgXcQ)");
    }

    #[test]
    fn explicit_binding_beats_builtin_default() {
        let bindings = VariableBindings::shared([("video_url", "https://example.com/v")]);
        let out = build_description(&unscoped(&["{{video_url}}"]), &bindings, "", "abc");
        assert_eq!(out, "https://example.com/v");
    }

    #[test]
    fn names_are_case_sensitive() {
        let bindings = VariableBindings::shared([("name", "Sam")]);
        let out = build_description(&unscoped(&["{{Name}}|{{name}}"]), &bindings, "", "abc");
        assert_eq!(out, "|Sam");
    }

    #[test]
    fn scoped_bindings_do_not_leak_across_templates() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut bindings = VariableBindings::new();
        bindings.bind(first, "sponsor", "Acme");

        let fragments = vec![
            Fragment::for_template(first, "Sponsor: {{sponsor}}"),
            Fragment::for_template(second, "Also {{sponsor}}"),
        ];
        let out = build_description(&fragments, &bindings, "\n", "abc");
        assert_eq!(out, "Sponsor: Acme\nAlso ");
    }

    #[test]
    fn scoped_binding_overrides_shared() {
        let id = Uuid::new_v4();
        let mut bindings = VariableBindings::shared([("x", "shared")]);
        bindings.bind(id, "x", "scoped");

        let fragments = vec![
            Fragment::for_template(id, "{{x}}"),
            Fragment::unscoped("{{x}}"),
        ];
        assert_eq!(build_description(&fragments, &bindings, ",", "v"), "scoped,shared");
    }

    #[test]
    fn composition_is_deterministic() {
        let bindings = VariableBindings::shared([("a", "1"), ("b", "2")]);
        let parts = unscoped(&["{{a}}{{b}}{{a}}", "{{c}}"]);
        let first = build_description(&parts, &bindings, "/", "v");
        let second = build_description(&parts, &bindings, "/", "v");
        assert_eq!(first, second);
        assert_eq!(first, "121/");
    }

    #[test]
    fn substituted_values_are_not_re_expanded() {
        let bindings = VariableBindings::shared([("a", "{{b}}"), ("b", "boom")]);
        let out = build_description(&unscoped(&["{{a}}"]), &bindings, "", "v");
        assert_eq!(out, "{{b}}");
    }

    #[test]
    fn platform_limit_counts_characters_not_bytes() {
        let at_limit = "é".repeat(MAX_DESCRIPTION_CHARS);
        assert!(!exceeds_platform_limit(&at_limit));
        assert!(exceeds_platform_limit(&format!("{at_limit}x")));
    }
}
