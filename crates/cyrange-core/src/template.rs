//! Single-pass `{{ name }}` substitution for range descriptors.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::context::TemplateContext;

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("token pattern is valid")
});

/// Replace every known `{{ name }}` token in `text`.
///
/// Tokens whose name is not bound in `ctx` are left exactly as written.
/// Substituted values are never rescanned, so a value that itself looks
/// like a token survives verbatim.
#[must_use]
pub fn render(text: &str, ctx: &TemplateContext) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            ctx.get(&caps[1]).map_or_else(|| caps[0].to_string(), str::to_string)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> TemplateContext {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_known_tokens_replaced() {
        let out = render(
            "host={{ host_mgmt_addr }} id={{ clone_range_id }}",
            &ctx(&[("host_mgmt_addr", "10.0.0.1"), ("clone_range_id", "7")]),
        );
        assert_eq!(out, "host=10.0.0.1 id=7");
    }

    #[test]
    fn test_unknown_token_passes_through() {
        let out = render("a={{ not_a_var }} b={{ x }}", &ctx(&[("x", "1")]));
        assert_eq!(out, "a={{ not_a_var }} b=1");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let out = render("{{ x }}-{{x}}-{{  x  }}", &ctx(&[("x", "y")]));
        assert_eq!(out, "y-y-y");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let out = render(
            "{{ a }} {{ b }}",
            &ctx(&[("a", "{{ b }}"), ("b", "done")]),
        );
        assert_eq!(out, "{{ b }} done");
    }

    #[test]
    fn test_non_token_braces_untouched() {
        let text = "literal {{ }} and {{ 1bad }} and { single }";
        assert_eq!(render(text, &ctx(&[("bad", "x")])), text);
    }
}
