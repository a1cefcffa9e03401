use regex::{Captures, Regex};
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder pattern"))
}

/// 以 `{key}` 佔位符套用欄位，未知的 key 原樣保留
pub fn render_template(template: &str, fields: &[(&str, &str)]) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            fields
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_known_placeholders() {
        let rendered = render_template(
            "Hi {first_name}, thanks for trying {company_name}!",
            &[("first_name", "Ada"), ("company_name", "Engines")],
        );
        assert_eq!(rendered, "Hi Ada, thanks for trying Engines!");
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let rendered = render_template("{greeting} {first_name}", &[("first_name", "Ada")]);
        assert_eq!(rendered, "{greeting} Ada");
    }

    #[test]
    fn test_repeated_placeholder() {
        let rendered = render_template("{x}-{x}", &[("x", "1")]);
        assert_eq!(rendered, "1-1");
    }
}
