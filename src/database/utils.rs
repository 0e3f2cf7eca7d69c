use std::sync::OnceLock;

use regex::Regex;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\?").expect("placeholder pattern is valid"))
}

/// Collapses whitespace and numbers `?` placeholders as `$1, $2, ...` so
/// queries can be written positionally.
pub fn sql(query: &str) -> String {
    let cleaned = query.split_whitespace().collect::<Vec<&str>>().join(" ");
    let mut param_index = 0;
    placeholder()
        .replace_all(&cleaned, |_: &regex::Captures| {
            param_index += 1;
            format!("${}", param_index)
        })
        .into_owned()
}
