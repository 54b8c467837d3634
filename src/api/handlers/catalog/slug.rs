//! Product slugs: lowercase `a-z0-9` words joined by single dashes.

/// Turn free text into a slug of at most `max` characters.
/// Returns `None` when nothing slug-worthy is left.
pub(super) fn slugify(input: &str, max: usize) -> Option<String> {
    let words: Vec<String> = input
        .to_lowercase()
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect();

    let joined = words.join("-");
    let truncated: String = joined.chars().take(max).collect();
    let slug = truncated.trim_end_matches('-');
    (!slug.is_empty()).then(|| slug.to_string())
}

/// First free variant of `base`: `base`, then `base-2`, `base-3`, ...
/// The suffix eats into `max` rather than growing the slug past it.
pub(super) fn unique_slug(base: &str, max: usize, taken: impl Fn(&str) -> bool) -> Option<String> {
    if !taken(base) {
        return Some(base.to_string());
    }
    (2..=1000).find_map(|n| {
        let suffix = format!("-{n}");
        let room = max.checked_sub(suffix.len()).filter(|room| *room > 0)?;
        let head: String = base.chars().take(room).collect();
        let head = head.trim_end_matches('-');
        if head.is_empty() {
            return None;
        }
        let candidate = format!("{head}{suffix}");
        (!taken(&candidate)).then_some(candidate)
    })
}
