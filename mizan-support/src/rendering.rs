//! Text rendering for diagnostics.
//!
//! Type names come from [`std::any::type_name`] and are fully qualified,
//! which makes reports hard to scan. These helpers shorten them, lay out
//! per-component findings and suggest registered types close to a missing one.

/// Renders a header followed by its items as a tree.
///
/// ```
/// use mizan_support::rendering::render_tree;
///
/// let rendered = render_tree("Mailer [Singleton]", &["i32", "String"]);
/// assert_eq!(rendered, "Mailer [Singleton]\n  ├─ i32\n  └─ String\n");
/// ```
pub fn render_tree(header: &str, items: &[impl AsRef<str>]) -> String {
    let mut result = String::new();
    result.push_str(header);
    result.push('\n');

    for (i, item) in items.iter().enumerate() {
        let branch = if i + 1 == items.len() { "└─" } else { "├─" };
        result.push_str("  ");
        result.push_str(branch);
        result.push(' ');
        result.push_str(item.as_ref());
        result.push('\n');
    }

    result
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use mizan_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::services::Mailer"), "Mailer");
/// assert_eq!(
///     shorten_type_name("dyn core::ops::function::Fn(i32) -> my_app::Mailer"),
///     "dyn Fn(i32) -> Mailer"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                segment.clear();
            }
            '<' | '>' | '(' | ')' | '[' | ']' | ',' | ' ' | '&' | ';' => {
                result.push_str(&segment);
                result.push(ch);
                segment.clear();
            }
            _ => segment.push(ch),
        }
    }

    result.push_str(&segment);
    result
}

/// Registered type names that look like `requested`, best match first.
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    // stable on ties, so callers passing sorted input get sorted output
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
