use std::borrow::Cow;

/// Appends each value through `f`, inserting `separator` between the pieces
/// that actually produced output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Caps statement text for log lines.
pub fn truncate_long(query: &str) -> Cow<'_, str> {
    const LIMIT: usize = 497;
    if query.len() <= LIMIT {
        return Cow::Borrowed(query);
    }
    let mut end = LIMIT;
    while !query.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!("{}...", query[..end].trim_end()))
}
