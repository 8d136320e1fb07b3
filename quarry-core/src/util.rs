/// Writes every value into `out` through `f`, inserting `separator` between
/// consecutive entries.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut first = true;
    for value in values {
        if !first {
            out.push_str(separator);
        }
        first = false;
        f(out, value);
    }
}

/// Runs `f` against `out`, wrapped in parentheses when `wrap` holds.
pub fn parenthesized_if(out: &mut String, wrap: bool, f: impl FnOnce(&mut String)) {
    if wrap {
        out.push('(');
    }
    f(out);
    if wrap {
        out.push(')');
    }
}
