/// Collect the `%N` placeholder indices of a display message, in order of appearance.
///
/// `%%` is a literal percent sign and is skipped. A `%` not followed by a digit
/// is plain text.
pub fn placeholders(message: &str) -> Vec<usize> {
    let bytes = message.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'%') {
            i += 2;
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end > start {
            if let Ok(n) = message[start..end].parse::<usize>() {
                found.push(n);
            }
        }
        i = end.max(i + 1);
    }
    found
}

/// True if the placeholders are exactly `%1..=%arg_count`, each used once.
pub fn placeholders_match(found: &[usize], arg_count: usize) -> bool {
    if found.len() != arg_count {
        return false;
    }
    let mut sorted = found.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, n)| *n == i + 1)
}

/// Substitute `%N` with the N-th (1-based) label. Unmatched placeholders are kept.
pub fn render(message: &str, labels: &[&str]) -> String {
    let mut out = String::with_capacity(message.len());
    let mut chars = message.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if let Some((_, '%')) = chars.peek() {
            chars.next();
            out.push('%');
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while let Some((j, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            end = j + 1;
            chars.next();
        }
        let label = message[start..end]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| labels.get(idx));
        match label {
            Some(label) => out.push_str(label),
            None => out.push_str(&message[i..end]),
        }
    }
    out
}
