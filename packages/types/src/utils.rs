/// Replaces every character outside `[A-Za-z0-9.-]` with `_` so an uploaded
/// file name can be used as an object key segment.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

/// Loose shape check for an email address: one `@`, a non-empty local part and
/// a dotted domain. Deliverability is the payment provider's concern.
pub fn is_plausible_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
