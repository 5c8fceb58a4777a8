/// Escapes HTML metacharacters and converts newlines to `<br>` markers.
///
/// This runs once at ingestion; the note repository stores the result as
/// opaque text and never re-escapes it.
pub fn sanitize_content(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }

    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("<br>");
            }
            '\n' => out.push_str("<br>"),
            other => out.push(other),
        }
    }
    out
}

/// Removes `<...>` tag spans. An unterminated tag swallows the rest of the
/// input, matching how stored content is previewed upstream.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            other => out.push(other),
        }
    }
    out
}

/// Tag-stripped prefix attached to notes in summary listings.
pub fn preview(html: &str, max_chars: usize) -> String {
    strip_tags(html).chars().take(max_chars).collect()
}

/// Converts stored note content back to plain text: `<br>` and closing block
/// tags become newlines, remaining tags are dropped, the entities produced by
/// [`sanitize_content`] are decoded, and line endings are normalized.
pub fn to_plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>') {
            Some(close) => {
                if tag_breaks_line(&after[..close]) {
                    out.push('\n');
                }
                rest = &after[close + 1..];
            }
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);

    let decoded = decode_entities(&out);

    let mut normalized = String::with_capacity(decoded.len());
    let mut chars = decoded.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            normalized.push('\n');
        } else {
            normalized.push(ch);
        }
    }
    normalized.trim().to_string()
}

fn tag_breaks_line(body: &str) -> bool {
    let tag = body.trim().to_ascii_lowercase();
    if tag == "br" || tag == "br/" || tag == "br /" {
        return true;
    }
    matches!(
        tag.as_str(),
        "/p" | "/div" | "/li" | "/h1" | "/h2" | "/h3" | "/h4" | "/h5" | "/h6"
    )
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
