use serde_json::Value;

/// One way of recovering a JSON object from free-form model text.
type Extractor = fn(&str) -> Option<Value>;

/// Tried in order; the first strategy that yields an object wins.
const EXTRACTORS: &[(&str, Extractor)] = &[
    ("direct", parse_direct),
    ("fenced", parse_fenced),
    ("balanced_braces", parse_balanced_braces),
];

/// Recover the JSON object embedded in a model response, if any.
pub fn extract_json_object(text: &str) -> Option<Value> {
    EXTRACTORS.iter().find_map(|(name, extract)| {
        let value = extract(text)?;
        tracing::trace!(target: "itinerary::model", strategy = *name, "recovered JSON object");
        Some(value)
    })
}

fn as_object(value: Value) -> Option<Value> {
    value.is_object().then_some(value)
}

/// The whole response is the object.
pub(crate) fn parse_direct(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok().and_then(as_object)
}

/// The object sits inside a markdown code fence, optionally tagged `json`.
pub(crate) fn parse_fenced(text: &str) -> Option<Value> {
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_ticks = &rest[open + 3..];
        let body_start = after_ticks.find('\n').map(|idx| idx + 1).unwrap_or(0);
        let info = after_ticks[..body_start].trim();
        let body = &after_ticks[body_start..];
        let Some(close) = body.find("```") else {
            return None;
        };

        if info.is_empty() || info.eq_ignore_ascii_case("json") {
            if let Some(value) = parse_direct(&body[..close]) {
                return Some(value);
            }
        }
        rest = &body[close + 3..];
    }
    None
}

/// The first top-level `{...}` span, matched with string and escape awareness, that parses.
///
/// Objects nested inside an unclosed span are fragments of cut-off output, never answers.
pub(crate) fn parse_balanced_braces(text: &str) -> Option<Value> {
    let mut offset = 0;
    while let Some(open) = text[offset..].find('{') {
        let start = offset + open;
        let end = start + balanced_end(&text[start..])?;
        if let Some(value) = parse_direct(&text[start..end]) {
            return Some(value);
        }
        offset = end;
    }
    None
}

/// Byte length of the balanced object starting at `text[0] == '{'`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}
