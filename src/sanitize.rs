const FENCE: &str = "```";

/// Strips markdown code-fence artifacts that models wrap around JSON payloads.
///
/// Only one leading tagged fence, one leading bare fence and one trailing
/// fence are removed; a single pair of inline backticks is unwrapped last.
pub fn sanitize_model_output(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_tagged = strip_leading_fence(trimmed, true);
    let without_bare = strip_leading_fence(without_tagged, false);
    let without_trailing = strip_trailing_fence(without_bare);
    strip_inline_backticks(without_trailing).trim().to_string()
}

fn strip_leading_fence(input: &str, allow_json_tag: bool) -> &str {
    let Some(mut rest) = input.trim_start().strip_prefix(FENCE) else {
        return input;
    };
    if allow_json_tag {
        if let Some(tag) = rest.get(..4) {
            if tag.eq_ignore_ascii_case("json") {
                rest = &rest[4..];
            }
        }
    }
    rest.trim_start()
}

fn strip_trailing_fence(input: &str) -> &str {
    input.trim_end().strip_suffix(FENCE).unwrap_or(input)
}

fn strip_inline_backticks(input: &str) -> &str {
    if input.len() > 2 && input.starts_with('`') && input.ends_with('`') {
        &input[1..input.len() - 1]
    } else {
        input
    }
}
