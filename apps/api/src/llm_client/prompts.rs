// Shared prompt constants and prompt-building utilities.
// Each domain defines its own template alongside its Profile and Plan types.
// This file contains cross-cutting fragments.

/// System instruction that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured fitness and wellness assistant. \
    You MUST respond with valid JSON only, matching the provided response schema exactly. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Sentence every domain template opens its output contract with.
pub const JSON_FORMAT_INSTRUCTION: &str = "The response MUST be in JSON format.";

/// Placeholder for an optional free-text field left empty.
pub const NONE_PROVIDED: &str = "None provided";

/// Placeholder for optional symptom lists left empty.
pub const NONE_REPORTED: &str = "None reported";

/// Placeholder for optional measurements left empty.
pub const NOT_PROVIDED: &str = "Not provided";

/// Returns the value untouched, or `placeholder` when the user left the field blank.
pub fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

/// Fills `{name}` slots in a template in a single pass, so user text that happens
/// to contain `{...}` is never expanded. Unknown slots are left untouched.
pub fn render(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match slots.iter().find(|(slot, _)| *slot == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_placeholder_blank_uses_placeholder() {
        assert_eq!(or_placeholder("   ", NONE_PROVIDED), "None provided");
        assert_eq!(or_placeholder("", NOT_PROVIDED), "Not provided");
    }

    #[test]
    fn test_or_placeholder_keeps_text_verbatim() {
        assert_eq!(
            or_placeholder(" peanuts,shellfish ", NONE_PROVIDED),
            " peanuts,shellfish "
        );
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let out = render("{a} and {a} then {b}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and x then y");
    }

    #[test]
    fn test_render_leaves_unknown_slots() {
        assert_eq!(render("{missing}", &[("a", "x")]), "{missing}");
    }

    #[test]
    fn test_render_does_not_expand_slot_text_inside_values() {
        let out = render("{a} / {b}", &[("a", "{b}"), ("b", "y")]);
        assert_eq!(out, "{b} / y");
    }

    #[test]
    fn test_render_handles_unclosed_brace() {
        assert_eq!(render("x { y", &[("y", "z")]), "x { y");
    }
}
