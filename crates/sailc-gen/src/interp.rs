//! String interpolation: `{{ expr }}` placeholders to Python f-strings.
//!
//! A literal without placeholders becomes a plain quoted string. With
//! placeholders it becomes an f-string whose expressions are emitted
//! in place; dotted placeholders get dict-safe member access, so
//! `"hello {{u.name}}!"` renders
//! `f"hello {(u["name"] if isinstance(u, dict) else u.name)}!"`.

/// Quote a string as a Python string literal.
pub(crate) fn py_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    push_escaped(&mut out, value);
    out.push('"');
    out
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
}

/// Convert a Sailfin string literal into a Python expression.
pub(crate) fn interpolate(value: &str) -> String {
    if !value.contains("{{") {
        return py_str(value);
    }

    let mut out = String::with_capacity(value.len() + 4);
    out.push_str("f\"");
    let mut rest = value;
    loop {
        match rest.find("{{") {
            None => {
                push_fstring_literal(&mut out, rest);
                break;
            }
            Some(open) => {
                let (literal, after_open) = rest.split_at(open);
                push_fstring_literal(&mut out, literal);
                let after_open = &after_open[2..];
                match after_open.find("}}") {
                    None => {
                        // Unbalanced placeholder: keep the braces literal
                        push_fstring_literal(&mut out, "{{");
                        push_fstring_literal(&mut out, after_open);
                        break;
                    }
                    Some(close) => {
                        let expression = after_open[..close].trim();
                        out.push('{');
                        out.push_str(&placeholder_expr(expression));
                        out.push('}');
                        rest = &after_open[close + 2..];
                    }
                }
            }
        }
    }
    out.push('"');
    out
}

/// Literal text inside an f-string: escape quotes and double up braces.
fn push_fstring_literal(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            c => out.push(c),
        }
    }
}

/// Rewrite a placeholder expression for safe member access.
///
/// `a.b.c` chains fold into guarded lookups; anything that is not a
/// plain dotted identifier passes through unchanged.
fn placeholder_expr(expression: &str) -> String {
    let segments: Vec<&str> = expression.split('.').collect();
    if segments.len() < 2 || !segments.iter().all(|s| is_identifier(s)) {
        return expression.to_string();
    }
    let mut acc = segments[0].to_string();
    for segment in &segments[1..] {
        acc = format!(
            "({acc}[\"{segment}\"] if isinstance({acc}, dict) else {acc}.{segment})"
        );
    }
    acc
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
