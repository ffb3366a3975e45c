//! Human-readable validation reports
//!
//! Rendering only reads the structured errors; it never reorders, filters or
//! rewrites them.

use std::fmt::Write;

use crate::locate::SourceMap;
use crate::validate::ValidationError;

/// Render a multi-line report for `errors`
///
/// With `source` (the JSON text the errors were localized against) each
/// localized error also gets a code frame with a caret under the offending
/// position.
pub fn render_pretty(errors: &[ValidationError], source: Option<&str>) -> String {
    let mut out = String::new();
    if errors.is_empty() {
        out.push_str("✅ Document is valid\n");
        return out;
    }

    let map = source.map(SourceMap::new);
    for error in errors {
        render_error(&mut out, error, map.as_ref());
        out.push('\n');
    }

    let noun = if errors.len() == 1 { "error" } else { "errors" };
    let _ = writeln!(out, "❌ {} {}", errors.len(), noun);
    out
}

fn render_error(out: &mut String, error: &ValidationError, map: Option<&SourceMap<'_>>) {
    let _ = write!(out, "❌ [{}] {}", error.keyword, error.path);
    if let Some(location) = &error.location {
        let _ = write!(out, " (line {}, column {})", location.line, location.column);
    }
    out.push('\n');
    let _ = writeln!(out, "   {}", error.message);
    if let Some(suggestion) = &error.suggestion {
        let _ = writeln!(out, "   └─ Did you mean \"{}\"?", suggestion);
    }

    let (Some(location), Some(map)) = (&error.location, map) else {
        return;
    };
    let Some(line) = map.line_text(location.line) else {
        return;
    };
    let gutter = location.line.to_string();
    let pad = " ".repeat(gutter.len());
    // Keep tabs so the caret lines up with the source line
    let indent: String = line
        .chars()
        .take(location.column.saturating_sub(1))
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    let _ = writeln!(out, "   {} |", pad);
    let _ = writeln!(out, "   {} | {}", gutter, line);
    let _ = writeln!(out, "   {} | {}^", pad, indent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::SourceLocation;

    fn error(path: &str, keyword: &str, message: &str) -> ValidationError {
        ValidationError::new(path, keyword, message)
    }

    #[test]
    fn test_valid() {
        assert_eq!(render_pretty(&[], None), "✅ Document is valid\n");
    }

    #[test]
    fn test_plain_errors() {
        let errors = vec![
            error("/", "required", "missing required property \"title\""),
            error("/", "required", "missing required property \"children\""),
        ];
        let output = render_pretty(&errors, None);
        assert!(output.contains("❌ [required] /\n   missing required property \"title\""));
        assert!(output.ends_with("❌ 2 errors\n"));
        assert!(!output.contains(" | "));
    }

    #[test]
    fn test_suggestion_and_frame() {
        let source = "{\n  \"type\": \"Document\",\n  \"kind\": \"warnign\"\n}";
        let mut e = error("/kind", "enum", "must be one of: \"note\", \"warning\"");
        e.suggestion = Some("warning".to_string());
        e.location = Some(SourceLocation { line: 3, column: 11, offset: 35 });

        let output = render_pretty(&[e], Some(source));
        assert!(output.contains("❌ [enum] /kind (line 3, column 11)"));
        assert!(output.contains("└─ Did you mean \"warning\"?"));
        assert!(output.contains("   3 |   \"kind\": \"warnign\"\n"));
        assert!(output.contains("     |           ^\n"));
        assert!(output.ends_with("❌ 1 error\n"));
    }

    #[test]
    fn test_location_without_source_has_no_frame() {
        let mut e = error("/title", "type", "must be array, found string");
        e.location = Some(SourceLocation { line: 1, column: 2, offset: 1 });
        let output = render_pretty(&[e], None);
        assert!(output.contains("(line 1, column 2)"));
        assert!(!output.contains(" | "));
    }
}
