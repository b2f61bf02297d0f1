use crate::ast::SourceMap;
use super::{Diagnostic, Severity};

pub fn render(d: &Diagnostic) -> String {
    let severity = match d.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };

    let source_map = d.source.as_deref().map(SourceMap::new);

    let labels: Vec<serde_json::Value> = d.labels.iter().map(|l| {
        let mut obj = serde_json::json!({
            "start": l.span.start,
            "end": l.span.end,
            "message": l.message,
            "primary": l.is_primary,
        });
        if let Some(map) = &source_map {
            let snippet = map.snippet(l.span.start, l.span.end);
            obj["line"] = serde_json::Value::from(snippet.line);
            obj["col"] = serde_json::Value::from(snippet.column);
        }
        obj
    }).collect();

    let mut obj = serde_json::json!({
        "severity": severity,
        "message": d.message,
        "labels": labels,
        "notes": d.notes,
    });

    if let Some(code) = d.code {
        obj["code"] = serde_json::Value::String(code.to_string());
    }

    if let Some(s) = &d.suggestion {
        obj["suggestion"] = serde_json::Value::String(s.clone());
    }

    serde_json::to_string(&obj).unwrap_or_else(|_| r#"{"severity":"error","message":"internal error serializing diagnostic"}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::{Scope, eval};

    fn parse_json(s: &str) -> serde_json::Value {
        serde_json::from_str(s).expect("valid JSON")
    }

    fn span(start: usize, end: usize) -> Span {
        Span { start, end, line: 1, column: start as u32 }
    }

    #[test]
    fn render_basic_error() {
        let v = parse_json(&render(&Diagnostic::error("x is not a valid symbol")));
        assert_eq!(v["severity"], "error");
        assert_eq!(v["message"], "x is not a valid symbol");
        assert!(v["labels"].as_array().unwrap().is_empty());
        assert!(v.get("code").is_none());
    }

    #[test]
    fn render_with_span_and_source() {
        let d = Diagnostic::error("Unexpected token `@`")
            .with_span(span(4, 5), "here")
            .with_source("1 + @".to_string());
        let v = parse_json(&render(&d));
        let label = &v["labels"][0];
        assert_eq!(label["start"], 4);
        assert_eq!(label["end"], 5);
        assert_eq!(label["primary"], true);
        assert_eq!(label["line"], 1);
        assert_eq!(label["col"], 5);
    }

    #[test]
    fn render_runtime_error_from_eval() {
        let source = "\n[1][5]";
        let err = eval(source, &Scope::new()).unwrap_err();
        let d = Diagnostic::from(&err).with_source(source);
        let v = parse_json(&render(&d));
        assert_eq!(v["code"], "LE-R004");
        assert_eq!(v["message"], "Array index `5` out of range, expected < 1");
        assert_eq!(v["labels"][0]["line"], 2);
    }

    #[test]
    fn render_with_suggestion_and_notes() {
        let d = Diagnostic::error("bad")
            .with_note("first")
            .with_note("second")
            .with_suggestion("try this instead");
        let v = parse_json(&render(&d));
        assert_eq!(v["suggestion"], "try this instead");
        assert_eq!(v["notes"].as_array().unwrap().len(), 2);
        assert_eq!(v["notes"][0], "first");
    }

    #[test]
    fn render_no_suggestion_key_absent() {
        let v = parse_json(&render(&Diagnostic::error("bad")));
        assert!(v.get("suggestion").is_none());
    }

    #[test]
    fn render_label_without_source_no_line_col() {
        let d = Diagnostic::error("bad").with_span(span(5, 8), "here");
        let v = parse_json(&render(&d));
        let label = &v["labels"][0];
        assert!(label.get("line").is_none());
        assert!(label.get("col").is_none());
    }

    #[test]
    fn render_warning_severity() {
        let mut d = Diagnostic::error("unused");
        d.severity = Severity::Warning;
        assert_eq!(parse_json(&render(&d))["severity"], "warning");
    }
}
