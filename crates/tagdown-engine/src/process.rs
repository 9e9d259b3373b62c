//! Per-block content processors.
//!
//! A closed set of stateless rewriters, applied to every scanned block in
//! the fixed order Code → List → Table. Each is a no-op when its trigger
//! substring is absent, so the common case costs one substring search.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// The processor variants. Extending the pipeline means adding a variant
/// here, not probing block content ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Processor {
    Code,
    List,
    Table,
}

impl Processor {
    /// Application order is fixed: Code, then List, then Table.
    pub const PIPELINE: [Processor; 3] = [Processor::Code, Processor::List, Processor::Table];

    pub fn apply(&self, content: &str) -> String {
        match self {
            Processor::Code => apply_code(content),
            Processor::List => apply_list(content),
            Processor::Table => apply_table(content),
        }
    }
}

/// Run the full pipeline once over a block. Exactly-once application is
/// the caller's responsibility: the code step HTML-escapes and re-running
/// it double-escapes.
pub fn run_pipeline(content: &str) -> String {
    let mut content = content.to_string();
    for processor in Processor::PIPELINE {
        content = processor.apply(&content);
    }
    content
}

fn code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<code>(.*?)</code>").expect("valid code regex"))
}

fn brace_regex() -> &'static Regex {
    // No (?s): list shorthand is single-line, as it always has been.
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(.*?)\}").expect("valid brace regex"))
}

/// HTML-escape the inner text of every `<code>...</code>` occurrence.
fn apply_code(content: &str) -> String {
    if !content.contains("<code>") {
        return content.to_string();
    }
    code_regex()
        .replace_all(content, |caps: &Captures| {
            format!("<code>{}</code>", html_escape::encode_text(&caps[1]))
        })
        .into_owned()
}

/// Rewrite `{a,b,c}` shorthand into `<li>` items. Items split on literal
/// commas and are not escaped. The `<ul>` wrap only applies when no
/// literal `<ul>`/`<ol>` survived the rewrite; shorthand inside an `<ol>`
/// block keeps its ol-ness only because the author's tag is still there.
fn apply_list(content: &str) -> String {
    if !content.contains("<ul>") && !content.contains("<ol>") {
        return content.to_string();
    }
    let rewritten = brace_regex().replace_all(content, |caps: &Captures| {
        let items: Vec<&str> = caps[1].split(',').collect();
        format!("<li>{}</li>", items.join("</li><li>"))
    });
    if rewritten.contains("<ul>") || rewritten.contains("<ol>") {
        rewritten.into_owned()
    } else {
        format!("<ul>{rewritten}</ul>")
    }
}

/// Rewrite a `<table>` block: an optional `<thead>[[..|..]]</thead>` line
/// defines the header, every `[[..|..]]` line becomes a body row with the
/// first cell as a row header. The processor always emits its own
/// `<tbody>`; explicit ones in the input are dropped.
fn apply_table(content: &str) -> String {
    if !content.contains("<table>") {
        return content.to_string();
    }

    let inner = content.replace("<table>", "").replace("</table>", "");
    let mut parts = vec![String::from(r#"<table class="content-table">"#)];
    let mut tbody_open = false;

    for line in inner.trim().lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("<thead>") {
            parts.push(table_header(line));
            tbody_open = true; // table_header opens <tbody>
        } else if line.starts_with("<tbody>") || line.starts_with("</tbody>") {
            continue;
        } else if line.contains("[[") && line.contains("]]") {
            if !tbody_open {
                parts.push("<tbody>".to_string());
                tbody_open = true;
            }
            parts.push(table_row(line));
        }
    }

    if tbody_open {
        parts.push("</tbody>".to_string());
    }
    parts.push("</table>".to_string());

    format!(
        "<div class=\"table-responsive\">\n{}\n</div>",
        parts.join("\n")
    )
}

fn table_header(line: &str) -> String {
    let header = line.replace("<thead>", "").replace("</thead>", "");
    if !header.contains("[[") {
        return String::new();
    }
    let cells: String = header
        .trim_matches(|c| c == '[' || c == ']')
        .split('|')
        .map(str::trim)
        .map(|cell| format!("<th scope=\"col\">{cell}</th>"))
        .collect();
    format!("<thead><tr>{cells}</tr></thead><tbody>")
}

fn table_row(line: &str) -> String {
    let mut cells = line.trim_matches(|c| c == '[' || c == ']').split('|');
    let first = cells.next().unwrap_or("").trim();
    let rest: String = cells
        .map(str::trim)
        .map(|cell| format!("<td>{cell}</td>"))
        .collect();
    format!("<tr><td class=\"row-header\">{first}</td>{rest}</tr>")
}
