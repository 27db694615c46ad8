//! HTML rendering for the log viewer page

use crate::logging::{Level, Segment};

use super::source::{Page, SourceKind};

const STYLE: &str = r#"
        body {
            font-family: 'Courier New', monospace;
            background-color: #1e1e1e;
            color: #d4d4d4;
            margin: 0;
            padding: 20px;
        }
        h1 { color: #4fc3f7; margin-bottom: 10px; }
        .controls {
            background-color: #2d2d2d;
            padding: 15px;
            border-radius: 5px;
            margin-bottom: 20px;
        }
        .level-filter, .source-filter { margin-bottom: 10px; }
        .level-filter a, .source-filter a, .pagination a {
            color: #4fc3f7;
            text-decoration: none;
            padding: 5px 10px;
            background-color: #3a3a3a;
            border-radius: 3px;
            margin-right: 5px;
        }
        .level-filter a:hover, .source-filter a:hover, .pagination a:hover {
            background-color: #4a4a4a;
        }
        .active {
            color: #fff;
            background-color: #0d6efd;
            padding: 5px 10px;
            border-radius: 3px;
            margin-right: 5px;
            font-weight: bold;
        }
        .pagination { margin-top: 10px; }
        .pagination .disabled { color: #666; padding: 5px 10px; }
        .pagination .page-info { color: #aaa; margin: 0 10px; }
        .log-container {
            background-color: #0d1117;
            border: 1px solid #30363d;
            border-radius: 5px;
            padding: 15px;
            overflow-x: auto;
        }
        .log-entry {
            line-height: 1.5;
            padding: 8px 0;
            white-space: pre-wrap;
            word-wrap: break-word;
            border-bottom: 1px solid #21262d;
            margin-bottom: 5px;
        }
        .log-entry:last-child { border-bottom: none; }
        .log-entry:hover { background-color: #161b22; }
"#;

/// Filter settings echoed into every navigation link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewContext {
    pub level: Level,
    pub source: SourceKind,
    /// Whether a row store is attached, so the source switch is worth showing
    pub has_row_store: bool,
}

/// Escape HTML special characters
pub fn html_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

fn link(level: Level, page: usize, per_page: usize, source: SourceKind) -> String {
    format!(
        "?level={}&amp;page={}&amp;per_page={}&amp;source={}",
        level.as_str().to_ascii_lowercase(),
        page,
        per_page,
        source.as_str()
    )
}

/// Colour the level token of a head line (input must already be escaped)
fn colorize_head(line: &str) -> String {
    for level in Level::ALL {
        let token = format!(" {} ", level.as_str());
        if line.contains(&token) {
            return line.replacen(
                &token,
                &format!(
                    " <span style=\"color: {}; font-weight: bold;\">{}</span> ",
                    level.color(),
                    level.as_str()
                ),
                1,
            );
        }
    }
    line.to_string()
}

fn render_entry(segment: &Segment) -> String {
    let lines: Vec<String> = segment
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let escaped = html_escape(line.trim_end());
            if i == 0 {
                colorize_head(&escaped)
            } else {
                escaped
            }
        })
        .collect();
    format!("<div class=\"log-entry\">{}</div>", lines.join("<br>"))
}

fn render_pagination(page: &Page, ctx: &ViewContext) -> String {
    let mut html = String::from("<div class=\"pagination\">");

    match page.prev_page() {
        Some(prev) => html.push_str(&format!(
            "<a href=\"{}\">&laquo; Previous</a> ",
            link(ctx.level, prev, page.per_page, ctx.source)
        )),
        None => html.push_str("<span class=\"disabled\">&laquo; Previous</span> "),
    }

    html.push_str(&format!(
        "<span class=\"page-info\">Page {} of {} ({} entries)</span>",
        page.page, page.total_pages, page.total_entries
    ));

    match page.next_page() {
        Some(next) => html.push_str(&format!(
            " <a href=\"{}\">Next &raquo;</a>",
            link(ctx.level, next, page.per_page, ctx.source)
        )),
        None => html.push_str(" <span class=\"disabled\">Next &raquo;</span>"),
    }

    html.push_str("</div>");
    html
}

fn render_level_filter(page: &Page, ctx: &ViewContext) -> String {
    let mut html = String::from("<div class=\"level-filter\">Filter by level: ");
    for level in Level::ALL {
        if level == ctx.level {
            html.push_str(&format!("<span class=\"active\">{}</span> ", level));
        } else {
            html.push_str(&format!(
                "<a href=\"{}\">{}</a> ",
                link(level, 1, page.per_page, ctx.source),
                level
            ));
        }
    }
    html.push_str("</div>");
    html
}

fn render_source_filter(page: &Page, ctx: &ViewContext) -> String {
    if !ctx.has_row_store {
        return String::new();
    }

    let mut html = String::from("<div class=\"source-filter\">Source: ");
    for (kind, label) in [(SourceKind::File, "File"), (SourceKind::Db, "Database")] {
        if kind == ctx.source {
            html.push_str(&format!("<span class=\"active\">{}</span> ", label));
        } else {
            html.push_str(&format!(
                "<a href=\"{}\">{}</a> ",
                link(ctx.level, 1, page.per_page, kind),
                label
            ));
        }
    }
    html.push_str("</div>");
    html
}

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n    <title>JustLog Viewer</title>\n    \
         <meta charset=\"utf-8\">\n    <style>{STYLE}    </style>\n</head>\n<body>\n    \
         <h1>JustLog Viewer</h1>\n{body}\n</body>\n</html>"
    )
}

/// Render a full viewer page
pub fn render_page(page: &Page, ctx: &ViewContext) -> String {
    let entries: Vec<String> = page.entries.iter().map(render_entry).collect();
    let log_content = if entries.is_empty() {
        "<p>No logs found.</p>".to_string()
    } else {
        entries.join("\n")
    };
    let pagination = render_pagination(page, ctx);

    document(&format!(
        "    <div class=\"controls\">\n        {}\n        {}\n        {}\n    </div>\n    \
         <div class=\"log-container\">\n        {}\n    </div>\n    \
         <div class=\"controls\">\n        {}\n    </div>",
        render_source_filter(page, ctx),
        render_level_filter(page, ctx),
        pagination,
        log_content,
        pagination
    ))
}

/// Page shown when no log file has been configured or created yet
pub fn render_missing_log() -> String {
    document("    <p>No log file found. Has the logger been set up with a log file path?</p>")
}
