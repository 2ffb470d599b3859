use crate::models::TableRow;

const CELL_STYLE: &str = "text-align: left; vertical-align: top;";

/// Renders rows as a standalone HTML table. Image cells are inserted as
/// markup, every other cell is escaped with newlines kept as `<br>`.
pub fn render_html_table(rows: &[TableRow]) -> String {
    let mut html = String::from("<table border=\"1\" class=\"annotations\">\n  <thead>\n    <tr>");
    for header in TableRow::HEADERS {
        html.push_str(&format!("<th style=\"{CELL_STYLE}\">{header}</th>"));
    }
    html.push_str("</tr>\n  </thead>\n  <tbody>\n");

    for row in rows {
        html.push_str("    <tr>");
        for (index, cell) in row.cells().into_iter().enumerate() {
            let content = if index == 0 {
                cell.to_string()
            } else {
                escape_text(cell)
            };
            html.push_str(&format!("<td style=\"{CELL_STYLE}\">{content}</td>"));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("  </tbody>\n</table>\n");
    html
}

/// Wraps a table in a minimal HTML document.
pub fn render_html_page(title: &str, table: &str) -> String {
    let title = escape_text(title);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{table}</body>\n</html>\n"
    )
}

fn escape_text(input: &str) -> String {
    html_escape::encode_text(input).replace('\n', "<br>")
}
