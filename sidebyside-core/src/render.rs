//! HTML fragment rendering.
//!
//! Produces the table, the recap block and the hidden site-link carrier that
//! the form controller injects into its result view. All option and model
//! text goes through [`escape_html`]; the output is a pure function of its
//! inputs.

use crate::sanitize::escape_html;
use crate::types::{Cell, ComparisonOption, ComparisonResult, PLACEHOLDER, Recap, RowName, SiteLink};
use std::fmt::Write;

/// Class of the hidden element that carries site links.
pub const SITE_LINKS_CLASS: &str = "site-links";
/// Data attribute (without the `data-` prefix) holding the site-link JSON.
pub const SITE_LINKS_ATTR: &str = "sites";

/// Render the full response fragment for a validated result.
pub fn render_fragment(options: &[ComparisonOption], result: &ComparisonResult) -> String {
    let mut html = render_table(options, result);
    if let Some(recap) = &result.recap {
        html.push_str(&render_recap(recap));
    }
    html.push_str(&render_site_links(options));
    html
}

/// Render the six-row comparison table.
///
/// Rows always appear in [`RowName::ALL`] order with exactly one data cell
/// per option, whatever order (or subset) the model returned.
pub fn render_table(options: &[ComparisonOption], result: &ComparisonResult) -> String {
    let mut html = String::from("<table class=\"comparison\"><thead><tr><th>Attribute</th>");
    for option in options {
        let _ = write!(html, "<th>{}</th>", escape_html(&option.name));
    }
    html.push_str("</tr></thead><tbody>");

    for row in RowName::ALL {
        let _ = write!(html, "<tr><td><strong>{}</strong></td>", escape_html(row.as_str()));
        for index in 0..options.len() {
            html.push_str("<td>");
            match result.cell(row, index) {
                Some(cell) => push_cell(&mut html, cell),
                None => html.push_str(PLACEHOLDER),
            }
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table>");
    html
}

fn push_cell(html: &mut String, cell: &Cell) {
    html.push_str("<ul>");
    for phrase in cell {
        let _ = write!(html, "<li>{}</li>", escape_html(phrase));
    }
    html.push_str("</ul>");
}

/// Render the recap block.
pub fn render_recap(recap: &Recap) -> String {
    let mut html = String::from("<section class=\"recap\">");

    if let Some(line) = &recap.bottom_line {
        let _ = write!(html, "<p class=\"bottom-line\">{}</p>", escape_html(line));
    }

    let _ = write!(
        html,
        "<p class=\"suggestion\"><strong>Suggestion:</strong> {} \
         <span class=\"confidence confidence-{level}\">{level} confidence</span></p>",
        escape_html(recap.suggestion.label()),
        level = recap.confidence.as_str(),
    );

    push_list(&mut html, "why", "Why", &recap.why);
    push_list(&mut html, "key-differences", "Key differences", &recap.key_differences);

    html.push_str("</section>");
    html
}

fn push_list(html: &mut String, class: &str, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = write!(html, "<h4>{heading}</h4><ul class=\"{class}\">");
    for item in items {
        let _ = write!(html, "<li>{}</li>", escape_html(item));
    }
    html.push_str("</ul>");
}

/// Render the hidden element listing options that mention a URL.
pub fn render_site_links(options: &[ComparisonOption]) -> String {
    let links: Vec<SiteLink> = options
        .iter()
        .filter_map(|o| {
            o.url.as_ref().map(|url| SiteLink {
                name: o.name.clone(),
                url: url.clone(),
            })
        })
        .collect();
    // Serializing plain strings cannot fail.
    let json = serde_json::to_string(&links).unwrap_or_else(|_| "[]".to_string());
    format!(
        "<div class=\"{SITE_LINKS_CLASS}\" hidden data-{SITE_LINKS_ATTR}=\"{}\"></div>",
        escape_html(&json)
    )
}
