//! Navigation panel markup.
//!
//! A flat list styled to look nested: each entry is indented
//! proportionally to its heading level. Pure function of the title list.

use crate::titles::Title;
use std::fmt::Write;

const TOGGLE_BUTTON: &str = "<button id=\"toggle-nav\" aria-controls=\"nav-panel\">\
<i class=\"fas fa-sitemap\"></i> Contents</button>\n";

/// Render the toggle button and the (initially hidden) navigation panel.
/// Entry text is HTML-escaped; ids come straight from title extraction.
pub fn navigation_markup(titles: &[Title]) -> String {
    let mut out = String::from(TOGGLE_BUTTON);
    out.push_str("<div id=\"nav-panel\" style=\"display: none;\"><ul>\n");
    for title in titles {
        let padding = 20 * (usize::from(title.level) - 1) + 10;
        writeln!(
            out,
            "<li style=\"padding-left: {padding}px;\"><a href=\"#{}\">{}</a></li>",
            title.id,
            html_escape::encode_text(&title.text),
        )
        .expect("writing to a String cannot fail");
    }
    out.push_str("</ul></div>");
    out
}
