//! The renderer seam and the built-in page renderer.
//!
//! The conversion pipeline treats rendering as an external collaborator:
//! everything it knows is in [`RenderData`], and anything implementing
//! [`Renderer`] can turn that into a document. [`PageRenderer`] is the
//! built-in implementation used by the CLI and the live server.

use crate::assets::AssetPaths;
use crate::favicon::FaviconReport;
use crate::titles::Title;
use std::path::PathBuf;
use tagdown_config::Config;

/// Everything a renderer gets: processed content, the ordered title list,
/// prebuilt navigation markup, the relative asset layout, the favicon
/// integrity report and the configuration, passed by reference.
#[derive(Debug)]
pub struct RenderData<'a> {
    pub content: &'a str,
    pub titles: &'a [Title],
    pub navigation: &'a str,
    pub assets: &'a AssetPaths,
    pub favicon_status: &'a FaviconReport,
    pub config: &'a Config,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("required template fragment not found: {0}")]
    MissingFragment(PathBuf),
    #[error("failed to read template fragment {path}: {source}")]
    FragmentRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub trait Renderer {
    fn render(&self, data: &RenderData<'_>) -> Result<String, RenderError>;
}

/// Assembles the complete HTML document around the converted content.
/// Optional header/footer fragments are read once at construction;
/// configuring a fragment that does not exist fails fast, before any
/// conversion is attempted.
#[derive(Debug, Clone, Default)]
pub struct PageRenderer {
    header: Option<String>,
    footer: Option<String>,
}

impl PageRenderer {
    pub fn from_config(config: &Config) -> Result<Self, RenderError> {
        Ok(Self {
            header: read_fragment(config.templates.header.as_ref())?,
            footer: read_fragment(config.templates.footer.as_ref())?,
        })
    }
}

fn read_fragment(path: Option<&PathBuf>) -> Result<Option<String>, RenderError> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !path.exists() {
        return Err(RenderError::MissingFragment(path.clone()));
    }
    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|source| RenderError::FragmentRead {
            path: path.clone(),
            source,
        })
}

impl Renderer for PageRenderer {
    fn render(&self, data: &RenderData<'_>) -> Result<String, RenderError> {
        let title = data
            .titles
            .first()
            .map(|t| t.text.as_str())
            .unwrap_or("Structured Text");

        let mut page = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        page.push_str("<meta charset=\"UTF-8\">\n");
        page.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
        push_line(&mut page, format_args!("<title>{}</title>", html_escape::encode_text(title)));
        push_line(
            &mut page,
            format_args!("<link rel=\"stylesheet\" href=\"{}/styles.css\">", data.assets.css),
        );
        self.write_favicon_links(&mut page, data);
        page.push_str("</head>\n<body>\n");

        if let Some(header) = &self.header {
            page.push_str(header);
            page.push('\n');
        }
        page.push_str(data.navigation);
        page.push('\n');
        page.push_str("<main class=\"content\">\n");
        page.push_str(data.content);
        page.push_str("\n</main>\n");
        if let Some(footer) = &self.footer {
            page.push_str(footer);
            page.push('\n');
        }
        push_line(
            &mut page,
            format_args!("<script src=\"{}/main.js\"></script>", data.assets.js),
        );
        page.push_str("</body>\n</html>\n");
        Ok(page)
    }
}

impl PageRenderer {
    /// Links only the favicon files the integrity report did not flag.
    fn write_favicon_links(&self, page: &mut String, data: &RenderData<'_>) {
        for file_name in &data.config.favicons.required_files {
            if data.favicon_status.flags(file_name) {
                continue;
            }
            push_line(
                page,
                format_args!("<link rel=\"icon\" href=\"{}/{file_name}\">", data.assets.images),
            );
        }
        if !data.favicon_status.flags("site.webmanifest") {
            push_line(
                page,
                format_args!(
                    "<link rel=\"manifest\" href=\"{}/site.webmanifest\">",
                    data.assets.images
                ),
            );
        }
    }
}

fn push_line(page: &mut String, line: std::fmt::Arguments<'_>) {
    use std::fmt::Write;
    // Writing to a String cannot fail.
    let _ = writeln!(page, "{line}");
}
