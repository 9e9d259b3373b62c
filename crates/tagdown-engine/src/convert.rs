//! The conversion orchestrator.
//!
//! One pass over the document: scan into blocks, rewrite each block
//! through the processor pipeline, extract titles for headings, then
//! assemble render data and delegate to the renderer. The blocking and
//! suspending variants produce byte-identical output; the suspending one
//! computes the three auxiliary pieces (navigation, asset paths, favicon
//! report) concurrently since none depends on another.

use crate::assets::{self, AssetError, AssetPaths};
use crate::favicon::{self, FaviconReport};
use crate::io::{self, IoError};
use crate::navigation;
use crate::process;
use crate::render::{PageRenderer, RenderData, RenderError, Renderer};
use crate::scan::{Segment, scan};
use crate::titles::{self, Title};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagdown_config::Config;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("required asset directory not found: {0}")]
    MissingAssetDir(PathBuf),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Orchestrates scan → process → render → write for one input/output
/// pair. Construction validates paths and templates so a misconfigured
/// converter fails before any conversion is attempted.
#[derive(Debug, Clone)]
pub struct Converter {
    config: Arc<Config>,
    renderer: PageRenderer,
}

impl Converter {
    pub fn new(config: Config) -> Result<Self, ConvertError> {
        for dir in [&config.assets.css, &config.assets.js, &config.assets.images] {
            if !dir.is_dir() {
                return Err(ConvertError::MissingAssetDir(dir.clone()));
            }
        }
        let renderer = PageRenderer::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            renderer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transform the raw document into processed content plus the ordered
    /// title list. Pure CPU work, no suspension points.
    ///
    /// The anchor ordinal advances for every scanned block, not only
    /// headings; interstitial passthrough is emitted verbatim while
    /// trailing passthrough becomes one escaped paragraph.
    pub fn process_document(&self, content: &str) -> (String, Vec<Title>) {
        let segments = scan(content);
        let total = segments.len();
        let mut out = String::with_capacity(content.len());
        let mut titles = Vec::new();
        let mut ordinal = 0;

        for (position, segment) in segments.into_iter().enumerate() {
            match segment {
                Segment::Passthrough(text) => {
                    if position + 1 == total {
                        let trailing = text.trim();
                        if !trailing.is_empty() {
                            out.push_str("<p>");
                            out.push_str(&html_escape::encode_text(trailing));
                            out.push_str("</p>");
                        }
                    } else {
                        out.push_str(text);
                    }
                }
                Segment::Block(block) => {
                    let index = ordinal;
                    ordinal += 1;

                    if !self.config.html.allowed_tags.iter().any(|t| t == block.tag) {
                        out.push_str(block.raw);
                        continue;
                    }

                    let body = match titles::heading_level(block.tag) {
                        Some(level) => {
                            let (rewritten, title) = titles::extract_heading(
                                block.raw,
                                level,
                                index,
                                &self.config.ids.title_prefix,
                            );
                            titles.push(title);
                            rewritten
                        }
                        None => block.raw.to_string(),
                    };
                    out.push_str(&process::run_pipeline(&body));
                }
            }
        }

        (out, titles)
    }

    /// Blocking conversion: read, process, render, write.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        info!(input = %input.display(), output = %output.display(), "starting conversion");

        let raw = io::read_input(input)?;
        let (content, titles) = self.process_document(&raw);

        let navigation = navigation::navigation_markup(&titles);
        let assets = assets::asset_paths();
        let favicon_status = favicon::verify_favicon_resources(
            &self.config.assets.images,
            &self.config.favicons.required_files,
        );

        let html = self.render(&content, &titles, &navigation, &assets, &favicon_status)?;
        io::write_output(output, &html)?;

        info!(output = %output.display(), "conversion complete");
        Ok(())
    }

    /// Suspending conversion, byte-identical to [`Self::convert`]. Read,
    /// scan/process, render and write stay strictly sequential; the
    /// auxiliary render data is computed concurrently on the blocking
    /// pool. Failure anywhere aborts before the write, so partial output
    /// is never produced.
    pub async fn convert_async(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        info!(input = %input.display(), output = %output.display(), "starting conversion");

        let raw = io::read_input_async(input).await?;
        let (content, titles) = self.process_document(&raw);

        let nav_titles = titles.clone();
        let images_dir = self.config.assets.images.clone();
        let required_files = self.config.favicons.required_files.clone();
        let (navigation, assets, favicon_status) = tokio::try_join!(
            tokio::task::spawn_blocking(move || navigation::navigation_markup(&nav_titles)),
            tokio::task::spawn_blocking(assets::asset_paths),
            tokio::task::spawn_blocking(move || {
                favicon::verify_favicon_resources(&images_dir, &required_files)
            }),
        )?;

        let html = self.render(&content, &titles, &navigation, &assets, &favicon_status)?;
        io::write_output_async(output, &html).await?;

        info!(output = %output.display(), "conversion complete");
        Ok(())
    }

    fn render(
        &self,
        content: &str,
        titles: &[Title],
        navigation: &str,
        assets: &AssetPaths,
        favicon_status: &FaviconReport,
    ) -> Result<String, ConvertError> {
        debug!(titles = titles.len(), "rendering document");
        let html = self.renderer.render(&RenderData {
            content,
            titles,
            navigation,
            assets,
            favicon_status,
            config: &self.config,
        })?;
        Ok(html)
    }

    /// Copy the configured asset sources next to the output file.
    pub fn prepare_assets(&self, output_dir: &Path) -> Result<(), AssetError> {
        assets::prepare_assets(&self.config.assets, output_dir)
    }
}
