//! # tagdown engine
//!
//! Turns a tag-annotated plain-text document into a complete HTML page.
//!
//! The pipeline runs in one pass over the source:
//!
//! 1. **`scan`**: locate top-level blocks for the allowed tag pairs
//! 2. **`titles`**: assign anchor ids to heading blocks
//! 3. **`process`**: rewrite code/list/table shorthand inside each block
//! 4. **`convert`**: assemble content, navigation, asset paths and the
//!    favicon report, then hand everything to the renderer
//!
//! Scanning and processing are pure, synchronous CPU work; `convert`
//! exposes both a blocking and a suspending variant with byte-identical
//! output.

pub mod assets;
pub mod convert;
pub mod favicon;
pub mod io;
pub mod navigation;
pub mod process;
pub mod render;
pub mod scan;
pub mod titles;

pub use convert::{ConvertError, Converter};
pub use render::{PageRenderer, RenderData, RenderError, Renderer};
pub use scan::{Block, Segment, scan};
pub use titles::Title;
