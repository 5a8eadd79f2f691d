//! Page content model: bilingual resolution and block rendering.

pub mod blocks;
pub mod locale;

pub use blocks::{block_catalog, render_block, BlockKind, BlockTypeInfo, RenderedBlock};
pub use locale::{localize, pick_text, Locale};
