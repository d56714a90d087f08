//! HTML rendering and output placement

pub mod html;
pub mod output;

pub use html::HtmlRenderer;
pub use output::{unique_output_path, write_document};
