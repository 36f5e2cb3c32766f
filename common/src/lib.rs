pub mod document;
pub mod filter;
pub mod text;

pub use document::*;
pub use filter::*;
pub use text::*;
