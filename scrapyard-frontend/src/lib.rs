//! Export artwork for scraped records.
//!
//! Records served from the cache can be composed into a single preview
//! image (screenshot, cover, logo and media texture) laid out according to
//! a YAML [`ArtworkLayout`].

pub mod compositor;
pub mod error;
pub mod layout;

pub use compositor::ArtworkCompositor;
pub use error::FrontendError;
pub use layout::ArtworkLayout;
