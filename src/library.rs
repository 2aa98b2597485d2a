//! Track model, tag reading and path expansion for the playlist.

mod display;
mod metadata;
mod model;
mod scan;

pub use display::{display_line, display_subtitle, display_title, format_time};
pub use metadata::{LoftyMetadata, MetadataCallback, MetadataSource, TagData, read_tags};
pub use model::{Artwork, PLACEHOLDER_ART, Track};
pub use scan::expand_inputs;
