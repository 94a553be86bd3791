//! Adapter implementations for port traits.
//!
//! - `live/`: real API implementations
//! - `recording/`: record interactions to cassettes
//! - `replaying/`: replay interactions from cassettes

pub mod live;
pub mod recording;
pub mod replaying;

/// Port name used for [`crate::ports::ImageEditor`] interactions in cassettes.
pub(crate) const IMAGE_EDITOR_PORT: &str = "image_editor";
/// Method name used for [`crate::ports::ImageEditor::edit`] interactions.
pub(crate) const EDIT_METHOD: &str = "edit";
