//! Replaying adapter for the `ImageEditor` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::adapters::{EDIT_METHOD, IMAGE_EDITOR_PORT};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::image_editor::{EditFuture, EditRequest, ImageEditor, ImagePayload};

/// Serves recorded edit results from a cassette.
pub struct ReplayingImageEditor {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingImageEditor {
    /// Create a replaying editor backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl ImageEditor for ReplayingImageEditor {
    fn edit(&self, _request: &EditRequest) -> EditFuture<'_> {
        let result = next_output(&self.replayer, IMAGE_EDITOR_PORT, EDIT_METHOD)
            .and_then(replay_result::<ImagePayload>);
        Box::pin(async move { result })
    }
}
