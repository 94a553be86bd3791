//! Recording adapter for the `ImageEditor` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::adapters::{EDIT_METHOD, IMAGE_EDITOR_PORT};
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::image_editor::{EditFuture, EditRequest, ImageEditor};

/// Records edit interactions while delegating to an inner implementation.
pub struct RecordingImageEditor {
    inner: Box<dyn ImageEditor>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingImageEditor {
    /// Creates a new recording editor wrapping the given implementation.
    pub fn new(inner: Box<dyn ImageEditor>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl ImageEditor for RecordingImageEditor {
    fn edit(&self, request: &EditRequest) -> EditFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.edit(&request).await;
            record_result(&self.recorder, IMAGE_EDITOR_PORT, EDIT_METHOD, &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditError;
    use crate::ports::ImagePayload;

    struct FixedEditor(Result<ImagePayload, String>);

    impl ImageEditor for FixedEditor {
        fn edit(&self, _request: &EditRequest) -> EditFuture<'_> {
            let result = self.0.clone().map_err(EditError::MalformedResponse);
            Box::pin(async move { result })
        }
    }

    fn request() -> EditRequest {
        EditRequest {
            image: ImagePayload::new(vec![1, 2, 3], "image/png"),
            instruction: "remove background".into(),
        }
    }

    #[tokio::test]
    async fn records_success_and_failure() {
        let dir = std::env::temp_dir().join("snapedit_recording_adapter_test");
        let path = dir.join("image_editor.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "rec", "abc")));

        let ok = RecordingImageEditor::new(
            Box::new(FixedEditor(Ok(ImagePayload::new(vec![4, 5, 6], "image/png")))),
            Arc::clone(&recorder),
        );
        let failing = RecordingImageEditor::new(
            Box::new(FixedEditor(Err("no image".into()))),
            Arc::clone(&recorder),
        );

        assert!(ok.edit(&request()).await.is_ok());
        assert!(failing.edit(&request()).await.is_err());
        drop((ok, failing));

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        recorder.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let cassette: crate::cassette::format::Cassette = serde_yaml::from_str(&content).unwrap();
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].input["instruction"], "remove background");
        assert_eq!(cassette.interactions[0].output["Ok"]["data"], "BAUG");
        assert_eq!(cassette.interactions[1].output["Err"]["category"], "MalformedResponse");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
