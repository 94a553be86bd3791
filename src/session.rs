//! Edit session controller: upload, instruct, submit, export.
//!
//! An [`EditSession`] owns the state of one user's upload/edit/result cycle.
//! Every transition is a plain method; [`EditSession::submit`] is the only one
//! that talks to the outside world, through an [`ImageEditor`].
//!
//! Submission is split into [`EditSession::begin_submit`] and
//! [`EditSession::complete`] so the session can stay usable while a request
//! is in flight. Each dispatch gets a fresh ticket; `reset` and `upload`
//! invalidate it, and `complete` drops any result whose ticket is stale.

use std::fmt;

use thiserror::Error;

use crate::error::{EditError, FailureCategory};
use crate::ports::{EditRequest, ImageEditor, ImagePayload};

/// Observable state of a session, derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing uploaded.
    Empty,
    /// An original is present; no result or error yet.
    Ready,
    /// A request is in flight.
    Submitting,
    /// The last request produced an edited image.
    Succeeded,
    /// The last request failed.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Empty => "empty",
            Self::Ready => "ready",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// A transition the session refused to make.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The upload was empty or not an image.
    #[error("Not a valid image (mime type '{mime_type}', {len} bytes)")]
    InvalidImage {
        /// Declared MIME type of the rejected payload.
        mime_type: String,
        /// Size of the rejected payload.
        len: usize,
    },
    /// Submit needs an uploaded image.
    #[error("Upload an image before submitting")]
    NoImage,
    /// Submit needs a non-blank instruction.
    #[error("Instruction is empty")]
    EmptyInstruction,
    /// A request is already in flight.
    #[error("An edit is already in progress")]
    Busy,
    /// There is no edited image to retrieve.
    #[error("No edited image available")]
    NoResult,
}

/// The recorded outcome of a failed edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    /// Why the edit failed.
    pub category: FailureCategory,
    /// Human-readable description.
    pub message: String,
}

impl From<&EditError> for SessionFailure {
    fn from(err: &EditError) -> Self {
        Self { category: err.category(), message: err.to_string() }
    }
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} failure)", self.message, self.category)
    }
}

/// Identifies one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// A request that has been dispatched but not yet completed.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    /// Pass back to [`EditSession::complete`].
    pub ticket: Ticket,
    /// What to send to the editor.
    pub request: EditRequest,
}

/// What [`EditSession::complete`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The result was applied to the session.
    Applied,
    /// The ticket was stale (session reset or re-uploaded); result dropped.
    Discarded,
}

/// One user's in-memory editing session.
#[derive(Debug, Default)]
pub struct EditSession {
    original: Option<ImagePayload>,
    instruction: String,
    edited: Option<ImagePayload>,
    error: Option<SessionFailure>,
    in_flight: Option<Ticket>,
    next_ticket: u64,
}

impl EditSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.is_processing() {
            SessionState::Submitting
        } else if self.edited.is_some() {
            SessionState::Succeeded
        } else if self.error.is_some() {
            SessionState::Failed
        } else if self.original.is_some() {
            SessionState::Ready
        } else {
            SessionState::Empty
        }
    }

    /// The uploaded image, if any.
    #[must_use]
    pub fn original(&self) -> Option<&ImagePayload> {
        self.original.as_ref()
    }

    /// The current instruction text.
    #[must_use]
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// The edited image, if the last request succeeded.
    #[must_use]
    pub fn edited(&self) -> Option<&ImagePayload> {
        self.edited.as_ref()
    }

    /// The failure from the last request, if it failed.
    #[must_use]
    pub fn error(&self) -> Option<&SessionFailure> {
        self.error.as_ref()
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Replace the source image. Clears any result or error and supersedes
    /// a request still in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidImage`] for empty or non-image payloads.
    pub fn upload(&mut self, image: ImagePayload) -> Result<(), SessionError> {
        if !image.is_valid() {
            return Err(SessionError::InvalidImage {
                mime_type: image.mime_type,
                len: image.data.len(),
            });
        }
        if let Some(ticket) = self.in_flight.take() {
            tracing::debug!(?ticket, "upload supersedes in-flight edit");
        }
        tracing::debug!(mime_type = %image.mime_type, bytes = image.data.len(), "image uploaded");
        self.original = Some(image);
        self.edited = None;
        self.error = None;
        Ok(())
    }

    /// Overwrite the instruction text.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] while a request is in flight.
    pub fn set_instruction(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }
        self.instruction = text.into();
        Ok(())
    }

    /// Validate and enter `Submitting`, returning the request to dispatch.
    ///
    /// Clears the previous result as well as the error: a resubmit that fails
    /// leaves the session `Failed` with no edited image, rather than showing
    /// the result of an earlier instruction. Nothing is dispatched when this
    /// returns an error, and the session is left untouched.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] if a request is in flight,
    /// [`SessionError::NoImage`] without an upload, and
    /// [`SessionError::EmptyInstruction`] for a blank instruction.
    pub fn begin_submit(&mut self) -> Result<PendingEdit, SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }
        let image = self.original.clone().ok_or(SessionError::NoImage)?;
        if self.instruction.trim().is_empty() {
            return Err(SessionError::EmptyInstruction);
        }

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        self.edited = None;
        self.error = None;

        tracing::debug!(?ticket, instruction = %self.instruction, "edit dispatched");
        Ok(PendingEdit {
            ticket,
            request: EditRequest { image, instruction: self.instruction.clone() },
        })
    }

    /// Apply the outcome of a dispatched request.
    ///
    /// Results for a ticket that is no longer in flight are discarded.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<ImagePayload, EditError>,
    ) -> Completion {
        if self.in_flight != Some(ticket) {
            tracing::debug!(?ticket, "discarding result for superseded edit");
            return Completion::Discarded;
        }
        self.in_flight = None;
        match result {
            Ok(image) => {
                tracing::debug!(?ticket, mime_type = %image.mime_type, "edit succeeded");
                self.edited = Some(image);
            }
            Err(e) => {
                tracing::warn!(?ticket, error = %e, "edit failed");
                self.error = Some(SessionFailure::from(&e));
            }
        }
        Completion::Applied
    }

    /// Dispatch the current image and instruction to `editor` and wait for
    /// the outcome.
    ///
    /// An upstream failure is not an `Err` here: it lands in
    /// [`EditSession::error`] and the returned state is `Failed`.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionError`] from [`EditSession::begin_submit`] when
    /// the submit is rejected.
    pub async fn submit(&mut self, editor: &dyn ImageEditor) -> Result<SessionState, SessionError> {
        let pending = self.begin_submit()?;
        let result = editor.edit(&pending.request).await;
        self.complete(pending.ticket, result);
        Ok(self.state())
    }

    /// Clear everything, abandoning any request in flight.
    pub fn reset(&mut self) {
        let next_ticket = self.next_ticket;
        *self = Self { next_ticket, ..Self::default() };
    }

    /// The edited image, for export.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoResult`] unless the session is `Succeeded`.
    pub fn retrieve_result(&self) -> Result<&ImagePayload, SessionError> {
        match (self.state(), self.edited.as_ref()) {
            (SessionState::Succeeded, Some(image)) => Ok(image),
            _ => Err(SessionError::NoResult),
        }
    }
}
