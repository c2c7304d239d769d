use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::capture::domain::frame_source::{CameraProvider, FrameSource};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera is already in use")]
    ResourceBusy,
    #[error("failed to open camera: {0}")]
    Open(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to read camera frame: {0}")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("camera session was closed")]
    Closed,
}

struct CameraState {
    source: Option<Box<dyn FrameSource>>,
    session: u64,
}

/// Owns the single camera handle shared by live sessions.
///
/// Cloning is cheap; all clones see the same handle. Opening, stopping and
/// frame reads are serialized through one mutex.
#[derive(Clone)]
pub struct CameraController {
    provider: Arc<dyn CameraProvider>,
    state: Arc<Mutex<CameraState>>,
}

impl CameraController {
    pub fn new(provider: Arc<dyn CameraProvider>) -> Self {
        Self {
            provider,
            state: Arc::new(Mutex::new(CameraState {
                source: None,
                session: 0,
            })),
        }
    }

    /// Opens the camera for a new session. Fails with
    /// [`CameraError::ResourceBusy`] while another session holds it.
    pub fn acquire(&self) -> Result<CameraLease, CameraError> {
        let mut state = lock(&self.state);
        if state.source.is_some() {
            return Err(CameraError::ResourceBusy);
        }
        let source = self.provider.open().map_err(CameraError::Open)?;
        state.session += 1;
        state.source = Some(source);
        log::info!("Camera opened (session {})", state.session);
        Ok(CameraLease {
            state: Arc::clone(&self.state),
            session: state.session,
        })
    }

    /// Releases the camera if open. Returns whether anything was released;
    /// stopping a closed camera is a no-op.
    ///
    /// Blocks until a read already in progress on a lease returns.
    pub fn stop(&self) -> bool {
        let mut state = lock(&self.state);
        match state.source.take() {
            Some(mut source) => {
                source.release();
                log::info!("Camera released by stop (session {})", state.session);
                true
            }
            None => false,
        }
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).source.is_some()
    }
}

// Camera state stays consistent across a panicked holder, so the poison
// flag is ignored.
fn lock(state: &Mutex<CameraState>) -> MutexGuard<'_, CameraState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One live session's claim on the camera.
///
/// Dropping the lease releases the camera unless it was already stopped or
/// handed to a newer session.
pub struct CameraLease {
    state: Arc<Mutex<CameraState>>,
    session: u64,
}

impl CameraLease {
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Pulls the next frame. Returns [`CameraError::Closed`] once the
    /// camera was stopped.
    pub fn read_frame(&mut self) -> Result<Frame, CameraError> {
        let mut state = lock(&self.state);
        if state.session != self.session {
            return Err(CameraError::Closed);
        }
        let source = state.source.as_mut().ok_or(CameraError::Closed)?;
        source.read_frame().map_err(CameraError::Read)
    }

    /// Releases the camera if this lease still owns it.
    pub fn release(&mut self) {
        let mut state = lock(&self.state);
        if state.session != self.session {
            return;
        }
        if let Some(mut source) = state.source.take() {
            source.release();
            log::info!("Camera released (session {})", self.session);
        }
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        self.release();
    }
}
