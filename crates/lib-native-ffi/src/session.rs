//! Device session lifecycle and ordered teardown.
//!
//! Some vendor libraries need a "begin" handshake with the attached hardware
//! after loading and a matching "end" before unloading. The session guard
//! keeps the pairing straight; [`Teardown`] runs the release steps so that a
//! failing step never prevents the next one.

use crate::error::{NativeError, NativeResult};

pub use lib_types::SessionState;

/// Begin/end pairing for one device session.
#[derive(Debug)]
pub struct DeviceSession {
    label: String,
    state: SessionState,
}

impl DeviceSession {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Run the begin handshake.
    ///
    /// Rejected with `InvalidState` while a session is active or faulted;
    /// a failed handshake leaves the previous state unchanged.
    pub fn begin<F>(&mut self, handshake: F) -> NativeResult<()>
    where
        F: FnOnce() -> NativeResult<()>,
    {
        if !self.state.can_begin() {
            return Err(NativeError::invalid_state(SessionState::Uninitialized, self.state));
        }
        handshake()?;
        self.state = SessionState::Active;
        tracing::info!(session = %self.label, "Device session started");
        Ok(())
    }

    /// Run the end handshake if a session is active; otherwise do nothing.
    ///
    /// A failing handshake leaves the session `Faulted` so it is not ended
    /// twice.
    pub fn end<F>(&mut self, handshake: F) -> NativeResult<()>
    where
        F: FnOnce() -> NativeResult<()>,
    {
        if self.state != SessionState::Active {
            tracing::debug!(session = %self.label, state = ?self.state, "No active session to end");
            return Ok(());
        }
        match handshake() {
            Ok(()) => {
                self.state = SessionState::Closed;
                tracing::info!(session = %self.label, "Device session ended");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Faulted;
                Err(e)
            }
        }
    }
}

/// Runs release steps in sequence, continuing past failures.
///
/// Steps are given in release order, which is the reverse of acquisition
/// order (end the device session, then unload the library). Every failure
/// is logged; [`Teardown::finish`] returns the first one.
#[derive(Debug)]
pub struct Teardown {
    label: String,
    first_error: Option<NativeError>,
    failures: usize,
}

impl Teardown {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            first_error: None,
            failures: 0,
        }
    }

    /// Run one release step now.
    pub fn step<F>(&mut self, name: &str, release: F) -> &mut Self
    where
        F: FnOnce() -> NativeResult<()>,
    {
        if let Err(e) = release() {
            tracing::warn!(teardown = %self.label, step = name, error = %e, "Teardown step failed");
            self.failures += 1;
            if self.first_error.is_none() {
                self.first_error = Some(e);
            }
        }
        self
    }

    /// Number of failed steps so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn finish(self) -> NativeResult<()> {
        match self.first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallError;
    use lib_types::StatusCode;
    use std::cell::RefCell;

    fn failure(code: i32) -> NativeError {
        CallError::status("AttoDRY_Interface_end", StatusCode(code), None).into()
    }

    #[test]
    fn test_second_begin_rejected() {
        let mut session = DeviceSession::new("attoDRY");
        session.begin(|| Ok(())).unwrap();
        let err = session.begin(|| panic!("must not run")).unwrap_err();
        assert!(matches!(
            err,
            NativeError::InvalidState { actual: SessionState::Active, .. }
        ));
    }

    #[test]
    fn test_failed_begin_keeps_state() {
        let mut session = DeviceSession::new("attoDRY");
        assert!(session.begin(|| Err(failure(1))).is_err());
        assert_eq!(session.state(), SessionState::Uninitialized);
        session.begin(|| Ok(())).unwrap();
        assert!(session.is_active());
    }

    #[test]
    fn test_end_without_begin_is_noop() {
        let mut session = DeviceSession::new("attoDRY");
        session.end(|| panic!("must not run")).unwrap();
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_end_failure_faults_session() {
        let mut session = DeviceSession::new("attoDRY");
        session.begin(|| Ok(())).unwrap();
        assert!(session.end(|| Err(failure(5))).is_err());
        assert_eq!(session.state(), SessionState::Faulted);
        // Not ended twice
        session.end(|| panic!("must not run")).unwrap();
        assert!(session.begin(|| Ok(())).is_err());
    }

    #[test]
    fn test_restart_after_clean_end() {
        let mut session = DeviceSession::new("APT");
        session.begin(|| Ok(())).unwrap();
        session.end(|| Ok(())).unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        session.begin(|| Ok(())).unwrap();
    }

    #[test]
    fn test_teardown_runs_every_step() {
        let order = RefCell::new(Vec::new());
        let mut teardown = Teardown::new("attoDRY");
        teardown
            .step("end", || {
                order.borrow_mut().push("end");
                Err(failure(7))
            })
            .step("unload", || {
                order.borrow_mut().push("unload");
                Ok(())
            });
        assert_eq!(teardown.failures(), 1);
        let err = teardown.finish().unwrap_err();
        assert_eq!(err.status_code(), Some(StatusCode(7)));
        assert_eq!(*order.borrow(), vec!["end", "unload"]);
    }

    #[test]
    fn test_teardown_reports_first_failure() {
        let mut teardown = Teardown::new("Andor");
        teardown.step("shut down", || Err(failure(1))).step("unload", || Err(failure(2)));
        assert_eq!(teardown.failures(), 2);
        assert_eq!(teardown.finish().unwrap_err().status_code(), Some(StatusCode(1)));
    }
}
