//! Scoped sessions: acquire a backend, use it, always release it.

use crate::backend::Backend;
use crate::error::Result;

/// Connect `backend`, run `body` against it, then tear the session down on
/// every exit path.
///
/// Teardown order: `commit` when `body` returned `Ok`, `rollback` when it
/// returned `Err`, then `close` either way. Commit and rollback failures are
/// logged at warn level and swallowed. A close failure propagates only when
/// `body` succeeded; after a failed body the body's error wins and the close
/// failure is logged. If `body` panics, the session is rolled back and
/// closed best-effort while unwinding.
///
/// A connect failure aborts the session before `body` runs.
pub fn with_session<B, T, F>(backend: &mut B, body: F) -> Result<T>
where
    B: Backend + ?Sized,
    F: FnOnce(&mut B) -> Result<T>,
{
    backend.connect()?;
    let guard = Teardown {
        backend,
        armed: true,
    };
    match body(&mut *guard.backend) {
        Ok(value) => {
            guard.finish(false)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(close_err) = guard.finish(true) {
                log::warn!("close failed after a failed session: {close_err}");
            }
            Err(err)
        }
    }
}

/// Holds the connected backend between `connect` and teardown. While armed,
/// dropping it (closure panic) rolls back and closes; `finish` disarms and
/// runs the ordered teardown instead.
struct Teardown<'a, B: Backend + ?Sized> {
    backend: &'a mut B,
    armed: bool,
}

impl<B: Backend + ?Sized> Teardown<'_, B> {
    fn finish(mut self, failed: bool) -> Result<()> {
        self.armed = false;
        if failed {
            if let Err(err) = self.backend.rollback() {
                log::warn!("rollback failed during session teardown: {err}");
            }
        } else if let Err(err) = self.backend.commit() {
            log::warn!("commit failed during session teardown: {err}");
        }
        self.backend.close()
    }
}

impl<B: Backend + ?Sized> Drop for Teardown<'_, B> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = self.backend.rollback() {
            log::warn!("rollback failed while unwinding: {err}");
        }
        if let Err(err) = self.backend.close() {
            log::warn!("close failed while unwinding: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use super::*;
    use crate::config::BackendKind;
    use crate::error::Error;
    use crate::surface::ExecutionSurface;

    #[derive(Default)]
    struct MockBackend {
        calls: Vec<&'static str>,
        live: bool,
        fail_connect: bool,
        fail_commit: bool,
        fail_rollback: bool,
        fail_close: bool,
    }

    impl fmt::Display for MockBackend {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("mock backend")
        }
    }

    impl Backend for MockBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Sqlite
        }

        fn connect(&mut self) -> Result<()> {
            self.calls.push("connect");
            if self.fail_connect {
                return Err(Error::Connection("mock refused to connect".into()));
            }
            self.live = true;
            Ok(())
        }

        fn cursor(&mut self) -> Result<&mut dyn ExecutionSurface> {
            Err(Error::NotConnected)
        }

        fn commit(&mut self) -> Result<()> {
            self.calls.push("commit");
            if self.fail_commit {
                return Err(Error::Connection("commit refused".into()));
            }
            Ok(())
        }

        fn rollback(&mut self) -> Result<()> {
            self.calls.push("rollback");
            if self.fail_rollback {
                return Err(Error::Connection("rollback refused".into()));
            }
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.calls.push("close");
            self.live = false;
            if self.fail_close {
                return Err(Error::Connection("close refused".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn success_commits_then_closes() {
        let mut mock = MockBackend::default();
        let value = with_session(&mut mock, |_| Ok(42)).expect("session succeeds");
        assert_eq!(value, 42);
        assert_eq!(mock.calls, ["connect", "commit", "close"]);
        assert!(!mock.live);
    }

    #[test]
    fn failure_rolls_back_then_closes() {
        let mut mock = MockBackend::default();
        let outcome: Result<()> =
            with_session(&mut mock, |_| Err(Error::Connection("boom".into())));
        assert!(matches!(outcome, Err(Error::Connection(ref m)) if m == "boom"));
        assert_eq!(mock.calls, ["connect", "rollback", "close"]);
        assert!(!mock.live);
    }

    #[test]
    fn connect_failure_aborts_before_the_body() {
        let mut mock = MockBackend {
            fail_connect: true,
            ..MockBackend::default()
        };
        let outcome: Result<()> = with_session(&mut mock, |_| {
            panic!("body must not run");
        });
        assert!(matches!(outcome, Err(Error::Connection(_))));
        assert_eq!(mock.calls, ["connect"]);
    }

    #[test]
    fn commit_failure_is_swallowed() {
        let mut mock = MockBackend {
            fail_commit: true,
            ..MockBackend::default()
        };
        let value = with_session(&mut mock, |_| Ok("kept")).expect("commit failure is swallowed");
        assert_eq!(value, "kept");
        assert_eq!(mock.calls, ["connect", "commit", "close"]);
    }

    #[test]
    fn rollback_failure_is_swallowed() {
        let mut mock = MockBackend {
            fail_rollback: true,
            ..MockBackend::default()
        };
        let outcome: Result<()> =
            with_session(&mut mock, |_| Err(Error::Connection("boom".into())));
        assert!(matches!(outcome, Err(Error::Connection(ref m)) if m == "boom"));
        assert_eq!(mock.calls, ["connect", "rollback", "close"]);
    }

    #[test]
    fn close_failure_surfaces_after_success() {
        let mut mock = MockBackend {
            fail_close: true,
            ..MockBackend::default()
        };
        let outcome = with_session(&mut mock, |_| Ok(()));
        assert!(matches!(outcome, Err(Error::Connection(ref m)) if m == "close refused"));
    }

    #[test]
    fn close_failure_loses_to_the_body_error() {
        let mut mock = MockBackend {
            fail_close: true,
            ..MockBackend::default()
        };
        let outcome: Result<()> =
            with_session(&mut mock, |_| Err(Error::Connection("boom".into())));
        assert!(matches!(outcome, Err(Error::Connection(ref m)) if m == "boom"));
        assert_eq!(mock.calls, ["connect", "rollback", "close"]);
    }

    #[test]
    fn panicking_body_still_rolls_back_and_closes() {
        let mut mock = MockBackend::default();
        let unwound = catch_unwind(AssertUnwindSafe(|| {
            let _: Result<()> = with_session(&mut mock, |_| panic!("boom"));
        }));
        assert!(unwound.is_err());
        assert_eq!(mock.calls, ["connect", "rollback", "close"]);
        assert!(!mock.live);
    }

    #[test]
    fn a_variant_serves_sequential_sessions() {
        let mut mock = MockBackend::default();
        with_session(&mut mock, |_| Ok(())).expect("first session");
        with_session(&mut mock, |_| Ok(())).expect("second session");
        assert_eq!(
            mock.calls,
            ["connect", "commit", "close", "connect", "commit", "close"]
        );
    }
}
