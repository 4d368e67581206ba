//! Retrying writes to output files that another program holds open

use amsreport_core::ConsolidateError;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// How often, and how patiently, a locked output is retried
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// Whether an I/O error means the file is open elsewhere
///
/// Windows reports sharing (32) and lock (33) violations as raw OS errors;
/// everywhere else a held file shows up as permission denied.
pub fn is_locked(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    cfg!(windows) && matches!(error.raw_os_error(), Some(32) | Some(33))
}

/// Run `write` until it succeeds, retrying only while the target is locked.
///
/// Any other I/O error is returned at once.
pub fn write_with_retry<F>(path: &Path, policy: &RetryPolicy, mut write: F) -> Result<(), ConsolidateError>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        match write(path) {
            Ok(()) => return Ok(()),
            Err(e) if is_locked(&e) => {
                if attempt < attempts {
                    warn!(
                        "{} is locked, retrying in {:?} (attempt {}/{})",
                        path.display(),
                        policy.delay,
                        attempt,
                        attempts
                    );
                    thread::sleep(policy.delay);
                }
            }
            Err(e) => return Err(ConsolidateError::Io(e)),
        }
    }
    Err(ConsolidateError::OutputLocked {
        path: path.to_path_buf(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    fn denied() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "in use")
    }

    #[test]
    fn succeeds_after_transient_lock() {
        let mut calls = 0;
        let result = write_with_retry(Path::new("out.xlsx"), &quick(3), |_| {
            calls += 1;
            if calls < 3 {
                Err(denied())
            } else {
                Ok(())
            }
        });
        assert!(result.is_ok());
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_attempts() {
        let mut calls = 0;
        let result = write_with_retry(Path::new("out.xlsx"), &quick(2), |_| {
            calls += 1;
            Err(denied())
        });
        assert_eq!(calls, 2);
        match result {
            Err(ConsolidateError::OutputLocked { path, attempts }) => {
                assert_eq!(path, Path::new("out.xlsx"));
                assert_eq!(attempts, 2);
            }
            other => panic!("expected OutputLocked, got {other:?}"),
        }
    }

    #[test]
    fn other_errors_are_not_retried() {
        let mut calls = 0;
        let result = write_with_retry(Path::new("out.xlsx"), &quick(5), |_| {
            calls += 1;
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ConsolidateError::Io(_))));
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            attempts: 0,
            delay: Duration::ZERO,
        };
        let mut calls = 0;
        let result = write_with_retry(Path::new("out.xlsx"), &policy, |_| {
            calls += 1;
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(calls, 1);
    }

    #[test]
    fn lock_detection() {
        assert!(is_locked(&denied()));
        assert!(!is_locked(&io::Error::new(io::ErrorKind::NotFound, "gone")));
    }
}
