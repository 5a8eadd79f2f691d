//! Log-and-propagate helpers for `Result`.

use std::fmt::Display;
use tracing::{error, warn};

/// Adds `log` to results so a failure is recorded where it happens and
/// still returned to the caller.
pub trait ResultExt<T, E> {
    /// Log a failure at error level with the caller's location.
    ///
    /// # Arguments
    ///
    /// * `context` - What was being attempted, e.g. `"syncing property"`
    ///
    /// # Returns
    ///
    /// The result unchanged, so it can be propagated with `?`.
    fn log<S: ToString>(self, context: S) -> Result<T, E>;

    /// Log a failure as a warning and drop it. For side effects that must
    /// not fail the request, such as notification mail.
    fn best_effort<S: ToString>(self, context: S) -> Option<T>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log<S: ToString>(self, context: S) -> Result<T, E> {
        if let Err(ref e) = self {
            let caller_location = std::panic::Location::caller();
            error!(
                target: "studio_cms",
                error = %e,
                file = %format!("{}:{}", caller_location.file(), caller_location.line()),
                context = %context.to_string(),
                "Operation failed"
            );
        }
        self
    }

    #[track_caller]
    fn best_effort<S: ToString>(self, context: S) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                let caller_location = std::panic::Location::caller();
                warn!(
                    target: "studio_cms",
                    error = %e,
                    file = %format!("{}:{}", caller_location.file(), caller_location.line()),
                    context = %context.to_string(),
                    "Best-effort step failed, continuing"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_passes_result_through() {
        let ok: Result<i32, &str> = Ok(42);
        assert_eq!(ok.log("ctx").unwrap(), 42);

        let err: Result<i32, &str> = Err("boom");
        assert_eq!(err.log("ctx").unwrap_err(), "boom");
    }

    #[test]
    fn test_best_effort_swallows_errors() {
        let err: Result<i32, &str> = Err("smtp down");
        assert_eq!(err.best_effort("sending mail"), None);

        let ok: Result<i32, &str> = Ok(1);
        assert_eq!(ok.best_effort("sending mail"), Some(1));
    }
}
