//! The error channel and the process-wide uncaught-error sink.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use thiserror::Error;

/// The error value carried by every `on_error` signal.
///
/// Errors are shared because a single failure may need to reach several
/// places: the terminal callback, a post-terminal action and the uncaught
/// sink can all observe the same underlying error.
pub type DynError = Arc<dyn std::error::Error + Send + Sync>;

/// Two errors folded into one: a primary error plus a second, unrelated
/// error raised while the primary was being handled.
///
/// Produced when, for example, a cleanup action fails while the pipeline is
/// already unwinding from a delivered error. Both are preserved for
/// diagnostics instead of the second silently displacing the first.
#[derive(Debug, Error)]
#[error("{primary}; while handling it: {secondary}")]
pub struct CompositeError {
    primary: DynError,
    secondary: DynError,
}

impl CompositeError {
    /// Folds a `primary` error and a `secondary` error raised while handling
    /// it into one value.
    #[must_use]
    pub fn new(primary: DynError, secondary: DynError) -> Self {
        Self { primary, secondary }
    }

    /// The error that was being handled first.
    #[must_use]
    pub fn primary(&self) -> &DynError {
        &self.primary
    }

    /// The error raised while the primary one was being handled.
    #[must_use]
    pub fn secondary(&self) -> &DynError {
        &self.secondary
    }
}

type UncaughtErrorHandler = Box<dyn Fn(&DynError) + Send + Sync>;

/// The installed sink, or none when the default (log and drop) applies.
static UNCAUGHT_ERROR_HANDLER: ArcSwapOption<UncaughtErrorHandler> = ArcSwapOption::const_empty();

/// Installs the process-wide sink for errors that have no live channel left
/// to report through, replacing any previously installed handler.
///
/// The handler runs on whatever thread produced the orphaned error and must
/// not panic; a panicking handler unwinds into the reporting call site.
/// Install once at startup; tests that install a capture handler restore the
/// default with [`reset_uncaught_error_handler`] afterwards.
pub fn set_uncaught_error_handler<F>(handler: F)
where
    F: Fn(&DynError) + Send + Sync + 'static,
{
    let handler: UncaughtErrorHandler = Box::new(handler);
    UNCAUGHT_ERROR_HANDLER.store(Some(Arc::new(handler)));
}

/// Restores the default uncaught-error sink, which logs the error via
/// `tracing::error!` and drops it.
pub fn reset_uncaught_error_handler() {
    UNCAUGHT_ERROR_HANDLER.store(None);
}

/// Reports an error that cannot be delivered through any live channel.
///
/// Used by operators when an action fails after its subscription already
/// terminated or was cancelled. Application code only needs this when
/// implementing operators of its own.
pub fn report_uncaught_error(error: &DynError) {
    match UNCAUGHT_ERROR_HANDLER.load_full() {
        Some(handler) => (*handler)(error),
        None => tracing::error!(%error, "error reached the end of a terminated pipeline"),
    }
}
