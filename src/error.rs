//! Adapters for turning failed reads into "unavailable" values.
//!
//! Metric collaborators never propagate errors to callers; a metric that cannot be read is simply
//! not available. These adapters keep the failure visible in the logs while discarding it.

pub trait ResultOkLogExt<T, E> {
    /// Converts the result into an [`Option`], logging the error at debug level.
    ///
    /// Unsupported metrics are expected on many systems, so the log level stays low.
    fn ok_log(self) -> Option<T>;

    /// Converts the result into an [`Option`], logging the error at trace level.
    ///
    /// Used on hot paths where a missing file is the normal state (e.g. `memory.swap.current`
    /// on kernels without swap accounting).
    fn ok_trace(self) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn ok_log(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::debug!("metric unavailable: {err}");
                None
            }
        }
    }

    fn ok_trace(self) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::trace!("metric unavailable: {err}");
                None
            }
        }
    }
}
