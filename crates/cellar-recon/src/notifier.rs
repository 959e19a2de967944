//! Built-in [`Notifier`] implementations.
//!
//! The real fan-out (push, email, chat) lives outside this workspace; these
//! let the engine run without one.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use crate::error::NotifierError;
use crate::ports::Notifier;

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify_over_tolerance(
        &self,
        _store_id: &str,
        _comp_date: NaiveDate,
        _over_tolerance: usize,
    ) -> Result<(), NotifierError> {
        Ok(())
    }
}

/// Emits a `warn!` event per notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_over_tolerance(
        &self,
        store_id: &str,
        comp_date: NaiveDate,
        over_tolerance: usize,
    ) -> Result<(), NotifierError> {
        warn!(
            store_id = %store_id,
            comp_date = %comp_date,
            over_tolerance,
            "Stock discrepancies over tolerance"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_notifiers_never_fail() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        assert!(NoOpNotifier.notify_over_tolerance("s", date, 3).await.is_ok());
        assert!(LogNotifier.notify_over_tolerance("s", date, 3).await.is_ok());
    }
}
