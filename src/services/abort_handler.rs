//! Termination of a move after repeated failed days.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::errors::DomainResult;
use crate::domain::models::{AbortPayload, CompressionActionKind, CompressionRecord, Plan};

#[derive(Debug, Clone, Copy, Default)]
pub struct AbortHandler;

impl AbortHandler {
    pub fn new() -> Self {
        Self
    }

    /// Abort the move and build the notification for the user.
    ///
    /// Fails with `MoveNotActive` if the move already reached a terminal
    /// status; in that case nothing is logged.
    pub fn abort(
        &self,
        plan: &mut Plan,
        consecutive_failures: u32,
        current_day: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<AbortPayload> {
        plan.abort()?;

        let payload = AbortPayload::new(plan.id, plan.name.clone(), consecutive_failures);
        plan.record(CompressionRecord::new(
            plan.id,
            Vec::new(),
            CompressionActionKind::Aborted,
            format!("{consecutive_failures} consecutive days fully missed"),
            now,
        )
        .on_night(current_day));

        warn!(
            move_id = %plan.id,
            move_name = %plan.name,
            consecutive_failures,
            "move aborted"
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::models::{MoveStatus, RecoveryOption};
    use chrono::NaiveDate;

    #[test]
    fn test_abort_sets_status_and_logs() {
        let mut plan = Plan::new("Spring Launch", NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), 7);
        let payload = AbortHandler::new().abort(&mut plan, 3, 5, Utc::now()).unwrap();

        assert_eq!(plan.status, MoveStatus::Aborted);
        assert_eq!(payload.options, RecoveryOption::ALL.to_vec());
        assert!(payload.message.contains("'Spring Launch'"));
        assert_eq!(plan.compression_log.by_action(CompressionActionKind::Aborted).count(), 1);
    }

    #[test]
    fn test_abort_twice_is_rejected() {
        let mut plan = Plan::new("Launch", NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), 7);
        let handler = AbortHandler::new();
        handler.abort(&mut plan, 3, 5, Utc::now()).unwrap();

        let err = handler.abort(&mut plan, 4, 6, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::MoveNotActive { .. }));
        assert_eq!(plan.compression_log.len(), 1);
    }
}
