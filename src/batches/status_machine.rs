use crate::batches::BatchStatus;

/// Service for managing batch status transitions
pub struct BatchStatusMachine;

impl BatchStatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Ready
    /// - Ready → Assigned
    /// - Assigned → OutForDelivery
    /// - OutForDelivery → Completed
    ///
    /// Skips, backward moves and same-status moves are rejected.
    pub fn is_valid_transition(from: BatchStatus, to: BatchStatus) -> bool {
        from.next() == Some(to)
    }

    /// Attempt to transition from one status to another
    pub fn transition(from: BatchStatus, to: BatchStatus) -> Result<BatchStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            match from.next() {
                Some(next) => Err(format!(
                    "Invalid status transition from {} to {} (next allowed: {})",
                    from, to, next
                )),
                None => Err(format!(
                    "Invalid status transition from {} to {} ({} is terminal)",
                    from, to, from
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_to_ready() {
        assert!(BatchStatusMachine::is_valid_transition(
            BatchStatus::Pending,
            BatchStatus::Ready
        ));
    }

    #[test]
    fn test_ready_to_assigned() {
        assert!(BatchStatusMachine::is_valid_transition(
            BatchStatus::Ready,
            BatchStatus::Assigned
        ));
    }

    #[test]
    fn test_assigned_to_out_for_delivery() {
        assert!(BatchStatusMachine::is_valid_transition(
            BatchStatus::Assigned,
            BatchStatus::OutForDelivery
        ));
    }

    #[test]
    fn test_out_for_delivery_to_completed() {
        assert!(BatchStatusMachine::is_valid_transition(
            BatchStatus::OutForDelivery,
            BatchStatus::Completed
        ));
    }

    #[test]
    fn test_pending_to_assigned_skips_ready() {
        assert!(!BatchStatusMachine::is_valid_transition(
            BatchStatus::Pending,
            BatchStatus::Assigned
        ));
    }

    #[test]
    fn test_ready_to_pending_is_not_a_manual_transition() {
        assert!(!BatchStatusMachine::is_valid_transition(
            BatchStatus::Ready,
            BatchStatus::Pending
        ));
    }

    #[test]
    fn test_same_status_is_rejected() {
        assert!(!BatchStatusMachine::is_valid_transition(
            BatchStatus::Assigned,
            BatchStatus::Assigned
        ));
    }

    #[test]
    fn test_transition_from_completed() {
        let result = BatchStatusMachine::transition(BatchStatus::Completed, BatchStatus::Pending);
        assert!(result.unwrap_err().contains("terminal"));
    }

    #[test]
    fn test_transition_valid() {
        let result = BatchStatusMachine::transition(BatchStatus::Ready, BatchStatus::Assigned);
        assert_eq!(result, Ok(BatchStatus::Assigned));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn batch_status_strategy() -> impl Strategy<Value = BatchStatus> {
        prop_oneof![
            Just(BatchStatus::Pending),
            Just(BatchStatus::Ready),
            Just(BatchStatus::Assigned),
            Just(BatchStatus::OutForDelivery),
            Just(BatchStatus::Completed),
        ]
    }

    fn rank(status: BatchStatus) -> u8 {
        match status {
            BatchStatus::Pending => 0,
            BatchStatus::Ready => 1,
            BatchStatus::Assigned => 2,
            BatchStatus::OutForDelivery => 3,
            BatchStatus::Completed => 4,
        }
    }

    /// Only single forward steps are accepted
    #[test]
    fn prop_only_single_forward_steps() {
        proptest!(|(from in batch_status_strategy(), to in batch_status_strategy())| {
            let valid = BatchStatusMachine::is_valid_transition(from, to);
            prop_assert_eq!(valid, rank(to) == rank(from) + 1);
        });
    }

    /// transition() and is_valid_transition() agree
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(from in batch_status_strategy(), to in batch_status_strategy())| {
            let is_valid = BatchStatusMachine::is_valid_transition(from, to);
            let result = BatchStatusMachine::transition(from, to);
            prop_assert_eq!(is_valid, result.is_ok());
        });
    }
}
