//! Property-based tests for rust_log_shipper using proptest

use proptest::prelude::*;
use rust_log_shipper::core::{AddOutcome, BatchBuffer};
use rust_log_shipper::prelude::*;
use std::time::Duration;

fn level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
    ]
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Test that parsing ignores case
    #[test]
    fn test_log_level_case_insensitive(level in level(), use_lower in any::<bool>()) {
        let input = if use_lower {
            level.to_str().to_lowercase()
        } else {
            level.to_str().to_string()
        };
        prop_assert_eq!(input.parse::<LogLevel>().unwrap(), level);
    }
}

// ============================================================================
// Buffer Tests
// ============================================================================

proptest! {
    /// Every added event comes out of exactly one drain, in order
    #[test]
    fn test_drains_partition_submissions(
        chunks in prop::collection::vec(0usize..40, 1..10),
        max in 1usize..50,
    ) {
        let (buffer, _flush_rx) = BatchBuffer::new(max, OverflowPolicy::TriggerOnly);
        let identity = SourceIdentity::default();
        let mut next = 0usize;
        let mut seen = Vec::new();

        for chunk in chunks {
            for _ in 0..chunk {
                buffer.add(Event::new(LogLevel::Info, next.to_string(), &identity));
                next += 1;
            }
            seen.extend(buffer.drain().iter().map(|e| e.message().parse::<usize>().unwrap()));
            prop_assert!(buffer.is_empty());
        }

        prop_assert_eq!(seen, (0..next).collect::<Vec<_>>());
    }

    /// Bounded policies never hold more than their ceiling
    #[test]
    fn test_bounded_policies_respect_ceiling(
        max in 1usize..20,
        extra in 0usize..20,
        count in 0usize..100,
        drop_oldest in any::<bool>(),
    ) {
        let ceiling = max + extra;
        let policy = if drop_oldest {
            OverflowPolicy::DropOldest { ceiling }
        } else {
            OverflowPolicy::DropNewest { ceiling }
        };
        let (buffer, _flush_rx) = BatchBuffer::new(max, policy);
        let identity = SourceIdentity::default();

        let mut refused = 0;
        for i in 0..count {
            let outcome = buffer.add(Event::new(LogLevel::Debug, i.to_string(), &identity));
            if matches!(outcome, AddOutcome::Rejected | AddOutcome::EvictedOldest) {
                refused += 1;
            }
            prop_assert!(buffer.len() <= ceiling);
        }

        prop_assert_eq!(buffer.len(), count.min(ceiling));
        prop_assert_eq!(refused, count.saturating_sub(ceiling));

        // DropOldest keeps the newest events, DropNewest the oldest
        let kept: Vec<usize> = buffer
            .drain()
            .iter()
            .map(|e| e.message().parse().unwrap())
            .collect();
        if let (Some(first), true) = (kept.first(), count > ceiling) {
            let expected_first = if drop_oldest { count - ceiling } else { 0 };
            prop_assert_eq!(*first, expected_first);
        }
    }
}

// ============================================================================
// Configuration Tests
// ============================================================================

proptest! {
    /// Resolved sizes keep max positive and min at or below it
    #[test]
    fn test_buffer_sizes_are_clamped(min in 0usize..50_000, max in 0usize..50_000) {
        let config = ShipperBuilder::new()
            .min_buffer_size(min)
            .max_buffer_size(max)
            .resolve_with(|_| None);

        prop_assert!(config.max_buffer_size() >= 1);
        prop_assert!(config.min_buffer_size() <= config.max_buffer_size());
        prop_assert_eq!(config.max_buffer_size(), max.max(1));
    }

    /// The send timeout never reaches the publish interval
    #[test]
    fn test_send_timeout_below_interval(interval_ms in 10u64..120_000, timeout_ms in 0u64..120_000) {
        let config = ShipperBuilder::new()
            .publish_interval(Duration::from_millis(interval_ms))
            .send_timeout(Duration::from_millis(timeout_ms))
            .resolve_with(|_| None);

        prop_assert!(config.send_timeout() < config.publish_interval());
        prop_assert!(config.send_timeout() <= Duration::from_millis(timeout_ms));
    }

    /// Explicit settings win over the environment
    #[test]
    fn test_explicit_overrides_environment(explicit in 1usize..1000, from_env in 1usize..1000) {
        let config = ShipperBuilder::new()
            .max_buffer_size(explicit)
            .resolve_with(|key| {
                (key == rust_log_shipper::core::ENV_MAX_BUFFER_SIZE).then(|| from_env.to_string())
            });
        prop_assert_eq!(config.max_buffer_size(), explicit);

        let config = ShipperBuilder::new().resolve_with(|key| {
            (key == rust_log_shipper::core::ENV_MAX_BUFFER_SIZE).then(|| from_env.to_string())
        });
        prop_assert_eq!(config.max_buffer_size(), from_env);
    }
}

// ============================================================================
// Attribute Tests
// ============================================================================

proptest! {
    /// Attributes survive the wire format
    #[test]
    fn test_attributes_serialize_as_object(key in "[a-z_]{1,12}", value in any::<i64>()) {
        let event = Event::new(LogLevel::Info, "attr", &SourceIdentity::default())
            .with_attributes(Attributes::new().with_field(key.clone(), value));
        let json = serde_json::to_value(&event).unwrap();
        prop_assert_eq!(&json["attributes"][key.as_str()], &serde_json::json!(value));
    }
}
