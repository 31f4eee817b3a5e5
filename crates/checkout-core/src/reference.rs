//! Transaction Reference Generation
//!
//! References have the shape `tx-<plan>-<millis>-<suffix>`: a human-traceable
//! plan component, a monotonically non-decreasing time component, and a
//! per-call random suffix so concurrent calls in the same millisecond never
//! collide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::session::TxRef;

const SUFFIX_LEN: usize = 8;

/// Lock-free generator of gateway transaction references
pub struct ReferenceGenerator {
    last_millis: AtomicU64,
}

impl Default for ReferenceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceGenerator {
    pub fn new() -> Self {
        Self {
            last_millis: AtomicU64::new(0),
        }
    }

    /// Mint the next reference for a plan. Never blocks.
    pub fn next(&self, plan: &str) -> TxRef {
        let millis = self.monotonic_millis();
        let suffix = random_suffix();
        TxRef::from_string(format!("tx-{}-{millis}-{suffix}", sanitize_plan(plan)))
    }

    /// Wall clock in milliseconds, clamped to never run backwards
    fn monotonic_millis(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        let previous = self.last_millis.fetch_max(now, Ordering::AcqRel);
        previous.max(now)
    }
}

/// Keep references URL- and log-safe
fn sanitize_plan(plan: &str) -> String {
    let cleaned: String = plan
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if cleaned.is_empty() {
        "plan".to_string()
    } else {
        cleaned
    }
}

fn random_suffix() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..SUFFIX_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_reference_shape() {
        let generator = ReferenceGenerator::new();
        let tx_ref = generator.next("Pro");
        assert!(tx_ref.as_str().starts_with("tx-Pro-"));
        assert_eq!(tx_ref.as_str().split('-').count(), 4);
    }

    #[test]
    fn test_plan_component_is_sanitized() {
        let generator = ReferenceGenerator::new();
        assert!(generator.next("Pro Max!").as_str().starts_with("tx-ProMax-"));
        assert!(generator.next("--").as_str().starts_with("tx-plan-"));
    }

    #[test]
    fn test_concurrent_references_are_distinct() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 1_250;

        let generator = Arc::new(ReferenceGenerator::new());
        let seen = Arc::new(Mutex::new(HashSet::new()));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let generator = generator.clone();
                let seen = seen.clone();
                std::thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        let tx_ref = generator.next("Pro");
                        seen.lock().unwrap().insert(tx_ref.as_str().to_string());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(seen.lock().unwrap().len(), THREADS * PER_THREAD);
    }
}
