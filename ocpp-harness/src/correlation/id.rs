//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Correlation ID generation for outbound calls.

use crate::frame::CorrelationId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generates correlation IDs for the calls this endpoint sends.
///
/// IDs start at 1 and increment monotonically, rendered as decimal strings
/// since OCPP-J ids are strings on the wire. The counter is lock-free and can
/// be shared across tasks.
///
/// # Example
///
/// ```rust
/// use ocpp_harness::correlation::CorrelationIdGenerator;
///
/// let generator = CorrelationIdGenerator::new();
/// assert_eq!(generator.next().as_str(), "1");
/// assert_eq!(generator.next().as_str(), "2");
/// ```
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    next_id: AtomicU64,
}

impl CorrelationIdGenerator {
    /// Creates a generator whose first ID is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Generate the next correlation ID.
    #[must_use]
    pub fn next(&self) -> CorrelationId {
        CorrelationId::new(self.next_id.fetch_add(1, Ordering::Relaxed).to_string())
    }

    /// Returns the numeric value the next call to [`next`](Self::next) will use.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl Default for CorrelationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_starts_at_one() {
        let generator = CorrelationIdGenerator::new();
        assert_eq!(generator.next(), CorrelationId::from("1"));
    }

    #[test]
    fn test_generator_current() {
        let generator = CorrelationIdGenerator::new();
        assert_eq!(generator.current(), 1);
        let _ = generator.next();
        assert_eq!(generator.current(), 2);
    }

    #[tokio::test]
    async fn test_generator_concurrent() {
        use std::sync::Arc;

        let generator = Arc::new(CorrelationIdGenerator::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let generator = generator.clone();
            handles.push(tokio::spawn(async move {
                (0..100).map(|_| generator.next()).collect::<Vec<_>>()
            }));
        }

        let mut all_ids = std::collections::HashSet::new();
        for handle in handles {
            for id in handle.await.unwrap() {
                assert!(all_ids.insert(id.clone()), "Duplicate ID in concurrent test: {id}");
            }
        }

        assert_eq!(all_ids.len(), 1000);
    }
}
