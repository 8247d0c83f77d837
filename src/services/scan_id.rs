use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Mints process-unique scan identifiers, e.g. `scan-1767225600123`.
///
/// Ids embed the submission time in milliseconds. Submissions landing in the
/// same millisecond advance past the previous value, so within one process an
/// id is never reused and ids are strictly increasing.
pub struct ScanIdGenerator {
    last: AtomicU64,
}

impl ScanIdGenerator {
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self
                .last
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return format!("scan-{next}"),
                Err(actual) => last = actual,
            }
        }
    }
}

impl Default for ScanIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn numeric_part(id: &str) -> u64 {
        id.strip_prefix("scan-").unwrap().parse().unwrap()
    }

    #[test]
    fn ids_are_never_reused() {
        let generator = ScanIdGenerator::new();
        let ids: HashSet<String> = (0..10_000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let generator = ScanIdGenerator::new();
        let mut previous = numeric_part(&generator.next_id());
        for _ in 0..1000 {
            let current = numeric_part(&generator.next_id());
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn ids_are_unique_across_threads() {
        use std::sync::Arc;

        let generator = Arc::new(ScanIdGenerator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let generator = Arc::clone(&generator);
            handles.push(std::thread::spawn(move || {
                (0..1000).map(|_| generator.next_id()).collect::<Vec<_>>()
            }));
        }

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id));
            }
        }
        assert_eq!(all.len(), 8000);
    }
}
