use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};

/// Process-unique id for connections and sessions.
///
/// Counts up from a random starting point so ids from two server runs do not line up in logs.
pub fn next_id() -> u64 {
    static NEXT: OnceLock<AtomicU64> = OnceLock::new();
    NEXT.get_or_init(|| AtomicU64::new(u64::from(rand::random::<u32>()) + 1))
        .fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = next_id();
        let b = next_id();
        assert!(b > a);
    }
}
