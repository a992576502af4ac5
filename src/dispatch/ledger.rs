//! 抑制账本 - 记录用户主动划掉的 logical id
//!
//! 划掉回调线程写入，show 路径读取。每个操作都是独立的原子点操作，
//! 并发的 dismiss 与 show 之间按最后一次写入为准。

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// 抑制账本
#[derive(Debug, Default)]
pub struct SuppressionLedger {
    entries: Mutex<HashSet<String>>,
}

impl SuppressionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashSet<String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 记录一次用户划掉，返回是否为新条目
    pub fn insert(&self, logical_id: &str) -> bool {
        self.entries().insert(logical_id.to_string())
    }

    pub fn contains(&self, logical_id: &str) -> bool {
        self.entries().contains(logical_id)
    }

    /// 清空账本，返回清除的条目数
    pub fn clear(&self) -> usize {
        let mut entries = self.entries();
        let count = entries.len();
        entries.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// 按字典序返回全部条目
    pub fn snapshot(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries().iter().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_insert_and_contains() {
        let ledger = SuppressionLedger::new();
        assert!(ledger.is_empty());

        assert!(ledger.insert("A"));
        assert!(!ledger.insert("A"));
        assert!(ledger.contains("A"));
        assert!(!ledger.contains("B"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_clear() {
        let ledger = SuppressionLedger::new();
        ledger.insert("A");
        ledger.insert("B");

        assert_eq!(ledger.clear(), 2);
        assert!(!ledger.contains("A"));
        assert_eq!(ledger.clear(), 0);
    }

    #[test]
    fn test_concurrent_writers() {
        let ledger = Arc::new(SuppressionLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        ledger.insert(&format!("{}-{}", t, i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.len(), 800);
        assert_eq!(ledger.snapshot().len(), 800);
    }
}
