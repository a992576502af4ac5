//! logical id → platform id 映射

use serde::{Deserialize, Serialize};

/// fixed-slot 策略下所有通知共用的 platform id
pub const FIXED_SLOT_ID: i32 = 1001;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 稳定哈希：32 位 FNV-1a，结果非负
///
/// 跨进程也保持一致，平台侧的 request code 需要非负整数。
pub fn stable_hash(logical_id: &str) -> i32 {
    let hash = logical_id
        .bytes()
        .fold(FNV_OFFSET, |acc, b| (acc ^ u32::from(b)).wrapping_mul(FNV_PRIME));
    (hash & 0x7fff_ffff) as i32
}

/// 通知身份策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    /// 每个 logical id 一个槽位，可同时显示多条
    #[default]
    PerIdentity,
    /// 所有通知共用一个槽位，新通知总是替换旧通知
    FixedSlot,
}

impl IdentityPolicy {
    pub fn platform_id(&self, logical_id: &str) -> i32 {
        match self {
            IdentityPolicy::PerIdentity => stable_hash(logical_id),
            IdentityPolicy::FixedSlot => FIXED_SLOT_ID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_hash_is_deterministic() {
        assert_eq!(stable_hash("A"), stable_hash("A"));
        assert_eq!(stable_hash("1700000000000"), stable_hash("1700000000000"));
    }

    #[test]
    fn test_stable_hash_known_values() {
        // FNV-1a("") = 0x811c9dc5, 去掉符号位
        assert_eq!(stable_hash(""), 0x011c_9dc5);
        // FNV-1a("a") = 0xe40c292c
        assert_eq!(stable_hash("a"), 0x640c_292c);
    }

    #[test]
    fn test_stable_hash_distinguishes_ids() {
        let ids: Vec<String> = (0..1000).map(|i| format!("{}", 1_700_000_000_000i64 + i)).collect();
        let hashes: std::collections::HashSet<i32> = ids.iter().map(|id| stable_hash(id)).collect();

        assert_eq!(hashes.len(), ids.len());
        assert_ne!(stable_hash("A"), stable_hash("B"));
    }

    #[test]
    fn test_stable_hash_non_negative() {
        for id in ["A", "B", "long-identifier-with-many-bytes", "你好"] {
            assert!(stable_hash(id) >= 0);
        }
    }

    #[test]
    fn test_policies() {
        assert_eq!(IdentityPolicy::FixedSlot.platform_id("A"), FIXED_SLOT_ID);
        assert_eq!(IdentityPolicy::FixedSlot.platform_id("B"), FIXED_SLOT_ID);
        assert_eq!(IdentityPolicy::PerIdentity.platform_id("A"), stable_hash("A"));
        assert_eq!(IdentityPolicy::default(), IdentityPolicy::PerIdentity);
    }
}
