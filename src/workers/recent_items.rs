// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use lru::LruCache;
use std::num::NonZeroUsize;

const DEFAULT_CAPACITY: usize = 1000;

/// 最近条目缓存
///
/// 记录最近处理过的条目名称，容量有限，满时淘汰最早插入的名称。
/// 查询不会刷新条目位置，因此淘汰顺序严格按插入顺序
pub struct RecentItemsCache {
    entries: LruCache<String, ()>,
}

impl RecentItemsCache {
    /// 创建缓存，容量为 0 时使用默认容量
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    /// 记录名称
    ///
    /// 返回因容量不足被淘汰的最早名称
    pub fn insert(&mut self, name: &str) -> Option<String> {
        if self.entries.contains(name) {
            return None;
        }
        self.entries
            .push(name.to_string(), ())
            .map(|(evicted, _)| evicted)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl Default for RecentItemsCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "recent_items_test.rs"]
mod tests;
