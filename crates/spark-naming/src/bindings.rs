//! # BindingTable：静态绑定对象表
//!
//! ## 核心意图（Why）
//! - 保存 `名称 -> 对象` 的静态绑定，供默认工厂生成的命名上下文查找；
//! - 上下文实例与控制器共享同一张表，控制器后续的 `bind`/`clear` 对已交付的上下文立即可见。
//!
//! ## 行为契约（What）
//! - 键唯一，重复绑定以最后一次写入为准；遍历顺序无语义；
//! - 读写均不依赖激活锁，基于 `DashMap` 分片锁保证并发安全。
//!
//! ## 风险提示（Trade-offs）
//! - `clear` 与并发 `bind` 交错时，结果等价于二者按某一顺序串行执行，不保证跨分片的整体快照。

use dashmap::DashMap;

use crate::object::BoundObject;

/// 控制器私有、上下文共享的绑定表。
#[derive(Debug, Default)]
pub struct BindingTable {
    entries: DashMap<String, BoundObject>,
}

impl BindingTable {
    /// 创建空表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 绑定或覆盖名称，返回被覆盖的旧对象。
    pub fn bind(&self, name: impl Into<String>, object: BoundObject) -> Option<BoundObject> {
        self.entries.insert(name.into(), object)
    }

    /// 按名称查询，命中时返回对象的克隆引用，不暴露内部 guard。
    pub fn get(&self, name: &str) -> Option<BoundObject> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// 名称是否已绑定。
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 清空全部绑定。
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 当前全部名称，按字典序排列，便于诊断输出保持稳定。
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        names.sort_unstable();
        names
    }
}
