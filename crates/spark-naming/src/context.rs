//! # context 模块说明
//!
//! ## 角色定位（Why）
//! - 定义宿主交付给调用方的命名上下文契约 [`NamingContext`]；
//! - 提供默认工厂使用的扁平实现 [`SimpleNamingContext`]。
//!
//! ## 契约边界（What）
//! - 查找未命中返回 [`NamingError::NameNotFound`]，错误中携带拼接根名后的完整名称；
//! - 上下文不拥有绑定表，只持有共享引用。

use std::{fmt, sync::Arc};

use crate::{
    bindings::BindingTable, environment::Environment, error::NamingError, object::BoundObject,
};

/// 命名上下文契约。
///
/// # 教案式说明
/// - **意图（Why）**：名称层级解析、重命名、枚举等能力属于上下文实现本身，
///   激活与工厂解析只负责构造并交付上下文；
/// - **契约（What）**：实现必须线程安全，可被多个线程同时查找。
pub trait NamingContext: Send + Sync + fmt::Debug {
    /// 按名称查找绑定对象。
    fn lookup(&self, name: &str) -> Result<BoundObject, NamingError>;

    /// 创建上下文时传入的环境。
    fn environment(&self) -> &Environment;
}

/// 由默认工厂生成的扁平命名上下文。
///
/// # 教案式说明
/// - **逻辑（How）**：查找时以 `root_name + name` 作为完整名称访问共享绑定表；
/// - **契约（What）**：持有绑定表的共享引用而非快照，控制器之后的 `bind`/`clear` 在此可见。
pub struct SimpleNamingContext {
    root_name: String,
    bindings: Arc<BindingTable>,
    environment: Environment,
}

impl SimpleNamingContext {
    pub fn new(
        root_name: impl Into<String>,
        bindings: Arc<BindingTable>,
        environment: Environment,
    ) -> Self {
        Self {
            root_name: root_name.into(),
            bindings,
            environment,
        }
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn bindings(&self) -> &Arc<BindingTable> {
        &self.bindings
    }
}

impl NamingContext for SimpleNamingContext {
    fn lookup(&self, name: &str) -> Result<BoundObject, NamingError> {
        let full_name = format!("{}{}", self.root_name, name);
        self.bindings
            .get(&full_name)
            .ok_or(NamingError::NameNotFound { name: full_name })
    }

    fn environment(&self) -> &Environment {
        &self.environment
    }
}

impl fmt::Debug for SimpleNamingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNamingContext")
            .field("root_name", &self.root_name)
            .field("bindings", &self.bindings.len())
            .field("environment", &self.environment.len())
            .finish()
    }
}
