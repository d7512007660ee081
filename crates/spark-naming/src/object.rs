//! 绑定对象：命名层保存与交付的类型擦除引用。

use std::{any::Any, fmt, sync::Arc};

/// 绑定到名称上的不透明对象引用。
///
/// # 教案式说明
/// - **意图 (Why)**：静态绑定的对象（数据源、连接池、测试替身等）类型各异，命名层只负责保存与交付引用，
///   不应理解其内部结构；
/// - **逻辑 (How)**：内部以 `Arc<dyn Any + Send + Sync>` 擦除类型，并在构造时记录类型名，
///   供日志与调试输出使用；取用方通过 [`BoundObject::downcast_ref`] / [`BoundObject::downcast`] 恢复具体类型；
/// - **契约 (What)**：克隆只增加引用计数，所有克隆指向同一对象，[`BoundObject::ptr_eq`] 可据此判断身份。
#[derive(Clone)]
pub struct BoundObject {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl BoundObject {
    /// 以值语义构造绑定对象。
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::from_arc(Arc::new(value))
    }

    /// 复用调用方已持有的 `Arc`，保持对象身份不变。
    pub fn from_arc<T>(value: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// 绑定对象的具体类型名。
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 以引用方式恢复具体类型，类型不符时返回 `None`。
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// 恢复为具体类型的共享引用。
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// 两个绑定对象是否指向同一实例。
    pub fn ptr_eq(&self, other: &BoundObject) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for BoundObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundObject").field(&self.type_name).finish()
    }
}

impl fmt::Display for BoundObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.type_name, Arc::as_ptr(&self.value))
    }
}
