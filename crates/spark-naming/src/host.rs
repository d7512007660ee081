//! 宿主命名管理器：进程级、仅可写入一次的提供者注册槽。
//!
//! # 设计初衷（Why）
//! - 宿主约定整个进程生命周期内只接受一个初始上下文提供者，且不提供注销能力；
//! - 本模块以 [`NamingManager`] 表达该契约，并提供进程级实现 [`HostNamingManager`]。
//!
//! # 使用方式（How）
//! - 应用代码通过 [`initial_context`] 向进程级宿主请求初始上下文；
//! - 测试可构造独立的 [`HostNamingManager`] 注入 [`ActivationService`](crate::ActivationService)，
//!   互不干扰。
//!
//! # 契约说明（What）
//! - `register_provider` 在槽位已占用时返回 [`HostRegistrationError::AlreadyRegistered`]；
//! - 调用提供者时不持有槽位锁，提供者内部可以安全地回访宿主。

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::{
    context::NamingContext,
    environment::Environment,
    error::{HostRegistrationError, NamingError},
    factory::ContextFactoryBuilder,
};

/// 宿主注册接口。
pub trait NamingManager: Send + Sync {
    /// 是否已注册提供者。
    fn has_registered_provider(&self) -> bool;

    /// 注册提供者；槽位已占用时失败，且失败是永久的。
    fn register_provider(
        &self,
        provider: Arc<dyn ContextFactoryBuilder>,
    ) -> Result<(), HostRegistrationError>;

    /// 通过已注册的提供者创建初始上下文。
    fn initial_context(&self, environment: &Environment) -> Result<Box<dyn NamingContext>, NamingError>;
}

/// 基于互斥锁的宿主注册槽实现。
///
/// # 教案式说明
/// - **意图（Why）**：为进程提供唯一的注册槽，同时允许测试构造隔离实例；
/// - **逻辑（How）**：`Mutex<Option<Arc<dyn ContextFactoryBuilder>>>` 保证“检查 + 写入”原子化；
///   读取提供者时克隆 `Arc` 后立即释放锁；
/// - **契约（What）**：没有注销接口；`reset` 仅在 `test-util` 特性下存在。
#[derive(Default)]
pub struct HostNamingManager {
    slot: Mutex<Option<Arc<dyn ContextFactoryBuilder>>>,
}

impl HostNamingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程级宿主实例。
    pub fn global() -> Arc<HostNamingManager> {
        static GLOBAL: OnceLock<Arc<HostNamingManager>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(HostNamingManager::new())))
    }

    fn provider(&self) -> Option<Arc<dyn ContextFactoryBuilder>> {
        self.slot.lock().as_ref().map(Arc::clone)
    }

    /// 清空注册槽，仅用于测试隔离。
    #[cfg(any(test, feature = "test-util"))]
    pub fn reset(&self) {
        *self.slot.lock() = None;
    }
}

impl NamingManager for HostNamingManager {
    fn has_registered_provider(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn register_provider(
        &self,
        provider: Arc<dyn ContextFactoryBuilder>,
    ) -> Result<(), HostRegistrationError> {
        let mut guard = self.slot.lock();
        if guard.is_some() {
            return Err(HostRegistrationError::AlreadyRegistered);
        }
        *guard = Some(provider);
        Ok(())
    }

    fn initial_context(&self, environment: &Environment) -> Result<Box<dyn NamingContext>, NamingError> {
        let provider = self.provider().ok_or(NamingError::NoInitialContext)?;
        let factory = provider.create_initial_context_factory(environment)?;
        factory.initial_context(environment)
    }
}

impl std::fmt::Debug for HostNamingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostNamingManager")
            .field("registered", &self.has_registered_provider())
            .finish()
    }
}

/// 向进程级宿主请求初始命名上下文。
pub fn initial_context(environment: &Environment) -> Result<Box<dyn NamingContext>, NamingError> {
    HostNamingManager::global().initial_context(environment)
}
