//! # ContextBuilder：静态命名环境控制器
//!
//! ## 定位与职责（Why）
//! - 面向测试与静态配置场景：把对象绑定到名称上，并在激活后让宿主返回的初始上下文直接暴露这些绑定；
//! - 停用后仍保留宿主注册，改为按环境中的委托指定转交给其他工厂。
//!
//! ## 行为契约（What）
//! - `activate` 首次调用时向宿主注册，之后的往返只切换活动指针；
//! - `bind`/`clear` 只操作本实例的绑定表，不影响激活状态；
//! - 作为 [`ContextFactoryBuilder`] 被宿主调用时：活动实例总是返回默认工厂，
//!   非活动实例在环境指定了委托工厂时返回委托工厂。

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::{debug, info};

use crate::{
    activation::{ActivationService, ActivationState},
    bindings::BindingTable,
    environment::{Environment, INITIAL_CONTEXT_FACTORY},
    error::NamingError,
    factory::{ContextFactoryBuilder, DefaultContextFactory, InitialContextFactory},
    object::BoundObject,
};

/// 控制器实例的进程内唯一标识。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuilderId(u64);

impl BuilderId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        BuilderId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BuilderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context-builder#{}", self.0)
    }
}

/// 静态命名环境控制器。
///
/// # 教案级注释
/// - **设计目的 (Why)**
///   - 为测试套件提供可反复启停的命名环境替身：激活时暴露私有绑定，停用时回退到委托工厂；
/// - **关键要素 (How)**
///   - `id`：判定“是否为活动实例”的身份；
///   - `bindings`：`Arc<BindingTable>`，与生成的上下文共享；
///   - `service`：所属的 [`ActivationService`]，承载初始化锁与活动指针；
/// - **契约说明 (What)**
///   - 实例总以 `Arc<ContextBuilder>` 形式存在，宿主注册槽与活动指针都持有该 `Arc`；
///   - 激活/停用不会隐式清空绑定表。
pub struct ContextBuilder {
    id: BuilderId,
    bindings: Arc<BindingTable>,
    service: Arc<ActivationService>,
}

impl ContextBuilder {
    /// 在进程级服务下创建新实例。
    pub fn new() -> Arc<Self> {
        ActivationService::global().new_builder()
    }

    pub(crate) fn with_service(service: Arc<ActivationService>) -> Self {
        Self {
            id: BuilderId::next(),
            bindings: Arc::new(BindingTable::new()),
            service,
        }
    }

    /// 进程级服务的当前活动实例。
    pub fn current() -> Option<Arc<Self>> {
        ActivationService::global().current_context_builder()
    }

    /// 进程级服务下一个已激活且绑定为空的实例。
    ///
    /// 参见 [`ActivationService::empty_activated_context_builder`]。
    pub fn empty_activated() -> Result<Arc<Self>, NamingError> {
        ActivationService::global().empty_activated_context_builder()
    }

    /// 实例身份，激活冲突错误与日志均以此标识实例。
    pub fn id(&self) -> BuilderId {
        self.id
    }

    /// 与生成的上下文共享的绑定表。
    pub fn bindings(&self) -> &Arc<BindingTable> {
        &self.bindings
    }

    /// 所属的激活服务。
    pub fn service(&self) -> &Arc<ActivationService> {
        &self.service
    }

    /// 激活本实例。
    ///
    /// # 教案式说明
    /// - **执行 (How)**：首次激活在初始化锁内检查并写入宿主注册槽，之后只更新活动指针；
    /// - **契约 (What)**：
    ///   - 已激活时再次调用为无副作用的成功；
    ///   - 宿主槽位被其他提供者占用时返回 [`NamingError::RegistrationConflict`]，状态保持 `Unregistered`；
    ///   - 宿主注册一旦完成便持续到进程结束，[`initial_context`](crate::initial_context) 将始终经过本实例。
    pub fn activate(self: &Arc<Self>) -> Result<(), NamingError> {
        self.service.activate(self)
    }

    /// 暂时停用本实例。
    ///
    /// - **契约 (What)**：仍保持宿主注册，之后的上下文请求在环境指定了委托工厂时转交委托工厂；
    ///   可与 [`ContextBuilder::activate`] 任意次往返。
    pub fn deactivate(&self) {
        self.service.deactivate(self);
    }

    /// 清空全部绑定，保持激活状态不变。
    pub fn clear(&self) {
        self.bindings.clear();
    }

    /// 将对象绑定到名称上，对本实例生成的全部上下文生效。
    pub fn bind(&self, name: impl Into<String>, object: BoundObject) {
        let name = name.into();
        info!(builder = %self.id, name = %name, object = %object, "static naming binding");
        self.bindings.bind(name, object);
    }

    /// 当前激活状态。
    ///
    /// - **契约 (What)**：只读查询；并发激活/停用时返回调用瞬间的某个一致状态。
    pub fn state(&self) -> ActivationState {
        self.service.state_of(self)
    }

    /// 是否为所属服务的活动实例。
    pub fn is_active(&self) -> bool {
        self.service.is_active(self)
    }
}

impl ContextFactoryBuilder for ContextBuilder {
    /// 为宿主解析本次上下文请求应使用的工厂。
    ///
    /// # 教案式说明
    /// - **执行 (How)**：
    ///   1. 本实例非活动且环境包含 [`INITIAL_CONTEXT_FACTORY`]：经注册表解析、校验并实例化委托工厂；
    ///   2. 否则返回捕获本实例绑定表的 [`DefaultContextFactory`]；
    /// - **契约 (What)**：激活优先于委托；委托解析失败以 [`NamingError::Configuration`] 同步返回，
    ///   不会回退到默认工厂。
    fn create_initial_context_factory(
        &self,
        environment: &Environment,
    ) -> Result<Arc<dyn InitialContextFactory>, NamingError> {
        if !self.is_active() {
            if let Some(designation) = environment.get(INITIAL_CONTEXT_FACTORY) {
                debug!(
                    builder = %self.id,
                    designation = designation.kind(),
                    "inactive builder delegates to the configured initial context factory"
                );
                return Ok(self.service.registry().instantiate(designation)?);
            }
        }
        debug!(builder = %self.id, "serving static bindings through the default context factory");
        Ok(Arc::new(DefaultContextFactory::new(Arc::clone(&self.bindings))))
    }
}

impl fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("id", &self.id)
            .field("bindings", &self.bindings.len())
            .field("state", &self.state())
            .finish()
    }
}
