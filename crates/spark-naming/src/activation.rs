//! # ActivationService：进程级激活状态
//!
//! ## 核心意图（Why）
//! - 宿主注册槽一经写入便无法撤销，而测试套件需要反复切换“静态绑定 / 委托”两种模式；
//! - 因此将“是否已向宿主注册”与“当前由哪个实例提供服务”拆成两份状态：前者一次性写入，
//!   后者可在 `activate`/`deactivate` 之间任意往返。
//!
//! ## 架构定位（Where）
//! - 持有注入的宿主 [`NamingManager`] 与工厂注册表 [`FactoryRegistry`]；
//! - [`ContextBuilder`] 的激活相关操作全部委托到此处，保证同一服务下的实例共享同一把初始化锁。
//!
//! ## 行为契约（What）
//! - 初始化锁内完成“检查宿主槽位 + 注册”，两个并发激活只有一个成功，另一个得到
//!   [`NamingError::RegistrationConflict`]；
//! - 活动实例指针基于 `ArcSwapOption`，写入与读取具备 Release/Acquire 语义，读者不会看到半更新的引用；
//! - 绑定操作不经过初始化锁。
//!
//! ## 风险提示（Trade-offs）
//! - 活动实例持有服务的强引用，激活期间二者互相引用；注册本身与进程同寿，此处不做额外回收。

use std::sync::{Arc, OnceLock, Weak};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::{
    builder::{BuilderId, ContextBuilder},
    error::NamingError,
    factory::{ContextFactoryBuilder, FactoryRegistry},
    host::{HostNamingManager, NamingManager},
};

/// 控制器实例的激活状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActivationState {
    /// 尚未向宿主注册。
    Unregistered,
    /// 已注册，但当前未提供静态绑定。
    RegisteredInactive,
    /// 已注册且为活动实例。
    RegisteredActive,
}

/// 初始化锁保护的注册记录。
#[derive(Debug, Default)]
struct Registration {
    owner: Option<BuilderId>,
    instance: Weak<ContextBuilder>,
}

/// 进程级激活服务。
///
/// # 教案级注释
/// - **设计目的 (Why)**
///   - 以显式单例对象承载原本散落的全局状态：初始化锁、一次性注册记录、活动实例指针；
///   - 宿主与注册表通过构造函数注入，测试可为每个用例构造独立服务。
/// - **关键要素 (How)**
///   - `initialization`：`parking_lot::Mutex<Registration>`，既是初始化锁也是注册记录；
///   - `active`：`ArcSwapOption<ContextBuilder>`，无锁读取当前活动实例；
/// - **契约说明 (What)**
///   - [`ActivationService::global`] 返回基于进程级宿主的共享实例；
///   - 同一服务下至多一个实例能成为注册者，活动实例只能是该注册者。
pub struct ActivationService {
    host: Arc<dyn NamingManager>,
    registry: Arc<FactoryRegistry>,
    initialization: Mutex<Registration>,
    active: ArcSwapOption<ContextBuilder>,
}

impl ActivationService {
    /// 以注入的宿主与注册表构造服务。
    pub fn new(host: Arc<dyn NamingManager>, registry: Arc<FactoryRegistry>) -> Arc<Self> {
        Arc::new(Self {
            host,
            registry,
            initialization: Mutex::new(Registration::default()),
            active: ArcSwapOption::empty(),
        })
    }

    /// 进程级服务实例，绑定 [`HostNamingManager::global`]。
    pub fn global() -> Arc<ActivationService> {
        static GLOBAL: OnceLock<Arc<ActivationService>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| {
            ActivationService::new(HostNamingManager::global(), Arc::new(FactoryRegistry::new()))
        }))
    }

    /// 注入的宿主注册接口。
    pub fn host(&self) -> &Arc<dyn NamingManager> {
        &self.host
    }

    /// 委托工厂注册表。
    pub fn registry(&self) -> &Arc<FactoryRegistry> {
        &self.registry
    }

    /// 在本服务下创建新的控制器实例，初始状态为 `Unregistered`。
    pub fn new_builder(self: &Arc<Self>) -> Arc<ContextBuilder> {
        Arc::new(ContextBuilder::with_service(Arc::clone(self)))
    }

    /// 当前活动实例，可能为空。
    pub fn current_context_builder(&self) -> Option<Arc<ContextBuilder>> {
        self.active.load_full()
    }

    /// 已向宿主注册的实例（若仍存活）。
    pub fn registered_builder(&self) -> Option<Arc<ContextBuilder>> {
        self.initialization.lock().instance.upgrade()
    }

    /// 返回一个处于激活状态且绑定表为空的实例。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：测试套件需要在每个用例开始时从零重建绑定；
    /// - **执行 (How)**：整个判定在初始化锁内完成，并发调用者按锁顺序串行：
    ///   1. 已有活动实例：原地清空其绑定表并原样返回，身份不变，不触发注册；
    ///   2. 无活动实例但本服务先前注册过实例：清空并重新激活该实例，避免必然失败的二次注册；
    ///   3. 从未注册：创建新实例并激活；
    /// - **契约 (What)**：仅可能因 [`NamingError::RegistrationConflict`] 失败，
    ///   即宿主槽位已被无关提供者占用；并发调用者得到同一实例。
    pub fn empty_activated_context_builder(self: &Arc<Self>) -> Result<Arc<ContextBuilder>, NamingError> {
        let mut registration = self.initialization.lock();
        if let Some(active) = self.current_context_builder() {
            active.clear();
            return Ok(active);
        }
        let builder = match registration.instance.upgrade() {
            Some(registered) => {
                registered.clear();
                registered
            }
            None => self.new_builder(),
        };
        info!(builder = %builder.id(), "activating simple naming environment");
        self.register_locked(&mut registration, &builder)?;
        self.active.store(Some(Arc::clone(&builder)));
        Ok(builder)
    }

    pub(crate) fn activate(&self, builder: &Arc<ContextBuilder>) -> Result<(), NamingError> {
        info!(builder = %builder.id(), "activating simple naming environment");
        let mut registration = self.initialization.lock();
        self.register_locked(&mut registration, builder)?;
        self.active.store(Some(Arc::clone(builder)));
        Ok(())
    }

    /// 在初始化锁内确认或建立注册关系；已是注册者时直接返回。
    fn register_locked(
        &self,
        registration: &mut Registration,
        builder: &Arc<ContextBuilder>,
    ) -> Result<(), NamingError> {
        match registration.owner {
            Some(owner) if owner == builder.id() => Ok(()),
            Some(owner) => {
                warn!(
                    builder = %builder.id(),
                    registered = %owner,
                    "naming provider slot is held by another context builder"
                );
                Err(NamingError::RegistrationConflict { builder: builder.id() })
            }
            None => {
                if self.host.has_registered_provider() {
                    warn!(builder = %builder.id(), "naming provider slot is held by an unrelated provider");
                    return Err(NamingError::RegistrationConflict { builder: builder.id() });
                }
                let provider: Arc<dyn ContextFactoryBuilder> = builder.clone();
                self.host
                    .register_provider(provider)
                    .map_err(|_| NamingError::RegistrationConflict { builder: builder.id() })?;
                registration.owner = Some(builder.id());
                registration.instance = Arc::downgrade(builder);
                Ok(())
            }
        }
    }

    pub(crate) fn deactivate(&self, builder: &ContextBuilder) {
        info!(builder = %builder.id(), "deactivating simple naming environment");
        let current = self.active.load();
        let is_current =
            Option::as_ref(&current).is_some_and(|active| active.id() == builder.id());
        if is_current {
            self.active.compare_and_swap(&current, None::<Arc<ContextBuilder>>);
        }
    }

    pub(crate) fn is_active(&self, builder: &ContextBuilder) -> bool {
        Option::as_ref(&self.active.load()).is_some_and(|active| active.id() == builder.id())
    }

    pub(crate) fn state_of(&self, builder: &ContextBuilder) -> ActivationState {
        let registered = self.initialization.lock().owner == Some(builder.id());
        match (registered, self.is_active(builder)) {
            (false, _) => ActivationState::Unregistered,
            (true, false) => ActivationState::RegisteredInactive,
            (true, true) => ActivationState::RegisteredActive,
        }
    }

    /// 清空激活与注册记录，仅用于测试隔离。
    ///
    /// - **注意事项**：不会触碰注入的宿主；使用进程级宿主时需同时调用 [`HostNamingManager::reset`]。
    #[cfg(any(test, feature = "test-util"))]
    pub fn reset(&self) {
        let mut registration = self.initialization.lock();
        *registration = Registration::default();
        self.active.store(None);
    }
}

impl std::fmt::Debug for ActivationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let active = Option::as_ref(&self.active.load()).map(|builder| builder.id());
        f.debug_struct("ActivationService")
            .field("registered", &self.initialization.lock().owner)
            .field("active", &active)
            .finish()
    }
}
