//! # factory 模块说明
//!
//! ## 角色定位（Why）
//! - 定义宿主与提供者之间的两层工厂契约：[`ContextFactoryBuilder`] 由宿主在每次创建上下文时调用，
//!   返回 [`InitialContextFactory`]，后者再生成具体的 [`NamingContext`]；
//! - 以显式注册表 [`FactoryRegistry`] 取代运行时按名称加载类型：委托工厂必须事先登记构造函数，
//!   解析阶段只做查表、能力校验与实例化。
//!
//! ## 契约边界（What）
//! - 委托指定可以是类型句柄 [`TypeHandle`]，也可以是注册表中的类型名称；
//! - 注册表在登记时即校验名称非空、不重复，解析阶段不会出现“半注册”的条目；
//! - 构造函数返回错误或发生 panic 时，统一包装为 [`ConfigurationError::Instantiation`]。

use std::{
    borrow::Cow,
    collections::BTreeMap,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::debug;

use crate::{
    bindings::BindingTable,
    context::{NamingContext, SimpleNamingContext},
    environment::{EnvValue, Environment, INITIAL_CONTEXT_FACTORY},
    error::{BoxError, ConfigurationError, NamingError},
};

/// 初始上下文工厂能力。
///
/// - **契约 (What)**：实现需满足 `Send + Sync`，以便宿主跨线程缓存与调用；
///   每次调用都应返回新的上下文实例。
pub trait InitialContextFactory: Send + Sync {
    /// 依据环境创建初始命名上下文。
    fn initial_context(&self, environment: &Environment) -> Result<Box<dyn NamingContext>, NamingError>;
}

/// 宿主注册槽接受的提供者契约。
///
/// # 教案式说明
/// - **意图 (Why)**：宿主只持有一个提供者，每次有人请求初始上下文时由提供者决定使用哪个工厂；
/// - **契约 (What)**：该入口由宿主调用，不面向应用代码；失败必须同步返回，宿主不会重试。
pub trait ContextFactoryBuilder: Send + Sync {
    fn create_initial_context_factory(
        &self,
        environment: &Environment,
    ) -> Result<Arc<dyn InitialContextFactory>, NamingError>;
}

/// 委托工厂的无参构造函数。
pub type FactoryConstructor =
    Arc<dyn Fn() -> Result<Arc<dyn InitialContextFactory>, BoxError> + Send + Sync>;

/// 注册类型所具备的能力。
#[derive(Clone)]
pub enum TypeCapability {
    /// 可作为初始上下文工厂实例化。
    ContextFactory(FactoryConstructor),
    /// 仅登记了名称，不具备工厂能力（例如供其他子系统引用的普通对象类型）。
    Opaque,
}

/// 注册表中的类型描述。
///
/// - **契约 (What)**：描述符构造后不可变，通过 [`TypeHandle`] 共享；
///   类型句柄可直接放入环境，绕过名称查找。
pub struct TypeDescriptor {
    name: Cow<'static, str>,
    capability: TypeCapability,
}

/// 类型句柄。
pub type TypeHandle = Arc<TypeDescriptor>;

impl TypeDescriptor {
    /// 描述一个具备工厂能力的类型。
    pub fn context_factory<F>(name: impl Into<Cow<'static, str>>, constructor: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn InitialContextFactory>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            capability: TypeCapability::ContextFactory(Arc::new(constructor)),
        }
    }

    /// 描述一个不具备工厂能力的类型。
    pub fn opaque(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            capability: TypeCapability::Opaque,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability(&self) -> &TypeCapability {
        &self.capability
    }

    pub fn is_context_factory(&self) -> bool {
        matches!(self.capability, TypeCapability::ContextFactory(_))
    }

    /// 校验能力并通过无参构造函数实例化。
    ///
    /// # 教案式说明
    /// - **执行 (How)**：
    ///   1. 不具备工厂能力时返回 [`ConfigurationError::NotAFactory`]；
    ///   2. 调用构造函数，返回错误时包装为 [`ConfigurationError::Instantiation`]；
    ///   3. 构造函数 panic 时捕获 panic 负载并同样包装，避免宿主线程被展开。
    pub fn instantiate(&self) -> Result<Arc<dyn InitialContextFactory>, ConfigurationError> {
        let constructor = match &self.capability {
            TypeCapability::ContextFactory(constructor) => constructor,
            TypeCapability::Opaque => {
                return Err(ConfigurationError::NotAFactory {
                    type_name: self.name.to_string(),
                });
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| constructor()));
        let source: BoxError = match outcome {
            Ok(Ok(factory)) => return Ok(factory),
            Ok(Err(error)) => error,
            Err(payload) => panic_message(&*payload).into(),
        };
        Err(ConfigurationError::Instantiation {
            type_name: self.name.to_string(),
            source,
        })
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("context_factory", &self.is_context_factory())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("constructor panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("constructor panicked: {message}")
    } else {
        "constructor panicked".to_owned()
    }
}

/// 委托工厂的显式注册表。
///
/// # 教案级注释
/// - **目标 (Why)**
///   - 委托路径允许按名称指定工厂实现，但不做开放式的动态加载：所有可被指定的类型必须事先登记；
///   - 命名冲突在注册时即被捕获，解析阶段不会遇到二义性。
/// - **设计要点 (How)**
///   - 内部使用 `RwLock<BTreeMap<String, TypeHandle>>`：解析为读多写少路径，`BTreeMap` 保证诊断输出有序；
/// - **契约 (What)**
///   - 名称区分大小写；空白名称返回 [`ConfigurationError::EmptyTypeName`]；
///   - 重复注册返回 [`ConfigurationError::DuplicateType`]，已有条目保持不变。
#[derive(Debug, Default)]
pub struct FactoryRegistry {
    entries: RwLock<BTreeMap<String, TypeHandle>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记类型，返回可直接放入环境的句柄。
    pub fn register(&self, descriptor: TypeDescriptor) -> Result<TypeHandle, ConfigurationError> {
        if descriptor.name().trim().is_empty() {
            return Err(ConfigurationError::EmptyTypeName);
        }
        let mut entries = self.entries.write();
        if entries.contains_key(descriptor.name()) {
            return Err(ConfigurationError::DuplicateType {
                type_name: descriptor.name().to_owned(),
            });
        }
        let handle = Arc::new(descriptor);
        entries.insert(handle.name().to_owned(), Arc::clone(&handle));
        Ok(handle)
    }

    /// 按名称查找句柄。
    pub fn get(&self, type_name: &str) -> Option<TypeHandle> {
        self.entries.read().get(type_name).cloned()
    }

    /// 已登记的全部类型名称，按字典序排列。
    pub fn type_names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// 将环境中的委托指定解析为类型句柄。
    ///
    /// - **契约 (What)**：类型句柄原样返回；文本按名称查表，未命中返回
    ///   [`ConfigurationError::UnresolvableType`]；其余取值种类返回
    ///   [`ConfigurationError::InvalidValueKind`]。
    pub fn resolve(&self, designation: &EnvValue) -> Result<TypeHandle, ConfigurationError> {
        match designation {
            EnvValue::Type(handle) => Ok(Arc::clone(handle)),
            EnvValue::Text(type_name) => {
                self.get(type_name)
                    .ok_or_else(|| ConfigurationError::UnresolvableType {
                        type_name: type_name.clone(),
                    })
            }
            other => Err(ConfigurationError::InvalidValueKind {
                key: INITIAL_CONTEXT_FACTORY.to_owned(),
                kind: other.kind(),
            }),
        }
    }

    /// 解析并实例化委托工厂。
    pub fn instantiate(
        &self,
        designation: &EnvValue,
    ) -> Result<Arc<dyn InitialContextFactory>, ConfigurationError> {
        let handle = self.resolve(designation)?;
        debug!(type_name = handle.name(), "instantiating delegate initial context factory");
        handle.instantiate()
    }

    /// 清空注册表，仅用于测试隔离。
    #[cfg(any(test, feature = "test-util"))]
    pub fn reset(&self) {
        self.entries.write().clear();
    }
}

/// 默认工厂：以控制器的绑定表生成 [`SimpleNamingContext`]。
///
/// # 教案式说明
/// - **逻辑 (How)**：捕获绑定表的共享引用，每次调用生成根名为空、环境为调用方传入值的新上下文；
/// - **契约 (What)**：不做快照，控制器之后的绑定变更对生成的上下文可见。
#[derive(Debug, Clone)]
pub struct DefaultContextFactory {
    bindings: Arc<BindingTable>,
}

impl DefaultContextFactory {
    pub fn new(bindings: Arc<BindingTable>) -> Self {
        Self { bindings }
    }
}

impl InitialContextFactory for DefaultContextFactory {
    fn initial_context(&self, environment: &Environment) -> Result<Box<dyn NamingContext>, NamingError> {
        Ok(Box::new(SimpleNamingContext::new(
            "",
            Arc::clone(&self.bindings),
            environment.clone(),
        )))
    }
}
