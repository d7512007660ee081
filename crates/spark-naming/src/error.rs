//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义命名上下文激活、工厂解析与宿主注册三条路径上的错误语义；
//! - 为每个错误提供稳定的点分错误码，便于日志检索与告警聚合。
//!
//! ## 设计要求（What）
//! - 所有错误类型派生 `thiserror::Error`，与 `std::error::Error` 生态兼容；
//! - `RegistrationConflict` 与 `Configuration` 为致命错误，框架内部不做自动重试；
//! - `bind`/`clear`/`deactivate` 等操作是全函数，不会产生本模块的错误。

use std::error::Error as StdError;

use thiserror::Error;

use crate::builder::BuilderId;

/// 实例化失败时携带的底层原因。
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// 命名子系统对外暴露的统一错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：调用方只需处理一种错误类型，即可覆盖激活冲突、配置错误与查找失败；
/// - **契约 (What)**：
///   - 所有变体均满足 `Send + Sync + 'static`，可安全跨线程传播；
///   - [`NamingError::code`] 返回稳定错误码，文本描述可能随版本调整，错误码不会；
/// - **风险 (Trade-offs)**：`Configuration` 采用透明包装，`Display` 直接复用内部错误文本，
///   日志中需借助错误码区分来源。
#[derive(Debug, Error)]
pub enum NamingError {
    /// 宿主注册槽已被其他提供者占用。
    ///
    /// - **意图 (Why)**：宿主只接受一次注册且无法撤销，冲突后本进程内无法再通过该实例接管；
    /// - **契约 (What)**：`builder` 为发起激活的实例，其状态保持 `Unregistered`；
    /// - **风险 (Trade-offs)**：调用方需改走其他集成路径，重试不会成功。
    #[error(
        "cannot activate context builder {builder}: a naming provider is already registered \
         with the host naming manager; the host accepts exactly one provider per process and \
         offers no reset"
    )]
    RegistrationConflict { builder: BuilderId },

    /// 工厂解析阶段的配置错误。
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// 命名上下文中不存在该名称的绑定。
    #[error("name `{name}` is not bound in this naming context")]
    NameNotFound { name: String },

    /// 宿主尚未注册任何提供者时请求初始上下文。
    #[error("no initial context provider is registered with the host naming manager")]
    NoInitialContext,
}

impl NamingError {
    /// 返回稳定的错误码。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：与框架其余模块一致，以 `domain.component.reason` 形式输出错误码；
    /// - **执行 (How)**：配置类错误委托给 [`ConfigurationError::code`]。
    pub fn code(&self) -> &'static str {
        match self {
            NamingError::RegistrationConflict { .. } => "naming.registration.conflict",
            NamingError::Configuration(error) => error.code(),
            NamingError::NameNotFound { .. } => "naming.context.not_found",
            NamingError::NoInitialContext => "naming.host.no_provider",
        }
    }

    /// 是否为配置错误。
    pub fn is_configuration(&self) -> bool {
        matches!(self, NamingError::Configuration(_))
    }
}

/// 工厂解析与环境装载过程中的配置错误。
///
/// # 教案式说明
/// - **意图 (Why)**：覆盖“覆盖键取值类型错误”“类型不具备工厂能力”“实例化失败”等全部失败路径，
///   保证解析失败总是同步上报，绝不静默回退到默认工厂；
/// - **契约 (What)**：涉及具体类型的变体都携带 `type_name`，便于排障时定位注册项；
/// - **风险 (Trade-offs)**：`Instantiation` 保留原始错误链，`Display` 仅输出摘要，
///   完整原因需通过 `source()` 逐级读取。
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// 覆盖键对应的值既不是类型句柄也不是类型名称。
    #[error("invalid value type for environment key `{key}`: expected a type handle or type name, found {kind}")]
    InvalidValueKind { key: String, kind: &'static str },

    /// 类型名称未在工厂注册表中登记。
    #[error("specified type `{type_name}` is not registered in the factory registry")]
    UnresolvableType { type_name: String },

    /// 解析出的类型不具备初始上下文工厂能力。
    #[error("specified type `{type_name}` does not implement the initial context factory capability")]
    NotAFactory { type_name: String },

    /// 构造工厂实例失败（返回错误或构造过程中 panic）。
    #[error("cannot instantiate specified initial context factory `{type_name}`")]
    Instantiation {
        type_name: String,
        #[source]
        source: BoxError,
    },

    /// 注册表中已存在同名类型。
    #[error("type `{type_name}` is already registered")]
    DuplicateType { type_name: String },

    /// 注册的类型名称为空或仅含空白。
    #[error("type name must not be empty")]
    EmptyTypeName,

    /// 环境文档无法解析。
    #[error("environment document is malformed: {detail}")]
    MalformedEnvironment { detail: String },

    /// 环境文档中出现无法映射的值类型（数组、浮点、日期等）。
    #[error("environment key `{key}` holds an unsupported {kind} value")]
    UnsupportedValue { key: String, kind: &'static str },
}

impl ConfigurationError {
    /// 返回稳定的错误码。
    pub fn code(&self) -> &'static str {
        match self {
            ConfigurationError::InvalidValueKind { .. } => "naming.config.invalid_value_kind",
            ConfigurationError::UnresolvableType { .. } => "naming.config.unresolvable_type",
            ConfigurationError::NotAFactory { .. } => "naming.config.not_a_factory",
            ConfigurationError::Instantiation { .. } => "naming.config.instantiation",
            ConfigurationError::DuplicateType { .. } => "naming.config.duplicate_type",
            ConfigurationError::EmptyTypeName => "naming.config.empty_type_name",
            ConfigurationError::MalformedEnvironment { .. } => "naming.config.malformed",
            ConfigurationError::UnsupportedValue { .. } => "naming.config.unsupported_value",
        }
    }
}

/// 宿主注册槽拒绝注册。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum HostRegistrationError {
    /// 已存在注册的提供者。
    #[error("a naming provider is already registered with the host naming manager")]
    AlreadyRegistered,
}
