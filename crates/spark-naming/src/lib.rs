#![deny(unsafe_code)]
#![doc = "spark-naming: 进程级唯一的初始命名上下文提供者。"]
#![doc = ""]
#![doc = "宿主命名管理器在整个进程生命周期内只接受一次提供者注册且无法撤销；本 crate 在该约束下提供可反复启停的静态绑定环境："]
#![doc = "激活时宿主返回的上下文暴露控制器私有的绑定表，停用时按环境中的委托指定转交其他工厂。"]

//! # 模块导览
//!
//! - [`activation`]：进程级激活服务，持有初始化锁与活动实例指针；
//! - [`builder`]：控制器 [`ContextBuilder`]，对外提供 `activate`/`deactivate`/`bind`/`clear`；
//! - [`factory`]：工厂契约、显式类型注册表与默认工厂；
//! - [`host`]：宿主注册槽契约与进程级实现；
//! - [`bindings`]、[`object`]、[`environment`]、[`context`]：绑定表、绑定对象、环境与上下文。
//!
//! # 快速上手
//!
//! ```
//! use std::sync::Arc;
//!
//! use spark_naming::{
//!     ActivationService, BoundObject, Environment, FactoryRegistry, HostNamingManager, NamingManager,
//! };
//!
//! let host = Arc::new(HostNamingManager::new());
//! let service = ActivationService::new(host.clone(), Arc::new(FactoryRegistry::new()));
//!
//! let builder = service.new_builder();
//! builder.bind("svc/ds", BoundObject::new("primary-datasource"));
//! builder.activate()?;
//!
//! let context = host.initial_context(&Environment::new())?;
//! let datasource = context.lookup("svc/ds")?;
//! assert_eq!(datasource.downcast_ref::<&str>(), Some(&"primary-datasource"));
//! # Ok::<(), spark_naming::NamingError>(())
//! ```

pub mod activation;
pub mod bindings;
pub mod builder;
pub mod context;
pub mod environment;
pub mod error;
pub mod factory;
pub mod host;
pub mod object;

pub use activation::{ActivationService, ActivationState};
pub use bindings::BindingTable;
pub use builder::{BuilderId, ContextBuilder};
pub use context::{NamingContext, SimpleNamingContext};
pub use environment::{EnvValue, Environment, INITIAL_CONTEXT_FACTORY};
pub use error::{BoxError, ConfigurationError, HostRegistrationError, NamingError};
pub use factory::{
    ContextFactoryBuilder, DefaultContextFactory, FactoryConstructor, FactoryRegistry,
    InitialContextFactory, TypeCapability, TypeDescriptor, TypeHandle,
};
pub use host::{HostNamingManager, NamingManager, initial_context};
pub use object::BoundObject;
