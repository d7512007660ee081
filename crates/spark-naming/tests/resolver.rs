//! 工厂解析器契约测试。
//!
//! # 教案级导览
//!
//! - **Why**：停用的控制器需要按环境把上下文请求转交委托工厂，而任何委托失败都必须同步上报，
//!   绝不能静默回退到默认工厂。
//! - **How**：通过宿主 `initial_context` 驱动完整路径，覆盖类型句柄、类型名称、错误取值类型、
//!   缺少工厂能力与构造失败。
//! - **What**：活动实例总是忽略覆盖键；非活动实例的委托结果与错误码稳定可断言。

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use spark_naming::{
    ActivationService, BindingTable, BoundObject, ConfigurationError, DefaultContextFactory,
    EnvValue, Environment, FactoryRegistry, HostNamingManager, INITIAL_CONTEXT_FACTORY,
    InitialContextFactory, NamingError, NamingManager, TypeDescriptor,
};

const REMOTE_FACTORY: &str = "acme.RemoteContextFactory";

struct Fixture {
    host: Arc<HostNamingManager>,
    service: Arc<ActivationService>,
    remote: Arc<BindingTable>,
    constructions: Arc<AtomicUsize>,
}

/// 构造注册了“远端”委托工厂的隔离环境。
fn fixture() -> Fixture {
    let host = Arc::new(HostNamingManager::new());
    let registry = Arc::new(FactoryRegistry::new());
    let remote = Arc::new(BindingTable::new());
    remote.bind("svc/ds", BoundObject::new("remote-datasource"));
    let constructions = Arc::new(AtomicUsize::new(0));

    let table = Arc::clone(&remote);
    let counter = Arc::clone(&constructions);
    registry
        .register(TypeDescriptor::context_factory(REMOTE_FACTORY, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let factory: Arc<dyn InitialContextFactory> =
                Arc::new(DefaultContextFactory::new(Arc::clone(&table)));
            Ok(factory)
        }))
        .expect("委托工厂注册应成功");

    let service = ActivationService::new(host.clone(), registry);
    Fixture {
        host,
        service,
        remote,
        constructions,
    }
}

fn lookup_text(host: &HostNamingManager, environment: &Environment, name: &str) -> Option<&'static str> {
    let context = host.initial_context(environment).ok()?;
    let object = context.lookup(name).ok()?;
    object.downcast_ref::<&'static str>().copied()
}

#[test]
fn inactive_builder_delegates_by_type_name() {
    let fx = fixture();
    let builder = fx.service.new_builder();
    builder.bind("svc/ds", BoundObject::new("local-datasource"));
    builder.activate().expect("注册应成功");
    builder.deactivate();

    let environment = Environment::new().with(INITIAL_CONTEXT_FACTORY, REMOTE_FACTORY);
    assert_eq!(
        lookup_text(&fx.host, &environment, "svc/ds"),
        Some("remote-datasource")
    );
    assert_eq!(fx.constructions.load(Ordering::SeqCst), 1, "每次解析实例化一次委托工厂");
}

#[test]
fn inactive_builder_delegates_by_type_handle() {
    let fx = fixture();
    let builder = fx.service.new_builder();
    builder.activate().expect("注册应成功");
    builder.deactivate();

    let handle = fx.service.registry().get(REMOTE_FACTORY).expect("已注册");
    let environment = Environment::new().with(INITIAL_CONTEXT_FACTORY, EnvValue::Type(handle));
    assert_eq!(
        lookup_text(&fx.host, &environment, "svc/ds"),
        Some("remote-datasource")
    );
}

#[test]
fn activation_takes_precedence_over_override() {
    let fx = fixture();
    let builder = fx.service.new_builder();
    builder.bind("svc/ds", BoundObject::new("local-datasource"));
    builder.activate().expect("注册应成功");

    let environment = Environment::new().with(INITIAL_CONTEXT_FACTORY, REMOTE_FACTORY);
    assert_eq!(
        lookup_text(&fx.host, &environment, "svc/ds"),
        Some("local-datasource")
    );
    assert_eq!(fx.constructions.load(Ordering::SeqCst), 0, "活动实例不得实例化委托工厂");
}

#[test]
fn deactivated_builder_without_override_still_serves_bindings() {
    let fx = fixture();
    let builder = fx.service.new_builder();
    builder.bind("svc/ds", BoundObject::new("local-datasource"));
    builder.activate().expect("注册应成功");
    builder.deactivate();

    assert_eq!(
        lookup_text(&fx.host, &Environment::new(), "svc/ds"),
        Some("local-datasource")
    );
}

#[test]
fn non_factory_type_fails_without_context() {
    let fx = fixture();
    fx.service
        .registry()
        .register(TypeDescriptor::opaque("acme.PooledDataSource"))
        .expect("普通类型注册应成功");
    let builder = fx.service.new_builder();
    builder.activate().expect("注册应成功");
    builder.deactivate();

    let environment = Environment::new().with(INITIAL_CONTEXT_FACTORY, "acme.PooledDataSource");
    let error = fx.host.initial_context(&environment).unwrap_err();

    assert!(matches!(
        error,
        NamingError::Configuration(ConfigurationError::NotAFactory { ref type_name })
            if type_name == "acme.PooledDataSource"
    ));
}

#[test]
fn malformed_designation_is_a_configuration_error() {
    let fx = fixture();
    let builder = fx.service.new_builder();
    builder.activate().expect("注册应成功");
    builder.deactivate();

    let environment = Environment::new().with(INITIAL_CONTEXT_FACTORY, true);
    let error = fx.host.initial_context(&environment).unwrap_err();
    assert!(error.is_configuration());
    assert_eq!(error.code(), "naming.config.invalid_value_kind");

    let environment = Environment::new().with(INITIAL_CONTEXT_FACTORY, "acme.Unknown");
    let error = fx.host.initial_context(&environment).unwrap_err();
    assert_eq!(error.code(), "naming.config.unresolvable_type");
}

#[test]
fn constructor_failure_is_reported_not_downgraded() {
    let fx = fixture();
    fx.service
        .registry()
        .register(TypeDescriptor::context_factory("acme.OfflineFactory", || {
            Err("directory server unreachable".into())
        }))
        .expect("注册应成功");
    let builder = fx.service.new_builder();
    builder.bind("svc/ds", BoundObject::new("local-datasource"));
    builder.activate().expect("注册应成功");
    builder.deactivate();

    let environment = Environment::new().with(INITIAL_CONTEXT_FACTORY, "acme.OfflineFactory");
    let error = fx.host.initial_context(&environment).unwrap_err();

    match error {
        NamingError::Configuration(ConfigurationError::Instantiation { type_name, source }) => {
            assert_eq!(type_name, "acme.OfflineFactory");
            assert_eq!(source.to_string(), "directory server unreachable");
        }
        other => panic!("应得到实例化错误，实际为 {other:?}"),
    }
}

#[test]
fn delegate_sees_remote_table_not_builder_table() {
    let fx = fixture();
    let builder = fx.service.new_builder();
    builder.activate().expect("注册应成功");
    builder.deactivate();

    fx.remote.bind("svc/queue", BoundObject::new("remote-queue"));
    let environment = Environment::new().with(INITIAL_CONTEXT_FACTORY, REMOTE_FACTORY);
    assert_eq!(
        lookup_text(&fx.host, &environment, "svc/queue"),
        Some("remote-queue")
    );
    assert!(builder.bindings().is_empty());
}
