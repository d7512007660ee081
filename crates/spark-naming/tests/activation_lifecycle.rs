//! 激活状态机的生命周期契约测试。
//!
//! # 教案级导览
//!
//! - **Why**：激活/停用可以任意往返，而宿主注册只能发生一次；这里逐条验证两份状态的分离。
//! - **How**：每个用例构造独立的宿主与激活服务，避免进程级单例在用例之间串扰。
//! - **What**：覆盖重复激活幂等、停用后重新激活保留绑定、空环境复用实例身份、重绑定覆盖与清空。

use std::sync::Arc;

use spark_naming::{
    ActivationService, ActivationState, BoundObject, Environment, FactoryRegistry,
    HostNamingManager, NamingError, NamingManager,
};

fn isolated() -> (Arc<HostNamingManager>, Arc<ActivationService>) {
    let host = Arc::new(HostNamingManager::new());
    let service = ActivationService::new(host.clone(), Arc::new(FactoryRegistry::new()));
    (host, service)
}

#[test]
fn repeated_activation_is_idempotent() {
    let (host, service) = isolated();
    let builder = service.new_builder();

    builder.activate().expect("首次激活应注册成功");
    builder.activate().expect("重复激活应为无副作用的成功");

    assert!(host.has_registered_provider());
    assert_eq!(builder.state(), ActivationState::RegisteredActive);
    assert!(
        service
            .current_context_builder()
            .is_some_and(|current| Arc::ptr_eq(&current, &builder)),
        "重复激活后活动实例保持不变"
    );
}

#[test]
fn reactivation_keeps_bindings_and_skips_registration() {
    let (host, service) = isolated();
    let builder = service.new_builder();
    builder.bind("jdbc/ds", BoundObject::new("primary"));
    builder.activate().expect("首次激活应注册成功");

    builder.deactivate();
    assert!(service.current_context_builder().is_none());
    assert_eq!(builder.state(), ActivationState::RegisteredInactive);

    builder.activate().expect("停用后重新激活不得触发注册冲突");
    assert_eq!(builder.state(), ActivationState::RegisteredActive);
    assert!(builder.bindings().contains("jdbc/ds"), "激活往返不得隐式清空绑定");

    let context = host.initial_context(&Environment::new()).expect("已注册提供者");
    assert!(context.lookup("jdbc/ds").is_ok());
}

#[test]
fn empty_activated_builder_reuses_active_identity() {
    let (_host, service) = isolated();

    let first = service.empty_activated_context_builder().expect("无活动实例时应创建并激活");
    assert!(first.bindings().is_empty());
    assert!(first.is_active());

    first.bind("svc/cache", BoundObject::new(1_u8));
    let second = service.empty_activated_context_builder().expect("已有活动实例时应原地清空");

    assert!(Arc::ptr_eq(&first, &second), "应返回同一实例");
    assert_eq!(first.id(), second.id());
    assert!(second.bindings().is_empty());
}

#[test]
fn empty_activated_builder_revives_registered_instance_after_deactivate() {
    let (_host, service) = isolated();
    let first = service.empty_activated_context_builder().expect("创建并激活");
    first.bind("svc/cache", BoundObject::new(1_u8));
    first.deactivate();

    let revived = service
        .empty_activated_context_builder()
        .expect("本服务已注册的实例应被重新激活，而非触发冲突");

    assert!(Arc::ptr_eq(&first, &revived));
    assert!(revived.is_active());
    assert!(revived.bindings().is_empty());
}

#[test]
fn rebinding_overwrites_and_clear_keeps_activation() {
    let (_host, service) = isolated();
    let builder = service.new_builder();
    builder.activate().expect("激活应成功");

    let a = BoundObject::new("A");
    let b = BoundObject::new("B");
    builder.bind("x", a.clone());
    builder.bind("x", b.clone());

    let bound = builder.bindings().get("x").expect("x 应已绑定");
    assert!(bound.ptr_eq(&b));
    assert!(!bound.ptr_eq(&a));
    assert_eq!(builder.bindings().len(), 1);

    builder.clear();
    assert!(builder.bindings().is_empty());
    assert_eq!(builder.state(), ActivationState::RegisteredActive);
}

#[test]
fn second_instance_conflicts_and_stays_unregistered() {
    let (_host, service) = isolated();
    let owner = service.new_builder();
    let intruder = service.new_builder();
    owner.activate().expect("首个实例注册成功");
    owner.deactivate();

    let error = intruder.activate().unwrap_err();
    assert!(matches!(error, NamingError::RegistrationConflict { builder } if builder == intruder.id()));
    assert_eq!(error.code(), "naming.registration.conflict");
    assert_eq!(intruder.state(), ActivationState::Unregistered);
    assert!(service.current_context_builder().is_none(), "冲突不得改变活动指针");
}
