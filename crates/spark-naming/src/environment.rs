//! 上下文创建时由调用方提供的环境映射。
//!
//! # 设计目标（Why）
//! - 环境是“无类型”的键值表：同一个键可能携带类型句柄、类型名称或任意标量，解析器需在调用时判别；
//! - 以强类型枚举 [`EnvValue`] 表达取值种类，避免字符串配置带来的歧义。
//!
//! # 逻辑概览（How）
//! - [`Environment`] 内部使用 `BTreeMap`，保证遍历与调试输出顺序稳定；
//! - [`Environment::from_toml_str`] 借助 `toml` 解析配置文件，嵌套表按 `.` 拼接为扁平键。
//!
//! # 契约说明（What）
//! - [`INITIAL_CONTEXT_FACTORY`] 是唯一被本 crate 解释的键，其余键原样透传给命名上下文。

use std::collections::BTreeMap;

use crate::{error::ConfigurationError, factory::TypeHandle, object::BoundObject};

/// 指定委托工厂实现的环境键。
pub const INITIAL_CONTEXT_FACTORY: &str = "naming.factory.initial";

/// 环境取值。
///
/// ### 设计取舍（Trade-offs）
/// - `Type` 与 `Text` 共同覆盖“类型句柄”与“可解析类型名”两种工厂指定方式；
/// - `Object` 允许调用方在环境中夹带任意对象，但解析器对其不做解释。
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum EnvValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Type(TypeHandle),
    Object(BoundObject),
}

impl EnvValue {
    /// 取值种类的可读名称，用于错误信息。
    pub fn kind(&self) -> &'static str {
        match self {
            EnvValue::Text(_) => "text",
            EnvValue::Integer(_) => "integer",
            EnvValue::Boolean(_) => "boolean",
            EnvValue::Type(_) => "type handle",
            EnvValue::Object(_) => "object",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EnvValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue::Text(value.to_owned())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        EnvValue::Text(value)
    }
}

impl From<i64> for EnvValue {
    fn from(value: i64) -> Self {
        EnvValue::Integer(value)
    }
}

impl From<bool> for EnvValue {
    fn from(value: bool) -> Self {
        EnvValue::Boolean(value)
    }
}

impl From<TypeHandle> for EnvValue {
    fn from(value: TypeHandle) -> Self {
        EnvValue::Type(value)
    }
}

impl From<BoundObject> for EnvValue {
    fn from(value: BoundObject) -> Self {
        EnvValue::Object(value)
    }
}

/// 调用方提供的环境映射。
///
/// ### 契约说明（What）
/// - **前置条件**：键区分大小写；
/// - **后置条件**：克隆得到独立副本，后续修改互不影响。
#[derive(Clone, Debug, Default)]
pub struct Environment {
    entries: BTreeMap<String, EnvValue>,
}

impl Environment {
    /// 创建空环境。
    pub fn new() -> Self {
        Self::default()
    }

    /// 以链式方式追加条目。
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<EnvValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// 写入条目，返回旧值。
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<EnvValue>) -> Option<EnvValue> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&EnvValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<EnvValue> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EnvValue)> {
        self.entries.iter()
    }

    /// 从 TOML 文档装载环境。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：部署方通常以配置文件声明委托工厂与连接参数，而非在代码中逐项拼装；
    /// - **执行 (How)**：
    ///   1. 使用 `toml` 解析为表；
    ///   2. 递归展开嵌套表，键以 `.` 连接，例如 `[naming.factory] initial = "..."` 得到
    ///      [`INITIAL_CONTEXT_FACTORY`]；
    ///   3. 字符串、整数、布尔映射为对应 [`EnvValue`]，其余类型拒绝；
    /// - **契约 (What)**：语法错误返回 [`ConfigurationError::MalformedEnvironment`]，
    ///   不支持的取值返回 [`ConfigurationError::UnsupportedValue`]。
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigurationError> {
        let table = document
            .parse::<toml::Table>()
            .map_err(|error| ConfigurationError::MalformedEnvironment {
                detail: error.to_string(),
            })?;
        let mut environment = Environment::new();
        flatten_table(&mut environment, None, &table)?;
        Ok(environment)
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<EnvValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut environment = Environment::new();
        for (key, value) in iter {
            environment.insert(key, value);
        }
        environment
    }
}

fn flatten_table(
    environment: &mut Environment,
    prefix: Option<&str>,
    table: &toml::Table,
) -> Result<(), ConfigurationError> {
    for (segment, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{segment}"),
            None => segment.clone(),
        };
        match value {
            toml::Value::Table(nested) => flatten_table(environment, Some(&key), nested)?,
            toml::Value::String(text) => {
                environment.insert(key, text.as_str());
            }
            toml::Value::Integer(number) => {
                environment.insert(key, *number);
            }
            toml::Value::Boolean(flag) => {
                environment.insert(key, *flag);
            }
            other => {
                return Err(ConfigurationError::UnsupportedValue {
                    key,
                    kind: other.type_str(),
                });
            }
        }
    }
    Ok(())
}
