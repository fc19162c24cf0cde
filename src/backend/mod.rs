//! The untyped boundary to external parsing backends.
//!
//! A backend is registered as a [`BackendModule`]: an export table whose
//! entries may be plain parse functions, factories returning a result
//! accessor, classes instantiated once and reused, middleware factories, or
//! nested namespaces (`default`). Adapters never see a backend's concrete
//! types, only [`serde_json::Value`] results.

mod entry;

pub use entry::*;

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Per-call failure inside a backend. Never escapes an adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendFailure {
    #[error("{0}")]
    Threw(String),
    #[error("backend panicked: {0}")]
    Panicked(String),
    #[error("backend returned no result")]
    NoResult,
}

impl BackendFailure {
    pub fn threw(message: impl Into<String>) -> Self {
        Self::Threw(message.into())
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendFailure>;

pub type ParseFn = Arc<dyn Fn(&str) -> BackendResult<Value> + Send + Sync>;
pub type FactoryFn = Arc<dyn Fn(&str) -> BackendResult<Box<dyn ParserHandle>> + Send + Sync>;
pub type ClassFn = Arc<dyn Fn() -> BackendResult<Arc<dyn ParserInstance>> + Send + Sync>;
pub type Middleware = Arc<dyn Fn(&mut SyntheticRequest) -> BackendResult<()> + Send + Sync>;
pub type MiddlewareFactory = Arc<dyn Fn() -> BackendResult<Middleware> + Send + Sync>;

/// Per-UA parser object produced by a factory export (`getParser(ua)`,
/// `new UAParser(ua)`), read through its result accessor.
pub trait ParserHandle {
    fn result(&self) -> BackendResult<Value>;
}

/// Long-lived parser produced by a class export and shared across calls.
pub trait ParserInstance: Send + Sync {
    fn parse(&self, ua: &str) -> BackendResult<Value>;
}

#[derive(Clone)]
pub enum Export {
    Function(ParseFn),
    Factory(FactoryFn),
    Class(ClassFn),
    Middleware(MiddlewareFactory),
    Module(BackendModule),
}

impl Export {
    pub fn function(f: impl Fn(&str) -> BackendResult<Value> + Send + Sync + 'static) -> Self {
        Self::Function(Arc::new(f))
    }

    pub fn factory(
        f: impl Fn(&str) -> BackendResult<Box<dyn ParserHandle>> + Send + Sync + 'static,
    ) -> Self {
        Self::Factory(Arc::new(f))
    }

    pub fn class(
        f: impl Fn() -> BackendResult<Arc<dyn ParserInstance>> + Send + Sync + 'static,
    ) -> Self {
        Self::Class(Arc::new(f))
    }

    pub fn middleware(f: impl Fn() -> BackendResult<Middleware> + Send + Sync + 'static) -> Self {
        Self::Middleware(Arc::new(f))
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Function(_) => "function",
            Self::Factory(_) => "factory",
            Self::Class(_) => "class",
            Self::Middleware(_) => "middleware",
            Self::Module(_) => "module",
        }
    }
}

impl std::fmt::Debug for Export {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module(module) => f.debug_tuple("Module").field(module).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Export table of one backend.
#[derive(Clone, Default, Debug)]
pub struct BackendModule {
    callable: Option<Box<Export>>,
    exports: IndexMap<String, Export>,
}

impl BackendModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the module itself callable (e.g. `bowser(ua)`).
    pub fn callable(mut self, export: Export) -> Self {
        self.callable = Some(Box::new(export));
        self
    }

    pub fn export(mut self, name: impl Into<String>, export: Export) -> Self {
        self.exports.insert(name.into(), export);
        self
    }

    /// Walk an export path. The empty path is the module itself; nested
    /// modules are entered segment by segment.
    pub fn lookup(&self, path: &[&str]) -> Option<&Export> {
        match path {
            [] => self.callable.as_deref(),
            [name, rest @ ..] => match (self.exports.get(*name)?, rest) {
                (export, []) => Some(export),
                (Export::Module(inner), rest) => inner.lookup(rest),
                _ => None,
            },
        }
    }
}

impl From<BackendModule> for Export {
    fn from(module: BackendModule) -> Self {
        Self::Module(module)
    }
}

/// Mutable stand-in for an HTTP request, handed to middleware-style
/// backends. Only the `user-agent` header is populated; middleware attaches
/// its result as a field.
#[derive(Debug, Clone, Default)]
pub struct SyntheticRequest {
    headers: IndexMap<String, String>,
    fields: Map<String, Value>,
}

impl SyntheticRequest {
    pub fn for_user_agent(ua: &str) -> Self {
        let mut headers = IndexMap::new();
        headers.insert("user-agent".to_string(), ua.to_string());
        Self {
            headers,
            fields: Map::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn field(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub(crate) fn take(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }
}

/// Name → module table, the equivalent of module resolution.
#[derive(Clone, Default, Debug)]
pub struct ModuleRegistry {
    modules: IndexMap<String, BackendModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, module: BackendModule) -> &mut Self {
        self.modules.insert(name.into(), module);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Locate a module. A missing module is a setup error.
    pub fn require(&self, name: &str) -> Result<&BackendModule> {
        self.modules
            .get(name)
            .ok_or_else(|| Error::BackendMissing(name.to_string()))
    }
}
