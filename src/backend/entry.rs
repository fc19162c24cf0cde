use super::{
    BackendFailure, BackendModule, BackendResult, Export, FactoryFn, Middleware, ParseFn,
    SyntheticRequest,
};
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// How an adapter expects to find a callable at a given export path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// `f(ua)` returning the result.
    Call,
    /// `f(ua)` returning a parser whose accessor yields the result.
    Construct,
    /// `new C()` once, then `instance.parse(ua)` per call.
    Instance,
    /// Middleware factory; the result is read back from the listed request
    /// fields, first present wins.
    Middleware { reads: &'static [&'static str] },
}

/// One entry in an adapter's fixed-priority probe list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub path: &'static [&'static str],
    pub kind: ProbeKind,
}

impl Probe {
    pub const fn call(path: &'static [&'static str]) -> Self {
        Self {
            path,
            kind: ProbeKind::Call,
        }
    }

    pub const fn construct(path: &'static [&'static str]) -> Self {
        Self {
            path,
            kind: ProbeKind::Construct,
        }
    }

    pub const fn instance(path: &'static [&'static str]) -> Self {
        Self {
            path,
            kind: ProbeKind::Instance,
        }
    }

    pub const fn middleware(
        path: &'static [&'static str],
        reads: &'static [&'static str],
    ) -> Self {
        Self {
            path,
            kind: ProbeKind::Middleware { reads },
        }
    }
}

/// The shape a resolved entry point was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPointShape {
    DirectCall,
    ConstructorWithAccessor,
    DefaultExportIndirection,
    MiddlewareStyle,
}

/// A resolved, invocable entry point.
#[derive(Clone)]
pub enum EntryPoint {
    DirectCall(ParseFn),
    ConstructorWithAccessor(FactoryFn),
    DefaultExportIndirection(Box<EntryPoint>),
    MiddlewareStyle {
        middleware: Middleware,
        reads: &'static [&'static str],
    },
}

impl std::fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DefaultExportIndirection(inner) => {
                f.debug_tuple("DefaultExportIndirection").field(inner).finish()
            }
            other => write!(f, "{:?}", other.shape()),
        }
    }
}

impl EntryPoint {
    pub fn shape(&self) -> EntryPointShape {
        match self {
            Self::DirectCall(_) => EntryPointShape::DirectCall,
            Self::ConstructorWithAccessor(_) => EntryPointShape::ConstructorWithAccessor,
            Self::DefaultExportIndirection(_) => EntryPointShape::DefaultExportIndirection,
            Self::MiddlewareStyle { .. } => EntryPointShape::MiddlewareStyle,
        }
    }

    /// Call the backend. Panics are caught, and anything other than an
    /// object counts as no result.
    pub fn invoke(&self, ua: &str) -> BackendResult<Value> {
        let value = catch_unwind(AssertUnwindSafe(|| self.invoke_inner(ua)))
            .map_err(|payload| BackendFailure::Panicked(panic_message(payload.as_ref())))??;
        if value.is_object() {
            Ok(value)
        } else {
            Err(BackendFailure::NoResult)
        }
    }

    fn invoke_inner(&self, ua: &str) -> BackendResult<Value> {
        match self {
            Self::DirectCall(call) => call(ua),
            Self::ConstructorWithAccessor(construct) => construct(ua)?.result(),
            Self::DefaultExportIndirection(inner) => inner.invoke_inner(ua),
            Self::MiddlewareStyle { middleware, reads } => {
                let mut req = SyntheticRequest::for_user_agent(ua);
                middleware(&mut req)?;
                reads
                    .iter()
                    .filter_map(|field| req.take(field))
                    .find(|v| !v.is_null())
                    .ok_or(BackendFailure::NoResult)
            }
        }
    }
}

/// Resolve every probe that matches the module, keeping probe order.
///
/// Class exports are instantiated here, once; middleware factories are
/// invoked here, once. A probe whose construction fails is skipped.
pub fn resolve(backend: &str, module: &BackendModule, probes: &[Probe]) -> Vec<EntryPoint> {
    probes
        .iter()
        .filter_map(|probe| {
            let export = module.lookup(probe.path)?;
            let entry = match resolve_export(export, probe.kind) {
                Ok(entry) => entry,
                Err(Some(failure)) => {
                    tracing::debug!(backend, path = ?probe.path, %failure, "probe construction failed");
                    return None;
                }
                Err(None) => return None,
            };
            Some(if probe.path.first() == Some(&"default") {
                EntryPoint::DefaultExportIndirection(Box::new(entry))
            } else {
                entry
            })
        })
        .collect()
}

fn resolve_export(export: &Export, kind: ProbeKind) -> Result<EntryPoint, Option<BackendFailure>> {
    // A namespace that is itself callable stands in for its callable.
    let export = match export {
        Export::Module(module) => module.lookup(&[]).ok_or(None)?,
        other => other,
    };

    match (kind, export) {
        (ProbeKind::Call, Export::Function(call)) => Ok(EntryPoint::DirectCall(call.clone())),
        (ProbeKind::Construct, Export::Factory(construct)) => {
            Ok(EntryPoint::ConstructorWithAccessor(construct.clone()))
        }
        (ProbeKind::Instance, Export::Class(class)) => {
            let instance = class().map_err(Some)?;
            Ok(EntryPoint::DirectCall(Arc::new(move |ua: &str| instance.parse(ua))))
        }
        (ProbeKind::Middleware { reads }, Export::Middleware(factory)) => Ok(
            EntryPoint::MiddlewareStyle {
                middleware: factory().map_err(Some)?,
                reads,
            },
        ),
        _ => Err(None),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ParserHandle, ParserInstance};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Handle(String);

    impl ParserHandle for Handle {
        fn result(&self) -> BackendResult<Value> {
            Ok(json!({ "seen": self.0 }))
        }
    }

    struct Shared;

    impl ParserInstance for Shared {
        fn parse(&self, ua: &str) -> BackendResult<Value> {
            Ok(json!({ "instance": ua }))
        }
    }

    #[test]
    fn probes_resolve_in_priority_order() {
        let module = BackendModule::new()
            .export(
                "getParser",
                Export::factory(|ua| Ok(Box::new(Handle(ua.to_string())) as Box<dyn ParserHandle>)),
            )
            .export("parse", Export::function(|_| Ok(json!({ "direct": true }))));
        let probes = [Probe::call(&["parse"]), Probe::construct(&["getParser"])];

        let entries = resolve("test", &module, &probes);
        let shapes: Vec<_> = entries.iter().map(EntryPoint::shape).collect();
        assert_eq!(
            shapes,
            vec![EntryPointShape::DirectCall, EntryPointShape::ConstructorWithAccessor]
        );
        assert_eq!(entries[1].invoke("x").unwrap(), json!({ "seen": "x" }));
    }

    #[test]
    fn default_export_is_wrapped() {
        let module = BackendModule::new().export(
            "default",
            BackendModule::new()
                .callable(Export::function(|_| Ok(json!({ "via": "default" }))))
                .into(),
        );
        let entries = resolve("test", &module, &[Probe::call(&["default"])]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].shape(), EntryPointShape::DefaultExportIndirection);
        assert_eq!(entries[0].invoke("").unwrap()["via"], "default");
    }

    #[test]
    fn class_is_instantiated_once() {
        static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);
        let module = BackendModule::new().export(
            "DeviceDetector",
            Export::class(|| {
                CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Shared) as Arc<dyn ParserInstance>)
            }),
        );
        let entries = resolve("test", &module, &[Probe::instance(&["DeviceDetector"])]);
        entries[0].invoke("a").unwrap();
        entries[0].invoke("b").unwrap();
        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn middleware_result_is_read_back() {
        let module = BackendModule::new().export(
            "express",
            Export::middleware(|| {
                Ok(Arc::new(|req: &mut SyntheticRequest| -> BackendResult<()> {
                    let ua = req.header("user-agent").unwrap_or_default().to_string();
                    req.set("useragent", json!({ "source": ua }));
                    Ok(())
                }) as Middleware)
            }),
        );
        let probe = Probe::middleware(&["express"], &["useragent", "ua"]);
        let entries = resolve("test", &module, &[probe]);
        assert_eq!(entries[0].invoke("Foo/1.0").unwrap()["source"], "Foo/1.0");
    }

    #[test]
    fn panics_and_non_objects_are_failures() {
        let panicking = EntryPoint::DirectCall(Arc::new(|_: &str| -> BackendResult<Value> {
            panic!("boom")
        }));
        assert_eq!(
            panicking.invoke("x").unwrap_err(),
            BackendFailure::Panicked("boom".to_string())
        );

        let null = EntryPoint::DirectCall(Arc::new(|_: &str| -> BackendResult<Value> {
            Ok(Value::Null)
        }));
        assert_eq!(null.invoke("x").unwrap_err(), BackendFailure::NoResult);
    }

    #[test]
    fn mismatched_kinds_are_skipped() {
        let module = BackendModule::new().export("parse", Export::function(|_| Ok(json!({}))));
        assert!(resolve("test", &module, &[Probe::construct(&["parse"])]).is_empty());
    }
}
