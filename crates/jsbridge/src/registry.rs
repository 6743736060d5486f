//! Host function registry.
//!
//! Host closures live in a name-keyed table owned by the execution
//! context. Each callable installed into the script carries only its own
//! name and dispatches through the table at call time, so any number of
//! functions stay independently reachable and re-registering one name
//! never disturbs the others.

use crate::value::coerce_string;
use rquickjs::prelude::Rest;
use rquickjs::{Ctx, Exception, Function, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Variadic host closure: stringified arguments in, string out
pub(crate) type HostFn = dyn Fn(&[String]) -> anyhow::Result<String>;

/// Zero-argument host closure
pub(crate) type SimpleHostFn = dyn Fn() -> anyhow::Result<String>;

/// A registered host closure
pub(crate) enum HostFunction {
    Variadic(Box<HostFn>),
    Simple(Box<SimpleHostFn>),
}

impl HostFunction {
    fn invoke(&self, args: &[String]) -> anyhow::Result<String> {
        match self {
            HostFunction::Variadic(f) => f(args),
            HostFunction::Simple(f) => f(),
        }
    }
}

/// Name-keyed table of host closures shared with the installed trampolines
#[derive(Clone, Default)]
pub(crate) struct HostFunctionRegistry {
    entries: Rc<RefCell<HashMap<String, Rc<HostFunction>>>>,
}

impl HostFunctionRegistry {
    /// Insert or replace an entry; true if a previous entry was replaced
    pub fn insert(&self, name: &str, function: HostFunction) -> bool {
        self.entries
            .borrow_mut()
            .insert(name.to_owned(), Rc::new(function))
            .is_some()
    }

    pub fn remove(&self, name: &str) -> bool {
        self.entries.borrow_mut().remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Release every closure
    pub fn clear(&self) {
        // Take the table first so closures drop without the borrow held
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        drop(entries);
    }

    fn get(&self, name: &str) -> Option<Rc<HostFunction>> {
        self.entries.borrow().get(name).cloned()
    }

    /// Expose `name` as a global callable that dispatches through this table
    pub fn install<'js>(&self, ctx: &Ctx<'js>, name: &str) -> rquickjs::Result<()> {
        let function = self.trampoline(ctx, name)?;
        ctx.globals().set(name, function)
    }

    /// Build a callable bound to `name` without installing it anywhere
    fn trampoline<'js>(&self, ctx: &Ctx<'js>, name: &str) -> rquickjs::Result<Function<'js>> {
        let registry = self.clone();
        let key = name.to_owned();

        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, args: Rest<Value<'js>>| -> rquickjs::Result<String> {
                registry.dispatch(&ctx, &key, args.0)
            },
        )?
        .with_name(name)
    }

    fn dispatch<'js>(
        &self,
        ctx: &Ctx<'js>,
        name: &str,
        args: Vec<Value<'js>>,
    ) -> rquickjs::Result<String> {
        let Some(function) = self.get(name) else {
            return Err(Exception::throw_reference(
                ctx,
                &format!("host function '{name}' is not registered"),
            ));
        };

        let args: Vec<String> = match function.as_ref() {
            HostFunction::Variadic(_) => args
                .iter()
                .map(|arg| coerce_string(ctx, arg).unwrap_or_default())
                .collect(),
            HostFunction::Simple(_) => Vec::new(),
        };
        trace!("Calling host function {} with {} args", name, args.len());

        function
            .invoke(&args)
            .map_err(|err| Exception::throw_internal(ctx, &format!("{err:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquickjs::{Context, Runtime};

    fn variadic(f: impl Fn(&[String]) -> anyhow::Result<String> + 'static) -> HostFunction {
        HostFunction::Variadic(Box::new(f))
    }

    #[test]
    fn test_registry_table() {
        let registry = HostFunctionRegistry::default();

        assert!(!registry.insert("b", variadic(|_| Ok("b".into()))));
        assert!(!registry.insert("a", variadic(|_| Ok("a".into()))));
        assert!(registry.insert("a", variadic(|_| Ok("a2".into()))));

        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.len(), 2);
        assert!(registry.remove("a"));
        assert!(!registry.contains("a"));

        registry.clear();
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_dispatch_by_name() {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        let registry = HostFunctionRegistry::default();

        registry.insert("first", variadic(|_| Ok("one".into())));
        registry.insert("second", variadic(|args| Ok(args.join("+"))));

        context.with(|ctx| {
            registry.install(&ctx, "first").unwrap();
            registry.install(&ctx, "second").unwrap();

            let result: String = ctx.eval("first() + ':' + second(1, 'x', true)").unwrap();
            assert_eq!(result, "one:1+x+true");
        });
    }

    #[test]
    fn test_unregistered_trampoline_throws() {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        let registry = HostFunctionRegistry::default();

        registry.insert("gone", variadic(|_| Ok(String::new())));

        context.with(|ctx| {
            registry.install(&ctx, "gone").unwrap();
            registry.remove("gone");

            let result: String = ctx
                .eval("try { gone(); 'called' } catch (e) { e.name }")
                .unwrap();
            assert_eq!(result, "ReferenceError");
        });
    }
}
