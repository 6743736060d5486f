//! Value bridge between host primitives and engine values.
//!
//! Coercions here follow the language's loose conversion rules and never
//! fail: when the engine throws while converting (a `toString` that throws,
//! a Symbol converted to string) the pending exception is discarded and a
//! zero value is returned instead.

use rquickjs::prelude::Coerced;
use rquickjs::{Ctx, FromJs, IntoJs, Type, Value};
use tracing::trace;

/// A host-side primitive that can be stored in a script global
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    String(String),
    Int(i32),
    Double(f64),
    Bool(bool),
}

impl HostValue {
    /// Read a primitive engine value; `None` for objects, functions,
    /// `undefined`, `null` and other non-primitive tags
    pub(crate) fn from_value(value: &Value<'_>) -> Option<Self> {
        match value.type_of() {
            Type::String => value
                .as_string()
                .and_then(|s| s.to_string().ok())
                .map(HostValue::String),
            Type::Int => value.as_int().map(HostValue::Int),
            Type::Float => value.as_float().map(HostValue::Double),
            Type::Bool => value.as_bool().map(HostValue::Bool),
            _ => None,
        }
    }

    /// Type name as reported by `typeof`
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::String(_) => "string",
            HostValue::Int(_) | HostValue::Double(_) => "number",
            HostValue::Bool(_) => "boolean",
        }
    }
}

impl<'js> IntoJs<'js> for HostValue {
    fn into_js(self, ctx: &Ctx<'js>) -> rquickjs::Result<Value<'js>> {
        match self {
            HostValue::String(s) => s.into_js(ctx),
            HostValue::Int(i) => Ok(Value::new_int(ctx.clone(), i)),
            HostValue::Double(d) => Ok(Value::new_float(ctx.clone(), d)),
            HostValue::Bool(b) => Ok(Value::new_bool(ctx.clone(), b)),
        }
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::String(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_owned())
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Double(value)
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl std::fmt::Display for HostValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostValue::String(s) => f.write_str(s),
            HostValue::Int(i) => write!(f, "{i}"),
            HostValue::Double(d) => write!(f, "{d}"),
            HostValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Host types a script value can be coerced into.
pub trait FromScript: Sized {
    /// Convert `value`, falling back to the type's zero value
    fn from_script<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Self;
}

impl FromScript for String {
    fn from_script<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Self {
        coerce_string(ctx, &value).unwrap_or_default()
    }
}

impl FromScript for i32 {
    fn from_script<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Self {
        coerce::<i32>(ctx, &value).unwrap_or_default()
    }
}

impl FromScript for f64 {
    fn from_script<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Self {
        coerce::<f64>(ctx, &value).unwrap_or_default()
    }
}

impl FromScript for bool {
    fn from_script<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Self {
        coerce::<bool>(ctx, &value).unwrap_or_default()
    }
}

/// ToString; `None` when the conversion threw
pub(crate) fn coerce_string<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> Option<String> {
    coerce::<String>(ctx, value)
}

fn coerce<'js, T>(ctx: &Ctx<'js>, value: &Value<'js>) -> Option<T>
where
    Coerced<T>: FromJs<'js>,
{
    match value.get::<Coerced<T>>() {
        Ok(Coerced(converted)) => Some(converted),
        Err(err) => {
            discard_pending(ctx, &err);
            trace!("Coercion to {} failed: {}", std::any::type_name::<T>(), err);
            None
        }
    }
}

/// Drop the exception a failed engine call left pending, if any
pub(crate) fn discard_pending(ctx: &Ctx<'_>, err: &rquickjs::Error) {
    if err.is_exception() {
        drop(ctx.catch());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquickjs::{Context, Runtime};

    fn with_ctx<R>(f: impl FnOnce(Ctx<'_>) -> R) -> R {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        context.with(f)
    }

    #[test]
    fn test_host_value_from_primitives() {
        assert_eq!(HostValue::from("a"), HostValue::String("a".to_string()));
        assert_eq!(HostValue::from(7), HostValue::Int(7));
        assert_eq!(HostValue::from(1.5), HostValue::Double(1.5));
        assert_eq!(HostValue::from(true), HostValue::Bool(true));
        assert_eq!(HostValue::from(1.5).type_name(), "number");
    }

    #[test]
    fn test_host_value_round_trip() {
        with_ctx(|ctx| {
            for host in [
                HostValue::from("text"),
                HostValue::from(-12),
                HostValue::from(0.25),
                HostValue::from(false),
            ] {
                let value = host.clone().into_js(&ctx).unwrap();
                assert_eq!(HostValue::from_value(&value), Some(host));
            }
        });
    }

    #[test]
    fn test_non_primitive_has_no_host_value() {
        with_ctx(|ctx| {
            let value: Value = ctx.eval("({a: 1})").unwrap();
            assert!(HostValue::from_value(&value).is_none());

            let value: Value = ctx.eval("undefined").unwrap();
            assert!(HostValue::from_value(&value).is_none());
        });
    }

    #[test]
    fn test_loose_coercion() {
        with_ctx(|ctx| {
            let value: Value = ctx.eval("'42'").unwrap();
            assert_eq!(i32::from_script(&ctx, value), 42);

            let value: Value = ctx.eval("4294967297").unwrap();
            assert_eq!(i32::from_script(&ctx, value), 1);

            let value: Value = ctx.eval("'abc'").unwrap();
            assert_eq!(i32::from_script(&ctx, value), 0);

            let value: Value = ctx.eval("''").unwrap();
            assert!(!bool::from_script(&ctx, value));

            let value: Value = ctx.eval("[1, 2]").unwrap();
            assert_eq!(String::from_script(&ctx, value), "1,2");
        });
    }

    #[test]
    fn test_throwing_coercion_defaults() {
        with_ctx(|ctx| {
            let value: Value = ctx
                .eval("({ toString() { throw new Error('no'); }, valueOf() { throw 1; } })")
                .unwrap();
            assert_eq!(String::from_script(&ctx, value.clone()), "");
            assert_eq!(i32::from_script(&ctx, value.clone()), 0);
            assert_eq!(f64::from_script(&ctx, value), 0.0);

            let value: Value = ctx.eval("Symbol('s')").unwrap();
            assert_eq!(String::from_script(&ctx, value), "");

            // Nothing left pending after the failed coercions
            let value: i32 = ctx.eval("1 + 1").unwrap();
            assert_eq!(value, 2);
        });
    }
}
