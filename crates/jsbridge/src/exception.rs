//! Exception translation.
//!
//! Every evaluating or calling path funnels its engine result through
//! [`check`], so a throw looks the same to the host whichever entry point
//! raised it.

use crate::error::Error;
use crate::value::coerce_string;
use rquickjs::{Ctx, Value};
use tracing::debug;

/// Message used when the thrown value cannot be stringified
pub(crate) const UNKNOWN_ERROR: &str = "Unknown error";

/// Turn an engine result into a host result, taking any pending exception.
pub(crate) fn check<'js, T>(
    ctx: &Ctx<'js>,
    result: rquickjs::Result<T>,
    origin: &str,
) -> Result<T, Error> {
    result.map_err(|err| translate(ctx, err, origin))
}

/// Convert an engine error into `Error::Script`.
pub(crate) fn translate(ctx: &Ctx<'_>, err: rquickjs::Error, origin: &str) -> Error {
    let (message, stack) = if err.is_exception() {
        let thrown = ctx.catch();
        let described = describe(ctx, &thrown);
        drop(thrown);
        described
    } else {
        (err.to_string(), None)
    };

    debug!("Script error in {}: {}", origin, message);

    Error::Script {
        origin: origin.to_owned(),
        message,
        stack,
    }
}

fn describe<'js>(ctx: &Ctx<'js>, thrown: &Value<'js>) -> (String, Option<String>) {
    let message = coerce_string(ctx, thrown).unwrap_or_else(|| UNKNOWN_ERROR.to_owned());

    let stack = thrown.as_object().and_then(|object| {
        match object.get::<_, Option<String>>("stack") {
            Ok(stack) => stack.filter(|s| !s.is_empty()),
            Err(err) => {
                crate::value::discard_pending(ctx, &err);
                None
            }
        }
    });

    (message, stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquickjs::{Context, Runtime};

    fn eval_error(source: &str) -> Error {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        context.with(|ctx| {
            let result = ctx.eval::<Value, _>(source);
            check(&ctx, result, "<test>").unwrap_err()
        })
    }

    #[test]
    fn test_reference_error() {
        match eval_error("undefined_variable") {
            Error::Script { origin, message, .. } => {
                assert_eq!(origin, "<test>");
                assert!(message.contains("ReferenceError"), "{message}");
                assert!(message.contains("undefined_variable"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_thrown_error_has_stack() {
        let err = eval_error("function f() { throw new Error('boom'); }\nf();");

        match err {
            Error::Script { message, stack, .. } => {
                assert_eq!(message, "Error: boom");
                assert!(stack.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_thrown_primitive() {
        let err = eval_error("throw 42");
        assert_eq!(err.script_message(), Some("42"));

        let err = eval_error("throw null");
        assert_eq!(err.script_message(), Some("null"));
    }

    #[test]
    fn test_unstringifiable_throw_uses_fallback() {
        let err = eval_error("throw { toString() { throw 'again'; } }");
        assert_eq!(err.script_message(), Some(UNKNOWN_ERROR));

        let err = eval_error("throw Symbol('s')");
        assert_eq!(err.script_message(), Some(UNKNOWN_ERROR));
    }
}
