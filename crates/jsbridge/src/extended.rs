//! Extended capabilities: `print`, `std` and `os` for scripts that need to
//! reach the host environment.

use crate::value::coerce_string;
use rquickjs::prelude::{Coerced, Rest};
use rquickjs::{Ctx, Exception, Function, IntoJs, Object, Value};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Install the bundle into the context's global object
pub(crate) fn install<'js>(ctx: &Ctx<'js>, started: Instant) -> rquickjs::Result<()> {
    let globals = ctx.globals();

    let print = Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, args: Rest<Value<'js>>| {
            let line = args
                .0
                .iter()
                .map(|arg| coerce_string(&ctx, arg).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" ");
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = writeln!(stdout, "{line}") {
                warn!("print failed: {}", err);
            }
        },
    )?
    .with_name("print")?;
    globals.set("print", print)?;

    globals.set("std", std_object(ctx)?)?;
    globals.set("os", os_object(ctx, started)?)?;

    debug!("Extended capabilities installed");
    Ok(())
}

fn std_object<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<Object<'js>> {
    let std = Object::new(ctx.clone())?;

    std.set(
        "getenv",
        Function::new(ctx.clone(), |name: Coerced<String>| std::env::var(name.0).ok())?
            .with_name("getenv")?,
    )?;

    std.set(
        "loadFile",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, path: Coerced<String>| -> rquickjs::Result<Value<'js>> {
                match std::fs::read_to_string(&path.0) {
                    Ok(contents) => contents.into_js(&ctx),
                    Err(err) => {
                        debug!("loadFile {} failed: {}", path.0, err);
                        Ok(Value::new_null(ctx))
                    }
                }
            },
        )?
        .with_name("loadFile")?,
    )?;

    Ok(std)
}

fn os_object<'js>(ctx: &Ctx<'js>, started: Instant) -> rquickjs::Result<Object<'js>> {
    let os = Object::new(ctx.clone())?;

    os.set("platform", platform())?;

    os.set(
        "getcwd",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>| -> rquickjs::Result<String> {
                std::env::current_dir()
                    .map(|dir| dir.display().to_string())
                    .map_err(|err| Exception::throw_internal(&ctx, &err.to_string()))
            },
        )?
        .with_name("getcwd")?,
    )?;

    os.set(
        "now",
        Function::new(ctx.clone(), move || started.elapsed().as_secs_f64() * 1000.0)?
            .with_name("now")?,
    )?;

    os.set(
        "sleep",
        Function::new(ctx.clone(), |ms: Coerced<f64>| {
            if ms.0.is_finite() && ms.0 > 0.0 {
                std::thread::sleep(Duration::from_secs_f64(ms.0 / 1000.0));
            }
        })?
        .with_name("sleep")?,
    )?;

    Ok(os)
}

/// Platform name in the engine's conventional spelling
fn platform() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquickjs::{Context, Runtime};

    fn with_extended<R>(f: impl FnOnce(Ctx<'_>) -> R) -> R {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        context.with(|ctx| {
            install(&ctx, Instant::now()).unwrap();
            f(ctx)
        })
    }

    #[test]
    fn test_platform_names() {
        let name = platform();
        assert!(!name.is_empty());
        assert_ne!(name, "macos");
        assert_ne!(name, "windows");
    }

    #[test]
    fn test_bundle_shape() {
        with_extended(|ctx| {
            let kinds: String = ctx
                .eval("[typeof print, typeof std.getenv, typeof std.loadFile, typeof os.platform, typeof os.now].join()")
                .unwrap();
            assert_eq!(kinds, "function,function,function,string,function");
        });
    }

    #[test]
    fn test_getenv_and_load_file() {
        with_extended(|ctx| {
            let missing: bool = ctx
                .eval("std.getenv('JSBRIDGE_SURELY_UNSET_VARIABLE') === undefined")
                .unwrap();
            assert!(missing);

            let path: bool = ctx.eval("typeof std.getenv('PATH') === 'string'").unwrap();
            assert!(path);

            let unreadable: bool = ctx
                .eval("std.loadFile('/nonexistent/jsbridge/file.js') === null")
                .unwrap();
            assert!(unreadable);
        });
    }

    #[test]
    fn test_now_is_monotonic() {
        with_extended(|ctx| {
            let ordered: bool = ctx
                .eval("var a = os.now(); os.sleep(2); var b = os.now(); b >= a && a >= 0")
                .unwrap();
            assert!(ordered);
        });
    }
}
