//! `console.log` bridge.

use crate::value::coerce_string;
use rquickjs::prelude::Rest;
use rquickjs::{Ctx, Function, Object, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;

type ConsoleFn = dyn Fn(&str);

/// The single host callback receiving logged messages for one context.
///
/// With no callback set, messages go to the `jsbridge::console` log target.
#[derive(Clone, Default)]
pub(crate) struct ConsoleSink {
    callback: Rc<RefCell<Option<Rc<ConsoleFn>>>>,
}

impl ConsoleSink {
    /// Replace the current callback
    pub fn set(&self, callback: impl Fn(&str) + 'static) {
        *self.callback.borrow_mut() = Some(Rc::new(callback));
    }

    /// Fall back to the log target
    pub fn clear(&self) {
        let previous = self.callback.borrow_mut().take();
        drop(previous);
    }

    #[cfg(test)]
    pub fn is_custom(&self) -> bool {
        self.callback.borrow().is_some()
    }

    fn emit(&self, message: &str) {
        let callback = self.callback.borrow().clone();
        match callback {
            Some(callback) => callback(message),
            None => info!(target: "jsbridge::console", "{}", message),
        }
    }

    /// Install `console.log`, creating the `console` object if the global
    /// is missing or no longer an object
    pub fn install<'js>(&self, ctx: &Ctx<'js>) -> rquickjs::Result<()> {
        let globals = ctx.globals();
        let console = match globals.get::<_, Value>("console")?.into_object() {
            Some(console) => console,
            None => {
                let console = Object::new(ctx.clone())?;
                globals.set("console", console.clone())?;
                console
            }
        };

        let sink = self.clone();
        let log = Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, args: Rest<Value<'js>>| {
                if args.0.is_empty() {
                    return;
                }
                let message = args
                    .0
                    .iter()
                    .map(|arg| coerce_string(&ctx, arg).unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(" ");
                sink.emit(&message);
            },
        )?
        .with_name("log")?;

        console.set("log", log)
    }
}
