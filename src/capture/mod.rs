//! Render interception used by live-dispatch probes.
//!
//! A probe needs the object a view bound into its render context, without
//! touching the view. The shared [`TemplateEngine`] is wrapped once with
//! [`Intercept`]; each probe then arms a per-thread slot with the context key
//! it expects before dispatching, and reads the slot back afterwards.
//!
//! Per thread, while armed:
//! - the first render call binding the key stores the bound value
//! - every later render call is suppressed (returns an empty string), so a
//!   nested or follow-up template cannot overwrite the captured value
//!
//! Probes run on their own thread, which keeps concurrent probes isolated and
//! leaves the caller's slot untouched.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::debug;
use crate::site::{Context, Dispatcher, Renderer, Response, TemplateEngine, Value};

// =============================================================================
// Per-thread slot
// =============================================================================

struct Slot {
    armed: Option<String>,
    captured: Option<Value>,
}

impl Slot {
    const fn idle() -> Self {
        Self {
            armed: None,
            captured: None,
        }
    }
}

thread_local! {
    static SLOT: RefCell<Slot> = const { RefCell::new(Slot::idle()) };
}

/// What the interception tells the wrapped renderer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Render,
    Suppress,
}

fn observe(context: &Context) -> Flow {
    SLOT.with_borrow_mut(|slot| {
        if slot.captured.is_some() {
            return Flow::Suppress;
        }
        if let Some(key) = &slot.armed
            && let Some(value) = context.get(key)
        {
            slot.captured = Some(value.clone());
        }
        Flow::Render
    })
}

/// Arms the current thread's slot; clears it again on drop.
///
/// Not `Send`: arming and reading back must happen on the same thread.
pub struct Armed {
    _thread_bound: PhantomData<*const ()>,
}

impl Armed {
    /// Arm for `key`. `None` arms nothing but still resets stale state.
    pub fn arm(key: Option<&str>) -> Self {
        SLOT.with_borrow_mut(|slot| {
            slot.armed = key.map(str::to_owned);
            slot.captured = None;
        });
        Self {
            _thread_bound: PhantomData,
        }
    }

    /// Take whatever was captured since arming.
    pub fn take(self) -> Option<Value> {
        SLOT.with_borrow_mut(|slot| slot.captured.take())
    }
}

impl Drop for Armed {
    fn drop(&mut self) {
        SLOT.with_borrow_mut(|slot| *slot = Slot::idle());
    }
}

// =============================================================================
// Renderer decorator
// =============================================================================

/// Wraps the installed renderer with the capture check.
pub struct Intercept {
    inner: Arc<Box<dyn Renderer>>,
}

impl Renderer for Intercept {
    fn render(&self, template: &str, context: &Context) -> String {
        match observe(context) {
            Flow::Render => self.inner.render(template, context),
            Flow::Suppress => String::new(),
        }
    }

    fn intercepts(&self) -> bool {
        true
    }
}

static INSTALL_LOCK: Mutex<()> = Mutex::new(());

/// Wrap `engine` with [`Intercept`] unless it already is.
///
/// Returns `true` if this call installed the interception.
pub fn install(engine: &TemplateEngine) -> bool {
    let _guard = INSTALL_LOCK.lock();
    if engine.is_intercepted() {
        return false;
    }
    engine.wrap(|inner| Box::new(Intercept { inner }));
    debug!("probe"; "render interception installed");
    true
}

// =============================================================================
// Probe dispatch
// =============================================================================

/// Outcome of one probe dispatch.
#[derive(Debug)]
pub enum ProbeResult {
    /// `200 OK`, with the captured binding if one was requested and found.
    Done(Option<Value>),
    /// A redirect with its raw `Location`.
    Redirect(String),
    /// Any other status, a redirect without target, or a panicking view.
    Failed(u16),
}

/// Dispatch `path` on a dedicated thread with the slot armed for `key`.
///
/// Blocks until the request completes.
pub fn probe(
    dispatcher: &dyn Dispatcher,
    path: &str,
    query: Option<&str>,
    key: Option<&str>,
) -> ProbeResult {
    let outcome = std::thread::scope(|scope| {
        scope
            .spawn(|| {
                let armed = Armed::arm(key);
                let response = dispatcher.dispatch(path, query);
                (response, armed.take())
            })
            .join()
    });

    match outcome {
        Ok((response, captured)) => classify(response, captured),
        Err(_) => {
            debug!("probe"; "{} panicked", path);
            ProbeResult::Failed(500)
        }
    }
}

fn classify(response: Response, captured: Option<Value>) -> ProbeResult {
    match response.status {
        200 => ProbeResult::Done(captured),
        _ if response.is_redirect() => match response.location() {
            Some(location) if !location.is_empty() => ProbeResult::Redirect(location.to_string()),
            _ => ProbeResult::Failed(response.status),
        },
        status => ProbeResult::Failed(status),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use super::*;

    /// Concatenates the bound values in a fixed key order.
    struct Concat;

    impl Renderer for Concat {
        fn render(&self, _template: &str, context: &Context) -> String {
            let mut out = String::new();
            for key in ["page", "item", "data"] {
                if let Some(Value::Text(text)) = context.get(key) {
                    out.push_str(text);
                }
            }
            out
        }
    }

    fn context(pairs: &[(&str, &str)]) -> Context {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), Value::from(*value)))
            .collect()
    }

    fn text(value: Option<Value>) -> Option<String> {
        match value {
            Some(Value::Text(text)) => Some(text),
            _ => None,
        }
    }

    fn engine() -> TemplateEngine {
        let engine = TemplateEngine::new(Concat);
        install(&engine);
        engine
    }

    #[test]
    fn test_install_once() {
        let engine = TemplateEngine::new(Concat);
        assert!(!engine.is_intercepted());
        assert!(install(&engine));
        assert!(!install(&engine));
        assert!(engine.is_intercepted());
    }

    #[test]
    fn test_unarmed_renders_normally() {
        let engine = engine();
        let armed = Armed::arm(None);
        let ctx = context(&[("page", "1"), ("item", "2"), ("data", "3")]);
        assert_eq!(engine.render("t", &ctx), "123");
        assert_eq!(engine.render("t", &ctx), "123");
        assert!(armed.take().is_none());
    }

    #[test]
    fn test_first_binding_wins() {
        let engine = engine();
        let armed = Armed::arm(Some("page"));
        assert_eq!(engine.render("t", &context(&[("item", "1"), ("data", "2")])), "12");
        assert_eq!(
            engine.render("t", &context(&[("page", "3"), ("item", "4"), ("data", "5")])),
            "345"
        );
        // Suppressed once captured.
        assert_eq!(
            engine.render("t", &context(&[("page", "6"), ("item", "7"), ("data", "8")])),
            ""
        );
        assert_eq!(text(armed.take()), Some("3".to_string()));
    }

    #[test]
    fn test_drop_clears_slot() {
        let engine = engine();
        {
            let _armed = Armed::arm(Some("page"));
            engine.render("t", &context(&[("page", "1")]));
        }
        // A stale capture would suppress this render.
        assert_eq!(engine.render("t", &context(&[("page", "2")])), "2");
        let armed = Armed::arm(Some("page"));
        assert!(armed.take().is_none());
    }

    #[test]
    fn test_concurrent_threads_are_isolated() {
        let engine = engine();
        let barrier = Barrier::new(4);
        let full = context(&[("page", "1"), ("item", "2"), ("data", "3")]);

        let results: Vec<Option<String>> = std::thread::scope(|scope| {
            let run = |key: Option<&'static str>| {
                let engine = &engine;
                let barrier = &barrier;
                let full = &full;
                scope.spawn(move || {
                    let armed = Armed::arm(key);
                    barrier.wait();
                    engine.render("t", full);
                    barrier.wait();
                    engine.render("t", full);
                    text(armed.take())
                })
            };
            let handles = [run(None), run(Some("page")), run(Some("item")), run(Some("data"))];
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(
            results,
            vec![
                None,
                Some("1".to_string()),
                Some("2".to_string()),
                Some("3".to_string())
            ]
        );
    }

    struct Fixed(Response);

    impl Dispatcher for Fixed {
        fn dispatch(&self, _path: &str, _query: Option<&str>) -> Response {
            self.0.clone()
        }
    }

    struct Panics;

    impl Dispatcher for Panics {
        fn dispatch(&self, _path: &str, _query: Option<&str>) -> Response {
            panic!("view blew up")
        }
    }

    #[test]
    fn test_probe_classification() {
        assert!(matches!(
            probe(&Fixed(Response::ok("Done")), "/response", None, None),
            ProbeResult::Done(None)
        ));
        assert!(matches!(
            probe(&Fixed(Response::redirect("/response", false)), "/r", None, None),
            ProbeResult::Redirect(target) if target == "/response"
        ));
        assert!(matches!(
            probe(&Fixed(Response::not_found()), "/x", None, None),
            ProbeResult::Failed(404)
        ));
        assert!(matches!(
            probe(&Panics, "/http500", None, None),
            ProbeResult::Failed(500)
        ));
    }

    #[test]
    fn test_probe_does_not_touch_caller_slot() {
        let engine = engine();
        let armed = Armed::arm(Some("page"));
        let _ = probe(&Fixed(Response::ok("")), "/", None, Some("item"));
        engine.render("t", &context(&[("page", "9")]));
        assert_eq!(text(armed.take()), Some("9".to_string()));
    }
}
