//! Listener dispatch
//!
//! Listener bindings attach an executable (a unit action or an action flow)
//! to a named event. When the event's value becomes available the dispatcher
//! invokes every matching binding on its own thread: the emitter never
//! blocks, no result or failure propagates back, and concurrent in-flight
//! invocations of the same binding are allowed. Failures are logged and
//! otherwise dropped.

use std::sync::Mutex;
use std::thread::JoinHandle;

use crate::domain::ListenerTarget;

use super::action::ActionRunner;

/// A registered event binding
struct Binding {
    event: String,
    target: ListenerTarget,
}

/// Fire-and-forget dispatch of listener bindings
pub struct ListenerDispatcher {
    runner: ActionRunner,
    bindings: Vec<Binding>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ListenerDispatcher {
    /// Creates a dispatcher over the runner's registry bindings
    pub fn new(runner: ActionRunner) -> Self {
        let bindings = runner
            .registry()
            .listener_bindings()
            .into_iter()
            .map(|(event, target)| Binding { event, target })
            .collect();

        Self {
            runner,
            bindings,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of registered bindings
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Fires an event, invoking every matching binding asynchronously.
    ///
    /// Returns the number of invocations started.
    pub fn emit(&self, event: &str, value: Option<&str>) -> usize {
        let mut started = 0;

        for binding in self.bindings.iter().filter(|b| b.event == event) {
            let runner = self.runner.clone();
            let target = binding.target.clone();
            let event = event.to_string();
            let value = value.map(str::to_string);

            let handle = std::thread::spawn(move || {
                let result = match &target {
                    ListenerTarget::Action(target) => runner
                        .perform_target(target, value.as_deref())
                        .map(|_| ()),
                    ListenerTarget::Flow(flow) => {
                        runner.run_flow(flow, value.as_deref()).map(|_| ())
                    }
                };

                if let Err(err) = result {
                    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                    eprintln!("[{timestamp}] listener for event '{event}' failed: {err}");
                }
            });

            self.handles
                .lock()
                .expect("listener handle list poisoned")
                .push(handle);
            started += 1;
        }

        started
    }

    /// Joins every invocation started so far.
    ///
    /// Listener results stay unobservable; this only bounds their lifetime
    /// (tests, CLI shutdown).
    pub fn wait_idle(&self) {
        let handles: Vec<_> = self
            .handles
            .lock()
            .expect("listener handle list poisoned")
            .drain(..)
            .collect();

        for handle in handles {
            let _ = handle.join();
        }
    }
}
