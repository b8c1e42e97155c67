//! Process-wide error hook
//!
//! A panic hook chained in front of whatever hook was installed before.
//! When a panic happens while bundled modules are executing, it logs the
//! stack of those modules, then always delegates to the previous hook.

use modpack_core::LogicalKey;
use once_cell::sync::OnceCell;
use std::cell::RefCell;
use std::panic;
use tracing::error;

static INSTALLED: OnceCell<()> = OnceCell::new();

thread_local! {
    static EXECUTING: RefCell<Vec<LogicalKey>> = const { RefCell::new(Vec::new()) };
}

/// Install the hook; returns false if it was already installed
pub fn install() -> bool {
    let mut fresh = false;
    INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let stack = executing();
            if !stack.is_empty() {
                let modules = stack
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                error!(target: "modpack::resolve", %modules, "Uncaught error in bundled module: {}", info);
            }
            previous(info);
        }));
        fresh = true;
    });
    fresh
}

pub fn is_installed() -> bool {
    INSTALLED.get().is_some()
}

/// Bundled modules executing on this thread, outermost first
pub fn executing() -> Vec<LogicalKey> {
    EXECUTING.with(|stack| stack.borrow().clone())
}

/// Marks a module as executing until dropped
pub struct ExecutionGuard(());

pub fn enter(name: &LogicalKey) -> ExecutionGuard {
    EXECUTING.with(|stack| stack.borrow_mut().push(name.clone()));
    ExecutionGuard(())
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        EXECUTING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_stack() {
        let outer = LogicalKey::parse("app").unwrap();
        let inner = LogicalKey::parse("app.greet").unwrap();

        assert!(executing().is_empty());
        {
            let _a = enter(&outer);
            let _b = enter(&inner);
            assert_eq!(executing(), [outer.clone(), inner.clone()]);
        }
        assert!(executing().is_empty());
    }

    #[test]
    fn test_install_once() {
        install();
        assert!(is_installed());
        assert!(!install());
    }

    #[test]
    fn test_hook_delegates() {
        install();
        let key = LogicalKey::parse("app").unwrap();
        let result = std::panic::catch_unwind(|| {
            let _guard = enter(&key);
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(executing().is_empty());
    }
}
