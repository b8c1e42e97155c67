//! Embedded resolver: answers imports from a bundle

use crate::error::ResolveError;
use crate::error_hook;
use crate::host::Host;
use crate::module::{Module, ModuleRef, ModuleSpec, ModuleState};
use modpack_config::HookPolicy;
use modpack_core::{Bundle, LogicalKey};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Once, PoisonError};
use std::thread::{self, ThreadId};
use tracing::{debug, info};

type Result<T, H> = std::result::Result<T, ResolveError<<H as Host>::Error>>;

enum Slot<N> {
    Loading { owner: ThreadId, module: ModuleRef<N> },
    Loaded(ModuleRef<N>),
}

impl<N> Slot<N> {
    fn module(&self) -> &ModuleRef<N> {
        match self {
            Slot::Loading { module, .. } | Slot::Loaded(module) => module,
        }
    }
}

struct Cache<N> {
    slots: HashMap<LogicalKey, Slot<N>>,
    /// Keys the bundle lacks; loaded externals also have a slot
    not_found: HashSet<LogicalKey>,
    /// Unqualified name -> default-package key it was served from
    aliases: HashMap<LogicalKey, LogicalKey>,
    /// Thread -> key whose `Loading` slot it is blocked on
    waiting: HashMap<ThreadId, LogicalKey>,
}

impl<N> Default for Cache<N> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            not_found: HashSet::new(),
            aliases: HashMap::new(),
            waiting: HashMap::new(),
        }
    }
}

impl<N> Cache<N> {
    /// Whether `me` waiting on a slot owned by `owner` would close a
    /// cycle of threads each waiting on the next one's slot
    fn closes_cycle(&self, mut owner: ThreadId, me: ThreadId) -> bool {
        for _ in 0..=self.waiting.len() {
            if owner == me {
                return true;
            }
            match self.waiting.get(&owner).and_then(|key| self.slots.get(key)) {
                Some(Slot::Loading { owner: next, .. }) => owner = *next,
                _ => return false,
            }
        }
        false
    }
}

/// Resolves imports against one bundle
///
/// Each key executes at most once, whether it comes from the bundle or
/// from the host's own lookup. An import of a key that is still executing
/// on the same thread returns the partial module; other threads wait for
/// it to finish, unless waiting would close a cycle of threads blocked on
/// each other, in which case they get the partial module too. Bundle
/// parents always execute before their children.
///
/// ```
/// use modpack_core::Packer;
/// use modpack_runtime::{Resolver, ScriptHost, Value};
/// use modpack_vfs::MemoryFileSystem;
///
/// let fs = MemoryFileSystem::with_files([
///     ("app/__init__.py", ""),
///     ("app/greet.py", "def hi(): return \"hi\""),
/// ]);
/// let bundle = Packer::new(&fs).bundle(&["app"]).unwrap();
///
/// let resolver = Resolver::new(bundle, ScriptHost::new());
/// let greet = resolver.import("app.greet").unwrap();
/// assert_eq!(resolver.host().call(&greet, "hi").unwrap(), Value::Str("hi".into()));
/// ```
pub struct Resolver<H: Host> {
    bundle: Bundle,
    host: H,
    cache: Mutex<Cache<H::Namespace>>,
    ready: Condvar,
    activated: Once,
}

impl<H: Host> Resolver<H> {
    pub fn new(bundle: Bundle, host: H) -> Self {
        Self {
            bundle,
            host,
            cache: Mutex::new(Cache::default()),
            ready: Condvar::new(),
            activated: Once::new(),
        }
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Import a dotted module name
    pub fn import(&self, name: &str) -> Result<ModuleRef<H::Namespace>, H> {
        let key = LogicalKey::parse(name)?;
        self.import_key(&key)
    }

    pub fn import_key(&self, key: &LogicalKey) -> Result<ModuleRef<H::Namespace>, H> {
        self.activate();

        if let Some(target) = self.alias_target(key) {
            let module = self.load_hierarchy(&target)?;
            self.lock().aliases.insert(key.clone(), target);
            return Ok(module);
        }

        self.load_hierarchy(key)
    }

    /// Import `tail` relative to `anchor`'s package, `level` dots up
    pub fn import_relative(
        &self,
        anchor: &Module<H::Namespace>,
        level: usize,
        tail: Option<&str>,
    ) -> Result<ModuleRef<H::Namespace>, H> {
        let package = anchor.package().ok_or_else(|| ResolveError::NoParentPackage {
            anchor: anchor.name().clone(),
        })?;
        let tail = tail.map(LogicalKey::parse).transpose()?;
        let target = package
            .resolve_relative(level, tail.as_ref())
            .ok_or_else(|| ResolveError::BeyondTopLevel {
                anchor: anchor.name().clone(),
            })?;
        self.import_key(&target)
    }

    /// Resolution state of a dotted name
    pub fn state(&self, name: &str) -> ModuleState {
        let Ok(key) = LogicalKey::parse(name) else {
            return ModuleState::Unresolved;
        };
        let cache = self.lock();
        let key = cache.aliases.get(&key).unwrap_or(&key);
        match cache.slots.get(key) {
            Some(Slot::Loading { .. }) => ModuleState::Loading,
            Some(Slot::Loaded(_)) => ModuleState::Loaded,
            None if cache.not_found.contains(key) => ModuleState::NotFound,
            None if self.bundle.registry.contains(key) => ModuleState::Registered,
            None => ModuleState::Unresolved,
        }
    }

    /// Default-package key an unqualified name was served from
    pub fn alias_of(&self, name: &str) -> Option<LogicalKey> {
        let key = LogicalKey::parse(name).ok()?;
        self.lock().aliases.get(&key).cloned()
    }

    /// Keys of every fully loaded bundle module
    pub fn loaded(&self) -> Vec<LogicalKey> {
        let mut keys: Vec<LogicalKey> = self
            .lock()
            .slots
            .iter()
            .filter(|(key, slot)| matches!(slot, Slot::Loaded(_)) && self.bundle.registry.contains(key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> MutexGuard<'_, Cache<H::Namespace>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn activate(&self) {
        self.activated.call_once(|| {
            let install = match self.bundle.hook {
                HookPolicy::Force => true,
                HookPolicy::Disable => false,
                HookPolicy::Auto => !self.host.has_error_hook(),
            };
            if install {
                error_hook::install();
            }
            info!(
                target: "modpack::resolve",
                modules = self.bundle.registry.len(),
                error_hook = install,
                "Resolver activated"
            );
        });
    }

    fn alias_target(&self, key: &LogicalKey) -> Option<LogicalKey> {
        if let Some(target) = self.lock().aliases.get(key) {
            return Some(target.clone());
        }
        let default = self.bundle.default_package.as_ref()?;
        if key.starts_with(default) {
            return None;
        }
        let candidate = default.join(key);
        self.bundle.registry.contains(&candidate).then_some(candidate)
    }

    fn load_hierarchy(&self, key: &LogicalKey) -> Result<ModuleRef<H::Namespace>, H> {
        for ancestor in key.ancestors() {
            self.load(&ancestor)?;
        }
        self.load(key)
    }

    fn load(&self, key: &LogicalKey) -> Result<ModuleRef<H::Namespace>, H> {
        let me = thread::current().id();
        let mut cache = self.lock();
        let mut external = None;

        loop {
            match cache.slots.get(key) {
                Some(Slot::Loaded(module)) => return Ok(module.clone()),
                Some(Slot::Loading { owner, module }) => {
                    if cache.closes_cycle(*owner, me) {
                        if *owner != me {
                            debug!(target: "modpack::resolve", module = %key, "Import cycle across threads, using partial module");
                        }
                        return Ok(module.clone());
                    }
                    cache.waiting.insert(me, key.clone());
                    cache = self.ready.wait(cache).unwrap_or_else(PoisonError::into_inner);
                    cache.waiting.remove(&me);
                    continue;
                }
                None => {}
            }

            if external.is_some() || self.bundle.registry.contains(key) {
                break;
            }

            // the lookup runs unlocked; the slot is re-checked afterwards
            cache.not_found.insert(key.clone());
            drop(cache);
            debug!(target: "modpack::resolve", module = %key, "Not in bundle, deferring to host");
            external = match self.host.find_external(key) {
                Ok(Some(found)) => Some(found),
                Ok(None) => return Err(ResolveError::NotFound(key.clone())),
                Err(err) => return Err(ResolveError::Host(err)),
            };
            cache = self.lock();
        }

        let bundled = external.is_none();
        let (spec, source) = match external {
            Some(found) => (
                ModuleSpec::new(key.clone(), found.kind, None),
                Cow::Owned(found.source),
            ),
            None => {
                let entry = self
                    .bundle
                    .registry
                    .get(key)
                    .ok_or_else(|| ResolveError::NotFound(key.clone()))?;
                let source_key = self
                    .bundle
                    .source_key(entry)
                    .map_err(|_| ResolveError::MissingSource {
                        name: key.clone(),
                        source_key: key.clone(),
                    })?;
                let source = self
                    .bundle
                    .sources
                    .get(&source_key)
                    .ok_or_else(|| ResolveError::MissingSource {
                        name: key.clone(),
                        source_key: source_key.clone(),
                    })?;
                (
                    ModuleSpec::new(key.clone(), entry.kind, Some(source_key)),
                    Cow::Borrowed(source),
                )
            }
        };

        let module = Arc::new(Module::new(spec.clone(), self.host.create_namespace(&spec)));
        cache.slots.insert(
            key.clone(),
            Slot::Loading {
                owner: me,
                module: module.clone(),
            },
        );
        drop(cache);

        debug!(target: "modpack::resolve", module = %key, package = spec.kind.is_package(), bundled, "Executing module");

        let mut pending = PendingLoad {
            resolver: self,
            key,
            done: false,
        };
        let result = if bundled {
            let _running = error_hook::enter(key);
            self.host.execute(self, &module, &source)
        } else {
            self.host.execute(self, &module, &source)
        };
        if let Err(source) = result {
            return Err(ResolveError::Execution {
                name: key.clone(),
                source,
            });
        }

        let parent = {
            let mut cache = self.lock();
            cache.slots.insert(key.clone(), Slot::Loaded(module.clone()));
            pending.done = true;
            key.parent()
                .and_then(|parent| cache.slots.get(&parent).map(|slot| slot.module().clone()))
        };
        self.ready.notify_all();

        if let Some(parent) = parent {
            self.host.bind_submodule(&parent, key.name(), &module);
        }
        Ok(module)
    }
}

/// Drops the loading slot unless the load completed, so failed or
/// panicking executions can be retried and never leave waiters stuck
struct PendingLoad<'r, H: Host> {
    resolver: &'r Resolver<H>,
    key: &'r LogicalKey,
    done: bool,
}

impl<H: Host> Drop for PendingLoad<'_, H> {
    fn drop(&mut self) {
        if !self.done {
            self.resolver.lock().slots.remove(self.key);
            self.resolver.ready.notify_all();
        }
    }
}
