//! Host-side parameters.
//!
//! A [`Param`] is a named, shared value with a range and change listeners. The host
//! owns its parameters; the binding engine only keeps weak handles and
//! [`Subscription`]s, so dropping a parameter on the host side simply makes its
//! binding go quiet.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamId(u64);

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

struct Shared<T> {
    id: ParamId,
    name: String,
    min: T,
    max: T,
    value: RwLock<T>,
    listeners: Mutex<Listeners<T>>,
}

impl<T> Shared<T> {
    fn listeners(&self) -> MutexGuard<'_, Listeners<T>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A shared, observable parameter value.
pub struct Param<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Param<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Param<T> {
    /// Create a parameter with an explicit range.
    pub fn new(name: impl Into<String>, value: T, min: T, max: T) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: ParamId(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed)),
                name: name.into(),
                min,
                max,
                value: RwLock::new(value),
                listeners: Mutex::new(Listeners {
                    next_id: 0,
                    entries: Vec::new(),
                }),
            }),
        }
    }

    pub fn id(&self) -> ParamId {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn min(&self) -> T {
        self.shared.min.clone()
    }

    pub fn max(&self) -> T {
        self.shared.max.clone()
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.shared
            .value
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Store a new value and notify every listener.
    ///
    /// Listeners run on the calling thread, after the value lock is released.
    pub fn set(&self, value: T) {
        *self.shared.value.write().unwrap_or_else(|e| e.into_inner()) = value.clone();

        let listeners: Vec<Listener<T>> = self
            .shared
            .listeners()
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(&value);
        }
    }

    /// Register a change listener. It stays registered until the returned
    /// [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut listeners = self.shared.listeners();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));

        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.listeners().entries.retain(|(i, _)| *i != id);
                }
            })),
        }
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.listeners().entries.len()
    }

    /// Non-owning handle to this parameter.
    pub fn downgrade(&self) -> WeakParam<T> {
        WeakParam {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl Param<bool> {
    /// Boolean parameter with the fixed `{false, true}` range.
    pub fn toggle(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, value, false, true)
    }
}

impl Param<String> {
    /// Free-form text parameter.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value.into(), String::new(), String::new())
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.shared.name)
            .field("value", &self.get())
            .field("min", &self.shared.min)
            .field("max", &self.shared.max)
            .finish()
    }
}

/// Weak handle to a [`Param`].
pub struct WeakParam<T> {
    shared: Weak<Shared<T>>,
}

impl<T> Clone for WeakParam<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> WeakParam<T> {
    /// Upgrade if the host still holds the parameter.
    pub fn upgrade(&self) -> Option<Param<T>> {
        self.shared.upgrade().map(|shared| Param { shared })
    }
}

/// Live change listener registration. Unsubscribes on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Unsubscribe now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// A parameter of any supported kind.
#[derive(Clone, Debug)]
pub enum Parameter {
    /// Float value with a `[min, max]` range; binds as a rotary control
    Numeric(Param<f32>),
    /// On/off value; binds as a switch
    Boolean(Param<bool>),
    /// Text value; cannot be bound
    Text(Param<String>),
}

impl Parameter {
    /// Float parameter with a range.
    pub fn float(name: impl Into<String>, value: f32, min: f32, max: f32) -> Self {
        Parameter::Numeric(Param::new(name, value, min, max))
    }

    /// Boolean parameter.
    pub fn toggle(name: impl Into<String>, value: bool) -> Self {
        Parameter::Boolean(Param::toggle(name, value))
    }

    /// Text parameter.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Parameter::Text(Param::text(name, value))
    }

    pub fn id(&self) -> ParamId {
        match self {
            Parameter::Numeric(p) => p.id(),
            Parameter::Boolean(p) => p.id(),
            Parameter::Text(p) => p.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Parameter::Numeric(p) => p.name(),
            Parameter::Boolean(p) => p.name(),
            Parameter::Text(p) => p.name(),
        }
    }

    /// Human readable current value.
    pub fn value_string(&self) -> String {
        match self {
            Parameter::Numeric(p) => format!("{:.3}", p.get()),
            Parameter::Boolean(p) => p.get().to_string(),
            Parameter::Text(p) => p.get(),
        }
    }
}

impl From<Param<f32>> for Parameter {
    fn from(p: Param<f32>) -> Self {
        Parameter::Numeric(p)
    }
}

impl From<Param<bool>> for Parameter {
    fn from(p: Param<bool>) -> Self {
        Parameter::Boolean(p)
    }
}

impl From<Param<String>> for Parameter {
    fn from(p: Param<String>) -> Self {
        Parameter::Text(p)
    }
}

/// Named, ordered list of parameters.
#[derive(Clone, Debug, Default)]
pub struct ParameterGroup {
    name: String,
    params: Vec<Parameter>,
}

impl ParameterGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a parameter.
    pub fn add(&mut self, param: impl Into<Parameter>) {
        self.params.push(param.into());
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, param: impl Into<Parameter>) -> Self {
        self.add(param);
        self
    }
}

impl Deref for ParameterGroup {
    type Target = [Parameter];

    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

impl FromIterator<Parameter> for ParameterGroup {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        Self {
            name: String::new(),
            params: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_set_notifies_listeners() {
        let p = Param::new("gain", 0.5_f32, 0.0, 1.0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _sub = p.subscribe(move |v| seen_clone.lock().unwrap().push(*v));

        p.set(0.25);
        p.set(0.25);
        assert_eq!(p.get(), 0.25);
        assert_eq!(*seen.lock().unwrap(), vec![0.25, 0.25]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let p = Param::toggle("mute", false);
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let sub = p.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(p.listener_count(), 1);

        p.set(true);
        drop(sub);
        p.set(false);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(p.listener_count(), 0);
    }

    #[test]
    fn test_unsubscribe_leaves_other_listeners() {
        let p = Param::new("x", 0.0_f32, 0.0, 1.0);
        let a = p.subscribe(|_| {});
        let _b = p.subscribe(|_| {});
        a.unsubscribe();
        assert_eq!(p.listener_count(), 1);
    }

    #[test]
    fn test_subscription_outlives_param() {
        let p = Param::new("x", 0.0_f32, 0.0, 1.0);
        let sub = p.subscribe(|_| {});
        drop(p);
        drop(sub);
    }

    #[test]
    fn test_weak_param() {
        let p = Param::toggle("solo", true);
        let weak = p.downgrade();
        assert!(weak.upgrade().is_some_and(|q| q.get()));
        drop(p);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_listener_may_unsubscribe_reentrantly() {
        let p = Param::new("x", 0.0_f32, 0.0, 1.0);
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot_clone = slot.clone();
        let sub = p.subscribe(move |_| {
            slot_clone.lock().unwrap().take();
        });
        *slot.lock().unwrap() = Some(sub);

        p.set(1.0);
        assert_eq!(p.listener_count(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Parameter::float("a", 0.0, 0.0, 1.0);
        let b = a.clone();
        let c = Parameter::float("a", 0.0, 0.0, 1.0);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_group() {
        let group = ParameterGroup::new("synth")
            .with(Param::new("cutoff", 440.0_f32, 20.0, 20000.0))
            .with(Param::toggle("bypass", false))
            .with(Param::text("label", "lead"));
        assert_eq!(group.name(), "synth");
        assert_eq!(group.len(), 3);
        assert!(matches!(group[1], Parameter::Boolean(_)));
        assert_eq!(group[2].value_string(), "lead");
    }
}
