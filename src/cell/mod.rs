//! Shared value cells and the Absent → Collection kind transition.
//!
//! Indexing an Absent value turns it into an empty collection in place.
//! Every clone of a [`Slot`] shares one cell, so all holders observe the
//! new kind. The cell is guarded by a lock held for the duration of each
//! index or mutate operation.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::ops::{self, OpResult, Unsupported};
use crate::value::{Collection, Key, Kind, Value};

impl Value {
    /// Replaces an Absent value with an empty collection. Returns whether
    /// the transition happened; any other kind is left untouched.
    pub fn promote_to_collection(&mut self) -> bool {
        if !self.is_absent() {
            return false;
        }
        *self = Value::Collection(Collection::new());
        debug!("absent value promoted to collection on indexed access");
        true
    }

    /// Indexed read that applies the kind transition. The first index of
    /// an Absent value yields Absent whatever the key.
    pub fn index_in_place(&mut self, key: &Value) -> OpResult<Value> {
        if self.promote_to_collection() {
            return Ok(Value::Absent);
        }
        ops::index(self, key)
    }

    /// `self[key] = value`. Absent is promoted first; only collections
    /// accept element assignment.
    pub fn set_index_in_place(&mut self, key: &Value, value: Value) -> OpResult<()> {
        self.promote_to_collection();
        let unsupported = Unsupported::new("[]=", self, key);
        match self {
            Value::Collection(collection) => {
                let key = Key::try_from(key).map_err(|_| unsupported)?;
                collection.insert(key, value);
                Ok(())
            }
            _ => Err(unsupported),
        }
    }

    pub fn pre_increment(&mut self) -> OpResult<&Value> {
        self.step(1, "++")?;
        Ok(self)
    }

    pub fn post_increment(&mut self) -> OpResult<Value> {
        let snapshot = self.clone();
        self.step(1, "++")?;
        Ok(snapshot)
    }

    pub fn pre_decrement(&mut self) -> OpResult<&Value> {
        self.step(-1, "--")?;
        Ok(self)
    }

    pub fn post_decrement(&mut self) -> OpResult<Value> {
        let snapshot = self.clone();
        self.step(-1, "--")?;
        Ok(snapshot)
    }

    fn step(&mut self, delta: i64, op: &'static str) -> OpResult<()> {
        match self {
            Value::Integer(n) => {
                *n = n.wrapping_add(delta);
                Ok(())
            }
            other => Err(Unsupported::new(op, other, other)),
        }
    }
}

/// Shared mutable cell holding one logical value.
#[derive(Debug, Clone, Default)]
pub struct Slot {
    inner: Arc<RwLock<Value>>,
}

impl Slot {
    pub fn new(value: Value) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    /// Snapshot of the current contents.
    pub fn get(&self) -> Value {
        self.inner.read().clone()
    }

    pub fn kind(&self) -> Kind {
        self.inner.read().kind()
    }

    pub fn runtime_type_tag(&self) -> &'static str {
        self.inner.read().runtime_type_tag()
    }

    /// Runs `f` on a snapshot taken before the call. The lock is not held
    /// while `f` runs, so `f` may use this slot again; writes it makes are
    /// not visible in the snapshot.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        let snapshot = self.get();
        f(&snapshot)
    }

    /// Whether both handles refer to the same cell.
    pub fn same_cell(&self, other: &Slot) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn index(&self, key: &Value) -> OpResult<Value> {
        self.inner.write().index_in_place(key)
    }

    pub fn set_index(&self, key: &Value, value: Value) -> OpResult<()> {
        self.inner.write().set_index_in_place(key, value)
    }

    /// Returns this same cell after incrementing it.
    pub fn pre_increment(&self) -> OpResult<Slot> {
        self.inner.write().pre_increment().map(|_| ())?;
        Ok(self.clone())
    }

    /// Returns the value held before incrementing.
    pub fn post_increment(&self) -> OpResult<Value> {
        self.inner.write().post_increment()
    }

    pub fn pre_decrement(&self) -> OpResult<Slot> {
        self.inner.write().pre_decrement().map(|_| ())?;
        Ok(self.clone())
    }

    pub fn post_decrement(&self) -> OpResult<Value> {
        self.inner.write().post_decrement()
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::new(value)
    }
}
