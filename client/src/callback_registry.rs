use std::{collections::HashMap, sync::Mutex};

use penne_shared::{InvokeId, Value};

use crate::error::{CallbackError, RemoteMethodError};

/// Completion callback of a client-issued invocation, called at most once
pub type ReplyCallback = Box<dyn FnOnce(Result<Value, RemoteMethodError>) + Send>;

// CallbackRegistry
/// Pending client-issued invocations, keyed by invoke id.
///
/// Callers register from their own threads while the dispatch context takes
/// entries out, both under the same lock. A taken callback is always run
/// after the lock is released, so a callback may register a follow-up call.
pub struct CallbackRegistry {
    pending: Mutex<HashMap<InvokeId, ReplyCallback>>,
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Fails if `invoke_id` is already waiting on a reply
    pub fn register(&self, invoke_id: InvokeId, callback: ReplyCallback) -> Result<(), CallbackError> {
        let mut pending = self.pending.lock().map_err(|_| CallbackError::LockPoisoned)?;
        if pending.contains_key(&invoke_id) {
            return Err(CallbackError::DuplicateInvocation { invoke_id });
        }
        pending.insert(invoke_id, callback);
        Ok(())
    }

    /// Removes and returns the callback for `invoke_id`
    pub fn take(&self, invoke_id: &InvokeId) -> Result<ReplyCallback, CallbackError> {
        let mut pending = self.pending.lock().map_err(|_| CallbackError::LockPoisoned)?;
        pending
            .remove(invoke_id)
            .ok_or_else(|| CallbackError::UnmatchedInvocation {
                invoke_id: invoke_id.clone(),
            })
    }

    /// Takes the callback for `invoke_id` and runs it with `result`
    pub fn complete(
        &self,
        invoke_id: &InvokeId,
        result: Result<Value, RemoteMethodError>,
    ) -> Result<(), CallbackError> {
        let callback = self.take(invoke_id)?;
        callback(result);
        Ok(())
    }

    /// Drops the callback without running it. Used by timeout policies and
    /// when the request never made it out.
    pub fn cancel(&self, invoke_id: &InvokeId) -> bool {
        match self.pending.lock() {
            Ok(mut pending) => pending.remove(invoke_id).is_some(),
            Err(_) => false,
        }
    }

    pub fn contains(&self, invoke_id: &InvokeId) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.contains_key(invoke_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
