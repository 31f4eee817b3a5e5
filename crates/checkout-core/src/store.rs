//! Session Storage
//!
//! The store is the single source of truth for session state. It is
//! constructed once at startup and injected into the lifecycle manager,
//! so a persistent backing store can be substituted without touching call
//! sites.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{CheckoutError, Result};
use crate::session::{Session, SessionId, TxRef};

/// Session storage trait
pub trait SessionStore: Send + Sync {
    /// Insert a newly created session
    fn insert(&self, session: &Session) -> Result<()>;

    /// Get a session by id
    fn get(&self, id: &SessionId) -> Result<Session>;

    /// Get a session by its gateway reference (used by verification
    /// callbacks, which carry only the reference)
    fn get_by_reference(&self, tx_ref: &TxRef) -> Result<Session>;

    /// Atomically mutate a session
    ///
    /// The mutator runs under the store's write lock, so concurrent updates
    /// to the same session are serialized. Callers must not perform I/O
    /// inside the mutator.
    fn update(&self, id: &SessionId, mutate: &dyn Fn(&mut Session) -> Result<()>)
        -> Result<Session>;
}

/// In-memory session store with a reference index
///
/// Lock order is always `sessions` before `by_reference`.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    by_reference: RwLock<HashMap<TxRef, SessionId>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            by_reference: RwLock::new(HashMap::new()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn insert(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap();

        if sessions.contains_key(&session.id) {
            return Err(CheckoutError::Storage(format!(
                "session {} already exists",
                session.id
            )));
        }

        if let Some(ref tx_ref) = session.tx_ref {
            let mut by_reference = self.by_reference.write().unwrap();
            if by_reference.contains_key(tx_ref) {
                return Err(CheckoutError::Storage(format!(
                    "reference {tx_ref} already in use"
                )));
            }
            by_reference.insert(tx_ref.clone(), session.id.clone());
        }

        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn get(&self, id: &SessionId) -> Result<Session> {
        let sessions = self.sessions.read().unwrap();
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| CheckoutError::SessionNotFound(id.to_string()))
    }

    fn get_by_reference(&self, tx_ref: &TxRef) -> Result<Session> {
        // Resolve the id and drop the index lock before touching
        // `sessions`; holding both here would invert the lock order.
        let id = {
            let by_reference = self.by_reference.read().unwrap();
            by_reference.get(tx_ref).cloned()
        };

        match id {
            Some(id) => self.get(&id),
            None => Err(CheckoutError::SessionNotFound(format!(
                "reference {tx_ref}"
            ))),
        }
    }

    fn update(
        &self,
        id: &SessionId,
        mutate: &dyn Fn(&mut Session) -> Result<()>,
    ) -> Result<Session> {
        let mut sessions = self.sessions.write().unwrap();
        let current = sessions
            .get_mut(id)
            .ok_or_else(|| CheckoutError::SessionNotFound(id.to_string()))?;

        // Mutate a draft so a failed mutator commits nothing.
        let mut draft = current.clone();
        mutate(&mut draft)?;

        if draft.id != current.id || draft.amount != current.amount || draft.currency != current.currency {
            return Err(CheckoutError::Storage(format!(
                "immutable field changed on session {id}"
            )));
        }
        if current.tx_ref.is_some() && draft.tx_ref != current.tx_ref {
            return Err(CheckoutError::Storage(format!(
                "reference reassigned on session {id}"
            )));
        }

        if current.tx_ref.is_none() {
            if let Some(ref tx_ref) = draft.tx_ref {
                let mut by_reference = self.by_reference.write().unwrap();
                if by_reference.contains_key(tx_ref) {
                    return Err(CheckoutError::Storage(format!(
                        "reference {tx_ref} already in use"
                    )));
                }
                by_reference.insert(tx_ref.clone(), id.clone());
            }
        }

        *current = draft;
        Ok(current.clone())
    }
}
