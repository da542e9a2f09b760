//! Persistence interface for the card flows, plus an in-memory backend.
//!
//! A real deployment puts a database behind [`CardStore`]. [`MemoryStore`]
//! backs the tests and mirrors the behaviour the flows rely on: unique
//! emails, auto-incremented ids, and timestamps kept to whole seconds.

use crate::error::{CardError, CardResult};
use crate::types::{CardRecord, NewCard, NewUser, UserRecord};
use cardvault_crypto::truncate_to_seconds;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Storage operations the card flows need.
pub trait CardStore: Send + Sync {
    /// Inserts a user and returns its id. Emails are unique.
    fn insert_user(&self, user: NewUser) -> CardResult<i64>;

    fn find_user(&self, user_id: i64) -> CardResult<Option<UserRecord>>;

    /// Inserts a card for an existing user and returns its id.
    fn insert_card(&self, card: NewCard) -> CardResult<i64>;

    /// All cards owned by `user_id`, oldest first.
    fn cards_for_user(&self, user_id: i64) -> CardResult<Vec<CardRecord>>;
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    cards: BTreeMap<i64, CardRecord>,
    next_user_id: i64,
    next_card_id: i64,
}

/// Thread-safe in-memory [`CardStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> CardResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| CardError::Storage(format!("store lock poisoned: {e}")))
    }

    fn write(&self) -> CardResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| CardError::Storage(format!("store lock poisoned: {e}")))
    }

    /// Overwrites a stored card. Test hook for tampering scenarios.
    pub fn replace_card(&self, card: CardRecord) -> CardResult<()> {
        let mut tables = self.write()?;
        match tables.cards.get_mut(&card.id) {
            Some(slot) => {
                *slot = card;
                Ok(())
            }
            None => Err(CardError::Storage(format!("no card with id {}", card.id))),
        }
    }

    /// Overwrites a stored user. Test hook for key-loss scenarios.
    pub fn replace_user(&self, user: UserRecord) -> CardResult<()> {
        let mut tables = self.write()?;
        match tables.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user;
                Ok(())
            }
            None => Err(CardError::UserNotFound(user.id)),
        }
    }
}

impl CardStore for MemoryStore {
    fn insert_user(&self, user: NewUser) -> CardResult<i64> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(CardError::DuplicateEmail(user.email));
        }

        tables.next_user_id += 1;
        let id = tables.next_user_id;
        tables.users.insert(
            id,
            UserRecord {
                id,
                name: user.name,
                email: user.email,
                salt: user.salt,
                public_key: Some(user.public_key),
                encrypted_private_key: Some(user.encrypted_private_key),
                registered_on: Utc::now().date_naive(),
            },
        );
        Ok(id)
    }

    fn find_user(&self, user_id: i64) -> CardResult<Option<UserRecord>> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }

    fn insert_card(&self, card: NewCard) -> CardResult<i64> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&card.user_id) {
            return Err(CardError::UserNotFound(card.user_id));
        }

        tables.next_card_id += 1;
        let id = tables.next_card_id;
        tables.cards.insert(
            id,
            CardRecord {
                id,
                user_id: card.user_id,
                payload: card.payload,
                iv: card.iv,
                expiration: card.expiration,
                created_at: truncate_to_seconds(card.created_at),
                signature: card.signature,
            },
        );
        Ok(id)
    }

    fn cards_for_user(&self, user_id: i64) -> CardResult<Vec<CardRecord>> {
        Ok(self
            .read()?
            .cards
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }
}
