//! # Balance Ledger
//!
//! The only code path that writes a user's balance, experience and level.
//! Every change is paired with an immutable ledger entry in the same
//! transaction.

use shared_types::entities::{Timestamp, User, UserId};

use crate::domain::entities::{LedgerKind, LedgerReference, NewLedgerEntry};
use crate::domain::wallet::{self, LevelChange};
use crate::domain::ProgressionError;
use crate::ports::outbound::StoreTransaction;

pub(super) struct BalanceLedger<'t, 'a> {
    tx: &'t mut (dyn StoreTransaction + 'a),
    now: Timestamp,
}

impl<'t, 'a> BalanceLedger<'t, 'a> {
    pub(super) fn new(tx: &'t mut (dyn StoreTransaction + 'a), now: Timestamp) -> Self {
        Self { tx, now }
    }

    fn lock(&mut self, user_id: UserId) -> Result<User, ProgressionError> {
        self.tx
            .lock_user(user_id)?
            .ok_or(ProgressionError::UserNotFound(user_id))
    }

    /// Grant experience and currency. Records an `earned` entry when coins
    /// are granted.
    pub(super) fn credit(
        &mut self,
        user_id: UserId,
        xp: u64,
        coins: u64,
        reference: LedgerReference,
        description: String,
    ) -> Result<LevelChange, ProgressionError> {
        let mut user = self.lock(user_id)?;
        let change = wallet::credit(&mut user, xp, coins)?;
        if xp == 0 && coins == 0 {
            return Ok(change);
        }
        self.tx.put_user(user)?;

        if coins > 0 {
            let amount = i64::try_from(coins).map_err(|_| ProgressionError::Overflow(user_id))?;
            self.tx.append_ledger(NewLedgerEntry {
                user_id,
                amount,
                xp,
                kind: LedgerKind::Earned,
                reference,
                description,
                created_at: self.now,
            })?;
        }
        Ok(change)
    }

    /// Spend currency. Returns the balance left.
    pub(super) fn debit(
        &mut self,
        user_id: UserId,
        coins: u64,
        reference: LedgerReference,
        description: String,
    ) -> Result<u64, ProgressionError> {
        let mut user = self.lock(user_id)?;
        wallet::debit(&mut user, coins)?;
        if coins == 0 {
            return Ok(user.balance);
        }

        let amount = i64::try_from(coins).map_err(|_| ProgressionError::Overflow(user_id))?;
        let balance = user.balance;
        self.tx.put_user(user)?;
        self.tx.append_ledger(NewLedgerEntry {
            user_id,
            amount: -amount,
            xp: 0,
            kind: LedgerKind::Spent,
            reference,
            description,
            created_at: self.now,
        })?;
        Ok(balance)
    }
}
