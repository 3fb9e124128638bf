//! Checked arithmetic on a user's balance and experience.
//!
//! These functions mutate an in-memory `User`; persisting it is the ledger's job.

use shared_types::entities::User;

use super::errors::ProgressionError;
use super::level::LevelCalculator;

/// Level before and after a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub previous: u32,
    pub current: u32,
}

impl LevelChange {
    pub fn leveled_up(&self) -> bool {
        self.current > self.previous
    }
}

/// Add experience and currency, then recompute the level.
///
/// On overflow the user is left untouched.
pub fn credit(user: &mut User, xp: u64, coins: u64) -> Result<LevelChange, ProgressionError> {
    let experience = user
        .experience
        .checked_add(xp)
        .ok_or(ProgressionError::Overflow(user.id))?;
    let balance = user
        .balance
        .checked_add(coins)
        .ok_or(ProgressionError::Overflow(user.id))?;

    let previous = user.level;
    user.experience = experience;
    user.balance = balance;
    user.level = LevelCalculator::compute(experience);

    Ok(LevelChange {
        previous,
        current: user.level,
    })
}

/// Remove currency. Fails without touching the user if the balance is short.
pub fn debit(user: &mut User, coins: u64) -> Result<(), ProgressionError> {
    user.balance = user
        .balance
        .checked_sub(coins)
        .ok_or(ProgressionError::InsufficientFunds {
            required: coins,
            available: user.balance,
        })?;
    Ok(())
}
