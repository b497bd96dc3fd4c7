// 6.0: the ledger. one isolated economy per circle: every member gets the
// starting balance on join, balances never go negative, and nothing ever
// moves funds across circles.
//
// memberships sit behind their own mutexes so a resolution sweep can credit
// many holders without serializing against unrelated circles. credit/debit
// are only ever called from inside a trade or payout critical section.

use crate::types::{CircleId, Dollars, Timestamp, UserId};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("circle {0:?} not found")]
    CircleNotFound(CircleId),

    #[error("user {user:?} is not a member of circle {circle:?}")]
    NotAMember { user: UserId, circle: CircleId },

    #[error("user {user:?} is already a member of circle {circle:?}")]
    AlreadyMember { user: UserId, circle: CircleId },

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Dollars,
        available: Dollars,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub user_id: UserId,
    pub circle_id: CircleId,
    pub balance: Dollars,
    pub joined_at: Timestamp,
}

impl Membership {
    pub fn credit(&mut self, amount: Dollars) {
        debug_assert!(!amount.is_negative(), "credit must be non-negative");
        self.balance = self.balance.add(amount);
    }

    /// Fails without mutating if the debit would push the balance negative,
    /// which fails the enclosing trade as a whole.
    pub fn debit(&mut self, amount: Dollars) -> Result<(), LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance = self.balance.sub(amount);
        Ok(())
    }
}

/// Balance snapshot used by the leaderboard; copied out of the locks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    pub user_id: UserId,
    pub balance: Dollars,
    pub joined_at: Timestamp,
}

#[derive(Debug)]
pub struct Circle {
    pub id: CircleId,
    pub name: String,
    pub creator: UserId,
    pub created_at: Timestamp,
    members: HashMap<UserId, Arc<Mutex<Membership>>>,
}

#[derive(Debug, Default)]
pub struct Ledger {
    circles: RwLock<HashMap<CircleId, Circle>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a circle; the creator joins immediately with the starting
    /// balance.
    pub fn create_circle(
        &self,
        id: CircleId,
        name: String,
        creator: UserId,
        starting_balance: Dollars,
        timestamp: Timestamp,
    ) {
        let mut circle = Circle {
            id,
            name,
            creator,
            created_at: timestamp,
            members: HashMap::new(),
        };
        circle.members.insert(
            creator,
            Arc::new(Mutex::new(Membership {
                user_id: creator,
                circle_id: id,
                balance: starting_balance,
                joined_at: timestamp,
            })),
        );
        self.circles.write().insert(id, circle);
    }

    pub fn join(
        &self,
        circle_id: CircleId,
        user: UserId,
        starting_balance: Dollars,
        timestamp: Timestamp,
    ) -> Result<(), LedgerError> {
        let mut circles = self.circles.write();
        let circle = circles
            .get_mut(&circle_id)
            .ok_or(LedgerError::CircleNotFound(circle_id))?;

        if circle.members.contains_key(&user) {
            return Err(LedgerError::AlreadyMember {
                user,
                circle: circle_id,
            });
        }

        circle.members.insert(
            user,
            Arc::new(Mutex::new(Membership {
                user_id: user,
                circle_id,
                balance: starting_balance,
                joined_at: timestamp,
            })),
        );
        Ok(())
    }

    /// Handle to one membership's balance cell. The caller locks it for the
    /// duration of its atomic operation.
    pub fn membership(
        &self,
        circle_id: CircleId,
        user: UserId,
    ) -> Result<Arc<Mutex<Membership>>, LedgerError> {
        let circles = self.circles.read();
        let circle = circles
            .get(&circle_id)
            .ok_or(LedgerError::CircleNotFound(circle_id))?;
        circle
            .members
            .get(&user)
            .cloned()
            .ok_or(LedgerError::NotAMember {
                user,
                circle: circle_id,
            })
    }

    pub fn is_member(&self, circle_id: CircleId, user: UserId) -> bool {
        self.membership(circle_id, user).is_ok()
    }

    pub fn balance(&self, circle_id: CircleId, user: UserId) -> Result<Dollars, LedgerError> {
        Ok(self.membership(circle_id, user)?.lock().balance)
    }

    pub fn circle_exists(&self, circle_id: CircleId) -> bool {
        self.circles.read().contains_key(&circle_id)
    }

    /// Copy every member's balance out of the locks, one membership at a
    /// time. The result is a consistent-enough snapshot for standings.
    pub fn snapshot(&self, circle_id: CircleId) -> Result<Vec<MembershipSnapshot>, LedgerError> {
        let circles = self.circles.read();
        let circle = circles
            .get(&circle_id)
            .ok_or(LedgerError::CircleNotFound(circle_id))?;

        Ok(circle
            .members
            .values()
            .map(|cell| {
                let m = cell.lock();
                MembershipSnapshot {
                    user_id: m.user_id,
                    balance: m.balance,
                    joined_at: m.joined_at,
                }
            })
            .collect())
    }
}
