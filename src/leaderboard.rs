// 7.0: standings. rank every membership in a circle by balance, richest
// first. ranks are dense 1-based positions; ties break on join order then
// user id so repeated calls over the same snapshot agree exactly.

use crate::ledger::MembershipSnapshot;
use crate::types::{Dollars, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: UserId,
    pub balance: Dollars,
}

pub fn rank_members(mut snapshot: Vec<MembershipSnapshot>) -> Vec<LeaderboardEntry> {
    snapshot.sort_by(|a, b| {
        b.balance
            .cmp(&a.balance)
            .then(a.joined_at.cmp(&b.joined_at))
            .then(a.user_id.cmp(&b.user_id))
    });

    snapshot
        .into_iter()
        .enumerate()
        .map(|(i, m)| LeaderboardEntry {
            rank: i as u32 + 1,
            user_id: m.user_id,
            balance: m.balance,
        })
        .collect()
}
