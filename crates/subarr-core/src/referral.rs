//! Referral rewards
//!
//! Maps a new subscriber's purchased term length to the number of days added
//! to the referrer's subscription. Pure lookup, no interpolation: a month
//! count without a mapping entry earns nothing.

use crate::config::Referrals;

/// Referral reward calculator
#[derive(Debug, Clone)]
pub struct ReferralRewards {
    referrals: Referrals,
}

impl ReferralRewards {
    pub fn new(referrals: Referrals) -> Self {
        Self { referrals }
    }

    /// Days to extend the referrer's subscription for a purchase of
    /// `months`; `None` when referrals are disabled or no entry exists
    pub fn reward_for(&self, months: u32) -> Option<u32> {
        if !self.referrals.enabled {
            return None;
        }
        self.referrals.rewards_by_months.get(&months).copied()
    }
}

impl Default for ReferralRewards {
    fn default() -> Self {
        Self::new(Referrals::default())
    }
}
