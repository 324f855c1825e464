use crate::account::PlanTier;
use crate::plan_limits::PlanLimits;

/// Free-tier quota used when no configuration row exists yet. An admission
/// decision must always be possible, so unknown plans parse to `free` and a
/// missing config self-heals to these defaults.
pub const FALLBACK_CARD_LIMIT: i64 = 2;

/// Strict less-than: a user sitting exactly at the quota is rejected.
pub fn can_admit(plan: PlanTier, limits: &PlanLimits, current_usage: i64) -> bool {
    current_usage < limits.quota_for(plan)
}
