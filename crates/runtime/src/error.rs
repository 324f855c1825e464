use thiserror::Error;

use crate::account::PlanTier;

/// Typed failure surface of the card services. Callers branch on the
/// variant, never on the message text.
#[derive(Debug, Error)]
pub enum CardServiceError {
    #[error("plan {plan} allows {limit} cards, {used} already in use")]
    QuotaExceeded {
        plan: PlanTier,
        limit: i64,
        used: i64,
    },

    #[error("no unique slug found after {attempts} attempts")]
    SlugGeneration { attempts: u32 },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("caller does not own the target card")]
    PermissionDenied,

    #[error("transient store failure")]
    TransientStore(#[source] anyhow::Error),
}

impl CardServiceError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    /// Only transient store failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStore(_))
    }

    /// Stable discriminant for wire envelopes and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::SlugGeneration { .. } => "slug_generation",
            Self::NotFound { .. } => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::TransientStore(_) => "transient_store",
        }
    }
}

impl From<sqlx::Error> for CardServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::TransientStore(anyhow::Error::new(err))
    }
}
