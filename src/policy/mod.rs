//! Retention policy deciding which resources a sweep removes.
//!
//! A resource is selected either because its name starts with the operator's
//! prefix or, when no prefix is given, because it is older than the age
//! threshold. The two rules never combine in one pass. Per-kind exceptions
//! (system catalogs, the shared lab user) are expressed as a [`Protection`]
//! and always win over a match.

use chrono::{DateTime, Duration, Utc};

/// Default age after which unprefixed resources are removed.
pub const DEFAULT_MAX_AGE_DAYS: u32 = 7;

/// Outcome of evaluating one resource.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    /// Leave the resource in place.
    Keep,
    /// Remove the resource.
    Delete(Reason),
}

impl Decision {
    /// Returns `true` for [`Decision::Delete`].
    #[must_use]
    pub const fn is_delete(self) -> bool {
        matches!(self, Self::Delete(_))
    }
}

/// Why a resource was selected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reason {
    /// Name starts with the configured prefix.
    PrefixMatch,
    /// Created before the age cutoff.
    Expired,
    /// User name belongs to the swept account domain.
    DomainMember,
}

/// How a kind picks its deletion candidates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selector {
    /// Prefix match when a prefix is set, otherwise age.
    PrefixOrAge,
    /// Names containing the given domain, ignoring prefix and age.
    AccountDomain(String),
}

/// Names a kind must never touch.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Protection {
    /// Nothing is protected.
    Unprotected,
    /// Built-in catalogs: `__*`, anything containing `system` or `hive`.
    SystemCatalogs,
    /// One exact name.
    Named(String),
}

impl Protection {
    /// Returns `true` when `name` is exempt from the sweep.
    #[must_use]
    pub fn protects(&self, name: &str) -> bool {
        match self {
            Self::Unprotected => false,
            Self::SystemCatalogs => is_system_catalog(name),
            Self::Named(protected) => protected == name,
        }
    }
}

/// Returns `true` for catalogs managed by the platform itself.
#[must_use]
pub fn is_system_catalog(name: &str) -> bool {
    name.starts_with("__") || name.contains("system") || name.contains("hive")
}

/// Prefix and age threshold applied to every prefix-or-age kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetentionPolicy {
    prefix: Option<String>,
    max_age: Duration,
}

impl RetentionPolicy {
    /// Builds a policy. A blank prefix counts as no prefix.
    #[must_use]
    pub fn new(prefix: Option<String>, max_age_days: u32) -> Self {
        Self {
            prefix: prefix.filter(|value| !value.is_empty()),
            max_age: Duration::days(i64::from(max_age_days)),
        }
    }

    /// Prefix in effect, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Age threshold in effect.
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Applies the policy to a single name and creation time.
    #[must_use]
    pub fn evaluate(
        &self,
        name: &str,
        created_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Decision {
        decide(name, created_at, self.prefix(), self.max_age, now)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(None, DEFAULT_MAX_AGE_DAYS)
    }
}

/// Prefix-or-age decision.
///
/// With a prefix, only the name matters. Without one, a resource is expired
/// when it was created strictly before `now - max_age`; a resource with no
/// reported creation time is kept.
#[must_use]
pub fn decide(
    name: &str,
    created_at: Option<DateTime<Utc>>,
    prefix: Option<&str>,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Decision {
    if let Some(prefix) = prefix {
        return if name.starts_with(prefix) {
            Decision::Delete(Reason::PrefixMatch)
        } else {
            Decision::Keep
        };
    }

    let Some(cutoff) = now.checked_sub_signed(max_age) else {
        return Decision::Keep;
    };
    match created_at {
        Some(created) if created < cutoff => Decision::Delete(Reason::Expired),
        _ => Decision::Keep,
    }
}

/// Full per-kind decision: protection first, then the selector.
#[must_use]
pub fn evaluate_with(
    selector: &Selector,
    protection: &Protection,
    policy: &RetentionPolicy,
    name: &str,
    created_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Decision {
    if protection.protects(name) {
        return Decision::Keep;
    }
    match selector {
        Selector::PrefixOrAge => policy.evaluate(name, created_at, now),
        Selector::AccountDomain(domain) if name.contains(domain.as_str()) => {
            Decision::Delete(Reason::DomainMember)
        }
        Selector::AccountDomain(_) => Decision::Keep,
    }
}

#[cfg(test)]
mod tests;
