//! Access guard: the per-screen decision function.
//!
//! Consumed once per protected screen mount and re-evaluated whenever the
//! session cell changes. Pure — no IO, no panics, no business logic. An
//! indeterminate profile state always resolves to a redirect, never to
//! "render anyway".

use crate::role::UserRole;
use crate::state::SessionSnapshot;

/// Route paths the guard can redirect to.
pub mod routes {
    pub const LOGIN: &str = "/login";
    pub const HOME: &str = "/";
    pub const LOGISTICS_DASHBOARD: &str = "/logistics-dashboard";
    pub const DRIVER_DASHBOARD: &str = "/driver-dashboard";
    pub const BUSINESS_DASHBOARD: &str = "/business-dashboard";
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session state is still resolving; show a loading placeholder.
    ShowLoading,
    RedirectTo(&'static str),
    /// The screen may render.
    Render,
}

/// The dashboard a role calls home, when it has one.
pub fn role_home(role: UserRole) -> Option<&'static str> {
    match role {
        UserRole::Logistics => Some(routes::LOGISTICS_DASHBOARD),
        UserRole::Driver => Some(routes::DRIVER_DASHBOARD),
        UserRole::Business => Some(routes::BUSINESS_DASHBOARD),
        UserRole::Unset => None,
    }
}

/// Decide what a protected screen should do given current session state.
///
/// An empty `allowed_roles` means "any authenticated user" — role checks
/// are skipped entirely (used by legacy/shared screens).
pub fn decide(snapshot: &SessionSnapshot, allowed_roles: &[UserRole]) -> GuardDecision {
    if snapshot.is_loading {
        return GuardDecision::ShowLoading;
    }

    if snapshot.session.is_none() {
        return GuardDecision::RedirectTo(routes::LOGIN);
    }

    if !allowed_roles.is_empty() {
        let role = snapshot.role();
        let allowed = snapshot.profile.is_some() && allowed_roles.contains(&role);
        if !allowed {
            // Wrong door: send the user to their own dashboard when we know
            // it. A missing profile or an unset role falls back to the
            // generic home — "/" is the single canonical fallback.
            return GuardDecision::RedirectTo(role_home(role).unwrap_or(routes::HOME));
        }
    }

    GuardDecision::Render
}
