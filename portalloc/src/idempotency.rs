//! Deciding whether a live allocation already satisfies a desired spec.
//!
//! The control loop re-evaluates every service continuously; this check lets
//! it skip services whose published ports need no work.

use crate::endpoint::PortConfig;
use crate::reconcile::index_by_key;

/// Returns `true` if `live` already satisfies `desired`.
///
/// - Both absent: satisfied.
/// - Exactly one absent, or different lengths: not satisfied.
/// - Otherwise both lists are compared as multisets keyed by identity,
///   ignoring order. Every ingress desired entry needs a live entry with the
///   same identity whose published port equals the desired one, or, when the
///   desired port is 0, any nonzero published port. A live port that is
///   still 0 never satisfies an ingress binding.
///
/// Host-mode bindings are not tracked cluster-wide; they only count towards
/// the length comparison.
///
/// # Examples
///
/// ```
/// use portalloc::{ports_allocated, PortConfig, Protocol};
///
/// let desired = [PortConfig::new("web", Protocol::Tcp, 80, 0)];
/// let live = [PortConfig::new("web", Protocol::Tcp, 80, 30000)];
///
/// assert!(ports_allocated(Some(&desired), Some(&live)));
/// assert!(!ports_allocated(Some(&desired), Some(&desired)));
/// assert!(ports_allocated(None, None));
/// ```
#[must_use]
pub fn ports_allocated(desired: Option<&[PortConfig]>, live: Option<&[PortConfig]>) -> bool {
    let (desired, live) = match (desired, live) {
        (None, None) => return true,
        (Some(desired), Some(live)) => (desired, live),
        _ => return false,
    };

    if desired.len() != live.len() {
        return false;
    }

    let mut allocated = index_by_key(live);

    // Explicit ports claim their exact live entry before wildcards pick any
    // remaining nonzero one.
    let (explicit, unassigned): (Vec<&PortConfig>, Vec<&PortConfig>) = desired
        .iter()
        .filter(|port| port.is_ingress())
        .partition(|port| !port.needs_assignment());

    explicit.into_iter().chain(unassigned).all(|wanted| {
        let Some(candidates) = allocated.get_mut(&wanted.key()) else {
            return false;
        };
        let matched = if wanted.needs_assignment() {
            candidates.iter().position(|port| port.published_port != 0)
        } else {
            candidates
                .iter()
                .position(|port| port.published_port == wanted.published_port)
        };
        matched.and_then(|index| candidates.remove(index)).is_some()
    })
}
