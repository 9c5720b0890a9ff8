//! Merging a service's desired ports with its previous live allocation.
//!
//! The merge is keyed by [`PortKey`] and driven by the desired list: the
//! output always follows the desired order, an unassigned (`0`) published
//! port inherits the value previously granted to the same binding, and an
//! explicit published port always wins over whatever was granted before.
//! Live bindings with no desired counterpart are dropped.

use std::collections::{HashMap, VecDeque};

use crate::endpoint::{PortConfig, PortKey};

/// Live entries grouped by identity, in live order.
///
/// Each entry is handed out at most once, so a desired list that repeats a
/// key is matched against distinct live entries.
pub(crate) fn index_by_key(ports: &[PortConfig]) -> HashMap<PortKey<'_>, VecDeque<&PortConfig>> {
    let mut index: HashMap<PortKey<'_>, VecDeque<&PortConfig>> = HashMap::new();
    for port in ports {
        index.entry(port.key()).or_default().push_back(port);
    }
    index
}

/// Computes the port list the allocator should hold next.
///
/// For each desired entry, in order:
///
/// - no live entry with the same identity: emitted unchanged;
/// - a match and the desired published port is 0: emitted with the matched
///   live published port carried forward;
/// - a match and the desired published port is explicit: emitted unchanged.
///
/// # Examples
///
/// ```
/// use portalloc::{reconcile, PortConfig, Protocol};
///
/// let desired = vec![
///     PortConfig::new("web", Protocol::Tcp, 80, 0),
///     PortConfig::new("admin", Protocol::Tcp, 8080, 0),
/// ];
/// let live = vec![PortConfig::new("web", Protocol::Tcp, 80, 30001)];
///
/// let target = reconcile(&desired, &live);
/// assert_eq!(target[0].published_port, 30001);
/// assert_eq!(target[1].published_port, 0);
/// ```
#[must_use]
pub fn reconcile(desired: &[PortConfig], live: &[PortConfig]) -> Vec<PortConfig> {
    let mut previous = index_by_key(live);

    desired
        .iter()
        .map(|wanted| {
            let mut next = wanted.clone();
            let prior = previous
                .get_mut(&wanted.key())
                .and_then(VecDeque::pop_front);
            if let Some(prior) = prior {
                if next.needs_assignment() {
                    next.published_port = prior.published_port;
                }
            }
            next
        })
        .collect()
}

/// Live entries that [`reconcile`] drops because nothing desired matches them.
///
/// Returned in live order. Callers that manage releases themselves use this
/// to find the bindings whose ports are no longer wanted.
#[must_use]
pub fn dropped(desired: &[PortConfig], live: &[PortConfig]) -> Vec<PortConfig> {
    let mut wanted: HashMap<PortKey<'_>, usize> = HashMap::new();
    for port in desired {
        *wanted.entry(port.key()).or_default() += 1;
    }

    live.iter()
        .filter(|port| match wanted.get_mut(&port.key()) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect()
}
