//! Wallet list ranking.
//!
//! Splits the available backends into a short highlight group and an
//! overflow group, using recency first, then readiness, then the well-known
//! wallet names. Pure and deterministic: same inputs, same output.

use serde::Serialize;
use std::collections::HashSet;
use unikit_types::constants::{HIGHLIGHT_LIMIT, TOP_WALLETS};
use unikit_types::{BackendDescriptor, BackendId};

/// Why the highlight group looks the way it does. Drives the UI heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupingReason {
    PreviouslyConnected,
    Installed,
    TopAndRecommended,
    Onboarding,
    TopWallet,
}

impl std::fmt::Display for GroupingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreviouslyConnected => write!(f, "previously connected"),
            Self::Installed => write!(f, "installed"),
            Self::TopAndRecommended => write!(f, "top and recommended"),
            Self::Onboarding => write!(f, "onboarding"),
            Self::TopWallet => write!(f, "top wallets"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedList {
    pub highlight: Vec<BackendDescriptor>,
    pub overflow: Vec<BackendDescriptor>,
    pub reason: GroupingReason,
}

impl RankedList {
    /// Highlight then overflow.
    pub fn iter(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.highlight.iter().chain(self.overflow.iter())
    }

    pub fn get(&self, id: &BackendId) -> Option<&BackendDescriptor> {
        self.iter().find(|d| &d.id == id)
    }

    pub fn len(&self) -> usize {
        self.highlight.len() + self.overflow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct Buckets {
    pinned: Vec<BackendDescriptor>,
    previously_connected: Vec<BackendDescriptor>,
    installed: Vec<BackendDescriptor>,
    top_named: Vec<BackendDescriptor>,
    rest: Vec<BackendDescriptor>,
}

/// Rank `backends` for display.
///
/// `recency` is most-recent-first, `precedence` orders the overflow tail
/// after readiness, `pinned` ids always lead the highlight group.
pub fn rank(
    backends: &[BackendDescriptor],
    recency: &[BackendId],
    precedence: &[BackendId],
    pinned: &[BackendId],
) -> RankedList {
    let valid = filter_valid(backends);

    if !valid.iter().any(|d| d.readiness.is_ready()) {
        return RankedList {
            highlight: Vec::new(),
            overflow: Vec::new(),
            reason: GroupingReason::Onboarding,
        };
    }

    let mut b = bucket(valid, recency, pinned);
    let mut highlight = std::mem::take(&mut b.pinned);

    if !b.previously_connected.is_empty() {
        let keep = b.previously_connected.len().min(HIGHLIGHT_LIMIT);
        let mut overflow = b.previously_connected.split_off(keep);
        highlight.append(&mut b.previously_connected);

        let mut tail = b.installed;
        tail.append(&mut b.top_named);
        tail.append(&mut b.rest);
        overflow.extend(sort_remainder(tail, precedence));

        return RankedList {
            highlight,
            overflow,
            reason: GroupingReason::PreviouslyConnected,
        };
    }

    if !b.installed.is_empty() {
        let keep = b.installed.len().min(HIGHLIGHT_LIMIT);
        let mut overflow = b.installed.split_off(keep);
        highlight.append(&mut b.installed);

        let reason = if b.top_named.is_empty() {
            GroupingReason::Installed
        } else {
            GroupingReason::TopAndRecommended
        };
        highlight.append(&mut b.top_named);
        overflow.extend(sort_remainder(b.rest, precedence));

        return RankedList {
            highlight,
            overflow,
            reason,
        };
    }

    highlight.append(&mut b.top_named);
    RankedList {
        highlight,
        overflow: sort_remainder(b.rest, precedence),
        reason: GroupingReason::TopWallet,
    }
}

/// Drop descriptors the UI cannot render and later duplicates of an id.
fn filter_valid(backends: &[BackendDescriptor]) -> Vec<BackendDescriptor> {
    let mut seen: HashSet<&BackendId> = HashSet::new();
    let mut out = Vec::with_capacity(backends.len());
    for d in backends {
        if let Err(e) = d.validate() {
            log::debug!("skipping backend: {}", e);
            continue;
        }
        if !seen.insert(&d.id) {
            log::debug!("skipping duplicate backend {}", d.id);
            continue;
        }
        out.push(d.clone());
    }
    out
}

fn bucket(valid: Vec<BackendDescriptor>, recency: &[BackendId], pinned: &[BackendId]) -> Buckets {
    let position = |list: &[BackendId], id: &BackendId| list.iter().position(|x| x == id);
    let top_position = |id: &BackendId| TOP_WALLETS.iter().position(|name| id == name);

    let mut b = Buckets::default();
    for d in valid {
        if position(pinned, &d.id).is_some() {
            b.pinned.push(d);
        } else if position(recency, &d.id).is_some() {
            b.previously_connected.push(d);
        } else if d.readiness == unikit_types::Readiness::Installed {
            b.installed.push(d);
        } else if top_position(&d.id).is_some() {
            b.top_named.push(d);
        } else {
            b.rest.push(d);
        }
    }

    b.pinned.sort_by_key(|d| position(pinned, &d.id));
    b.previously_connected.sort_by_key(|d| position(recency, &d.id));
    b.top_named.sort_by_key(|d| top_position(&d.id));
    b
}

/// Stable sort by precedence position, then readiness priority. Listed ids
/// always sort above unlisted ones; unlisted ids are ordered by readiness.
fn sort_remainder(mut list: Vec<BackendDescriptor>, precedence: &[BackendId]) -> Vec<BackendDescriptor> {
    list.sort_by_key(|d| {
        let rank = precedence
            .iter()
            .position(|p| p == &d.id)
            .unwrap_or(usize::MAX);
        (rank, d.readiness.priority())
    });
    list
}
