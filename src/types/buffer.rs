//! Secret buffer: fixed-length slots, each resolved or still a placeholder

use std::ops::Range;

use crate::types::{Anchor, ConfigError, Direction, ProbeRequest};

/// The partially recovered secret.
///
/// Length never changes after construction. Seed slots are resolved from the
/// start and can not be overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretBuffer {
    slots: Vec<Option<char>>,
    placeholder: char,
    /// Slots that still need searching (everything outside the seed)
    open: Range<usize>,
}

impl SecretBuffer {
    /// Create a buffer of `length` slots with `seed` at the anchored end
    pub fn new(
        length: usize,
        seed: &str,
        anchor: Anchor,
        placeholder: char,
    ) -> Result<Self, ConfigError> {
        if length == 0 {
            return Err(ConfigError::ZeroLength);
        }
        let seed: Vec<char> = seed.chars().collect();
        if seed.len() >= length {
            return Err(ConfigError::SeedTooLong { seed_len: seed.len(), length });
        }

        let mut slots = vec![None; length];
        let (seeded, open) = match anchor {
            Anchor::Prefix => (0..seed.len(), seed.len()..length),
            Anchor::Suffix => (length - seed.len()..length, 0..length - seed.len()),
        };
        for (slot, c) in slots[seeded].iter_mut().zip(seed) {
            *slot = Some(c);
        }

        Ok(Self { slots, placeholder, open })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn placeholder(&self) -> char {
        self.placeholder
    }

    /// Symbol at a slot, if resolved
    pub fn get(&self, position: usize) -> Option<char> {
        self.slots.get(position).copied().flatten()
    }

    pub fn is_resolved(&self, position: usize) -> bool {
        self.get(position).is_some()
    }

    /// Every slot holds a confirmed symbol
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Unresolved slot indices, ascending
    pub fn unresolved(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Unresolved slots outside the seed, in visiting order
    pub fn pending(&self, direction: Direction) -> Vec<usize> {
        let open = self.open.clone().filter(|&i| !self.is_resolved(i));
        match direction {
            Direction::Forward => open.collect(),
            Direction::Reverse => open.rev().collect(),
        }
    }

    /// Render the buffer with `symbol` substituted at `position`
    pub fn candidate(&self, position: usize, symbol: char) -> String {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| if i == position { symbol } else { s.unwrap_or(self.placeholder) })
            .collect()
    }

    /// Probe request for `symbol` at `position`
    pub fn request(&self, position: usize, symbol: char) -> ProbeRequest {
        ProbeRequest::new(position, symbol, self.candidate(position, symbol))
    }

    /// Baseline request: the placeholder at `position`, i.e. a known-wrong guess
    pub fn baseline(&self, position: usize) -> ProbeRequest {
        self.request(position, self.placeholder)
    }

    /// Record a confirmed symbol. Returns false (and changes nothing) when
    /// the slot is out of range or already resolved.
    pub fn commit(&mut self, position: usize, symbol: char) -> bool {
        match self.slots.get_mut(position) {
            Some(slot) if slot.is_none() => {
                *slot = Some(symbol);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for SecretBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: String = self.slots.iter().map(|s| s.unwrap_or(self.placeholder)).collect();
        write!(f, "{}", rendered)
    }
}

// =============================================================================
// TESTS
// =============================================================================
