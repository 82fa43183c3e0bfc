//! Permission flags carried by roles.
//!
//! Bit values are part of the wire contract and must never be renumbered.
//! Bits with no named flag are preserved in storage but never grant anything.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Flags in a role's server mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ServerFlags: i64 {
        const MANAGE_CHANNELS  = 1 << 0;
        const MANAGE_ROLES     = 1 << 1;
        const MANAGE_APPSERVER = 1 << 2;
    }
}

bitflags! {
    /// Flags in a role's subscription mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SubFlags: i64 {
        const MANAGE_SUBS = 1 << 0;
    }
}

/// Aggregated masks for one user on one server.
///
/// The channel mask has no named flags yet; it is kept raw so that the
/// aggregate stays lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PermissionMask {
    pub server: ServerFlags,
    pub channel: i64,
    pub sub: SubFlags,
}

impl PermissionMask {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a mask from raw stored bit patterns, dropping unknown bits.
    pub fn from_raw(server_mask: i64, channel_mask: i64, sub_mask: i64) -> Self {
        Self {
            server: ServerFlags::from_bits_truncate(server_mask),
            channel: channel_mask,
            sub: SubFlags::from_bits_truncate(sub_mask),
        }
    }

    /// Bitwise OR of two masks.
    pub fn union(self, other: Self) -> Self {
        Self {
            server: self.server | other.server,
            channel: self.channel | other.channel,
            sub: self.sub | other.sub,
        }
    }

    pub fn has_server(&self, flag: ServerFlags) -> bool {
        self.server.contains(flag)
    }

    pub fn has_sub(&self, flag: SubFlags) -> bool {
        self.sub.contains(flag)
    }
}

impl FromIterator<PermissionMask> for PermissionMask {
    fn from_iter<I: IntoIterator<Item = PermissionMask>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_are_stable() {
        assert_eq!(ServerFlags::MANAGE_CHANNELS.bits(), 0x1);
        assert_eq!(ServerFlags::MANAGE_ROLES.bits(), 0x2);
        assert_eq!(ServerFlags::MANAGE_APPSERVER.bits(), 0x4);
        assert_eq!(SubFlags::MANAGE_SUBS.bits(), 0x1);
    }

    #[test]
    fn unknown_bits_are_ignored() {
        let mask = PermissionMask::from_raw(0x2 | 0x100, 0, 0x40);
        assert_eq!(mask.server, ServerFlags::MANAGE_ROLES);
        assert!(mask.sub.is_empty());
    }

    #[test]
    fn masks_aggregate_with_or() {
        let a = PermissionMask::from_raw(0x1, 0x8, 0);
        let b = PermissionMask::from_raw(0x2, 0x1, 0x1);
        let all: PermissionMask = [a, b].into_iter().collect();

        assert!(all.has_server(ServerFlags::MANAGE_CHANNELS));
        assert!(all.has_server(ServerFlags::MANAGE_ROLES));
        assert!(!all.has_server(ServerFlags::MANAGE_APPSERVER));
        assert!(all.has_sub(SubFlags::MANAGE_SUBS));
        assert_eq!(all.channel, 0x9);
    }

    #[test]
    fn empty_iterator_yields_zero_mask() {
        let none: PermissionMask = std::iter::empty().collect();
        assert_eq!(none, PermissionMask::empty());
    }
}
