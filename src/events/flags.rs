//! Event flag registry and decoded flag masks.
//!
//! Every event line carries a 32-bit mask. [`FlagValue`] is that mask as a
//! `bitflags` set; [`EventFlag`] is the closed list of registry names over
//! its constants. Registry order is observable through [`FlagValue::active`]
//! and the `Display` output, so constants must stay in declaration order.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Serialize, Serializer};

/// Error returned when parsing an unknown flag name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown event flag: {0}")]
pub struct UnknownFlag(pub String);

bitflags! {
    /// A decoded 32-bit event mask.
    ///
    /// Any integer is a valid mask. Bits outside the registry are retained
    /// and available through [`FlagValue::unknown_bits`], but never named.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FlagValue: u32 {
        /// Events were coalesced; rescan the directory tree.
        const MUST_SCAN_SUB_DIRS = 0x0000_0001;
        /// Events were dropped in user space.
        const USER_DROPPED = 0x0000_0002;
        /// Events were dropped by the kernel.
        const KERNEL_DROPPED = 0x0000_0004;
        /// The event id counter wrapped around.
        const EVENT_IDS_WRAPPED = 0x0000_0008;
        /// Marks the end of replayed history when resuming from an id.
        const HISTORY_DONE = 0x0000_0010;
        /// A watched root path changed.
        const ROOT_CHANGED = 0x0000_0020;
        /// A volume was mounted below a watched path.
        const MOUNT = 0x0000_0040;
        /// A volume was unmounted below a watched path.
        const UNMOUNT = 0x0000_0080;
        const ITEM_CREATED = 0x0000_0100;
        const ITEM_REMOVED = 0x0000_0200;
        const ITEM_INODE_META_MOD = 0x0000_0400;
        const ITEM_RENAMED = 0x0000_0800;
        const ITEM_MODIFIED = 0x0000_1000;
        const ITEM_FINDER_INFO_MOD = 0x0000_2000;
        const ITEM_CHANGE_OWNER = 0x0000_4000;
        const ITEM_XATTR_MOD = 0x0000_8000;
        const ITEM_IS_FILE = 0x0001_0000;
        const ITEM_IS_DIR = 0x0002_0000;
        const ITEM_IS_SYMLINK = 0x0004_0000;
    }
}

/// Named bits of the event flag registry, in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventFlag {
    MustScanSubDirs,
    UserDropped,
    KernelDropped,
    EventIdsWrapped,
    HistoryDone,
    RootChanged,
    Mount,
    Unmount,
    ItemCreated,
    ItemRemoved,
    ItemInodeMetaMod,
    ItemRenamed,
    ItemModified,
    ItemFinderInfoMod,
    ItemChangeOwner,
    ItemXattrMod,
    ItemIsFile,
    ItemIsDir,
    ItemIsSymlink,
}

impl EventFlag {
    /// Every registered flag, in registry-declaration order.
    pub const ALL: &'static [EventFlag] = &[
        EventFlag::MustScanSubDirs,
        EventFlag::UserDropped,
        EventFlag::KernelDropped,
        EventFlag::EventIdsWrapped,
        EventFlag::HistoryDone,
        EventFlag::RootChanged,
        EventFlag::Mount,
        EventFlag::Unmount,
        EventFlag::ItemCreated,
        EventFlag::ItemRemoved,
        EventFlag::ItemInodeMetaMod,
        EventFlag::ItemRenamed,
        EventFlag::ItemModified,
        EventFlag::ItemFinderInfoMod,
        EventFlag::ItemChangeOwner,
        EventFlag::ItemXattrMod,
        EventFlag::ItemIsFile,
        EventFlag::ItemIsDir,
        EventFlag::ItemIsSymlink,
    ];

    /// The mask constant this flag names.
    #[must_use]
    pub const fn flag(self) -> FlagValue {
        match self {
            EventFlag::MustScanSubDirs => FlagValue::MUST_SCAN_SUB_DIRS,
            EventFlag::UserDropped => FlagValue::USER_DROPPED,
            EventFlag::KernelDropped => FlagValue::KERNEL_DROPPED,
            EventFlag::EventIdsWrapped => FlagValue::EVENT_IDS_WRAPPED,
            EventFlag::HistoryDone => FlagValue::HISTORY_DONE,
            EventFlag::RootChanged => FlagValue::ROOT_CHANGED,
            EventFlag::Mount => FlagValue::MOUNT,
            EventFlag::Unmount => FlagValue::UNMOUNT,
            EventFlag::ItemCreated => FlagValue::ITEM_CREATED,
            EventFlag::ItemRemoved => FlagValue::ITEM_REMOVED,
            EventFlag::ItemInodeMetaMod => FlagValue::ITEM_INODE_META_MOD,
            EventFlag::ItemRenamed => FlagValue::ITEM_RENAMED,
            EventFlag::ItemModified => FlagValue::ITEM_MODIFIED,
            EventFlag::ItemFinderInfoMod => FlagValue::ITEM_FINDER_INFO_MOD,
            EventFlag::ItemChangeOwner => FlagValue::ITEM_CHANGE_OWNER,
            EventFlag::ItemXattrMod => FlagValue::ITEM_XATTR_MOD,
            EventFlag::ItemIsFile => FlagValue::ITEM_IS_FILE,
            EventFlag::ItemIsDir => FlagValue::ITEM_IS_DIR,
            EventFlag::ItemIsSymlink => FlagValue::ITEM_IS_SYMLINK,
        }
    }

    /// The single bit this flag occupies.
    #[must_use]
    pub const fn bit(self) -> u32 {
        self.flag().bits()
    }

    /// Registry name of the flag.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EventFlag::MustScanSubDirs => "MustScanSubDirs",
            EventFlag::UserDropped => "UserDropped",
            EventFlag::KernelDropped => "KernelDropped",
            EventFlag::EventIdsWrapped => "EventIdsWrapped",
            EventFlag::HistoryDone => "HistoryDone",
            EventFlag::RootChanged => "RootChanged",
            EventFlag::Mount => "Mount",
            EventFlag::Unmount => "Unmount",
            EventFlag::ItemCreated => "ItemCreated",
            EventFlag::ItemRemoved => "ItemRemoved",
            EventFlag::ItemInodeMetaMod => "ItemInodeMetaMod",
            EventFlag::ItemRenamed => "ItemRenamed",
            EventFlag::ItemModified => "ItemModified",
            EventFlag::ItemFinderInfoMod => "ItemFinderInfoMod",
            EventFlag::ItemChangeOwner => "ItemChangeOwner",
            EventFlag::ItemXattrMod => "ItemXattrMod",
            EventFlag::ItemIsFile => "ItemIsFile",
            EventFlag::ItemIsDir => "ItemIsDir",
            EventFlag::ItemIsSymlink => "ItemIsSymlink",
        }
    }

    /// The registry entry for a single named constant.
    ///
    /// Registry bit `n` is entry `n` of [`EventFlag::ALL`].
    #[must_use]
    pub fn from_flag(flag: FlagValue) -> Option<Self> {
        let index = usize::try_from(flag.bits().trailing_zeros()).ok()?;
        Self::ALL
            .get(index)
            .copied()
            .filter(|entry| entry.flag() == flag)
    }
}

impl fmt::Display for EventFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventFlag {
    type Err = UnknownFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|flag| flag.name() == s)
            .ok_or_else(|| UnknownFlag(s.to_string()))
    }
}

impl FlagValue {
    /// Wrap a raw mask, retaining bits outside the registry.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Returns true if the given flag's bit is set.
    #[must_use]
    pub const fn is_set(self, flag: EventFlag) -> bool {
        self.contains(flag.flag())
    }

    /// Returns true if at least one registered flag is set.
    #[must_use]
    pub const fn has_named(self) -> bool {
        self.intersects(Self::all())
    }

    /// Bits set in the mask that have no registry entry.
    #[must_use]
    pub const fn unknown_bits(self) -> u32 {
        self.difference(Self::all()).bits()
    }

    /// Iterate the set flags in registry-declaration order.
    pub fn active(self) -> impl Iterator<Item = EventFlag> {
        self.iter_names()
            .filter_map(|(_, flag)| EventFlag::from_flag(flag))
    }

    /// Names of the set flags in registry-declaration order.
    #[must_use]
    pub fn active_names(self) -> Vec<&'static str> {
        self.active().map(EventFlag::name).collect()
    }
}

impl Default for FlagValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<u32> for FlagValue {
    fn from(raw: u32) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_named() {
            return f.write_str("-");
        }
        for (i, flag) in self.active().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(flag.name())?;
        }
        Ok(())
    }
}

impl Serialize for FlagValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.active().map(EventFlag::name))
    }
}
