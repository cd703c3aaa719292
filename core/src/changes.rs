use bitflags::bitflags;

bitflags! {
    /// What happened to a node since its changes were last cleared.
    ///
    /// Bits only accumulate until cleared, and bits set on a node are also
    /// set on all its owners.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Changes: u8 {
        /// The value changed but every child is where it was.
        const VALUE_CHANGED = 1 << 0;
        /// Children were added or removed, or a child's type changed.
        const STRUCTURE_CHANGED = 1 << 1;
        const SOMETHING_CHANGED = Self::VALUE_CHANGED.bits() | Self::STRUCTURE_CHANGED.bits();
    }
}

impl Changes {
    pub const NOTHING_CHANGED: Changes = Changes::empty();
}
