// SPDX-License-Identifier: MIT

/// Trait implemented by each FS-specific Meta structure.
/// Provides access to the static geometry needed while checking.
pub trait FsMeta<Unit: Ord + Copy> {
    /// Size of one allocation unit in bytes.
    fn unit_size(&self) -> usize;

    /// Compute the offset (in bytes) on disk corresponding to a given allocation unit.
    fn unit_offset(&self, unit: Unit) -> u64;

    /// Root unit (root inode).
    fn root_unit(&self) -> Unit;

    /// First unit of the data region.
    fn first_data_unit(&self) -> Unit;

    /// Last valid unit of the data region.
    fn last_data_unit(&self) -> Unit;

    /// Total number of units described by the image.
    fn total_units(&self) -> usize;

    /// Total size in bytes of the FS.
    fn size_bytes(&self) -> u64;

    /// Check if a given unit lies in the data region.
    fn is_valid_unit(&self, unit: Unit) -> bool {
        unit >= self.first_data_unit() && unit <= self.last_data_unit()
    }
}
