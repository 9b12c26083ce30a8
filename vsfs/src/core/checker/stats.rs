// SPDX-License-Identifier: MIT

/// Counters collected during a directory walk.
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkerStats {
    pub dirs_visited: usize,
    pub files_found: usize,
    pub entries_scanned: usize,
    /// Directory data blocks decoded.
    pub blocks_read: usize,
}
