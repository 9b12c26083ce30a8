// SPDX-License-Identifier: MIT

/// Per-inode reference counts gathered by the directory walk.
#[derive(Debug, Clone)]
pub struct RefTally {
    /// Entries naming the inode, `.` and `..` included.
    pub referenced: Vec<u32>,
    /// Entries naming the inode when it is a regular file.
    pub file_refs: Vec<u32>,
    /// Entries naming the inode when it is a directory, `.`/`..` slots excluded.
    pub dir_links: Vec<u32>,
    /// First directory seen holding an entry for the inode (0 = none).
    pub referrer: Vec<u32>,
}

impl RefTally {
    pub fn new(inode_count: usize) -> Self {
        Self {
            referenced: vec![0; inode_count],
            file_refs: vec![0; inode_count],
            dir_links: vec![0; inode_count],
            referrer: vec![0; inode_count],
        }
    }

    /// Counts one entry of directory `dir` naming `inum`.
    #[inline]
    pub fn reference(&mut self, dir: u32, inum: u32) {
        let i = inum as usize;
        self.referenced[i] += 1;
        if self.referrer[i] == 0 {
            self.referrer[i] = dir;
        }
    }

    #[inline]
    pub fn referenced(&self, inum: u32) -> u32 {
        self.referenced.get(inum as usize).copied().unwrap_or(0)
    }
}
