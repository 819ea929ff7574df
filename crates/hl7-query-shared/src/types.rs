//! Types for the shared structure.

/// Statistics about shared structure usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SharedStats {
    /// Number of read sections run.
    pub reads: u64,
    /// Number of write sections run.
    pub writes: u64,
    /// Index rebuilds triggered by reads.
    pub refreshes: u64,
}

impl SharedStats {
    /// Returns the share of reads served without a rebuild, as a
    /// percentage.
    pub fn fresh_read_rate(&self) -> f64 {
        if self.reads == 0 {
            0.0
        } else {
            (self.reads.saturating_sub(self.refreshes) as f64 / self.reads as f64) * 100.0
        }
    }
}

impl std::fmt::Display for SharedStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Shared Structure Statistics:")?;
        writeln!(f, "  Reads:           {}", self.reads)?;
        writeln!(f, "  Writes:          {}", self.writes)?;
        writeln!(f, "  Refreshes:       {}", self.refreshes)?;
        write!(f, "  Fresh reads:     {:.1}%", self.fresh_read_rate())
    }
}
