//! The environment: `(frame, register) -> memory slot` mapping

use std::collections::HashMap;
use tnac_ir::RegId;

/// Maps SSA registers to their runtime slot in a specific frame
/// incarnation
#[derive(Debug, Default)]
pub struct Env {
    map: HashMap<(u64, RegId), usize>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&mut self, frame_no: u64, reg: RegId, slot: usize) {
        self.map.insert((frame_no, reg), slot);
    }

    pub fn find(&self, frame_no: u64, reg: RegId) -> Option<usize> {
        self.map.get(&(frame_no, reg)).copied()
    }

    /// Drops every mapping belonging to a popped frame
    pub fn remove_frame(&mut self, frame_no: u64) {
        self.map.retain(|(no, _), _| *no != frame_no);
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mappings_are_per_frame() {
        let mut env = Env::new();
        env.map(0, RegId(1), 5);
        env.map(1, RegId(1), 7);
        assert_eq!(env.find(0, RegId(1)), Some(5));
        assert_eq!(env.find(1, RegId(1)), Some(7));
        env.remove_frame(0);
        assert_eq!(env.find(0, RegId(1)), None);
        assert_eq!(env.find(1, RegId(1)), Some(7));
    }
}
