use super::{Pattern, WipeMethod};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry of a method's pass schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPass {
    pub pattern: Pattern,
    /// 1-based position in the schedule
    pub index: usize,
    pub total: usize,
}

impl ScheduledPass {
    pub fn is_final(&self) -> bool {
        self.index == self.total
    }
}

impl fmt::Display for ScheduledPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pass {}/{} ({})", self.index, self.total, self.pattern)
    }
}

/// Ordered pass list for a method
pub fn schedule_for(method: WipeMethod) -> Vec<ScheduledPass> {
    let patterns = method.patterns();
    let total = patterns.len();

    patterns
        .iter()
        .enumerate()
        .map(|(i, &pattern)| ScheduledPass {
            pattern,
            index: i + 1,
            total,
        })
        .collect()
}
