use crate::models::Sticker;

/// Monotonic stacking counter. Each board owns one, so separate editors never
/// share stacking state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZCounter {
    current: u64,
}

impl ZCounter {
    pub fn starting_at(floor: u64) -> Self {
        Self { current: floor }
    }

    /// Starts above every sticker already present, and never below `floor`.
    pub fn seeded(floor: u64, stickers: &[Sticker]) -> Self {
        let highest = stickers.iter().map(|sticker| sticker.z).max().unwrap_or(0);
        Self {
            current: floor.max(highest),
        }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    /// Hands out the next z, strictly above anything handed out or observed.
    pub fn bump(&mut self) -> u64 {
        self.current = self.current.saturating_add(1);
        self.current
    }

    /// Raises the counter past a z that arrived from outside.
    pub fn observe(&mut self, z: u64) {
        self.current = self.current.max(z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sticker(z: u64) -> Sticker {
        Sticker {
            id: format!("s-{}", z),
            url: String::new(),
            x: 0.0,
            y: 0.0,
            width: 40.0,
            height: 40.0,
            angle: 0,
            z,
        }
    }

    #[test]
    fn seeds_above_existing_stickers() {
        assert_eq!(ZCounter::seeded(1000, &[]).current(), 1000);
        assert_eq!(ZCounter::seeded(1000, &[sticker(3), sticker(1500)]).current(), 1500);
    }

    #[test]
    fn bumps_are_strictly_increasing() {
        let mut counter = ZCounter::starting_at(1000);
        let handed_out: Vec<u64> = (0..5).map(|_| counter.bump()).collect();
        assert_eq!(handed_out, vec![1001, 1002, 1003, 1004, 1005]);

        counter.observe(2000);
        assert_eq!(counter.bump(), 2001);
        counter.observe(10);
        assert_eq!(counter.bump(), 2002);
    }
}
