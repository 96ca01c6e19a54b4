//! Preview of the tool tip trajectory.

use glam::DVec3;

/// Tool tip positions in the stock frame, one per toolpath pose, plus how
/// many of them the simulation has reached.
#[derive(Clone, Debug, Default)]
pub struct Backplot {
    points: Vec<DVec3>,
    steps: usize,
}

impl Backplot {
    pub fn new(points: Vec<DVec3>) -> Self {
        Self { points, steps: 0 }
    }

    /// Replace the trajectory and restart from the first point.
    pub fn set_points(&mut self, points: Vec<DVec3>) {
        self.points = points;
        self.steps = 0;
    }

    #[inline]
    pub fn points(&self) -> &[DVec3] {
        &self.points
    }

    /// Points already visited
    #[inline]
    pub fn visited(&self) -> &[DVec3] {
        &self.points[..self.steps]
    }

    /// Points still ahead of the tool
    #[inline]
    pub fn remaining(&self) -> &[DVec3] {
        &self.points[self.steps..]
    }

    #[inline]
    pub const fn steps(&self) -> usize {
        self.steps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Advance by `n` visited points, stopping at the last one.
    pub fn incr_steps(&mut self, n: usize) {
        self.steps = self.steps.saturating_add(n).min(self.points.len());
    }

    pub fn reset_steps(&mut self) {
        self.steps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_stop_at_end() {
        let mut plot = Backplot::new(vec![DVec3::ZERO, DVec3::X, DVec3::Y]);
        plot.incr_steps(2);
        assert_eq!(plot.visited(), &[DVec3::ZERO, DVec3::X]);
        assert_eq!(plot.remaining(), &[DVec3::Y]);

        plot.incr_steps(10);
        assert_eq!(plot.steps(), 3);
        assert!(plot.remaining().is_empty());

        plot.reset_steps();
        assert_eq!(plot.visited().len(), 0);
    }

    #[test]
    fn set_points_restarts() {
        let mut plot = Backplot::new(vec![DVec3::ZERO]);
        plot.incr_steps(1);
        plot.set_points(vec![DVec3::ONE, DVec3::NEG_ONE]);
        assert_eq!(plot.steps(), 0);
        assert_eq!(plot.len(), 2);
    }
}
