//! Fixed-capacity experience ring
use super::Transition;
use std::ops::Index;

/// Index-addressed ring of transitions.
///
/// Holds exactly `num_rollout_steps + 1` entries per training iteration: one
/// bootstrap entry carried over from the previous rollout's final step,
/// followed by the freshly gathered steps. The ring is allocated once per
/// training run and pre-filled so that every iteration starts aligned at
/// index 0.
#[derive(Debug, Clone)]
pub struct ExperienceBuffer {
    entries: Vec<Transition>,
    next_idx: usize,
}

impl ExperienceBuffer {
    /// Create a buffer with every slot holding a copy of `initial`.
    ///
    /// # Panics
    /// If `capacity < 2`; a rollout needs the bootstrap entry plus at least
    /// one gathered step.
    #[must_use]
    pub fn prefilled(capacity: usize, initial: Transition) -> Self {
        assert!(capacity >= 2, "capacity must hold a bootstrap entry plus a step");
        Self {
            entries: vec![initial; capacity],
            next_idx: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Index of the next slot to be written.
    #[must_use]
    pub const fn next_idx(&self) -> usize {
        self.next_idx
    }

    /// Index of the most recently written slot.
    #[must_use]
    pub fn last_written_idx(&self) -> usize {
        (self.next_idx + self.capacity() - 1) % self.capacity()
    }

    /// The most recently written transition.
    #[must_use]
    pub fn last_written(&self) -> &Transition {
        &self.entries[self.last_written_idx()]
    }

    /// Store a transition at the write index and advance it, wrapping.
    pub fn store(&mut self, transition: Transition) {
        let idx = self.next_idx;
        self.entries[idx] = transition;
        self.next_idx = (idx + 1) % self.capacity();
    }

    /// Copy the final entry of the previous rollout into slot 0 as the
    /// bootstrap entry for the next one.
    ///
    /// # Panics
    /// If the buffer is not aligned at a rollout boundary.
    pub fn last_becomes_first(&mut self) {
        assert_eq!(self.next_idx, 0, "rollout entered with a misaligned buffer");
        self.entries[0] = self.entries[self.capacity() - 1].clone();
        self.next_idx = 1;
    }

    /// Iterator over the entries in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Transition> {
        self.entries.iter()
    }
}

impl Index<usize> for ExperienceBuffer {
    type Output = Transition;

    fn index(&self, index: usize) -> &Transition {
        &self.entries[index]
    }
}

impl<'a> IntoIterator for &'a ExperienceBuffer {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{AgentStep, EnvStep};
    use super::*;
    use tch::Tensor;

    fn transition(marker: f64) -> Transition {
        Transition {
            env: EnvStep {
                observation: Tensor::of_slice(&[marker]),
                reward: Tensor::of_slice(&[marker]),
                done: Tensor::of_slice(&[0_i64]),
            },
            agent: AgentStep {
                action: Tensor::of_slice(&[0_i64]),
                value: Tensor::of_slice(&[marker]),
            },
        }
    }

    fn marker(t: &Transition) -> f64 {
        t.env.reward.double_value(&[0])
    }

    #[test]
    fn prefill_aligns_the_ring() {
        let buffer = ExperienceBuffer::prefilled(5, transition(0.0));
        assert_eq!(buffer.capacity(), 5);
        assert_eq!(buffer.next_idx(), 0);
        assert_eq!(buffer.last_written_idx(), 4);
    }

    #[test]
    fn rollout_lifecycle_keeps_one_bootstrap_entry() {
        let num_rollout_steps = 3;
        let mut buffer = ExperienceBuffer::prefilled(num_rollout_steps + 1, transition(7.0));

        for iteration in 0..2_usize {
            buffer.last_becomes_first();
            for step in 0..num_rollout_steps {
                buffer.store(transition((10 * iteration + step) as f64));
            }
            assert_eq!(buffer.next_idx(), 0);
            assert_eq!(buffer.last_written_idx(), num_rollout_steps);
        }

        // Slot 0 carries the final entry of the first iteration.
        assert_eq!(marker(&buffer[0]), 2.0);
        assert_eq!(marker(&buffer[3]), 12.0);
    }

    #[test]
    #[should_panic(expected = "misaligned")]
    fn mid_rollout_boundary_is_a_contract_violation() {
        let mut buffer = ExperienceBuffer::prefilled(3, transition(0.0));
        buffer.last_becomes_first();
        buffer.last_becomes_first();
    }

    #[test]
    #[should_panic(expected = "bootstrap")]
    fn capacity_must_fit_a_step() {
        let _ = ExperienceBuffer::prefilled(1, transition(0.0));
    }
}
