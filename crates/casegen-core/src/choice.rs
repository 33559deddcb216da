use rand::{Rng, RngCore};

/// Fair binary chooser.
///
/// Picks are grouped in rounds of two: the first pick of a round is random,
/// the second is its opposite, so both values are returned before either
/// repeats. `has_next` stays true until both values have been returned at
/// least once since the last reset.
#[derive(Debug, Clone, Default)]
pub struct FairChoice {
    pending: Option<bool>,
    seen_true: bool,
    seen_false: bool,
}

impl FairChoice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, rng: &mut dyn RngCore) -> bool {
        let value = match self.pending.take() {
            Some(value) => value,
            None => {
                let value = rng.random_bool(0.5);
                self.pending = Some(!value);
                value
            }
        };

        if value {
            self.seen_true = true;
        } else {
            self.seen_false = true;
        }
        value
    }

    pub fn has_next(&self) -> bool {
        !(self.seen_true && self.seen_false)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
