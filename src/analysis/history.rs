use std::collections::VecDeque;

/// Fixed-capacity sliding window; pushing past capacity drops the oldest value.
#[derive(Clone, Debug)]
pub struct Window {
    values: VecDeque<f32>,
    capacity: usize,
}

impl Window {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, value: f32) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &f32> + ExactSizeIterator {
        self.values.iter()
    }

    /// The newest `count` values (fewer if the window is shorter), oldest first.
    pub fn last(&self, count: usize) -> impl Iterator<Item = &f32> {
        let skip = self.values.len().saturating_sub(count);
        self.values.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

/// Trailing per-frame values used for adaptive thresholds.
#[derive(Clone, Debug)]
pub struct History {
    pub energy: Window,
    pub bass: Window,
    pub spectral_centroid: Window,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            energy: Window::new(capacity),
            bass: Window::new(capacity),
            spectral_centroid: Window::new(capacity),
        }
    }

    pub fn record(&mut self, energy: f32, bass: f32, spectral_centroid: f32) {
        self.energy.push(energy);
        self.bass.push(bass);
        self.spectral_centroid.push(spectral_centroid);
    }

    pub fn clear(&mut self) {
        self.energy.clear();
        self.bass.clear();
        self.spectral_centroid.clear();
    }
}
