use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::AnalyzerError;

/// The six fixed frequency regions, in ascending bin order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BandName {
    SubBass,
    Bass,
    LowMid,
    Mid,
    HighMid,
    Treble,
}

impl BandName {
    pub const ALL: [BandName; 6] = [
        BandName::SubBass,
        BandName::Bass,
        BandName::LowMid,
        BandName::Mid,
        BandName::HighMid,
        BandName::Treble,
    ];

    /// Bin range `[start, end)` of this band in the snapshot.
    pub const fn range(self) -> (usize, usize) {
        match self {
            BandName::SubBass => (0, 10),
            BandName::Bass => (10, 40),
            BandName::LowMid => (40, 70),
            BandName::Mid => (70, 150),
            BandName::HighMid => (150, 250),
            BandName::Treble => (250, 512),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            BandName::SubBass => "subBass",
            BandName::Bass => "bass",
            BandName::LowMid => "lowMid",
            BandName::Mid => "mid",
            BandName::HighMid => "highMid",
            BandName::Treble => "treble",
        }
    }
}

/// Number of snapshot bins the band table covers.
pub const BAND_TABLE_END: usize = BandName::Treble.range().1;

impl fmt::Display for BandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BandName {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BandName::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| AnalyzerError::UnknownBand(s.to_string()))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Band {
    #[serde(skip)]
    pub name: BandName,
    pub start: usize,
    pub end: usize,
    /// Mean magnitude of the band, 0.0-1.0
    pub value: f32,
    /// Loudest bin of the band, 0.0-1.0
    pub peak: f32,
    /// Exponential moving average of `value`
    pub average: f32,
}

impl Band {
    fn new(name: BandName) -> Self {
        let (start, end) = name.range();
        Self {
            name,
            start,
            end,
            value: 0.0,
            peak: 0.0,
            average: 0.0,
        }
    }

    fn aggregate(&mut self, snapshot: &[u8], decay: f32) {
        let bins = &snapshot[self.start..self.end];
        let sum: u32 = bins.iter().map(|&v| v as u32).sum();
        let max = bins.iter().copied().max().unwrap_or(0);

        self.value = sum as f32 / bins.len() as f32 / 255.0;
        self.peak = max as f32 / 255.0;
        self.average = self.average * decay + self.value * (1.0 - decay);
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bands {
    pub sub_bass: Band,
    pub bass: Band,
    pub low_mid: Band,
    pub mid: Band,
    pub high_mid: Band,
    pub treble: Band,
}

impl Default for Bands {
    fn default() -> Self {
        Self {
            sub_bass: Band::new(BandName::SubBass),
            bass: Band::new(BandName::Bass),
            low_mid: Band::new(BandName::LowMid),
            mid: Band::new(BandName::Mid),
            high_mid: Band::new(BandName::HighMid),
            treble: Band::new(BandName::Treble),
        }
    }
}

impl Bands {
    pub fn get(&self, name: BandName) -> &Band {
        match name {
            BandName::SubBass => &self.sub_bass,
            BandName::Bass => &self.bass,
            BandName::LowMid => &self.low_mid,
            BandName::Mid => &self.mid,
            BandName::HighMid => &self.high_mid,
            BandName::Treble => &self.treble,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Band> {
        [
            &self.sub_bass,
            &self.bass,
            &self.low_mid,
            &self.mid,
            &self.high_mid,
            &self.treble,
        ]
        .into_iter()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Band> {
        [
            &mut self.sub_bass,
            &mut self.bass,
            &mut self.low_mid,
            &mut self.mid,
            &mut self.high_mid,
            &mut self.treble,
        ]
        .into_iter()
    }

    /// Reduce each band range of `snapshot` to value/peak and fold the value
    /// into the running average. `snapshot` must cover `BAND_TABLE_END` bins.
    pub fn aggregate(&mut self, snapshot: &[u8], decay: f32) {
        debug_assert!(snapshot.len() >= BAND_TABLE_END);
        for band in self.iter_mut() {
            band.aggregate(snapshot, decay);
        }
    }

    pub fn reset_averages(&mut self) {
        for band in self.iter_mut() {
            band.average = 0.0;
        }
    }
}
