use std::{collections::BTreeMap, fmt};

/// Names of the diagnostic series a controller can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Series {
    Sigma,
    Control,
    EquivalentControl,
    Gain,
    GainRate,
    K1,
    K2,
    Integral,
}

impl Series {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sigma => "sigma",
            Self::Control => "u",
            Self::EquivalentControl => "u_eq",
            Self::Gain => "gain",
            Self::GainRate => "gain_rate",
            Self::K1 => "k1",
            Self::K2 => "k2",
            Self::Integral => "integral",
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Append-only diagnostic time series, one value per control step.
///
/// Owned by the caller and passed by value through
/// [`compute_control`](crate::SlidingModeController::compute_control), which
/// returns it with the new samples appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    series: BTreeMap<Series, Vec<f64>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history with the given series present but empty.
    #[must_use]
    pub fn with_series(names: &[Series]) -> Self {
        Self {
            series: names.iter().map(|&name| (name, Vec::new())).collect(),
        }
    }

    pub fn record(&mut self, name: Series, value: f64) {
        self.series.entry(name).or_default().push(value);
    }

    /// Samples recorded for `name`, empty if it was never recorded.
    #[must_use]
    pub fn get(&self, name: Series) -> &[f64] {
        self.series.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn last(&self, name: Series) -> Option<f64> {
        self.get(name).last().copied()
    }

    #[must_use]
    pub fn contains(&self, name: Series) -> bool {
        self.series.contains_key(&name)
    }

    /// Iterates over the recorded series in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (Series, &[f64])> {
        self.series.iter().map(|(&name, values)| (name, values.as_slice()))
    }
}
