use std::collections::BTreeMap;

/// Result of a single inference call.
///
/// Besides the crisp values it keeps the intermediate state of the call (rule
/// firing strengths and aggregated output sets) for inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct Outputs {
    crisp: BTreeMap<String, f64>,
    aggregated: BTreeMap<String, Vec<f64>>,
    firing_strengths: Vec<f64>,
}

impl Outputs {
    pub(crate) fn new(
        crisp: BTreeMap<String, f64>,
        aggregated: BTreeMap<String, Vec<f64>>,
        firing_strengths: Vec<f64>,
    ) -> Self {
        Self {
            crisp,
            aggregated,
            firing_strengths,
        }
    }

    /// Defuzzified value of output variable `name`
    pub fn get(&self, name: &str) -> Option<f64> {
        self.crisp.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.crisp.iter().map(|(name, val)| (name.as_str(), *val))
    }

    /// Aggregated fuzzy set of `name`, one degree per universe sample
    pub fn aggregated(&self, name: &str) -> Option<&[f64]> {
        self.aggregated.get(name).map(Vec::as_slice)
    }

    /// Firing strength of each rule, in rule order
    pub fn firing_strengths(&self) -> &[f64] {
        &self.firing_strengths
    }
}
