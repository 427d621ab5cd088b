//! The power-grid anomaly model: three inputs, one severity output, five
//! rules. Built once and shared by every caller.

use tracing::debug;

use crate::error::{FuzzyError, Result};
use crate::inference::{InferenceEngine, Operators};
use crate::inputs::Inputs;
use crate::rules::Rules;
use crate::severity::Reading;
use crate::terms::Terms;
use crate::universe::Universe;
use crate::variable::Variables;

pub const VOLTAGE: &str = "VoltageDeviation";
pub const FREQUENCY: &str = "FrequencyVariation";
pub const LOAD: &str = "LoadImbalance";
pub const SEVERITY: &str = "Severity";

#[derive(Clone, Debug)]
pub struct GridModel {
    engine: InferenceEngine,
}

impl GridModel {
    pub fn new() -> Result<Self> {
        Self::with_operators(Operators::default())
    }

    pub fn with_operators(ops: Operators) -> Result<Self> {
        let mut vars = Variables::new();

        let mut terms = Terms::with_capacity(3);
        terms.triangle("Low", 0., 0., 6.)?;
        terms.triangle("Medium", 5., 10., 15.)?;
        terms.triangle("High", 13., 20., 20.)?;
        let voltage = vars.add_input(VOLTAGE, Universe::new(0., 20., 1.)?, terms)?;

        let mut terms = Terms::with_capacity(3);
        terms.triangle("Stable", 0., 0., 0.4)?;
        terms.triangle("SlightlyUnstable", 0.3, 0.7, 1.5)?;
        terms.triangle("Unstable", 1.4, 2., 2.)?;
        let frequency = vars.add_input(FREQUENCY, Universe::new(0., 2., 0.1)?, terms)?;

        let mut terms = Terms::with_capacity(3);
        terms.triangle("Balanced", 0., 0., 25.)?;
        terms.triangle("SlightlyUnbalanced", 20., 50., 80.)?;
        terms.triangle("Unbalanced", 75., 100., 100.)?;
        let load = vars.add_input(LOAD, Universe::new(0., 100., 1.)?, terms)?;

        let mut terms = Terms::with_capacity(3);
        terms.triangle("Low", 0., 0., 30.)?;
        terms.triangle("Moderate", 20., 50., 80.)?;
        terms.triangle("High", 70., 100., 100.)?;
        let severity = vars.add_output(SEVERITY, Universe::new(0., 100., 1.)?, terms)?;

        let mut rules = Rules::with_capacity(5);

        rules.add(
            voltage.is("High") & frequency.is("Unstable") & load.is("Unbalanced"),
            severity.is("High"),
        );
        rules.add(
            voltage.is("Medium") & frequency.is("SlightlyUnstable"),
            severity.is("Moderate"),
        );
        rules.add(
            voltage.is("Low") & frequency.is("Stable") & load.is("Balanced"),
            severity.is("Low"),
        );
        rules.add(
            voltage.is("High") | frequency.is("SlightlyUnstable") | load.is("SlightlyUnbalanced"),
            severity.is("Moderate"),
        );
        rules.add(voltage.is("Low") & frequency.is("Stable"), severity.is("Low"));

        let engine = InferenceEngine::with_operators(vars, rules, ops)?;

        debug!(?ops, "grid model ready");

        Ok(Self { engine })
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Crisp severity score in [0, 100] for `reading`. Range checks are the
    /// caller's job, see [`Reading::validate`].
    pub fn severity(&self, reading: &Reading) -> Result<f64> {
        let mut inputs = Inputs::new();

        inputs.add(VOLTAGE, reading.voltage);
        inputs.add(FREQUENCY, reading.frequency);
        inputs.add(LOAD, reading.load);

        self.engine
            .infer(&inputs)?
            .get(SEVERITY)
            .ok_or_else(|| FuzzyError::UnknownVariable { name: SEVERITY.into() })
    }
}

#[test]
fn test_grid_model_layout() {
    let model = GridModel::new().unwrap();
    let vars = model.engine().variables();

    assert_eq!(vars.len(), 4);
    assert_eq!(vars.by_name(FREQUENCY).unwrap().universe().len(), 21);
    assert_eq!(vars.by_name(SEVERITY).unwrap().universe().len(), 101);
    assert_eq!(model.engine().rules().len(), 5);
    assert_eq!(model.engine().output_names().collect::<Vec<_>>(), [SEVERITY]);
}

#[test]
fn test_grid_model_firing() {
    let model = GridModel::new().unwrap();
    let inputs: Inputs = [(VOLTAGE, 10.), (FREQUENCY, 0.7), (LOAD, 50.)].into_iter().collect();
    let outputs = model.engine().infer(&inputs).unwrap();

    assert_eq!(outputs.firing_strengths(), &[0., 1., 0., 1., 0.]);
    assert_eq!(outputs.get(SEVERITY), Some(50.));
}
