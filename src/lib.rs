//! Mamdani fuzzy inference, applied to scoring the severity of power-grid
//! anomalies.
//!
//! The generic engine lives in [`InferenceEngine`]: triangular membership
//! functions over discretized universes, min/max rule premises, clipping
//! implication, max aggregation and centroid defuzzification. [`grid`] holds
//! the one shared power-grid configuration and [`severity`] turns its crisp
//! score into a severity level and an action.
//!
//! ```
//! use grid_severity::{Inputs, InferenceEngine, Rules, Terms, Universe, Variables};
//!
//! let mut terms = Terms::new();
//! terms.triangle("Low", 0., 0., 10.)?;
//! terms.triangle("High", 0., 10., 10.)?;
//!
//! let mut vars = Variables::new();
//! let load = vars.add_input("load", Universe::new(0., 10., 1.)?, terms.clone())?;
//! let alarm = vars.add_output("alarm", Universe::new(0., 10., 1.)?, terms)?;
//!
//! let mut rules = Rules::new();
//! rules.add(load.is("High"), alarm.is("High"));
//!
//! let engine = InferenceEngine::new(vars, rules)?;
//! let mut inputs = Inputs::new();
//! inputs.add("load", 10.);
//!
//! assert_eq!(engine.infer(&inputs)?.get("alarm"), Some(7.));
//! # Ok::<(), grid_severity::FuzzyError>(())
//! ```

mod dsl;
mod error;
mod inference;
mod inputs;
mod linspace;
mod math;
mod ops;
mod outputs;
mod rules;
mod terms;
mod universe;
mod variable;

pub mod config;
pub mod grid;
pub mod severity;

pub use dsl::Expr;
pub use error::{FuzzyError, Result};
pub use inference::{InferenceEngine, Operators};
pub use inputs::Inputs;
pub use ops::{AndOp, DefuzzificationOp, ImplicationOp, OrOp, ProductionLink};
pub use outputs::Outputs;
pub use rules::{Rule, Rules};
pub use terms::{Terms, TriangularMf};
pub use universe::Universe;
pub use variable::{LinguisticVariable, Role, Variable, VariableKey, Variables};
