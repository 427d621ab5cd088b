use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, trace};

use crate::dsl::Expr;
use crate::error::{FuzzyError, Result};
use crate::inputs::Inputs;
use crate::ops::*;
use crate::outputs::Outputs;
use crate::rules::Rules;
use crate::variable::{LinguisticVariable, Role, VariableKey, Variables};

/// Operator configuration of an engine. The default is plain Mamdani
/// inference: min/max premise logic, clipping, max aggregation and centroid.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operators {
    pub and_op: AndOp,
    pub or_op: OrOp,
    pub imp_op: ImplicationOp,
    pub prod_link: ProductionLink,
    pub defuzz_op: DefuzzificationOp,
}

impl Operators {
    pub fn new(
        and_op: AndOp,
        or_op: OrOp,
        imp_op: ImplicationOp,
        prod_link: ProductionLink,
        defuzz_op: DefuzzificationOp,
    ) -> Self {
        Self {
            and_op,
            or_op,
            imp_op,
            prod_link,
            defuzz_op,
        }
    }
}

/// Immutable fuzzy inference system.
///
/// Variables and rules are validated once, at construction. Each call to
/// [`InferenceEngine::infer`] owns its intermediate state, so one engine can
/// serve any number of threads without locking.
#[derive(Clone, Debug)]
pub struct InferenceEngine {
    vars: Variables,
    rules: Rules,
    ops: Operators,
    // Input variables read by at least one premise
    premise_inputs: Vec<VariableKey>,
    // Output variables named by at least one consequence, first seen first
    outputs: Vec<VariableKey>,
    // Per rule: (index into `outputs`, term index) of each consequent
    consequents: Vec<Vec<(usize, usize)>>,
}

impl InferenceEngine {
    pub fn new(vars: Variables, rules: Rules) -> Result<Self> {
        Self::with_operators(vars, rules, Operators::default())
    }

    pub fn with_operators(vars: Variables, rules: Rules, ops: Operators) -> Result<Self> {
        let mut premise_inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut consequents = Vec::with_capacity(rules.len());

        fn check_role(rule: usize, var: &LinguisticVariable, found: Role) -> Result<()> {
            if var.role() == found {
                return Ok(());
            }

            Err(FuzzyError::RoleMismatch {
                rule,
                variable: var.name().to_owned(),
                found,
                declared: var.role(),
            })
        }

        for (i, rule) in rules.iter().enumerate() {
            if !(0.0..=1.0).contains(&rule.weight) {
                return Err(FuzzyError::InvalidWeight {
                    rule: i,
                    weight: rule.weight,
                });
            }

            for (handle, label) in rule.premise.propositions() {
                let key = handle.key();
                let var = vars.lookup(handle)?;

                check_role(i, var, Role::Input)?;
                var.term_index(label)?;

                if !premise_inputs.contains(&key) {
                    premise_inputs.push(key);
                }
            }

            if rule.consequence.contains_or() {
                return Err(FuzzyError::InvalidConsequence {
                    rule: i,
                    reason: "a consequence can only join propositions with AND",
                });
            }

            let mut rule_consequents = Vec::new();

            for (handle, label) in rule.consequence.propositions() {
                let key = handle.key();
                let var = vars.lookup(handle)?;

                check_role(i, var, Role::Output)?;

                let term = var.term_index(label)?;
                let slot = match outputs.iter().position(|k| *k == key) {
                    Some(slot) => slot,
                    None => {
                        outputs.push(key);
                        outputs.len() - 1
                    },
                };

                rule_consequents.push((slot, term));
            }

            consequents.push(rule_consequents);
        }

        debug!(
            variables = vars.len(),
            rules = rules.len(),
            outputs = outputs.len(),
            "inference engine built"
        );

        Ok(Self {
            vars,
            rules,
            ops,
            premise_inputs,
            outputs,
            consequents,
        })
    }

    pub fn variables(&self) -> &Variables {
        &self.vars
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn operators(&self) -> Operators {
        self.ops
    }

    /// Names of the output variables reachable from the rules
    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|key| self.vars[*key].name())
    }

    /// Runs fuzzification, rule evaluation, implication, aggregation and
    /// defuzzification for every output variable.
    ///
    /// Fails with [`FuzzyError::NoRuleFired`] for the first output whose
    /// aggregated set is empty.
    pub fn infer(&self, inputs: &Inputs) -> Result<Outputs> {
        let fuzzified = self.fuzzify(inputs)?;
        let firing_strengths = self.firing_strengths(&fuzzified)?;
        let aggregated = self.aggregate(&firing_strengths);
        let mut crisp = BTreeMap::new();
        let mut sets = BTreeMap::new();

        for (key, aggregated) in self.outputs.iter().zip(aggregated) {
            let var = &self.vars[*key];
            let value = self
                .ops
                .defuzz_op
                .call(var.universe().points(), &aggregated)
                .ok_or_else(|| FuzzyError::NoRuleFired {
                    variable: var.name().to_owned(),
                })?;

            debug!(variable = var.name(), value, "defuzzified output");

            crisp.insert(var.name().to_owned(), value);
            sets.insert(var.name().to_owned(), aggregated);
        }

        Ok(Outputs::new(crisp, sets, firing_strengths))
    }

    // Degree of each crisp input in every term of its variable
    fn fuzzify(&self, inputs: &Inputs) -> Result<SecondaryMap<VariableKey, Vec<f64>>> {
        let mut fuzzified = SecondaryMap::with_capacity(inputs.0.len());

        for (name, value) in inputs.iter() {
            let key = self.vars.key(name).ok_or_else(|| FuzzyError::UnknownVariable {
                name: name.to_owned(),
            })?;
            let var = &self.vars[key];

            if var.role() != Role::Input {
                return Err(FuzzyError::NotAnInput { name: name.to_owned() });
            }
            if !value.is_finite() {
                return Err(FuzzyError::NonFiniteInput {
                    variable: name.to_owned(),
                    value,
                });
            }

            let degrees = var.fuzzify(value);

            trace!(variable = name, value, ?degrees, "fuzzified input");

            fuzzified.insert(key, degrees);
        }

        if let Some(missing) = self.premise_inputs.iter().find(|key| !fuzzified.contains_key(**key)) {
            return Err(FuzzyError::MissingInput {
                variable: self.vars[*missing].name().to_owned(),
            });
        }

        Ok(fuzzified)
    }

    fn firing_strengths(&self, fuzzified: &SecondaryMap<VariableKey, Vec<f64>>) -> Result<Vec<f64>> {
        fn combine(
            expr: &Expr,
            vars: &Variables,
            fuzzified: &SecondaryMap<VariableKey, Vec<f64>>,
            and_op: AndOp,
            or_op: OrOp,
        ) -> Result<f64> {
            match expr {
                Expr::Is(handle, label) => {
                    let var = vars.lookup(*handle)?;
                    let degrees = fuzzified.get(handle.key()).ok_or_else(|| FuzzyError::MissingInput {
                        variable: var.name().to_owned(),
                    })?;

                    Ok(degrees[var.term_index(label)?])
                },
                Expr::And(lhs, rhs) => {
                    let left = combine(lhs, vars, fuzzified, and_op, or_op)?;
                    let right = combine(rhs, vars, fuzzified, and_op, or_op)?;

                    Ok(and_op.call(left, right))
                },
                Expr::Or(lhs, rhs) => {
                    let left = combine(lhs, vars, fuzzified, and_op, or_op)?;
                    let right = combine(rhs, vars, fuzzified, and_op, or_op)?;

                    Ok(or_op.call(left, right))
                },
            }
        }

        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| -> Result<f64> {
                let strength =
                    combine(&rule.premise, &self.vars, fuzzified, self.ops.and_op, self.ops.or_op)? * rule.weight;

                trace!(rule = i, strength, "evaluated premise");

                Ok(strength)
            })
            .collect()
    }

    // Implicates every consequent of every firing rule and folds it into the
    // aggregated set of its output, in `self.outputs` order
    fn aggregate(&self, firing_strengths: &[f64]) -> Vec<Vec<f64>> {
        let mut aggregated: Vec<Vec<f64>> = self
            .outputs
            .iter()
            .map(|key| vec![0.; self.vars[*key].universe().len()])
            .collect();

        for (consequents, &strength) in self.consequents.iter().zip(firing_strengths) {
            // Implication by a zero strength is the identity of every production link
            if strength <= 0. {
                continue;
            }

            for &(slot, term) in consequents {
                let membership = self.vars[self.outputs[slot]].membership(term);
                let implied = self.ops.imp_op.call(strength, membership);

                self.ops.prod_link.accumulate(&mut aggregated[slot], implied);
            }
        }

        aggregated
    }
}

#[cfg(test)]
fn ramp_engine(ops: Operators) -> (InferenceEngine, crate::Variable, crate::Variable) {
    use crate::terms::Terms;
    use crate::universe::Universe;

    let mut ramps = Terms::new();

    ramps.triangle("Low", 0., 0., 10.).unwrap();
    ramps.triangle("High", 0., 10., 10.).unwrap();

    let mut vars = Variables::new();
    let x = vars.add_input("x", Universe::new(0., 10., 1.).unwrap(), ramps.clone()).unwrap();
    let y = vars.add_output("y", Universe::new(0., 10., 1.).unwrap(), ramps).unwrap();
    let mut rules = Rules::new();

    rules.add(x.is("Low"), y.is("Low"));
    rules.add(x.is("High"), y.is("High"));

    (InferenceEngine::with_operators(vars, rules, ops).unwrap(), x, y)
}

#[test]
fn test_mamdani_ramps() {
    let (engine, ..) = ramp_engine(Operators::default());
    let outputs = engine.infer(&[("x", 10.)].into_iter().collect()).unwrap();

    // Only "High" fires: Σu² / Σu over 0..=10
    assert_eq!(outputs.get("y"), Some(7.));
    assert_eq!(outputs.firing_strengths(), &[0., 1.]);
    assert_eq!(outputs.aggregated("y").unwrap()[4], 0.4);

    let outputs = engine.infer(&[("x", 5.)].into_iter().collect()).unwrap();

    assert_eq!(outputs.firing_strengths(), &[0.5, 0.5]);
    assert_eq!(outputs.get("y"), Some(5.));
    assert_eq!(engine.output_names().collect::<Vec<_>>(), ["y"]);
}

#[test]
fn test_larsen_implication_scales() {
    let ops = Operators {
        imp_op: ImplicationOp::Prod,
        ..Operators::default()
    };
    let (engine, ..) = ramp_engine(ops);
    let outputs = engine.infer(&[("x", 8.)].into_iter().collect()).unwrap();
    let aggregated = outputs.aggregated("y").unwrap();

    // Low scaled by 0.2, High scaled by 0.8
    assert!((aggregated[10] - 0.8).abs() < 1e-12);
    assert!((aggregated[0] - 0.2).abs() < 1e-12);
}

#[test]
fn test_input_errors() {
    let (engine, ..) = ramp_engine(Operators::default());

    assert_eq!(
        engine.infer(&Inputs::new()).unwrap_err(),
        FuzzyError::MissingInput { variable: "x".into() }
    );
    assert_eq!(
        engine.infer(&[("x", 1.), ("z", 1.)].into_iter().collect()).unwrap_err(),
        FuzzyError::UnknownVariable { name: "z".into() }
    );
    assert_eq!(
        engine.infer(&[("x", 1.), ("y", 1.)].into_iter().collect()).unwrap_err(),
        FuzzyError::NotAnInput { name: "y".into() }
    );
    assert!(matches!(
        engine.infer(&[("x", f64::NAN)].into_iter().collect()),
        Err(FuzzyError::NonFiniteInput { .. })
    ));
}

#[test]
fn test_no_rule_fired() {
    use crate::terms::Terms;
    use crate::universe::Universe;

    let mut terms = Terms::new();

    terms.triangle("Mid", 4., 5., 6.).unwrap();

    let mut vars = Variables::new();
    let x = vars.add_input("x", Universe::new(0., 10., 1.).unwrap(), terms.clone()).unwrap();
    let y = vars.add_output("y", Universe::new(0., 10., 1.).unwrap(), terms).unwrap();
    let mut rules = Rules::new();

    rules.add(x.is("Mid"), y.is("Mid"));

    let engine = InferenceEngine::new(vars, rules).unwrap();

    assert_eq!(
        engine.infer(&[("x", 9.)].into_iter().collect()).unwrap_err(),
        FuzzyError::NoRuleFired { variable: "y".into() }
    );
    assert_eq!(engine.infer(&[("x", 5.)].into_iter().collect()).unwrap().get("y"), Some(5.));
}

#[test]
fn test_multiple_consequents_share_strength() {
    use crate::terms::Terms;
    use crate::universe::Universe;

    let mut terms = Terms::new();

    terms.triangle("Low", 0., 0., 10.).unwrap();
    terms.triangle("High", 0., 10., 10.).unwrap();

    let mut vars = Variables::new();
    let universe = Universe::new(0., 10., 1.).unwrap();
    let x = vars.add_input("x", universe.clone(), terms.clone()).unwrap();
    let y = vars.add_output("y", universe.clone(), terms.clone()).unwrap();
    let z = vars.add_output("z", universe, terms).unwrap();
    let mut rules = Rules::new();

    rules.add(x.is("High"), y.is("High") & z.is("Low"));

    let engine = InferenceEngine::new(vars, rules).unwrap();
    let outputs = engine.infer(&[("x", 10.)].into_iter().collect()).unwrap();

    assert_eq!(outputs.get("y"), Some(7.));
    assert_eq!(outputs.get("z"), Some(3.));
    assert_eq!(outputs.iter().count(), 2);
}

#[test]
fn test_rule_weight_scales_strength() {
    use crate::terms::Terms;
    use crate::universe::Universe;

    let mut terms = Terms::new();

    terms.triangle("High", 0., 10., 10.).unwrap();

    let mut vars = Variables::new();
    let x = vars.add_input("x", Universe::new(0., 10., 1.).unwrap(), terms.clone()).unwrap();
    let y = vars.add_output("y", Universe::new(0., 10., 1.).unwrap(), terms).unwrap();
    let mut rules = Rules::new();

    rules.add_weighted(x.is("High"), y.is("High"), 0.5);

    let engine = InferenceEngine::new(vars, rules).unwrap();
    let outputs = engine.infer(&[("x", 10.)].into_iter().collect()).unwrap();

    assert_eq!(outputs.firing_strengths(), &[0.5]);
    assert_eq!(outputs.aggregated("y").unwrap().iter().copied().fold(0., f64::max), 0.5);
}

#[test]
fn test_validation_rejects_bad_rules() {
    use crate::terms::Terms;
    use crate::universe::Universe;

    let build = |premise: fn(crate::Variable, crate::Variable) -> (Expr, Expr, f64)| {
        let mut terms = Terms::new();

        terms.triangle("Low", 0., 0., 10.).unwrap();

        let mut vars = Variables::new();
        let x = vars.add_input("x", Universe::new(0., 10., 1.).unwrap(), terms.clone()).unwrap();
        let y = vars.add_output("y", Universe::new(0., 10., 1.).unwrap(), terms).unwrap();
        let (premise, consequence, weight) = premise(x, y);
        let mut rules = Rules::new();

        rules.add_weighted(premise, consequence, weight);

        InferenceEngine::new(vars, rules).map(|_| ())
    };

    assert_eq!(build(|x, y| (x.is("Low"), y.is("Low"), 1.)), Ok(()));
    assert_eq!(
        build(|x, y| (x.is("Huge"), y.is("Low"), 1.)),
        Err(FuzzyError::UnknownTerm {
            variable: "x".into(),
            label: "Huge".into(),
        })
    );
    assert_eq!(
        build(|x, y| (y.is("Low"), x.is("Low"), 1.)),
        Err(FuzzyError::RoleMismatch {
            rule: 0,
            variable: "y".into(),
            found: Role::Input,
            declared: Role::Output,
        })
    );
    assert!(matches!(
        build(|x, y| (x.is("Low"), y.is("Low") | y.is("Low"), 1.)),
        Err(FuzzyError::InvalidConsequence { rule: 0, .. })
    ));
    assert!(matches!(
        build(|x, y| (x.is("Low"), y.is("Low"), 1.5)),
        Err(FuzzyError::InvalidWeight { rule: 0, .. })
    ));
}

#[test]
fn test_rules_from_another_registry_are_rejected() {
    use crate::terms::Terms;
    use crate::universe::Universe;

    let registry = || {
        let mut terms = Terms::new();

        terms.triangle("Low", 0., 0., 10.).unwrap();

        let mut vars = Variables::new();
        let x = vars.add_input("x", Universe::new(0., 10., 1.).unwrap(), terms.clone()).unwrap();
        let y = vars.add_output("y", Universe::new(0., 10., 1.).unwrap(), terms).unwrap();

        (vars, x, y)
    };
    let (vars, ..) = registry();
    let (_, fx, fy) = registry();
    let mut rules = Rules::new();

    rules.add(fx.is("Low"), fy.is("Low"));

    // The foreign keys match this registry's slots, they must still not bind
    assert_eq!(vars.key("x"), Some(fx.key()));
    assert!(matches!(
        InferenceEngine::new(vars, rules),
        Err(FuzzyError::UnknownVariable { .. })
    ));
}

#[test]
fn test_engine_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<InferenceEngine>();
}
