use std::collections::HashMap;
use std::ops::Index;
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{new_key_type, SlotMap};

use crate::dsl::Expr;
use crate::error::{FuzzyError, Result};
use crate::terms::{Terms, TriangularMf};
use crate::universe::Universe;

new_key_type! {
    /// A variable key
    pub struct VariableKey;
}

static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(0);

/// Identifies the [`Variables`] a handle was issued by. Slot map keys alone
/// collide across registries.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) struct RegistryId(u64);

impl RegistryId {
    fn next() -> Self {
        Self(NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a variable registered in [`Variables`], used to build rules.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Variable {
    pub(crate) key: VariableKey,
    pub(crate) registry: RegistryId,
}

impl Variable {
    pub fn key(self) -> VariableKey {
        self.key
    }

    /// Proposition "variable is `label`"
    pub fn is(self, label: impl Into<String>) -> Expr {
        Expr::Is(self, label.into())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Role {
    Input,
    Output,
}

#[derive(Clone, Debug)]
struct Term {
    label: String,
    mf: TriangularMf,
    // mf sampled over the variable's universe
    membership: Vec<f64>,
}

/// A named axis with its labelled membership functions
#[derive(Clone, Debug)]
pub struct LinguisticVariable {
    name: String,
    role: Role,
    universe: Universe,
    terms: Vec<Term>,
}

impl LinguisticVariable {
    fn new(name: String, role: Role, universe: Universe, terms: Terms) -> Result<Self> {
        let mut this = Self {
            name,
            role,
            universe,
            terms: Vec::with_capacity(terms.len()),
        };

        for (label, mf) in terms.0 {
            if this.terms.iter().any(|t| t.label == label) {
                return Err(FuzzyError::DuplicateTerm {
                    variable: this.name,
                    label,
                });
            }

            let membership = mf.sample(&this.universe);

            this.terms.push(Term { label, mf, membership });
        }

        Ok(this)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.label.as_str())
    }

    pub fn term(&self, label: &str) -> Result<&TriangularMf> {
        self.term_index(label).map(|i| &self.terms[i].mf)
    }

    pub(crate) fn term_index(&self, label: &str) -> Result<usize> {
        self.terms
            .iter()
            .position(|t| t.label == label)
            .ok_or_else(|| FuzzyError::UnknownTerm {
                variable: self.name.clone(),
                label: label.to_owned(),
            })
    }

    /// Term `index` sampled over the universe
    pub(crate) fn membership(&self, index: usize) -> &[f64] {
        &self.terms[index].membership
    }

    /// Degree of `value` in every term, in term order
    pub fn fuzzify(&self, value: f64) -> Vec<f64> {
        self.terms.iter().map(|t| t.mf.degree(value)).collect()
    }
}

/// Registry of the variables of one engine. A clone keeps the registry
/// identity, so handles issued before cloning resolve in both copies.
#[derive(Clone, Debug)]
pub struct Variables {
    id: RegistryId,
    slots: SlotMap<VariableKey, LinguisticVariable>,
    names: HashMap<String, VariableKey>,
}

impl Default for Variables {
    fn default() -> Self {
        Self {
            id: RegistryId::next(),
            slots: SlotMap::with_key(),
            names: HashMap::new(),
        }
    }
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input(&mut self, name: impl Into<String>, universe: Universe, terms: Terms) -> Result<Variable> {
        self.add(name, Role::Input, universe, terms)
    }

    pub fn add_output(&mut self, name: impl Into<String>, universe: Universe, terms: Terms) -> Result<Variable> {
        self.add(name, Role::Output, universe, terms)
    }

    pub fn add(&mut self, name: impl Into<String>, role: Role, universe: Universe, terms: Terms) -> Result<Variable> {
        let name = name.into();

        if self.names.contains_key(&name) {
            return Err(FuzzyError::DuplicateVariable { name });
        }

        let var = LinguisticVariable::new(name.clone(), role, universe, terms)?;
        let key = self.slots.insert(var);

        self.names.insert(name, key);

        Ok(Variable { key, registry: self.id })
    }

    pub fn get(&self, key: VariableKey) -> Option<&LinguisticVariable> {
        self.slots.get(key)
    }

    pub fn key(&self, name: &str) -> Option<VariableKey> {
        self.names.get(name).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<&LinguisticVariable> {
        self.key(name).and_then(|key| self.get(key))
    }

    /// Resolves a rule handle, rejecting handles issued by another registry
    pub(crate) fn lookup(&self, var: Variable) -> Result<&LinguisticVariable> {
        let foreign = || FuzzyError::UnknownVariable {
            name: "<handle from a different variable registry>".to_owned(),
        };

        if var.registry != self.id {
            return Err(foreign());
        }

        self.get(var.key).ok_or_else(foreign)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableKey, &LinguisticVariable)> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Index<VariableKey> for Variables {
    type Output = LinguisticVariable;

    fn index(&self, key: VariableKey) -> &LinguisticVariable {
        &self.slots[key]
    }
}

#[test]
fn test_variable_terms() {
    let mut terms = Terms::new();

    terms.triangle("Low", 0., 0., 6.).unwrap();
    terms.triangle("Medium", 5., 10., 15.).unwrap();
    terms.triangle("High", 13., 20., 20.).unwrap();

    let mut vars = Variables::new();
    let voltage = vars
        .add_input("VoltageDeviation", Universe::new(0., 20., 1.).unwrap(), terms)
        .unwrap();
    let var = &vars[voltage.key()];

    assert_eq!(var.name(), "VoltageDeviation");
    assert_eq!(var.role(), Role::Input);
    assert_eq!(var.labels().collect::<Vec<_>>(), ["Low", "Medium", "High"]);
    assert_eq!(var.term("Medium").unwrap().params(), (5., 10., 15.));
    assert_eq!(var.fuzzify(14.), vec![0., 0.2, 1. / 7.]);
    assert_eq!(var.membership(2).len(), 21);
    assert_eq!(vars.key("VoltageDeviation"), Some(voltage.key()));
    assert!(vars.by_name("Voltage").is_none());
    assert_eq!(
        var.term("Extreme"),
        Err(FuzzyError::UnknownTerm {
            variable: "VoltageDeviation".into(),
            label: "Extreme".into(),
        })
    );
}

#[test]
fn test_variable_rejects_duplicates() {
    let universe = Universe::new(0., 10., 1.).unwrap();
    let mut terms = Terms::new();

    terms.triangle("Low", 0., 0., 5.).unwrap();
    terms.triangle("Low", 0., 5., 10.).unwrap();

    let mut vars = Variables::new();

    assert_eq!(
        vars.add_input("x", universe.clone(), terms).unwrap_err(),
        FuzzyError::DuplicateTerm {
            variable: "x".into(),
            label: "Low".into(),
        }
    );

    vars.add_output("y", universe.clone(), Terms::new()).unwrap();

    assert_eq!(
        vars.add_input("y", universe, Terms::new()).unwrap_err(),
        FuzzyError::DuplicateVariable { name: "y".into() }
    );
    assert_eq!(vars.len(), 1);
}

#[test]
fn test_lookup_rejects_foreign_handles() {
    let universe = Universe::new(0., 10., 1.).unwrap();
    let mut vars = Variables::new();
    let mut other = Variables::new();

    let x = vars.add_input("x", universe.clone(), Terms::new()).unwrap();
    let foreign = other.add_input("x", universe, Terms::new()).unwrap();

    // Same slot, same version, different registry
    assert_eq!(x.key(), foreign.key());
    assert_eq!(vars.lookup(x).unwrap().name(), "x");
    assert!(matches!(
        vars.lookup(foreign),
        Err(FuzzyError::UnknownVariable { name }) if name.contains("different variable registry")
    ));
    assert_eq!(vars.clone().lookup(x).unwrap().name(), "x");
}
