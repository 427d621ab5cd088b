use crate::dsl::Expr;

#[derive(Clone, Debug, Default)]
pub struct Rules(pub(crate) Vec<Rule>);

impl Rules {
    pub fn new() -> Self {
        Rules(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Rules(Vec::with_capacity(capacity))
    }

    /// `consequence` is a single proposition or an `And` of several; every
    /// one of them is implicated with the premise's firing strength.
    pub fn add(&mut self, premise: Expr, consequence: Expr) {
        self.add_weighted(premise, consequence, 1.0);
    }

    /// Like [`Rules::add`], scaling the firing strength by `weight` in [0, 1]
    pub fn add_weighted(&mut self, premise: Expr, consequence: Expr, weight: f64) {
        self.0.push(Rule {
            premise,
            consequence,
            weight,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Rule {
    pub(crate) premise: Expr,
    pub(crate) consequence: Expr,
    pub(crate) weight: f64,
}

impl Rule {
    pub fn premise(&self) -> &Expr {
        &self.premise
    }

    pub fn consequence(&self) -> &Expr {
        &self.consequence
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}
