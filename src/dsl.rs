use std::ops::{BitAnd, BitOr};

use crate::variable::Variable;

/// Rule expression tree. Negation is not supported; express it as its own
/// term (e.g. "Stable" rather than "not Unstable").
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Is(Variable, String),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn or(self, rhs: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(rhs))
    }

    pub fn and(self, rhs: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(rhs))
    }

    /// Leaf propositions, left to right
    pub fn propositions(&self) -> Vec<(Variable, &str)> {
        let mut props = Vec::new();

        fn parse<'p>(expr: &'p Expr, out: &mut Vec<(Variable, &'p str)>) {
            match expr {
                Expr::Is(var, term) => out.push((*var, term.as_str())),
                Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
                    parse(lhs, out);
                    parse(rhs, out);
                },
            }
        }

        parse(self, &mut props);

        props
    }

    pub(crate) fn contains_or(&self) -> bool {
        match self {
            Expr::Is(..) => false,
            Expr::Or(..) => true,
            Expr::And(lhs, rhs) => lhs.contains_or() || rhs.contains_or(),
        }
    }
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        self.and(rhs)
    }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        self.or(rhs)
    }
}

#[test]
fn test_operators_build_binary_tree() {
    use crate::terms::Terms;
    use crate::universe::Universe;
    use crate::variable::Variables;

    let universe = Universe::new(0., 1., 0.5).unwrap();
    let mut vars = Variables::new();
    let mut add = |name| vars.add_input(name, universe.clone(), Terms::new()).unwrap();
    let (v, f, l) = (add("v"), add("f"), add("l"));
    let is = |var: Variable, label: &str| var.is(label);

    let expr = is(v, "High") & is(f, "Unstable") | is(l, "Unbalanced");

    assert_eq!(
        expr,
        Expr::Or(
            Box::new(Expr::And(Box::new(is(v, "High")), Box::new(is(f, "Unstable")))),
            Box::new(is(l, "Unbalanced")),
        )
    );
    assert_eq!(
        expr.propositions(),
        vec![(v, "High"), (f, "Unstable"), (l, "Unbalanced")]
    );
    assert!(expr.contains_or());
    assert!(!(is(v, "Low") & is(f, "Stable")).contains_or());
}
