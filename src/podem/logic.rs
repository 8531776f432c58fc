//! 5-valued D-algebra
//!
//! The domain is `{0, 1, X, D, D̄}` where `D` is "good 1 / faulty 0" and
//! `D̄` is "good 0 / faulty 1". And/Or/Xor/Not are primitive; Nand, Nor
//! and Xnor are obtained by post-negation.

use crate::netlist::GateKind;

/// A value in the 5-valued logic domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic5 {
    /// Constant 0 in both good and faulty circuit
    Zero,
    /// Constant 1 in both good and faulty circuit
    One,
    /// Unassigned
    X,
    /// Good 1, faulty 0
    D,
    /// Good 0, faulty 1
    DBar,
}

impl Logic5 {
    /// Lift a plain logic value
    pub fn from_bool(b: bool) -> Logic5 {
        if b {
            Logic5::One
        } else {
            Logic5::Zero
        }
    }

    /// Whether the value carries a fault effect
    pub fn is_faulty(self) -> bool {
        matches!(self, Logic5::D | Logic5::DBar)
    }
}

impl std::ops::Not for Logic5 {
    type Output = Logic5;

    fn not(self) -> Logic5 {
        use Logic5::*;
        match self {
            Zero => One,
            One => Zero,
            D => DBar,
            DBar => D,
            X => X,
        }
    }
}

/// 5-valued And
pub fn and5(a: Logic5, b: Logic5) -> Logic5 {
    use Logic5::*;
    if a == Zero || b == Zero {
        return Zero;
    }
    if a == One {
        return b;
    }
    if b == One {
        return a;
    }
    if a == X || b == X {
        return X;
    }
    // Both faulty: D ∧ D = D, D ∧ D̄ = 0
    if a == b {
        a
    } else {
        Zero
    }
}

/// 5-valued Or
pub fn or5(a: Logic5, b: Logic5) -> Logic5 {
    use Logic5::*;
    if a == One || b == One {
        return One;
    }
    if a == Zero {
        return b;
    }
    if b == Zero {
        return a;
    }
    if a == X || b == X {
        return X;
    }
    if a == b {
        a
    } else {
        One
    }
}

/// 5-valued Xor
pub fn xor5(a: Logic5, b: Logic5) -> Logic5 {
    use Logic5::*;
    if a == X || b == X {
        return X;
    }
    match (a, b) {
        (Zero, v) | (v, Zero) => v,
        (One, v) | (v, One) => !v,
        _ => {
            // Both faulty
            if a == b {
                Zero
            } else {
                One
            }
        }
    }
}

/// Evaluate a gate over 5-valued operands
///
/// Controlling values dominate X, so a partial assignment can already
/// force the output. Returns X for kinds without a combinational
/// function.
pub fn gate_value(kind: GateKind, inputs: &[Logic5]) -> Logic5 {
    use GateKind::*;
    if inputs.is_empty() {
        return Logic5::X;
    }
    let folded = match kind {
        And | Nand => inputs.iter().fold(Logic5::One, |acc, &v| and5(acc, v)),
        Or | Nor => inputs.iter().fold(Logic5::Zero, |acc, &v| or5(acc, v)),
        Xor | Xnor => inputs.iter().fold(Logic5::Zero, |acc, &v| xor5(acc, v)),
        Buf | Not => inputs[0],
        Input | Output | Dff | Unknown => return Logic5::X,
    };
    if kind.is_inverting() {
        !folded
    } else {
        folded
    }
}

#[cfg(test)]
mod tests {
    use super::{and5, gate_value, or5, xor5, Logic5::*};
    use crate::netlist::GateKind;

    #[test]
    fn test_not() {
        assert_eq!(!Zero, One);
        assert_eq!(!D, DBar);
        assert_eq!(!DBar, D);
        assert_eq!(!X, X);
        for v in [Zero, One, X, D, DBar] {
            assert_eq!(!!v, v);
        }
    }

    #[test]
    fn test_and() {
        // Controlling 0 dominates even X and fault effects
        assert_eq!(and5(Zero, X), Zero);
        assert_eq!(and5(D, Zero), Zero);
        assert_eq!(and5(One, D), D);
        assert_eq!(and5(D, D), D);
        assert_eq!(and5(D, DBar), Zero);
        assert_eq!(and5(DBar, D), Zero);
        assert_eq!(and5(X, One), X);
        assert_eq!(and5(X, D), X);
    }

    #[test]
    fn test_or() {
        assert_eq!(or5(One, X), One);
        assert_eq!(or5(DBar, One), One);
        assert_eq!(or5(Zero, D), D);
        assert_eq!(or5(D, D), D);
        assert_eq!(or5(D, DBar), One);
        assert_eq!(or5(X, Zero), X);
    }

    #[test]
    fn test_xor() {
        assert_eq!(xor5(X, One), X);
        assert_eq!(xor5(Zero, D), D);
        assert_eq!(xor5(One, D), DBar);
        assert_eq!(xor5(D, D), Zero);
        assert_eq!(xor5(D, DBar), One);
        assert_eq!(xor5(DBar, DBar), Zero);
    }

    #[test]
    fn test_gate_value() {
        use GateKind::*;
        // A single controlling input decides the gate with the rest X
        assert_eq!(gate_value(And, &[Zero, X, X]), Zero);
        assert_eq!(gate_value(Nand, &[Zero, X]), One);
        assert_eq!(gate_value(Or, &[X, One]), One);
        assert_eq!(gate_value(Nor, &[One, X]), Zero);
        // Xor stays X until everything is known
        assert_eq!(gate_value(Xor, &[One, X]), X);
        assert_eq!(gate_value(Xor, &[One, D]), DBar);
        assert_eq!(gate_value(Xnor, &[One, One]), One);
        assert_eq!(gate_value(Not, &[D]), DBar);
        assert_eq!(gate_value(Buf, &[DBar]), DBar);
        // Fault effects propagate through non-controlling operands
        assert_eq!(gate_value(And, &[One, D]), D);
        assert_eq!(gate_value(Nor, &[Zero, D]), DBar);
    }
}
