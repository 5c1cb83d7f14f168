//! Parse-time budgets.
//!
//! Grounded on the teacher's `Parser::with_exec_fuel` / `with_recursion_fuel`
//! builders: a pathological grammar or input (unbounded left recursion through
//! `Ref`, a `Quant` that never fails) should return an error, never abort the
//! process or hang it.

/// Limits applied while running a compiled [`crate::Parsers`] over input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum nested rule-reference depth before parsing fails with
    /// [`wbnf_core::Error::Inconceivable`]. `None` disables the check.
    pub max_recursion_depth: Option<u32>,
    /// Maximum iterations a single `Quant` may perform before failing with
    /// [`wbnf_core::Error::Inconceivable`]. `None` disables the check (the
    /// no-progress rule already prevents non-terminating loops).
    pub max_quant_iterations: Option<u32>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_recursion_depth: Some(512), max_quant_iterations: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_recursion_but_not_quant_iterations() {
        let opts = ParseOptions::default();
        assert_eq!(opts.max_recursion_depth, Some(512));
        assert_eq!(opts.max_quant_iterations, None);
    }
}
