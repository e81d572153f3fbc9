//! Batch evaluation of a loaded script
use crate::{
    builtins::install_builtins,
    context::{Context, Node},
    eval::EvalContext,
    render::Renderer,
    symbols::SymbolTable,
    Error,
};

use log::info;

/// A loaded script: the expression arena, the global symbol table, and an
/// ordered list of top-level evaluators.
///
/// Expressions are built through [`Script::ctx`] and declared into
/// [`Script::symbols`]; evaluators registered with
/// [`register_evaluator`](Script::register_evaluator) run in registration
/// order on every [`evaluate_all`](Script::evaluate_all).
///
/// ```
/// # use cel::Script;
/// let mut script = Script::new().unwrap();
/// let e = script.ctx.num(21.0);
/// let e = script.ctx.mul(e, 2.0).unwrap();
/// script.register_evaluator(e).unwrap();
/// ```
pub struct Script {
    /// Expression arena shared by declarations and evaluators
    pub ctx: Context,
    /// Global symbol table, pre-loaded with the builtins
    pub symbols: SymbolTable,
    evaluators: Vec<Node>,
    evaluations: Vec<Result<f64, Error>>,
}

impl Script {
    /// Builds an empty script with the builtins installed
    pub fn new() -> Result<Self, Error> {
        let mut ctx = Context::new();
        let mut symbols = SymbolTable::new();
        install_builtins(&mut ctx, &mut symbols)?;
        Ok(Self {
            ctx,
            symbols,
            evaluators: vec![],
            evaluations: vec![],
        })
    }

    /// Appends a top-level evaluator, returning its slot index
    pub fn register_evaluator(&mut self, node: Node) -> Result<usize, Error> {
        self.ctx.check_node(node)?;
        self.evaluators.push(node);
        Ok(self.evaluators.len() - 1)
    }

    /// Evaluates every registered evaluator in registration order.
    ///
    /// Each evaluator runs in a fresh [`EvalContext`]; a failure records an
    /// `Err` in its slot and the batch continues.
    pub fn evaluate_all<R: Renderer>(
        &mut self,
        renderer: &mut R,
    ) -> &[Result<f64, Error>] {
        let mut results = Vec::with_capacity(self.evaluators.len());
        for &node in &self.evaluators {
            let mut env = EvalContext::new(&self.symbols, &mut *renderer);
            results.push(self.ctx.eval(node, &mut env));
        }
        self.evaluations = results;
        &self.evaluations
    }

    /// Results of the most recent [`evaluate_all`](Script::evaluate_all),
    /// in registration order
    pub fn evaluations(&self) -> &[Result<f64, Error>] {
        &self.evaluations
    }

    /// Logs the most recent evaluation results, one line per slot
    pub fn log_evaluations(&self) {
        for (i, r) in self.evaluations.iter().enumerate() {
            match r {
                Ok(v) => info!("Result[{i}] = {v}"),
                Err(e) => info!("Result[{i}] = error: {e}"),
            }
        }
    }
}
