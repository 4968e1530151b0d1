//! Greedy fallback heuristic
//!
//! Walks items in canonical ranking order (highest effort-aware score
//! first). Deterministic and linear, but an approximation: it is not
//! guaranteed to find the optimal selection, and for combined constraints
//! it can report infeasibility where an exact solve would succeed.

use super::{Formulation, Item, Objective, SelectionSolver, SolveError, StopSignal};

pub struct Greedy;

impl SelectionSolver for Greedy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn solve(
        &self,
        items: &[Item],
        formulation: &Formulation,
        _stop: &StopSignal,
    ) -> Result<Vec<usize>, SolveError> {
        formulation.precheck(items)?;

        let selection = match (formulation.objective, formulation.min_risk) {
            (Objective::MaximizeRisk, None) => pack(items, formulation),
            (Objective::MinimizeEffort, _) => cover(items, formulation)?,
            (Objective::MaximizeRisk, Some(_)) => {
                let mut selection = cover(items, formulation)?;
                trim(items, formulation, &mut selection);
                selection
            }
        };

        let risk: f64 = selection.iter().map(|&i| items[i].risk).sum();
        if !formulation.meets_risk(risk) {
            return Err(formulation.infeasibility(items).into());
        }
        Ok(selection)
    }
}

/// First fit: take every item that still fits the budget and size cap
fn pack(items: &[Item], formulation: &Formulation) -> Vec<usize> {
    let mut selection = Vec::new();
    let mut effort = 0.0;
    for (i, item) in items.iter().enumerate() {
        if !formulation.within_count(selection.len() + 1) {
            break;
        }
        if formulation.within_budget(effort + item.effort) {
            selection.push(i);
            effort += item.effort;
        }
    }
    selection
}

/// Take items in order until the risk floor is reached
fn cover(items: &[Item], formulation: &Formulation) -> Result<Vec<usize>, SolveError> {
    let mut selection = Vec::new();
    let mut risk = 0.0;
    for (i, item) in items.iter().enumerate() {
        if formulation.meets_risk(risk) {
            break;
        }
        selection.push(i);
        risk += item.risk;
    }
    if !formulation.meets_risk(risk) {
        return Err(formulation.infeasibility(items).into());
    }
    Ok(selection)
}

/// Drop the lowest-ranked items until the budget and size cap hold
fn trim(items: &[Item], formulation: &Formulation, selection: &mut Vec<usize>) {
    let mut effort: f64 = selection.iter().map(|&i| items[i].effort).sum();
    while !(formulation.within_budget(effort) && formulation.within_count(selection.len())) {
        match selection.pop() {
            Some(i) => effort -= items[i].effort,
            None => break,
        }
    }
}
