//! Exact branch-and-bound solver

use super::{tolerance, Formulation, Item, Objective, SelectionSolver, SolveError, StopSignal};
use tracing::debug;

/// How many nodes to expand between stop-signal polls
const POLL_INTERVAL: u64 = 1024;

/// Depth-first, include-first search over items in canonical order.
///
/// Maximizing risk is bounded by the smaller of the fractional-knapsack
/// relaxation over the remaining budget and the sum of the riskiest
/// remaining items that still fit the cardinality cap. Minimizing effort is
/// bounded below by the fractional cover of the missing risk. Only a
/// strictly better solution replaces the incumbent, so ties resolve to the
/// first one found in canonical order.
pub struct BranchAndBound;

impl SelectionSolver for BranchAndBound {
    fn name(&self) -> &'static str {
        "branch_and_bound"
    }

    fn solve(
        &self,
        items: &[Item],
        formulation: &Formulation,
        stop: &StopSignal,
    ) -> Result<Vec<usize>, SolveError> {
        formulation.precheck(items)?;

        let mut search = Search::new(items, formulation, stop);
        search.expand(0)?;
        debug!(
            "Branch and bound explored {} nodes over {} items",
            search.nodes,
            items.len()
        );

        match search.best {
            Some(best) => Ok(best.selection),
            None => Err(formulation.infeasibility(items).into()),
        }
    }
}

struct Incumbent {
    value: f64,
    selection: Vec<usize>,
}

struct Search<'a> {
    items: &'a [Item],
    formulation: &'a Formulation,
    stop: &'a StopSignal,
    /// Item indices by risk/effort density, descending
    by_density: Vec<usize>,
    /// Item indices by risk, descending
    by_risk: Vec<usize>,
    chosen: Vec<usize>,
    effort: f64,
    risk: f64,
    best: Option<Incumbent>,
    nodes: u64,
}

impl<'a> Search<'a> {
    fn new(items: &'a [Item], formulation: &'a Formulation, stop: &'a StopSignal) -> Self {
        let density = |i: usize| items[i].risk / items[i].effort;
        let mut by_density: Vec<usize> = (0..items.len()).collect();
        by_density.sort_by(|&a, &b| density(b).total_cmp(&density(a)).then(a.cmp(&b)));
        let mut by_risk: Vec<usize> = (0..items.len()).collect();
        by_risk.sort_by(|&a, &b| items[b].risk.total_cmp(&items[a].risk).then(a.cmp(&b)));

        Self {
            items,
            formulation,
            stop,
            by_density,
            by_risk,
            chosen: Vec::with_capacity(items.len()),
            effort: 0.0,
            risk: 0.0,
            best: None,
            nodes: 0,
        }
    }

    fn expand(&mut self, next: usize) -> Result<(), SolveError> {
        if self.nodes % POLL_INTERVAL == 0 && self.stop.should_stop() {
            return Err(SolveError::Interrupted);
        }
        self.nodes += 1;

        match self.formulation.objective {
            Objective::MaximizeRisk => self.expand_max_risk(next),
            Objective::MinimizeEffort => self.expand_min_effort(next),
        }
    }

    fn expand_max_risk(&mut self, next: usize) -> Result<(), SolveError> {
        if next == self.items.len() {
            if self.formulation.meets_risk(self.risk) {
                self.offer(self.risk, |candidate, best| candidate > best);
            }
            return Ok(());
        }

        let upper = self.risk + self.risk_upper_bound(next);
        if !self.formulation.meets_risk(upper) {
            return Ok(());
        }
        if let Some(best) = &self.best {
            if upper <= best.value + tolerance(best.value) {
                return Ok(());
            }
        }

        self.branch(next)
    }

    fn expand_min_effort(&mut self, next: usize) -> Result<(), SolveError> {
        // Adding items only raises effort once the floor is reached
        if self.formulation.meets_risk(self.risk) {
            if self.formulation.within_count(self.chosen.len()) {
                self.offer(self.effort, |candidate, best| candidate < best);
            }
            return Ok(());
        }
        if next == self.items.len() {
            return Ok(());
        }

        let Some(extra) = self.effort_lower_bound(next) else {
            return Ok(());
        };
        if let Some(best) = &self.best {
            if self.effort + extra >= best.value - tolerance(best.value) {
                return Ok(());
            }
        }

        self.branch(next)
    }

    /// Include `next` if it fits, then exclude it
    fn branch(&mut self, next: usize) -> Result<(), SolveError> {
        let item = self.items[next];
        if self.formulation.within_budget(self.effort + item.effort)
            && self.formulation.within_count(self.chosen.len() + 1)
        {
            self.chosen.push(next);
            self.effort += item.effort;
            self.risk += item.risk;
            let result = self.expand(next + 1);
            self.chosen.pop();
            self.effort -= item.effort;
            self.risk -= item.risk;
            result?;
        }
        self.expand(next + 1)
    }

    fn offer(&mut self, value: f64, better: impl Fn(f64, f64) -> bool) {
        let improves = match &self.best {
            None => true,
            Some(best) => better(value, best.value) && (value - best.value).abs() > tolerance(best.value),
        };
        if improves {
            self.best = Some(Incumbent {
                value,
                selection: self.chosen.clone(),
            });
        }
    }

    /// Optimistic extra risk from items `next..`
    fn risk_upper_bound(&self, next: usize) -> f64 {
        let capacity = self
            .formulation
            .budget_hours
            .map(|b| b + tolerance(b) - self.effort);

        let mut knapsack = 0.0;
        let mut room = capacity.unwrap_or(f64::INFINITY);
        for &i in self.by_density.iter().filter(|&&i| i >= next) {
            if room <= 0.0 {
                break;
            }
            let item = self.items[i];
            if item.effort <= room {
                knapsack += item.risk;
                room -= item.effort;
            } else {
                knapsack += item.risk * room / item.effort;
                break;
            }
        }

        match self.formulation.max_count {
            Some(cap) => {
                let slots = cap.saturating_sub(self.chosen.len());
                let top: f64 = self
                    .by_risk
                    .iter()
                    .filter(|&&i| i >= next)
                    .take(slots)
                    .map(|&i| self.items[i].risk)
                    .sum();
                knapsack.min(top)
            }
            None => knapsack,
        }
    }

    /// Least extra effort that could close the risk gap with items `next..`,
    /// or `None` when they cannot close it at all
    fn effort_lower_bound(&self, next: usize) -> Option<f64> {
        let floor = self.formulation.min_risk.unwrap_or_default();
        let mut missing = floor - tolerance(floor) - self.risk;
        let mut effort = 0.0;
        for &i in self.by_density.iter().filter(|&&i| i >= next) {
            if missing <= 0.0 {
                break;
            }
            let item = self.items[i];
            if item.risk <= 0.0 {
                continue;
            }
            if item.risk <= missing {
                effort += item.effort;
                missing -= item.risk;
            } else {
                effort += item.effort * missing / item.risk;
                missing = 0.0;
            }
        }
        if missing > 0.0 {
            None
        } else {
            Some(effort)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrioritizeError;

    fn items(pairs: &[(f64, f64)]) -> Vec<Item> {
        pairs
            .iter()
            .map(|&(risk, effort)| Item { risk, effort })
            .collect()
    }

    fn solve(it: &[Item], f: Formulation) -> Result<Vec<usize>, SolveError> {
        BranchAndBound.solve(it, &f, &StopSignal::default())
    }

    /// Exhaustive reference for small inputs
    fn brute_force(it: &[Item], f: &Formulation) -> Option<f64> {
        let mut best: Option<f64> = None;
        for mask in 0u32..(1 << it.len()) {
            let selection: Vec<usize> = (0..it.len()).filter(|i| mask & (1 << i) != 0).collect();
            if f.check(it, &selection).is_err() {
                continue;
            }
            let value = match f.objective {
                Objective::MaximizeRisk => selection.iter().map(|&i| it[i].risk).sum::<f64>(),
                Objective::MinimizeEffort => selection.iter().map(|&i| it[i].effort).sum::<f64>(),
            };
            best = Some(match (best, f.objective) {
                (None, _) => value,
                (Some(b), Objective::MaximizeRisk) => b.max(value),
                (Some(b), Objective::MinimizeEffort) => b.min(value),
            });
        }
        best
    }

    fn sample() -> Vec<Item> {
        items(&[
            (0.9, 4.0),
            (0.3, 0.5),
            (0.6, 3.0),
            (0.5, 2.5),
            (0.2, 1.5),
            (0.7, 6.0),
            (0.1, 0.5),
            (0.4, 2.0),
        ])
    }

    #[test]
    fn test_budget_beats_first_fit() {
        let it = items(&[(0.5, 3.0), (0.4, 2.0), (0.4, 2.0)]);
        assert_eq!(solve(&it, Formulation::budget(4.0)).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_matches_brute_force() {
        let it = sample();
        let formulations = [
            Formulation::budget(5.0),
            Formulation::budget(9.5),
            Formulation::coverage(1.5),
            Formulation::coverage(3.7),
            Formulation::multi(8.0, 1.5, Some(3)),
            Formulation::multi(12.0, 2.0, None),
        ];
        for f in formulations {
            let selection = solve(&it, f).unwrap();
            f.check(&it, &selection).unwrap();
            let value: f64 = match f.objective {
                Objective::MaximizeRisk => selection.iter().map(|&i| it[i].risk).sum(),
                Objective::MinimizeEffort => selection.iter().map(|&i| it[i].effort).sum(),
            };
            let expected = brute_force(&it, &f).unwrap();
            assert!((value - expected).abs() < 1e-9, "{:?}: {} vs {}", f, value, expected);
        }
    }

    #[test]
    fn test_full_coverage_selects_every_risky_item() {
        let it = items(&[(0.9, 4.0), (0.2, 1.0), (0.0, 0.5)]);
        let total = 1.1;
        assert_eq!(solve(&it, Formulation::coverage(total)).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_zero_floor_selects_nothing() {
        let it = items(&[(0.0, 1.0), (0.0, 2.0)]);
        assert!(solve(&it, Formulation::coverage(0.0)).unwrap().is_empty());
    }

    #[test]
    fn test_infeasible_names_constraint() {
        let it = sample();
        let err = solve(&it, Formulation::multi(40.0, 2.0, Some(2))).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Failed(PrioritizeError::InfeasibleConstraints { ref constraint, .. }) if constraint == "max_classes"
        ));

        let err = solve(&it, Formulation::multi(2.0, 1.0, None)).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Failed(PrioritizeError::InfeasibleConstraints { ref constraint, .. }) if constraint == "budget_hours"
        ));
    }

    #[test]
    fn test_cancelled_search_is_interrupted() {
        let it: Vec<Item> = (0..60)
            .map(|i| Item {
                risk: 0.5 + (i % 7) as f64 * 0.01,
                effort: 1.0 + (i % 5) as f64 * 0.25,
            })
            .collect();
        let stop = StopSignal::default();
        stop.cancel();
        let result = BranchAndBound.solve(&it, &Formulation::budget(30.0), &stop);
        assert!(matches!(result, Err(SolveError::Interrupted)));
    }
}
