//! Text (terminal) reporter with colors and formatting

use crate::engine::StrategyComparison;
use crate::models::{Criticality, PrioritizationPlan};
use anyhow::Result;
use console::style;
use std::fmt::Write as _;

fn criticality_tag(level: Criticality) -> String {
    match level {
        Criticality::High => style("[H]").red().bold().to_string(),
        Criticality::Medium => style("[M]").yellow().to_string(),
        Criticality::Low => style("[L]").dim().to_string(),
    }
}

/// Render a plan as a ranked table with a metrics summary
pub fn render_plan(plan: &PrioritizationPlan) -> Result<String> {
    let mut out = String::new();
    let m = &plan.metrics;

    writeln!(out, "\n{}", style("Prioritization Plan").bold())?;
    writeln!(out, "{}", style("──────────────────────────────────────").dim())?;
    writeln!(
        out,
        "Strategy: {}  Solver: {}  Selected: {}/{}",
        style(&plan.strategy).cyan(),
        plan.solver,
        m.selected_count,
        m.candidate_count
    )?;
    writeln!(out)?;

    if plan.is_empty() {
        writeln!(out, "{}", style("No classes selected.").dim())?;
    } else {
        writeln!(
            out,
            "{}",
            style(format!(
                "{:>4}  {:<3} {:<32} {:>6} {:>8} {:>8}",
                "#", "", "CLASS", "RISK", "EFFORT", "SCORE"
            ))
            .bold()
        )?;
        for entry in &plan.entries {
            let e = &entry.enriched;
            writeln!(
                out,
                "{:>4}  {} {:<32} {:>6.2} {:>7.1}h {:>8.3}",
                entry.priority,
                criticality_tag(e.module_criticality),
                truncate(e.id(), 32),
                e.risk_score(),
                e.effort_hours,
                e.effort_aware_score
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", style("METRICS").bold())?;
    writeln!(
        out,
        "  Effort: {:.1}h  Coverage gain: {:.1}%  Popt@20: {:.3}  Recall@Top20: {:.3}",
        m.total_effort_hours,
        m.estimated_coverage_gain * 100.0,
        m.popt20_score,
        m.recall_top20
    )?;
    writeln!(
        out,
        "  Risk selected: {:.2} of {:.2}  Avg score: {:.3}",
        m.total_risk_selected, m.total_risk_all, m.avg_effort_aware_score
    )?;

    let c = &plan.criticality;
    if c.total > 0 {
        let levels: Vec<String> = Criticality::all()
            .iter()
            .map(|&level| format!("{} {} ({:.0}%)", c.count(level), level, c.percent(level)))
            .collect();
        writeln!(out, "  Criticality: {}", levels.join(", "))?;
    }

    Ok(out)
}

/// Render a side-by-side strategy comparison
pub fn render_comparison(rows: &[StrategyComparison]) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "\n{}", style("Strategy Comparison").bold())?;
    writeln!(out, "{}", style("──────────────────────────────────────").dim())?;
    writeln!(
        out,
        "{}",
        style(format!(
            "{:<22} {:>8} {:>9} {:>9} {:>8} {:>8}",
            "STRATEGY", "CLASSES", "EFFORT", "COVERAGE", "POPT20", "RECALL"
        ))
        .bold()
    )?;

    for row in rows {
        match (&row.metrics, &row.error) {
            (Some(m), _) => writeln!(
                out,
                "{:<22} {:>8} {:>8.1}h {:>8.1}% {:>8.3} {:>8.3}",
                row.strategy,
                m.selected_count,
                m.total_effort_hours,
                m.estimated_coverage_gain * 100.0,
                m.popt20_score,
                m.recall_top20
            )?,
            (None, Some(e)) => {
                writeln!(out, "{:<22} {}", row.strategy, style(e).red())?
            }
            (None, None) => writeln!(out, "{:<22} -", row.strategy)?,
        }
    }

    if let Some(m) = rows.iter().find_map(|row| row.metrics.as_ref()) {
        writeln!(
            out,
            "\n{}",
            style(format!("Popt@20 and Recall@Top20 measured against {}", m.basis)).dim()
        )?;
    }

    Ok(out)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
