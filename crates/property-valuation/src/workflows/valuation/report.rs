use std::fmt::Write as _;

use serde::Serialize;

use super::domain::ValuationResult;
use super::orchestrator::SubmissionSnapshot;

/// How an amount is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Bare number; whole values print without decimals.
    Plain,
    Euro,
    Percent,
    /// Dimensionless ratio such as the multiplier or index factor.
    Factor,
}

impl Unit {
    fn format(self, amount: f64) -> String {
        match self {
            Unit::Plain if amount.fract() == 0.0 => format!("{amount}"),
            Unit::Plain => format!("{amount:.2}"),
            Unit::Euro => format!("{amount:.2} EUR"),
            Unit::Percent => format!("{amount:.2} %"),
            Unit::Factor => format!("{amount:.4}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueLine {
    pub label: &'static str,
    pub amount: f64,
    pub unit: Unit,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub title: &'static str,
    pub lines: Vec<ValueLine>,
}

/// Display model of a valuation result plus whatever insight state accompanies it.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationReport {
    pub sections: Vec<ReportSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight_error: Option<String>,
}

impl ValuationReport {
    pub fn from_result(result: &ValuationResult) -> Self {
        let costs = &result.management_costs;
        let cpi = &result.cpi_used;

        let mut value_lines = vec![
            line("Theoretical total value", result.theoretical_total_value, Unit::Euro),
            line("Theoretical building value", result.theoretical_building_value, Unit::Euro),
            line("Land value", result.land_value, Unit::Euro),
        ];
        if let Some(amount) = result.actual_building_value {
            value_lines.push(line("Actual building value", amount, Unit::Euro));
        }
        if let Some(amount) = result.actual_land_value {
            value_lines.push(line("Actual land value", amount, Unit::Euro));
        }
        value_lines.push(line("Building share", result.building_share_percent, Unit::Percent));
        value_lines.push(line("Land share", result.land_share_percent, Unit::Percent));

        let mut cost_lines = vec![
            line("Administration", costs.administration, Unit::Euro),
            line("Maintenance", costs.maintenance, Unit::Euro),
            line("Risk of rent loss", costs.risk_of_rent_loss, Unit::Euro),
        ];
        if let Some(percentage) = costs.risk_percentage {
            cost_lines.push(line("Rent loss risk rate", percentage, Unit::Percent));
        }
        cost_lines.push(line("Total", costs.total, Unit::Euro));

        let sections = vec![
            ReportSection {
                title: "Values",
                lines: value_lines,
            },
            ReportSection {
                title: "Income",
                lines: vec![
                    line("Annual gross income", result.annual_gross_income, Unit::Euro),
                    line("Annual net income", result.annual_net_income, Unit::Euro),
                    line("Land interest", result.land_interest, Unit::Euro),
                    line("Building net income", result.building_net_income, Unit::Euro),
                    line("Multiplier", result.multiplier, Unit::Factor),
                ],
            },
            ReportSection {
                title: "Management costs",
                lines: cost_lines,
            },
            ReportSection {
                title: "Indexation",
                lines: vec![
                    line("CPI year", f64::from(cpi.year), Unit::Plain),
                    line("CPI month", f64::from(cpi.month), Unit::Plain),
                    line("CPI index value", cpi.index_value, Unit::Plain),
                    line("CPI base year", f64::from(cpi.base_year), Unit::Plain),
                    line("CPI base (Oct 2001)", result.cpi_base_2001, Unit::Plain),
                    line("Index factor", result.index_factor, Unit::Factor),
                ],
            },
        ];

        Self {
            sections,
            insight: None,
            insight_error: None,
        }
    }

    /// Build from a session snapshot; `None` when no result is present.
    pub fn from_snapshot(snapshot: &SubmissionSnapshot) -> Option<Self> {
        let result = snapshot.result.as_ref()?;
        let mut report = Self::from_result(result);
        report.insight = snapshot.insight_text.clone();
        report.insight_error = snapshot.insight_error.clone();
        Some(report)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            writeln!(out, "{}", section.title).expect("write section title");
            for entry in &section.lines {
                writeln!(out, "  {:<28} {}", entry.label, entry.unit.format(entry.amount))
                    .expect("write value line");
            }
            out.push('\n');
        }
        if let Some(insight) = &self.insight {
            writeln!(out, "Insight\n{insight}").expect("write insight");
        }
        if let Some(error) = &self.insight_error {
            writeln!(out, "Insight unavailable: {error}").expect("write insight error");
        }
        out.trim_end().to_string()
    }
}

fn line(label: &'static str, amount: f64, unit: Unit) -> ValueLine {
    ValueLine {
        label,
        amount,
        unit,
    }
}
