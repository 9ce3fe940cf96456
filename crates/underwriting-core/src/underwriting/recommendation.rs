use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Multiple, Rate};

/// Qualitative read on a single metric or on the deal as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Good,
    Warning,
    Bad,
    /// Metric is undefined; counted as bad
    Missing,
}

impl Tone {
    fn counts_as_bad(self) -> bool {
        matches!(self, Tone::Bad | Tone::Missing)
    }
}

/// Two-tier threshold: `good` at or above, `warning` at or above, otherwise bad.
#[derive(Debug, Clone, Copy)]
struct Benchmark {
    good: Decimal,
    warning: Decimal,
}

const DSCR_BENCHMARK: Benchmark = Benchmark {
    good: dec!(1.25),
    warning: dec!(1.05),
};
const CASH_ON_CASH_BENCHMARK: Benchmark = Benchmark {
    good: dec!(0.08),
    warning: dec!(0.04),
};
const IRR_BENCHMARK: Benchmark = Benchmark {
    good: dec!(0.12),
    warning: dec!(0.08),
};

impl Benchmark {
    fn classify(&self, value: Option<Decimal>) -> Tone {
        match value {
            None => Tone::Missing,
            Some(v) if v >= self.good => Tone::Good,
            Some(v) if v >= self.warning => Tone::Warning,
            Some(_) => Tone::Bad,
        }
    }
}

/// Assessment of one metric against its benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAssessment {
    pub metric: String,
    pub value: Option<Decimal>,
    pub tone: Tone,
    /// Value at or above which the metric reads as good
    pub benchmark: Decimal,
    pub text: String,
}

/// Per-metric verdicts plus an aggregate headline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub assessments: Vec<MetricAssessment>,
    pub tone: Tone,
    pub headline: String,
}

/// Classify a deal on DSCR, year-1 cash-on-cash and levered IRR.
pub fn classify(
    dscr: Option<Multiple>,
    cash_on_cash: Option<Rate>,
    levered_irr: Option<Rate>,
) -> RecommendationResult {
    let assessments = vec![
        assess_dscr(dscr),
        assess_rate("Cash-on-cash", cash_on_cash, CASH_ON_CASH_BENCHMARK),
        assess_rate("Levered IRR", levered_irr, IRR_BENCHMARK),
    ];

    let bad = assessments.iter().filter(|a| a.tone.counts_as_bad()).count();
    let good = assessments.iter().filter(|a| a.tone == Tone::Good).count();

    let (tone, headline) = if bad >= 2 {
        (Tone::Bad, "Likely not worth it")
    } else if good >= 2 && bad == 0 {
        (Tone::Good, "Likely worth pursuing")
    } else {
        (Tone::Warning, "Borderline — needs diligence.")
    };

    RecommendationResult {
        assessments,
        tone,
        headline: headline.to_string(),
    }
}

fn assess_dscr(value: Option<Multiple>) -> MetricAssessment {
    let tone = DSCR_BENCHMARK.classify(value);
    let text = match (tone, value) {
        (Tone::Good, Some(v)) => format!(
            "DSCR of {:.2}x clears the {:.2}x lender benchmark",
            v, DSCR_BENCHMARK.good
        ),
        (Tone::Warning, Some(v)) => format!(
            "DSCR of {:.2}x is thin: covers debt service but sits below {:.2}x",
            v, DSCR_BENCHMARK.good
        ),
        (_, Some(v)) => format!(
            "DSCR of {:.2}x is below {:.2}x; NOI barely covers debt service",
            v, DSCR_BENCHMARK.warning
        ),
        (_, None) => "DSCR is undefined (no debt service)".to_string(),
    };

    MetricAssessment {
        metric: "DSCR".into(),
        value,
        tone,
        benchmark: DSCR_BENCHMARK.good,
        text,
    }
}

fn assess_rate(metric: &str, value: Option<Rate>, benchmark: Benchmark) -> MetricAssessment {
    let tone = benchmark.classify(value);
    let text = match (tone, value) {
        (Tone::Good, Some(v)) => format!(
            "{metric} of {} meets the {} target",
            percent(v),
            percent(benchmark.good)
        ),
        (Tone::Warning, Some(v)) => format!(
            "{metric} of {} is between {} and the {} target",
            percent(v),
            percent(benchmark.warning),
            percent(benchmark.good)
        ),
        (_, Some(v)) => format!(
            "{metric} of {} is below the {} floor",
            percent(v),
            percent(benchmark.warning)
        ),
        (_, None) => format!("{metric} is undefined for this cash-flow profile"),
    };

    MetricAssessment {
        metric: metric.to_string(),
        value,
        tone,
        benchmark: benchmark.good,
        text,
    }
}

fn percent(rate: Rate) -> String {
    format!("{:.1}%", rate.saturating_mul(dec!(100)))
}
