//! Chi-square residual analysis over a petition x region table.
//!
//! The test of independence runs over the whole table at once: one statistic,
//! one p-value, and one expected-count matrix. Per-cell standardized residuals
//! `(observed - expected) / sqrt(expected)` then flag regions whose support
//! for a petition is unusually high or low relative to that petition's total
//! and the region's overall activity.
//!
//! Cells whose expected count is zero (an all-zero row or column) have no
//! residual. They carry `None` rather than a number and are never significant.

use crate::contingency::ContingencyTable;

/// Two-tailed 95% critical value of the standard normal.
pub const SIGNIFICANCE: f64 = 1.96;

/// Table-wide result of the Pearson test of independence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquareSummary {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
}

/// Where an observed count falls relative to its expected count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Lower,
    Within,
    Higher,
    /// Expected count is zero.
    Undefined,
}

impl Direction {
    pub fn from_residual(residual: Option<f64>) -> Self {
        match residual {
            None => Self::Undefined,
            Some(r) if r < -SIGNIFICANCE => Self::Lower,
            Some(r) if r > SIGNIFICANCE => Self::Higher,
            Some(_) => Self::Within,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lower => "Lower than expected",
            Self::Within => "Within expected range",
            Self::Higher => "Higher than expected",
            Self::Undefined => "Undefined",
        }
    }
}

/// One cell of the analysed table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualRecord {
    pub petition_id: u64,
    pub region_code: String,
    pub observed: u64,
    pub expected: f64,
    /// Share of the petition's signatures from this region. `None` if the
    /// petition has no signatures at all.
    pub row_percent: Option<f64>,
    /// `None` when `expected` is zero.
    pub std_residual: Option<f64>,
    pub significant: bool,
}

impl ResidualRecord {
    pub fn direction(&self) -> Direction {
        Direction::from_residual(self.std_residual)
    }
}

/// One petition's figures for a single region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRow {
    pub petition_id: u64,
    pub observed: u64,
    pub expected: f64,
    pub row_percent: Option<f64>,
    pub std_residual: Option<f64>,
    pub direction: Direction,
}

/// Expected counts, residuals and the overall test for a [`ContingencyTable`].
pub struct ChiAnalysis {
    table: ContingencyTable,
    expected: Vec<Vec<f64>>,
    row_totals: Vec<u64>,
    summary: ChiSquareSummary,
}

impl ChiAnalysis {
    pub fn new(table: ContingencyTable) -> Self {
        let row_totals = table.row_totals();
        let col_totals = table.col_totals();
        let grand = table.grand_total() as f64;

        let expected: Vec<Vec<f64>> = row_totals
            .iter()
            .map(|&r| {
                col_totals
                    .iter()
                    .map(|&c| {
                        if grand > 0.0 {
                            r as f64 * c as f64 / grand
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        let summary = pearson(&table, &expected);

        Self {
            table,
            expected,
            row_totals,
            summary,
        }
    }

    pub fn table(&self) -> &ContingencyTable {
        &self.table
    }

    pub fn summary(&self) -> ChiSquareSummary {
        self.summary
    }

    pub fn expected(&self, row: usize, col: usize) -> f64 {
        self.expected[row][col]
    }

    /// `(observed - expected) / sqrt(expected)`, undefined for zero expected.
    pub fn std_residual(&self, row: usize, col: usize) -> Option<f64> {
        let expected = self.expected[row][col];
        if expected > 0.0 {
            Some((self.table.get(row, col) as f64 - expected) / expected.sqrt())
        } else {
            None
        }
    }

    pub fn row_percent(&self, row: usize, col: usize) -> Option<f64> {
        match self.row_totals[row] {
            0 => None,
            total => Some(self.table.get(row, col) as f64 / total as f64),
        }
    }

    fn is_significant(residual: Option<f64>) -> bool {
        residual.is_some_and(|r| r.abs() > SIGNIFICANCE)
    }

    /// Every cell of the table, petitions in descending id order and each
    /// petition's regions highest-signature-first.
    pub fn records(&self) -> Vec<ResidualRecord> {
        let mut out = Vec::with_capacity(self.table.n_rows() * self.table.n_cols());
        for (row, &petition_id) in self.table.petition_ids().iter().enumerate() {
            for (col, code) in self.table.region_codes().iter().enumerate() {
                let std_residual = self.std_residual(row, col);
                out.push(ResidualRecord {
                    petition_id,
                    region_code: code.clone(),
                    observed: self.table.get(row, col),
                    expected: self.expected[row][col],
                    row_percent: self.row_percent(row, col),
                    std_residual,
                    significant: Self::is_significant(std_residual),
                });
            }
        }
        out.sort_by(|a, b| {
            b.petition_id
                .cmp(&a.petition_id)
                .then(b.observed.cmp(&a.observed))
                .then_with(|| a.region_code.cmp(&b.region_code))
        });
        out
    }

    /// Region codes with at least one significant cell, in column order.
    pub fn interesting_regions(&self) -> Vec<&str> {
        self.table
            .region_codes()
            .iter()
            .enumerate()
            .filter(|(col, _)| {
                (0..self.table.n_rows())
                    .any(|row| Self::is_significant(self.std_residual(row, *col)))
            })
            .map(|(_, code)| code.as_str())
            .collect()
    }

    /// All petitions' figures for one region, or `None` for an unknown code.
    pub fn region_table(&self, code: &str) -> Option<Vec<RegionRow>> {
        let col = self.table.region_index(code)?;
        Some(
            self.table
                .petition_ids()
                .iter()
                .enumerate()
                .map(|(row, &petition_id)| {
                    let std_residual = self.std_residual(row, col);
                    RegionRow {
                        petition_id,
                        observed: self.table.get(row, col),
                        expected: self.expected[row][col],
                        row_percent: self.row_percent(row, col),
                        std_residual,
                        direction: Direction::from_residual(std_residual),
                    }
                })
                .collect(),
        )
    }
}

/// Pearson statistic over cells with a positive expected count.
///
/// With one degree of freedom, Yates' continuity correction moves each
/// observed count up to 0.5 towards its expected count before squaring.
fn pearson(table: &ContingencyTable, expected: &[Vec<f64>]) -> ChiSquareSummary {
    let dof = table.n_rows().saturating_sub(1) * table.n_cols().saturating_sub(1);
    if dof == 0 {
        return ChiSquareSummary {
            statistic: 0.0,
            p_value: 1.0,
            degrees_of_freedom: 0,
        };
    }

    let yates = dof == 1;
    let mut statistic = 0.0;
    for (row, exp_row) in expected.iter().enumerate() {
        for (col, &exp) in exp_row.iter().enumerate() {
            if exp <= 0.0 {
                continue;
            }
            let observed = table.get(row, col) as f64;
            let mut diff = (observed - exp).abs();
            if yates {
                diff -= diff.min(0.5);
            }
            statistic += diff * diff / exp;
        }
    }

    ChiSquareSummary {
        statistic,
        p_value: chi2_sf(statistic, dof),
        degrees_of_freedom: dof,
    }
}

// ── Distribution functions ──

/// Survival function of the chi-square distribution: `P(X >= statistic)`.
pub fn chi2_sf(statistic: f64, dof: usize) -> f64 {
    if dof == 0 || statistic <= 0.0 {
        return 1.0;
    }
    gamma_q(dof as f64 / 2.0, statistic / 2.0)
}

const GAMMA_EPS: f64 = 1e-14;
const GAMMA_MAX_ITER: usize = 500;
const TINY: f64 = 1e-300;

/// Regularized upper incomplete gamma `Q(a, x)`.
fn gamma_q(a: f64, x: f64) -> f64 {
    if x < a + 1.0 {
        1.0 - gamma_p_series(a, x)
    } else {
        gamma_q_continued_fraction(a, x)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut term = 1.0 / a;
    let mut sum = term;
    for _ in 0..GAMMA_MAX_ITER {
        ap += 1.0;
        term *= x / ap;
        sum += term;
        if term.abs() < sum.abs() * GAMMA_EPS {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

/// Modified Lentz evaluation of the continued fraction for `Q(a, x)`.
fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=GAMMA_MAX_ITER {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < GAMMA_EPS {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Lanczos approximation (g = 7, n = 9).
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        // Reflection formula.
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut acc = COEFFS[0];
    let t = x + 7.5;
    for (i, &c) in COEFFS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}
