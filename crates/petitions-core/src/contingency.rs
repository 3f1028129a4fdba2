//! Petition x region matrix of observed signature counts.

use std::collections::{BTreeMap, BTreeSet};

use crate::petition::ConstituencySignature;

/// Observed signatures, one row per petition and one column per region code.
///
/// Rows and columns are kept in ascending order. Cells with no matching
/// signature rows hold 0; duplicate (petition, region) rows are summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContingencyTable {
    petition_ids: Vec<u64>,
    region_codes: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Pivot constituency signature rows into a table.
    pub fn from_signatures(rows: &[ConstituencySignature]) -> Self {
        let mut cells: BTreeMap<(u64, &str), u64> = BTreeMap::new();
        let mut petitions = BTreeSet::new();
        let mut regions = BTreeSet::new();

        for row in rows {
            petitions.insert(row.petition_id);
            regions.insert(row.region_code.as_str());
            *cells
                .entry((row.petition_id, row.region_code.as_str()))
                .or_insert(0) += row.signatures;
        }

        let petition_ids: Vec<u64> = petitions.into_iter().collect();
        let region_codes: Vec<String> = regions.iter().map(|r| r.to_string()).collect();
        let counts = petition_ids
            .iter()
            .map(|&pid| {
                regions
                    .iter()
                    .map(|&code| cells.get(&(pid, code)).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Self {
            petition_ids,
            region_codes,
            counts,
        }
    }

    /// Build a table from explicit `(petition, [(region, count)])` rows.
    pub fn from_rows<'a, I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = (u64, R)>,
        R: IntoIterator<Item = (&'a str, u64)>,
    {
        let flat: Vec<ConstituencySignature> = rows
            .into_iter()
            .flat_map(|(pid, cells)| {
                cells
                    .into_iter()
                    .map(move |(code, signatures)| ConstituencySignature {
                        petition_id: pid,
                        constituency: code.to_string(),
                        region_code: code.to_string(),
                        signatures,
                    })
            })
            .collect();
        Self::from_signatures(&flat)
    }

    pub fn petition_ids(&self) -> &[u64] {
        &self.petition_ids
    }

    pub fn region_codes(&self) -> &[String] {
        &self.region_codes
    }

    pub fn n_rows(&self) -> usize {
        self.petition_ids.len()
    }

    pub fn n_cols(&self) -> usize {
        self.region_codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.petition_ids.is_empty() || self.region_codes.is_empty()
    }

    /// Observed count at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.counts[row][col]
    }

    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|r| r.iter().sum()).collect()
    }

    pub fn col_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.n_cols()];
        for row in &self.counts {
            for (t, &v) in totals.iter_mut().zip(row) {
                *t += v;
            }
        }
        totals
    }

    pub fn grand_total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Column index of a region code.
    pub fn region_index(&self, code: &str) -> Option<usize> {
        self.region_codes
            .binary_search_by(|c| c.as_str().cmp(code))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(pid: u64, code: &str, n: u64) -> ConstituencySignature {
        ConstituencySignature {
            petition_id: pid,
            constituency: format!("{code} name"),
            region_code: code.into(),
            signatures: n,
        }
    }

    #[test]
    fn pivots_and_fills_missing_with_zero() {
        let table = ContingencyTable::from_signatures(&[
            sig(2, "E2", 5),
            sig(1, "E1", 10),
            sig(1, "E3", 1),
        ]);

        assert_eq!(table.petition_ids(), &[1, 2]);
        assert_eq!(table.region_codes(), &["E1", "E2", "E3"]);
        assert_eq!(table.get(0, 0), 10);
        assert_eq!(table.get(0, 1), 0);
        assert_eq!(table.get(1, 1), 5);
        assert_eq!(table.get(1, 2), 0);
    }

    #[test]
    fn duplicate_cells_are_summed() {
        let table = ContingencyTable::from_signatures(&[sig(1, "E1", 10), sig(1, "E1", 7)]);
        assert_eq!(table.get(0, 0), 17);
    }

    #[test]
    fn margins() {
        let table = ContingencyTable::from_rows([
            (1, vec![("R1", 100), ("R2", 0)]),
            (2, vec![("R1", 30), ("R2", 70)]),
        ]);
        assert_eq!(table.row_totals(), vec![100, 100]);
        assert_eq!(table.col_totals(), vec![130, 70]);
        assert_eq!(table.grand_total(), 200);
        assert_eq!(table.region_index("R2"), Some(1));
        assert_eq!(table.region_index("R9"), None);
    }

    #[test]
    fn empty_input() {
        let table = ContingencyTable::from_signatures(&[]);
        assert!(table.is_empty());
        assert_eq!(table.grand_total(), 0);
    }
}
