//! Result table and column selection.

use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FatturaError;
use crate::models::record::InvoiceRow;

/// Commonly exported invoice columns, in output order.
pub const DEFAULT_COLUMNS: [&str; 17] = [
    "CedentePrestatore/DatiAnagrafici/IdFiscaleIVA/IdPaese",
    "CedentePrestatore/DatiAnagrafici/IdFiscaleIVA/IdCodice",
    "CedentePrestatore/DatiAnagrafici/Anagrafica/Denominazione",
    "CedentePrestatore/DatiAnagrafici/RegimeFiscale",
    "CedentePrestatore/Sede/Indirizzo",
    "CedentePrestatore/Sede/NumeroCivico",
    "CedentePrestatore/Sede/CAP",
    "CedentePrestatore/Sede/Comune",
    "TipoDocumento",
    "Data",
    "Numero",
    "ImportoTotaleDocumento",
    "AliquotaIVA",
    "ImponibileImporto",
    "Imposta",
    "Descrizione",
    "PrezzoTotale",
];

/// Rows from every processed document, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultTable {
    rows: Vec<InvoiceRow>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the rows of one finished document.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = InvoiceRow>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[InvoiceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of all row keys, in order of first appearance.
    pub fn columns(&self) -> Vec<String> {
        let mut seen: IndexSet<&str> = IndexSet::new();
        for row in &self.rows {
            seen.extend(row.keys());
        }
        seen.into_iter().map(str::to_string).collect()
    }

    /// Value of `column` in row `index`; `None` for null or absent cells.
    pub fn value(&self, index: usize, column: &str) -> Option<&str> {
        self.rows.get(index).and_then(|row| row.get(column))
    }

    /// Resolve `selection` against the columns of this table.
    ///
    /// Returns [`FatturaError::NoColumnsSelected`] when nothing matches.
    pub fn select(&self, selection: &ColumnSelection) -> Result<Selected, FatturaError> {
        let available: IndexSet<String> = self.columns().into_iter().collect();

        let selected = match selection {
            ColumnSelection::Default => Selected {
                columns: DEFAULT_COLUMNS
                    .iter()
                    .filter(|c| available.contains(**c))
                    .map(|c| c.to_string())
                    .collect(),
                unknown: Vec::new(),
            },
            ColumnSelection::All => Selected {
                columns: available.iter().cloned().collect(),
                unknown: Vec::new(),
            },
            ColumnSelection::Custom(requested) => {
                let mut columns: IndexSet<String> = IndexSet::new();
                let mut unknown = Vec::new();
                for name in requested {
                    if available.contains(name) {
                        columns.insert(name.clone());
                    } else {
                        warn!("Column not found in table: {}", name);
                        unknown.push(name.clone());
                    }
                }
                Selected {
                    columns: columns.into_iter().collect(),
                    unknown,
                }
            }
        };

        if selected.columns.is_empty() {
            return Err(FatturaError::NoColumnsSelected);
        }

        Ok(selected)
    }
}

/// Which columns to export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSelection {
    /// [`DEFAULT_COLUMNS`] present in the table.
    #[default]
    Default,
    /// Every column in the table.
    All,
    /// The named columns present in the table, in the given order.
    Custom(Vec<String>),
}

impl FromStr for ColumnSelection {
    type Err = std::convert::Infallible;

    /// `default`, `all`, or a comma-separated list of column names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | "default" => ColumnSelection::Default,
            "all" => ColumnSelection::All,
            list => ColumnSelection::Custom(
                list.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        })
    }
}

/// Outcome of resolving a [`ColumnSelection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selected {
    /// Columns to export, in output order.
    pub columns: Vec<String>,
    /// Requested names that are not in the table.
    pub unknown: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FlatRecord;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, Option<&str>)]) -> FlatRecord {
        pairs
            .iter()
            .map(|(k, v)| (*k, v.map(str::to_string)))
            .collect()
    }

    fn sample() -> ResultTable {
        let mut table = ResultTable::new();
        table.extend([
            row(&[("Numero", Some("1")), ("Causale", Some("x")), ("Descrizione", Some("A"))]),
            row(&[("Numero", None), ("Causale", None), ("Descrizione", Some("B"))]),
        ]);
        table.extend([row(&[("Numero", Some("2")), ("CodiceArticolo/CodiceValore", Some("Z1"))])]);
        table
    }

    #[test]
    fn test_columns_union_in_first_seen_order() {
        assert_eq!(
            sample().columns(),
            vec!["Numero", "Causale", "Descrizione", "CodiceArticolo/CodiceValore"]
        );
    }

    #[test]
    fn test_value_lookup() {
        let table = sample();
        assert_eq!(table.value(0, "Descrizione"), Some("A"));
        assert_eq!(table.value(1, "Numero"), None);
        assert_eq!(table.value(2, "Causale"), None);
        assert_eq!(table.value(9, "Numero"), None);
    }

    #[test]
    fn test_select_default_keeps_default_order() {
        let selected = sample().select(&ColumnSelection::Default).unwrap();
        assert_eq!(selected.columns, vec!["Numero", "Descrizione"]);
    }

    #[test]
    fn test_select_all() {
        let selected = sample().select(&ColumnSelection::All).unwrap();
        assert_eq!(selected.columns.len(), 4);
    }

    #[test]
    fn test_select_custom_reports_unknown() {
        let selection: ColumnSelection = "Causale, Nope, Numero, Causale".parse().unwrap();
        let selected = sample().select(&selection).unwrap();

        assert_eq!(selected.columns, vec!["Causale", "Numero"]);
        assert_eq!(selected.unknown, vec!["Nope"]);
    }

    #[test]
    fn test_select_nothing_is_error() {
        let selection = ColumnSelection::Custom(vec!["Nope".to_string()]);
        assert!(matches!(
            sample().select(&selection),
            Err(FatturaError::NoColumnsSelected)
        ));

        assert!(matches!(
            ResultTable::new().select(&ColumnSelection::All),
            Err(FatturaError::NoColumnsSelected)
        ));
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!("default".parse::<ColumnSelection>().unwrap(), ColumnSelection::Default);
        assert_eq!("all".parse::<ColumnSelection>().unwrap(), ColumnSelection::All);
        assert_eq!(
            "Numero,Data".parse::<ColumnSelection>().unwrap(),
            ColumnSelection::Custom(vec!["Numero".to_string(), "Data".to_string()])
        );
    }
}
