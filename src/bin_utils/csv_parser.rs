use std::io::Read;

use crate::account::AccountId;
use csv::{DeserializeRecordsIntoIter, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Open,
    Transfer,
}

#[derive(Debug, Deserialize)]
pub struct Row {
    #[serde(rename = "type")]
    pub kind: RowKind,
    pub account: AccountId,
    pub to: Option<AccountId>,
    pub amount: Decimal,
}

/// Parses ledger rows in CSV format, yielding each row with its line number.
pub struct CsvRowParser<R> {
    iter: DeserializeRecordsIntoIter<R, Row>,
}

impl<R> CsvRowParser<R>
where
    R: Read,
{
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(source);

        Self {
            iter: reader.into_deserialize(),
        }
    }
}

impl<R> Iterator for CsvRowParser<R>
where
    R: Read,
{
    type Item = (u64, Result<Row, csv::Error>);

    fn next(&mut self) -> Option<Self::Item> {
        let curr_line = self.iter.reader().position().line();
        self.iter.next().map(|row| (curr_line, row))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    #[test]
    fn parse_rows() {
        let input = "type, account, to, amount\nopen, 1, , 100\ntransfer, 1, 2, 2.5\nbogus, 1, 2, 3\n";
        let rows: Vec<_> = CsvRowParser::new(input.as_bytes()).collect();
        assert_eq!(rows.len(), 3);

        let (_, open) = &rows[0];
        let open = open.as_ref().unwrap();
        assert_eq!(open.kind, RowKind::Open);
        assert_eq!(open.account, 1);
        assert_eq!(open.to, None);
        assert_eq!(open.amount, Decimal::from_u32(100).unwrap());

        let (_, transfer) = &rows[1];
        let transfer = transfer.as_ref().unwrap();
        assert_eq!(transfer.kind, RowKind::Transfer);
        assert_eq!(transfer.to, Some(2));
        assert_eq!(transfer.amount, Decimal::from_f64(2.5).unwrap());

        assert!(rows[2].1.is_err());
    }
}
