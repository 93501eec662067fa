//! A1 notation helpers.

/// 1-indexed column number to letters: 1 -> A, 19 -> S, 27 -> AA.
pub fn column_letters(mut column: u32) -> String {
    let mut out = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        out.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Tab name quoted for use in a range (`03-2026` -> `'03-2026'`).
pub fn quote_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

pub fn cell(tab: &str, row: u32, column: u32) -> String {
    format!("{}!{}{}", quote_tab(tab), column_letters(column), row)
}

pub fn whole_column(tab: &str, column: u32) -> String {
    let col = column_letters(column);
    format!("{}!{col}:{col}", quote_tab(tab))
}

/// Full rows `first` through `last`, e.g. `'03-2026'!8:25`.
pub fn row_span(tab: &str, first: u32, last: u32) -> String {
    format!("{}!{first}:{last}", quote_tab(tab))
}
