//! Console table for match results.
//!
//! Renders three columns (`File`, `MostSimilar`, `Score`) inside an ASCII
//! border. When the natural width exceeds [`MAX_TABLE_WIDTH`], the two path
//! columns are shrunk in proportion to their widths (never below
//! [`MIN_COLUMN_WIDTH`]) and long paths wrap onto continuation lines.
//!
//! ```
//! use mostsimilar::output::{table::TableOutput, ReportRow};
//!
//! let rows = vec![ReportRow {
//!     file: ".../a.txt".to_string(),
//!     most_similar: ".../b.txt".to_string(),
//!     score: 1.0,
//!     pair_id: 1,
//! }];
//! let table = TableOutput::new(&rows).without_footnote().render();
//! assert_eq!(
//!     table,
//!     "+-----------+-------------+------------+\n\
//!      | File      | MostSimilar |      Score |\n\
//!      +-----------+-------------+------------+\n\
//!      | .../a.txt | .../b.txt   | 1.00000000 |\n\
//!      +-----------+-------------+------------+\n"
//! );
//! ```

use std::fmt::Write as _;
use std::io;

use super::{format_score, ReportRow};

/// Widest table, borders included.
pub const MAX_TABLE_WIDTH: usize = 132;

/// Narrowest a path column is shrunk to.
pub const MIN_COLUMN_WIDTH: usize = 10;

/// Borders and padding around the three columns.
const FRAME_WIDTH: usize = 10;

const HEADER_FILE: &str = "File";
const HEADER_MATCH: &str = "MostSimilar";
const HEADER_SCORE: &str = "Score";

/// Explains how reciprocal pairs are laid out.
pub const FOOTNOTE: &str = "\
* Reciprocal best matches are shown once; the left column is the preferred file
  and the right column is the duplicate candidate (threshold 0.00000001), chosen
  by filename version/date markers, then modification time, then scan order.
";

/// Column widths, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWidths {
    pub file: usize,
    pub matched: usize,
    pub score: usize,
}

impl ColumnWidths {
    /// Clamps natural column widths to [`MAX_TABLE_WIDTH`].
    #[must_use]
    pub fn fit(file: usize, matched: usize, score: usize) -> Self {
        let mut widths = Self {
            file,
            matched,
            score,
        };
        if file + matched + score + FRAME_WIDTH <= MAX_TABLE_WIDTH {
            return widths;
        }

        let max_sum = if MAX_TABLE_WIDTH > score + FRAME_WIDTH {
            MAX_TABLE_WIDTH - score - FRAME_WIDTH
        } else {
            MIN_COLUMN_WIDTH * 2
        };
        let total = (file + matched).max(1);
        widths.file = MIN_COLUMN_WIDTH.max(file.min(max_sum * file / total));
        widths.matched = MIN_COLUMN_WIDTH.max(max_sum.saturating_sub(widths.file));
        if widths.file + widths.matched > max_sum {
            widths.file = MIN_COLUMN_WIDTH.max(max_sum.saturating_sub(widths.matched));
        }
        widths
    }

    /// Total rendered width, borders included.
    #[must_use]
    pub fn total(&self) -> usize {
        self.file + self.matched + self.score + FRAME_WIDTH
    }
}

/// Splits `text` into pieces of at most `width` characters.
///
/// Always returns at least one (possibly empty) line.
#[must_use]
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 || text.is_empty() {
        return vec![String::new()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

/// ASCII table formatter.
pub struct TableOutput<'a> {
    rows: &'a [ReportRow],
    footnote: bool,
}

impl<'a> TableOutput<'a> {
    #[must_use]
    pub fn new(rows: &'a [ReportRow]) -> Self {
        Self {
            rows,
            footnote: true,
        }
    }

    /// Omit the explanatory footnote.
    #[must_use]
    pub fn without_footnote(mut self) -> Self {
        self.footnote = false;
        self
    }

    /// Widths that fit every row.
    #[must_use]
    pub fn widths(&self) -> ColumnWidths {
        let natural = self.rows.iter().fold(
            (
                HEADER_FILE.len(),
                HEADER_MATCH.len(),
                HEADER_SCORE.len(),
            ),
            |(f, m, s), row| {
                (
                    f.max(row.file.chars().count()),
                    m.max(row.most_similar.chars().count()),
                    s.max(format_score(row.score).len()),
                )
            },
        );
        ColumnWidths::fit(natural.0, natural.1, natural.2)
    }

    /// Renders the table (and footnote) to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();

        separator(&mut out, widths);
        line(&mut out, widths, HEADER_FILE, HEADER_MATCH, HEADER_SCORE);
        separator(&mut out, widths);
        for row in self.rows {
            let score = format_score(row.score);
            let file_lines = wrap_text(&row.file, widths.file);
            let match_lines = wrap_text(&row.most_similar, widths.matched);
            for i in 0..file_lines.len().max(match_lines.len()) {
                line(
                    &mut out,
                    widths,
                    file_lines.get(i).map_or("", String::as_str),
                    match_lines.get(i).map_or("", String::as_str),
                    if i == 0 { &score } else { "" },
                );
            }
        }
        separator(&mut out, widths);
        if self.footnote {
            out.push_str(FOOTNOTE);
        }
        out
    }

    /// Writes the rendered table to `writer`.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())?;
        writer.flush()
    }
}

fn separator(out: &mut String, widths: ColumnWidths) {
    let _ = writeln!(
        out,
        "+{}+{}+{}+",
        "-".repeat(widths.file + 2),
        "-".repeat(widths.matched + 2),
        "-".repeat(widths.score + 2)
    );
}

fn line(out: &mut String, widths: ColumnWidths, file: &str, matched: &str, score: &str) {
    let _ = writeln!(
        out,
        "| {file:<fw$} | {matched:<mw$} | {score:>sw$} |",
        fw = widths.file,
        mw = widths.matched,
        sw = widths.score
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(file: &str, most_similar: &str, score: f64) -> ReportRow {
        ReportRow {
            file: file.to_string(),
            most_similar: most_similar.to_string(),
            score,
            pair_id: 1,
        }
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("", 4), vec![""]);
        assert_eq!(wrap_text("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("abc", 0), vec![""]);
        assert_eq!(wrap_text("éééé", 3), vec!["ééé", "é"]);
    }

    #[test]
    fn test_widths_fit_without_clamping() {
        let widths = ColumnWidths::fit(20, 30, 10);
        assert_eq!(widths, ColumnWidths { file: 20, matched: 30, score: 10 });
    }

    #[test]
    fn test_widths_clamped_proportionally() {
        let widths = ColumnWidths::fit(150, 50, 10);
        // max_sum = 132 - 10 - 10 = 112; file = 112 * 150 / 200 = 84
        assert_eq!(widths.file, 84);
        assert_eq!(widths.matched, 28);
        assert_eq!(widths.total(), MAX_TABLE_WIDTH);
    }

    #[test]
    fn test_widths_respect_minimum() {
        let widths = ColumnWidths::fit(500, 5, 10);
        assert_eq!(widths.matched, MIN_COLUMN_WIDTH);
        assert_eq!(widths.file, 102);
        assert_eq!(widths.total(), MAX_TABLE_WIDTH);
    }

    #[test]
    fn test_long_paths_wrap_and_align() {
        let long = format!(".../{}", "d".repeat(200));
        let rows = vec![row(&long, ".../short.txt", 0.5)];
        let rendered = TableOutput::new(&rows).without_footnote().render();
        let lines: Vec<&str> = rendered.lines().collect();
        let width = lines[0].chars().count();
        assert!(width <= MAX_TABLE_WIDTH);
        assert!(lines.iter().all(|l| l.chars().count() == width));
        // Header block (3 lines) + wrapped row (> 1 line) + closing border.
        assert!(lines.len() > 5);
        assert!(lines[3].ends_with("0.50000000 |"));
        assert!(!lines[4].contains("0.5"));
    }

    #[test]
    fn test_footnote_appended() {
        let rows = vec![row(".../a", ".../b", 1.0)];
        let rendered = TableOutput::new(&rows).render();
        assert!(rendered.ends_with(FOOTNOTE));
        assert!(FOOTNOTE.contains("threshold 0.00000001"));
    }

    #[test]
    fn test_empty_partner_cell() {
        let rows = vec![row(".../lonely.txt", "", 0.0)];
        let rendered = TableOutput::new(&rows).without_footnote().render();
        assert!(rendered.contains("| .../lonely.txt | "));
    }
}
