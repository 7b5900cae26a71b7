use super::cut::Cut;
use crate::config::Config;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Cut summary rendering
// ---------------------------------------------------------------------------

/// Output format of the cut summary. Purely presentational: every format
/// carries the same rows in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Space-aligned plain-text table.
    Text,
    /// GitHub-style pipe table.
    Markdown,
    /// Comma-delimited rows.
    Csv,
}

const COLUMNS: [&str; 6] = [
    "Cut name",
    "Signal",
    "Background",
    "Passing",
    "Eff.",
    "Pur.",
];

/// Render the per-cut selection summary.
///
/// One row per cut: name, scaled signal/background/passing counts and the
/// derived efficiency and purity. `header` controls whether column titles
/// are emitted. Ratios that are still undefined (nothing accumulated yet)
/// render as `-` rather than a number.
pub fn cut_summary(
    cuts: &[Cut],
    config: &Config,
    header: bool,
    format: ReportFormat,
) -> Result<String> {
    let rows: Vec<[String; 6]> = cuts.iter().map(|cut| row(cut, config)).collect();
    match format {
        ReportFormat::Text => Ok(render_text(&rows, header)),
        ReportFormat::Markdown => Ok(render_markdown(&rows, header)),
        ReportFormat::Csv => render_csv(&rows, header),
    }
}

fn row(cut: &Cut, config: &Config) -> [String; 6] {
    [
        cut.name().to_string(),
        format!("{:.2}", cut.n_signal()),
        format!("{:.2}", cut.n_background()),
        format!("{:.2}", cut.n_passing()),
        ratio_cell(cut.efficiency(), config),
        ratio_cell(cut.purity(), config),
    ]
}

fn ratio_cell(value: Result<f64>, config: &Config) -> String {
    match value {
        Ok(v) if config.perf_percent => format!("{:.5}", v * 100.0),
        Ok(v) => format!("{v:.5}"),
        Err(_) => "-".to_string(),
    }
}

fn render_text(rows: &[[String; 6]], header: bool) -> String {
    // column widths over header and body
    let mut widths: [usize; 6] = [0; 6];
    for (i, title) in COLUMNS.iter().enumerate() {
        widths[i] = if header { title.len() } else { 0 };
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    if header {
        let titles: Vec<String> = COLUMNS
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{t:>width$}", width = widths[i]))
            .collect();
        out.push_str(titles.join("  ").trim_end());
        out.push('\n');
    }
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i == 0 {
                    format!("{c:<width$}", width = widths[i])
                } else {
                    format!("{c:>width$}", width = widths[i])
                }
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

fn render_markdown(rows: &[[String; 6]], header: bool) -> String {
    let mut out = String::new();
    if header {
        out.push_str(&format!("| {} |\n", COLUMNS.join(" | ")));
        out.push_str(&format!(
            "|{}\n",
            COLUMNS.map(|_| " --- |").concat()
        ));
    }
    for row in rows {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    out
}

fn render_csv(rows: &[[String; 6]], header: bool) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if header {
        writer
            .write_record(COLUMNS)
            .map_err(|e| Error::Format(format!("csv rendering failed: {e}")))?;
    }
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| Error::Format(format!("csv rendering failed: {e}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Format(format!("csv rendering failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::Format(format!("csv rendering failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::EventBatch;
    use crate::selection::cut::CutTally;
    use arrow::array::BooleanArray;

    fn applied_cut(name: &str) -> Cut {
        let mut cut = Cut::new(name, |batch: &EventBatch| {
            Ok(BooleanArray::from(vec![true; batch.len()]))
        });
        cut.begin_run();
        cut.commit(&CutTally {
            n_signal: 3.0,
            n_background: 1.0,
            n_passing: 4.0,
            n_total_signal: 6.0,
        });
        cut
    }

    #[test]
    fn text_summary_with_header() {
        let cuts = vec![applied_cut("fv"), applied_cut("tracks")];
        let out = cut_summary(&cuts, &Config::default(), true, ReportFormat::Text).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Cut name"));
        assert!(lines[1].starts_with("fv"));
        assert!(lines[1].contains("0.50000")); // efficiency
        assert!(lines[1].contains("0.75000")); // purity
    }

    #[test]
    fn header_flag_suppresses_titles() {
        let cuts = vec![applied_cut("fv")];
        let out = cut_summary(&cuts, &Config::default(), false, ReportFormat::Text).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(!out.contains("Cut name"));
    }

    #[test]
    fn undefined_ratios_render_as_dash() {
        let cuts = vec![Cut::new("fv", |batch: &EventBatch| {
            Ok(BooleanArray::from(vec![true; batch.len()]))
        })];
        let out = cut_summary(&cuts, &Config::default(), false, ReportFormat::Csv).unwrap();
        assert_eq!(out.trim_end(), "fv,0.00,0.00,0.00,-,-");
    }

    #[test]
    fn percent_mode_scales_ratios() {
        let config = Config {
            perf_percent: true,
            ..Config::default()
        };
        let cuts = vec![applied_cut("fv")];
        let out = cut_summary(&cuts, &config, false, ReportFormat::Csv).unwrap();
        assert!(out.contains("50.00000"));
        assert!(out.contains("75.00000"));
    }

    #[test]
    fn markdown_rows_are_piped() {
        let cuts = vec![applied_cut("fv")];
        let out = cut_summary(&cuts, &Config::default(), true, ReportFormat::Markdown).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("---"));
        assert!(lines[2].starts_with("| fv |"));
    }
}
