//! Chart renderers consuming aggregated rows.
//!
//! The terminal renderer draws a date × time-of-day dot plot; the CSV
//! renderer emits `date,seconds,time` for external plotting tools.

use crate::aggregate::{format_hms, AggregatedRow, SECONDS_PER_DAY};
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Consumes the finished row sequence.
pub trait ChartRenderer {
    fn render(&mut self, rows: &[AggregatedRow]) -> Result<(), ChartError>;
}

pub const MIN_WIDTH: usize = 4;
pub const MAX_WIDTH: usize = 400;

/// Dot plot on a text terminal: one line per date, x axis = time of day.
pub struct TextChart<W: Write> {
    out: W,
    title: String,
    width: usize,
}

impl<W: Write> TextChart<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            title: "Date x Hour graph".to_string(),
            width: 48,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Plot width in columns, clamped to `MIN_WIDTH..=MAX_WIDTH`.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.clamp(MIN_WIDTH, MAX_WIDTH);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn column(&self, seconds: u32) -> usize {
        let s = (seconds % SECONDS_PER_DAY) as usize;
        s * self.width / SECONDS_PER_DAY as usize
    }

    fn axis(&self) -> String {
        let mut axis = vec![b' '; self.width + 1];
        for (hour, label) in [(0u32, "00"), (6, "06"), (12, "12"), (18, "18")] {
            let col = self.column(hour * 3600);
            if col + 1 < axis.len() {
                axis[col] = label.as_bytes()[0];
                axis[col + 1] = label.as_bytes()[1];
            }
        }
        String::from_utf8_lossy(&axis).trim_end().to_string()
    }
}

impl<W: Write> ChartRenderer for TextChart<W> {
    fn render(&mut self, rows: &[AggregatedRow]) -> Result<(), ChartError> {
        writeln!(self.out, "{}", self.title)?;
        if rows.is_empty() {
            writeln!(self.out, "(no data)")?;
            return Ok(());
        }

        let axis = self.axis();
        writeln!(self.out, "{:<10} {:<8} |{}", "Date", "Hour", axis)?;
        writeln!(self.out, "{}", "-".repeat(21 + self.width))?;
        for row in rows {
            let col = self.column(row.seconds_since_midnight);
            let mut line = vec![b' '; self.width];
            line[col.min(self.width - 1)] = b'*';
            writeln!(
                self.out,
                "{} {} |{}",
                row.date.format("%Y-%m-%d"),
                format_hms(row.seconds_since_midnight),
                String::from_utf8_lossy(&line).trim_end()
            )?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// CSV writer: `date,seconds,time`.
pub struct CsvChart<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvChart<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
        }
    }

    pub fn into_inner(self) -> Result<W, ChartError> {
        self.writer
            .into_inner()
            .map_err(|e| ChartError::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))
    }
}

impl<W: Write> ChartRenderer for CsvChart<W> {
    fn render(&mut self, rows: &[AggregatedRow]) -> Result<(), ChartError> {
        self.writer.write_record(["date", "seconds", "time"])?;
        for row in rows {
            self.writer.write_record([
                &row.date.format("%Y-%m-%d").to_string(),
                &row.seconds_since_midnight.to_string(),
                &format_hms(row.seconds_since_midnight),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Render rows to a CSV string.
pub fn rows_to_csv(rows: &[AggregatedRow]) -> Result<String, ChartError> {
    let mut chart = CsvChart::new(Vec::new());
    chart.render(rows)?;
    let data = chart.into_inner()?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}
