//! Diagnostic report writers

use crate::core::{Diagnostic, OutputFormat, Severity};
use colored::*;
use std::io::Write;

pub trait OutputWriter {
    fn write_diagnostics(&mut self, diagnostics: &[Diagnostic]) -> anyhow::Result<()>;
}

pub struct TextWriter<W: Write> {
    writer: W,
}

impl<W: Write> TextWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn severity_label(severity: Severity) -> ColoredString {
        let name = severity.display_name();
        match severity {
            Severity::Error => name.red().bold(),
            Severity::Warning => name.yellow().bold(),
            Severity::Style | Severity::Performance | Severity::Portability => name.cyan(),
            Severity::Information => name.normal(),
        }
    }
}

impl<W: Write> OutputWriter for TextWriter<W> {
    fn write_diagnostics(&mut self, diagnostics: &[Diagnostic]) -> anyhow::Result<()> {
        for diagnostic in diagnostics {
            writeln!(
                self.writer,
                "{}: {}: {} [{}]",
                diagnostic.primary_location(),
                Self::severity_label(diagnostic.severity),
                diagnostic.message,
                diagnostic.rule_id
            )?;
            for related in &diagnostic.locations[1..] {
                writeln!(self.writer, "  note: see {related}")?;
            }
        }
        let errors = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count();
        writeln!(
            self.writer,
            "{} finding(s), {} error(s)",
            diagnostics.len(),
            errors
        )?;
        Ok(())
    }
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_diagnostics(&mut self, diagnostics: &[Diagnostic]) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(diagnostics)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub fn create_writer<W: Write + 'static>(writer: W, format: OutputFormat) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Text => Box::new(TextWriter::new(writer)),
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
    }
}
