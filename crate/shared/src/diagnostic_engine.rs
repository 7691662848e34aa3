use crate::diagnostic::{Diagnostic, Severity};
use colored::Colorize;
use mgen_error::{ErrorCode, LineInfo, TranslateError};
use mgen_ir::SourceLocation;

/// Collects diagnostics across all pipeline phases and renders them
///
/// Diagnostics are append-only; the engine caps error collection so a
/// pathological input cannot flood the terminal, and keeps running counts
/// so phases can ask cheaply whether anything failed so far.
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
    max_errors: usize,
    file_name: String,
}

impl Default for DiagnosticEngine {
    fn default() -> Self {
        DiagnosticEngine::new()
    }
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            error_count: 0,
            warning_count: 0,
            max_errors: 100,
            file_name: String::from("<input>"),
        }
    }

    /// Records a diagnostic, keeping the severity counters current
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => {
                self.error_count += 1;
                if self.error_count >= self.max_errors {
                    self.emit_too_many_errors();
                    return;
                }
            }
            Severity::Warning => self.warning_count += 1,
            Severity::Info => {}
        }
        self.diagnostics.push(diagnostic);
    }

    /// Records an error-severity diagnostic
    pub fn emit_error(&mut self, error_code: ErrorCode, message: String, location: SourceLocation) {
        self.emit(Diagnostic::error(error_code, message, location));
    }

    /// Records a warning-severity diagnostic
    pub fn emit_warning(&mut self, error_code: ErrorCode, message: String, location: SourceLocation) {
        self.emit(Diagnostic::warning(error_code, message, location));
    }

    /// Records a phase error, preserving its suggestion if it has one
    pub fn emit_translate_error(&mut self, error: TranslateError) {
        self.emit(Diagnostic::from(error));
    }

    /// Records a batch of phase errors
    pub fn emit_all(&mut self, errors: Vec<TranslateError>) {
        for error in errors {
            self.emit_translate_error(error);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn set_file_name(&mut self, file_name: String) {
        self.file_name = file_name;
    }

    pub fn set_max_errors(&mut self, max_errors: usize) {
        self.max_errors = max_errors;
    }

    /// Consumes the engine and returns everything it collected
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Renders every collected diagnostic to standard error, followed by a
    /// summary line when anything was found
    pub fn report_all(&self, source: &str) {
        let line_info = LineInfo::new(source);
        for diagnostic in &self.diagnostics {
            self.report_diagnostic(diagnostic, &line_info);
        }

        if self.error_count > 0 || self.warning_count > 0 {
            self.report_summary();
        }
    }

    fn emit_too_many_errors(&mut self) {
        let diagnostic = Diagnostic::error(
            ErrorCode::GenerationFailure,
            format!("Too many errors ({}), stopping translation", self.max_errors),
            SourceLocation::new(0, 1, 1, 1),
        );
        self.diagnostics.push(diagnostic);
    }

    fn report_diagnostic(&self, diagnostic: &Diagnostic, line_info: &LineInfo) {
        let severity_str = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };

        let line = diagnostic.location.line;
        let col = diagnostic.location.column;
        let current_line_text = line_info.line_text(line).unwrap_or("<line not available>");

        eprintln!(
            "{} {}: {}",
            severity_str,
            diagnostic.error_code.to_string().bold(),
            diagnostic.message
        );

        eprintln!("  {} {}:{}:{}", "-->".yellow(), self.file_name, line, col);

        let line_num_str = format!("{}", line);
        let indent_width = line_num_str.len() + 1;
        let indent = " ".repeat(indent_width);
        let pipe = "|".yellow();

        eprintln!("{indent}{}", pipe);
        eprintln!("{} {} {}", line_num_str.yellow(), pipe, current_line_text);

        let marker = " ".repeat(col.saturating_sub(1))
            + &"^".repeat(diagnostic.location.length.max(1)).bold().red().to_string();
        eprintln!("{indent}{} {}", pipe, marker);

        if let Some(suggestion) = &diagnostic.suggestion {
            eprintln!("{indent}{} {}: {}", pipe, "help".green().bold(), suggestion);
        }
        eprintln!(
            "{indent}{} {}: https://mgen.dev/diagnostics#{}",
            pipe,
            "note".blue().bold(),
            diagnostic.error_code.code().to_lowercase()
        );

        eprintln!();
    }

    fn report_summary(&self) {
        let mut parts = Vec::new();

        if self.error_count > 0 {
            parts.push(
                format!(
                    "{} {}",
                    self.error_count,
                    if self.error_count == 1 { "error" } else { "errors" }
                )
                .red()
                .to_string(),
            );
        }

        if self.warning_count > 0 {
            parts.push(
                format!(
                    "{} {}",
                    self.warning_count,
                    if self.warning_count == 1 { "warning" } else { "warnings" }
                )
                .yellow()
                .to_string(),
            );
        }

        if !parts.is_empty() {
            eprintln!("Translation finished with {}", parts.join(", "));
        }
    }
}
