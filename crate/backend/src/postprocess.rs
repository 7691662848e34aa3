//! Target-level optimizer
//!
//! Optional pipeline phase over the generated text: strips trailing
//! whitespace and collapses runs of blank lines. Purely cosmetic; the
//! emitted program's semantics never change here.

/// Tidies one generated source file
pub fn tidy(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut blank_run = 0;
    for line in source.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            out.push('\n');
        } else {
            blank_run = 0;
            out.push_str(trimmed);
            out.push('\n');
        }
    }
    out
}
