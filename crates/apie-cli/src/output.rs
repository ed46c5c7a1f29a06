//! Terminal rendering

use std::collections::BTreeMap;
use std::io::{self, Write};

use apie_core::DisplaySurface;

/// Display surface that streams straight to stdout.
///
/// Flushes after every append so partial lines show up while the producer
/// is still working.
#[derive(Debug, Default)]
pub struct TerminalSurface;

impl DisplaySurface for TerminalSurface {
    fn append(&mut self, text: &str) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

/// One renderable block per result entry, name first, info indented.
pub fn format_results(results: &BTreeMap<String, String>) -> Vec<String> {
    results
        .iter()
        .map(|(name, info)| format!("{name}\n    \\---> {info}"))
        .collect()
}

/// Key/value rendering for the single-shot and lookup paths.
pub fn render_results(results: &BTreeMap<String, String>) {
    if results.is_empty() {
        println!("No results");
        return;
    }
    for block in format_results(results) {
        println!("{block}");
    }
}
