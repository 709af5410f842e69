//! `mw plugins` command implementation.

use mw_parser::ParserRegistry;
use mw_site::PluginRegistry;

use crate::error::CliError;
use crate::output::Output;

/// List the built-in plugins and markdown parsers, one per line.
pub(crate) fn execute() -> Result<(), CliError> {
    let output = Output::new();

    output.info("Plugins:");
    for name in PluginRegistry::default().names() {
        output.emit(&format!("plugin\t{name}"))?;
    }
    output.info("Markdown parsers:");
    for name in ParserRegistry::default().names() {
        output.emit(&format!("parser\t{name}"))?;
    }
    Ok(())
}
