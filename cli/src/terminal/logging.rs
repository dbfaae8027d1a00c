use colored::*;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::registry::LookupSpan;

/// Symbol-prefixed event formatter for the dashboard terminal.
///
/// Info and above stay terse (the dashboard owns the screen); debug and
/// trace events additionally carry their dimmed target so engine internals
/// can be followed with `RUST_LOG=recwatch_core=debug`.
pub struct RecwatchFormatter;

fn level_symbol(level: Level) -> (&'static str, fn(ColoredString) -> ColoredString) {
    match level {
        Level::TRACE => ("[ ]", |s| s.dimmed()),
        Level::DEBUG => ("[?]", |s| s.blue()),
        Level::INFO => ("[+]", |s| s.green().bold()),
        Level::WARN => ("[*]", |s| s.yellow().bold()),
        Level::ERROR => ("[-]", |s| s.red().bold()),
    }
}

impl<S, N> FormatEvent<S, N> for RecwatchFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let (symbol, color_func) = level_symbol(*meta.level());

        write!(writer, "{} ", color_func(symbol.into()))?;

        if *meta.level() >= Level::DEBUG {
            write!(writer, "{} ", format!("({})", meta.target()).dimmed())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Install the symbol formatter. `RUST_LOG` overrides the default level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .event_format(RecwatchFormatter)
        .init();
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_level_gets_a_distinct_symbol() {
        let levels = [
            Level::TRACE,
            Level::DEBUG,
            Level::INFO,
            Level::WARN,
            Level::ERROR,
        ];
        let symbols: Vec<&str> = levels.iter().map(|l| level_symbol(*l).0).collect();

        let mut unique = symbols.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), symbols.len());

        assert_eq!(level_symbol(Level::ERROR).0, "[-]");
        assert_eq!(level_symbol(Level::INFO).0, "[+]");
    }

    #[test]
    fn only_debug_and_trace_carry_the_target() {
        assert!(Level::DEBUG >= Level::DEBUG);
        assert!(Level::TRACE >= Level::DEBUG);
        assert!(!(Level::INFO >= Level::DEBUG));
        assert!(!(Level::ERROR >= Level::DEBUG));
    }
}
