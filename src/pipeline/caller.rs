//! Call-site resolution and stack trace capture.
//!
//! Emitting methods are `#[track_caller]`, so the immediate call site is
//! always known without walking the stack. A non-zero caller skip walks the
//! stack, finds the frame for that call site and moves `skip` frames further
//! out. Without debug info the anchor frame cannot be found and the immediate
//! call site is reported instead.

use std::borrow::Cow;
use std::fmt::Write;
use std::panic::Location;

use backtrace::{Backtrace, BacktraceSymbol};

use crate::encoding::Caller;

pub(crate) fn resolve(location: &'static Location<'static>, skip: usize) -> Caller<'static> {
    if skip == 0 {
        return Caller::from(location);
    }
    walk(location, skip).unwrap_or_else(|| Caller::from(location))
}

fn walk(location: &'static Location<'static>, skip: usize) -> Option<Caller<'static>> {
    let backtrace = Backtrace::new();
    let mut symbols = backtrace.frames().iter().flat_map(|frame| frame.symbols());

    symbols.position(|symbol| is_at(symbol, location))?;
    let symbol = symbols.nth(skip - 1)?;

    let file = symbol.filename()?.to_string_lossy().into_owned();
    Some(Caller::new(Cow::Owned(file), symbol.lineno()?))
}

fn is_at(symbol: &BacktraceSymbol, location: &Location<'_>) -> bool {
    symbol.lineno() == Some(location.line())
        && symbol
            .filename()
            .map_or(false, |file| file.ends_with(location.file()))
}

/// Render the current stack, innermost frame first, as `function\n\tfile:line`
/// pairs. Frames of this crate and of the unwinder above the caller are dropped.
pub(crate) fn capture_stack() -> String {
    let backtrace = Backtrace::new();
    let mut out = String::new();

    let symbols = backtrace
        .frames()
        .iter()
        .flat_map(|frame| frame.symbols())
        .skip_while(|symbol| symbol.name().map_or(true, |name| is_internal(&format!("{:#}", name))));

    for symbol in symbols {
        let name = symbol
            .name()
            .map(|name| format!("{:#}", name))
            .unwrap_or_else(|| "<unknown>".to_string());
        let _ = write!(out, "{}\n\t", name);
        match (symbol.filename(), symbol.lineno()) {
            (Some(file), Some(line)) => {
                let _ = writeln!(out, "{}:{}", file.display(), line);
            }
            _ => out.push_str("<unknown>\n"),
        }
    }

    out.truncate(out.trim_end().len());
    out
}

fn is_internal(name: &str) -> bool {
    let name = name.trim_start_matches('<');
    name.starts_with("backtrace::") || name.starts_with(concat!(env!("CARGO_CRATE_NAME"), "::"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_skip_is_call_site() {
        let location = Location::caller();
        let caller = resolve(location, 0);
        assert_eq!(caller.file, location.file());
        assert_eq!(caller.line, location.line());
    }

    #[test]
    fn test_internal_frames() {
        assert!(is_internal("backtrace::backtrace::trace"));
        assert!(is_internal("<zlog::logger::Logger as log::Log>::log"));
        assert!(!is_internal("std::rt::lang_start"));
        assert!(!is_internal("billing::charge"));
    }

    #[test]
    fn test_capture_stack_not_empty() {
        let stack = capture_stack();
        assert!(!stack.is_empty());
        assert!(!stack.starts_with("backtrace::"));
    }
}
