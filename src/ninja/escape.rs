//! Escaping for rule-file text.
//!
//! Two sinks with different rules compose here. The rule file itself
//! treats `$` and space as special (rule-level escaping). Values that a
//! rule hands to a shell verbatim additionally need shell escaping:
//! tokens containing spaces get double quotes, and `"` and `\` inside get
//! backslashes. Flags that may be multi-token are written with quoting
//! inhibited; the buildfile is assumed to have quoted what it wants quoted.

/// Which sink the string is being written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapingMode {
    /// No transformation.
    None,
    /// Rule-file escaping: prefix `$` and space with `$`.
    Ninja,
    /// Shell escaping: quote tokens with spaces, backslash `"` and `\`.
    Shell,
    /// Shell escaping composed with rule-file escaping of `$`.
    NinjaShell,
}

/// Escaping configuration.
#[derive(Debug, Clone, Copy)]
pub struct EscapeOptions {
    /// The mode to apply
    pub mode: EscapingMode,
    /// Don't quote even when the shell mode would. Used when the caller
    /// supplies its own quotes, or for flag strings that are really several
    /// flags.
    pub inhibit_quoting: bool,
}

impl EscapeOptions {
    /// Options for the given mode with quoting enabled.
    pub fn new(mode: EscapingMode) -> Self {
        EscapeOptions {
            mode,
            inhibit_quoting: false,
        }
    }
}

impl Default for EscapeOptions {
    fn default() -> Self {
        EscapeOptions::new(EscapingMode::None)
    }
}

/// Escape a string into the output buffer.
pub fn escape_string_to(out: &mut String, s: &str, options: &EscapeOptions) {
    match options.mode {
        EscapingMode::None => out.push_str(s),
        EscapingMode::Ninja => escape_ninja(out, s),
        EscapingMode::Shell => escape_shell(out, s, options.inhibit_quoting, false),
        EscapingMode::NinjaShell => escape_shell(out, s, options.inhibit_quoting, true),
    }
}

/// Escape a string, returning a new buffer.
pub fn escape_string(s: &str, options: &EscapeOptions) -> String {
    let mut out = String::with_capacity(s.len());
    escape_string_to(&mut out, s, options);
    out
}

fn escape_ninja(out: &mut String, s: &str) {
    for c in s.chars() {
        if c == '$' || c == ' ' {
            out.push('$');
        }
        out.push(c);
    }
}

fn escape_shell(out: &mut String, s: &str, inhibit_quoting: bool, also_ninja: bool) {
    let needs_quoting = !inhibit_quoting && s.contains(' ');
    if needs_quoting {
        out.push('"');
    }

    for c in s.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '$' if also_ninja => {
                out.push('$');
                out.push(c);
            }
            ' ' if also_ninja && !needs_quoting => {
                out.push('$');
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    if needs_quoting {
        out.push('"');
    }
}
