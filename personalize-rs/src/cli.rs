//! Command-line argument parsing for the preview binary.
//!
//! Usage:
//!   personalize [-f[<file>]] [-Ldlq] <template> [<recipient.json>]
//!   personalize -C

use std::path::PathBuf;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Which settings file to load.
    pub config: ConfigFile,
    /// Force legacy block matching (`-L`).
    pub legacy: bool,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Report malformed conditions and unknown tokens (`-l`).
    pub lint: bool,
    /// Suppress the rendered output, e.g. when only linting (`-q`).
    pub quiet: bool,
    /// Print the token catalog as JSON and exit (`-C`).
    pub catalog: bool,
    /// Template file to render.
    pub template: Option<PathBuf>,
    /// Recipient JSON file; an empty recipient when omitted.
    pub recipient: Option<PathBuf>,
}

/// How to choose the settings file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search `~/.personalizerc`, then `./.personalizerc` (default).
    #[default]
    Search,
    /// `-f` with no file argument: use built-in defaults.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(&raw[1..])
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<&str> = Vec::new();
    let mut rest = argv;

    while let Some((arg, tail)) = rest.split_first() {
        rest = tail;
        if arg == "--" {
            positional.extend(rest.iter().map(String::as_str));
            break;
        }
        match arg.strip_prefix('-') {
            Some(flags) if !flags.is_empty() => rest = args.apply_flags(flags, rest)?,
            _ => positional.push(arg),
        }
    }

    match positional[..] {
        [] if args.catalog => {}
        [] => return Err("missing template file".to_owned()),
        [template] => args.template = Some(template.into()),
        [template, recipient] => {
            args.template = Some(template.into());
            args.recipient = Some(recipient.into());
        }
        _ => return Err(format!("too many arguments ({})", positional.len())),
    }
    Ok(args)
}

fn is_positional(arg: &str) -> bool {
    !arg.starts_with('-') || arg == "-"
}

impl CliArgs {
    /// Apply one cluster of single-letter flags such as `Ldl`.  Returns the
    /// arguments left once `-f` has taken its file, if it took one.
    fn apply_flags<'a>(&mut self, flags: &str, rest: &'a [String]) -> Result<&'a [String], String> {
        for (at, flag) in flags.char_indices() {
            match flag {
                'L' => self.legacy = true,
                'd' => self.debug = true,
                'l' => self.lint = true,
                'q' => self.quiet = true,
                'C' => self.catalog = true,
                'f' => return Ok(self.settings_file(&flags[at + 1..], rest)),
                c => return Err(format!("unknown option: -{c}")),
            }
        }
        Ok(rest)
    }

    /// `-f<file>` names the file inline.  A bare `-f` takes the next argument
    /// only when a template path still follows it; otherwise it skips the
    /// settings file altogether.
    fn settings_file<'a>(&mut self, inline: &str, rest: &'a [String]) -> &'a [String] {
        if !inline.is_empty() {
            self.config = ConfigFile::Explicit(PathBuf::from(inline));
            return rest;
        }
        match rest.split_first() {
            Some((file, tail)) if is_positional(file) && tail.iter().any(|a| is_positional(a)) => {
                self.config = ConfigFile::Explicit(PathBuf::from(file));
                tail
            }
            _ => {
                self.config = ConfigFile::Skip;
                rest
            }
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the user settings file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    let home = std::env::var("HOME").unwrap_or_default();
    [format!("{home}/.personalizerc"), "./.personalizerc".to_owned()]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
