use personalize::catalog::CATALOG;
use personalize::cli::{self, CliArgs, ConfigFile};
use personalize::config::EngineConfig;
use personalize::lint::lint;
use personalize::{flatten, BlockMode, Recipient, Renderer, Template};
use tracing_subscriber::EnvFilter;

/// Stand-in recipient when no recipient file is given.
const PREVIEW_ID: &str = "preview";
const PREVIEW_EMAIL: &str = "preview@example.invalid";

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("personalize: {e}");
            eprintln!("Usage: personalize [-f[<file>]] [-Ldlq] <template> [<recipient.json>]");
            eprintln!("       personalize -C");
            std::process::exit(1);
        }
    };

    let (config, config_errors) = load_config(&args);
    init_logging(&args, &config);
    for e in &config_errors {
        tracing::warn!("settings: {e}");
    }

    if args.catalog {
        match serde_json::to_string_pretty(&CATALOG) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("personalize: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = run(&args, &config) {
        eprintln!("personalize: {e}");
        std::process::exit(1);
    }
}

fn load_config(args: &CliArgs) -> (EngineConfig, Vec<String>) {
    let mut messages = Vec::new();
    let path = match &args.config {
        ConfigFile::Skip => None,
        ConfigFile::Explicit(p) => Some(p.clone()),
        ConfigFile::Search => cli::find_user_config(),
    };

    let mut config = match path {
        None => EngineConfig::default(),
        Some(p) => match EngineConfig::load_file(&p) {
            Ok((config, errors)) => {
                messages.extend(errors.iter().map(|e| format!("{}: {e}", p.display())));
                config
            }
            Err(e) => {
                messages.push(format!("{}: {e}", p.display()));
                EngineConfig::default()
            }
        },
    };

    messages.extend(config.apply_env().iter().map(ToString::to_string));
    if args.legacy {
        config.block_mode = BlockMode::Legacy;
    }
    (config, messages)
}

fn init_logging(args: &CliArgs, config: &EngineConfig) {
    let directive = if args.debug { "debug" } else { config.log.as_str() };
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &CliArgs, config: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let Some(template_path) = &args.template else {
        return Err("missing template file".into());
    };
    let template = std::fs::read_to_string(template_path)
        .map_err(|e| format!("cannot read {}: {e}", template_path.display()))?;

    let recipient = match &args.recipient {
        Some(path) => Recipient::from_json_file(path)?,
        None => Recipient::new(PREVIEW_ID, PREVIEW_EMAIL),
    };

    if args.lint {
        let ctx = flatten(&recipient);
        for finding in lint(&Template::parse(&template), &ctx) {
            eprintln!("personalize: {}: {finding}", template_path.display());
        }
    }

    if !args.quiet {
        let out = Renderer::from_config(config).render(&template, &recipient);
        print!("{out}");
    }
    Ok(())
}
