//! Command-line interface for panprob
//!
//! Usage:
//!   panprob convert `<input>` `<output>` [--from F] [--to F] [--config FILE] [--subsume-code] [--copy-images] [--skip-missing-images]
//!   panprob inspect `<input>` [--from F] [--format tree|json] [--raw]
//!   panprob list-formats
//!
//! Formats are inferred from file extensions unless given explicitly. An output path of `-`
//! writes to stdout.

use clap::{Arg, ArgAction, ArgMatches, Command};
use panprob::config::{InspectFormat, Loader, PanprobConfig};
use panprob::postprocessors::paragraphize;
use panprob::{ConvertOptions, FormatRegistry, PanprobError, Pipeline};
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::init();

    let matches = Command::new("panprob")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert problems between DSCTeX, Gradescope Markdown and HTML")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("convert")
                .about("Convert a problem file to another format")
                .arg(
                    Arg::new("input")
                        .help("Problem file to read")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("output")
                        .help("File to write, or '-' for stdout")
                        .required(true)
                        .index(2),
                )
                .arg(from_arg())
                .arg(
                    Arg::new("to")
                        .long("to")
                        .short('t')
                        .help("Target format (default: inferred from the output extension)"),
                )
                .arg(config_arg())
                .arg(
                    Arg::new("subsume-code")
                        .long("subsume-code")
                        .help("Inline \\inputminted files, resolved next to the input")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("copy-images")
                        .long("copy-images")
                        .help("Copy referenced images next to the output")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("skip-missing-images")
                        .long("skip-missing-images")
                        .help("Warn instead of failing when an image to copy is missing")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the parsed problem tree")
                .arg(
                    Arg::new("input")
                        .help("Problem file to read")
                        .required(true)
                        .index(1),
                )
                .arg(from_arg())
                .arg(config_arg())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('F')
                        .help("Tree dump style")
                        .value_parser(["tree", "json"]),
                )
                .arg(
                    Arg::new("raw")
                        .long("raw")
                        .help("Show the tree before paragraphize")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("list-formats").about("List available formats"))
        .get_matches();

    let result = match matches.subcommand() {
        Some(("convert", convert_matches)) => handle_convert_command(convert_matches),
        Some(("inspect", inspect_matches)) => handle_inspect_command(inspect_matches),
        Some(("list-formats", _)) => {
            handle_list_formats_command();
            Ok(())
        }
        _ => unreachable!(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn from_arg() -> Arg {
    Arg::new("from")
        .long("from")
        .short('f')
        .help("Source format (default: inferred from the input extension)")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .help("TOML configuration layered over the built-in defaults")
}

fn load_config(
    matches: &ArgMatches,
    overrides: &[(&str, &str)],
) -> Result<PanprobConfig, PanprobError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    for (key, value) in overrides {
        loader = loader.set_override(key, *value)?;
    }
    loader.build()
}

fn read_source(path: &str) -> Result<String, PanprobError> {
    fs::read_to_string(path).map_err(|e| PanprobError::resource(path, e))
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Explicit format name, or the one inferred from the path's extension
fn resolve_format(
    registry: &FormatRegistry,
    explicit: Option<&String>,
    path: &str,
) -> Result<String, PanprobError> {
    match explicit {
        Some(name) => Ok(name.clone()),
        None => registry.detect(Path::new(path)).map(str::to_string),
    }
}

fn handle_convert_command(matches: &ArgMatches) -> Result<(), PanprobError> {
    let input = matches.get_one::<String>("input").unwrap();
    let output = matches.get_one::<String>("output").unwrap();

    let mut overrides = Vec::new();
    if matches.get_flag("subsume-code") {
        overrides.push(("subsume_code.enabled", "true"));
    }
    if matches.get_flag("copy-images") {
        overrides.push(("copy_images.enabled", "true"));
    }
    if matches.get_flag("skip-missing-images") {
        overrides.push(("copy_images.on_missing", "skip"));
    }
    let config = load_config(matches, &overrides)?;

    let registry = FormatRegistry::with_defaults();
    let from = resolve_format(&registry, matches.get_one::<String>("from"), input)?;
    let to = resolve_format(&registry, matches.get_one::<String>("to"), output)?;

    let to_stdout = output == "-";
    if to_stdout && config.copy_images.enabled {
        return Err(PanprobError::NotSupported(
            "--copy-images needs an output file".to_string(),
        ));
    }

    let options = ConvertOptions::from_config(
        &config,
        parent_dir(Path::new(input)),
        parent_dir(Path::new(output)),
    );
    let source = read_source(input)?;
    let rendered = Pipeline::with_registry(registry, options).convert(&source, &from, &to)?;

    if to_stdout {
        print!("{}", rendered);
    } else {
        fs::write(output, rendered).map_err(|e| PanprobError::resource(output, e))?;
        log::info!("wrote {} ({} -> {})", output, from, to);
    }
    Ok(())
}

fn handle_inspect_command(matches: &ArgMatches) -> Result<(), PanprobError> {
    let input = matches.get_one::<String>("input").unwrap();
    let config = load_config(matches, &[])?;

    let registry = FormatRegistry::with_defaults();
    let from = resolve_format(&registry, matches.get_one::<String>("from"), input)?;
    let source = read_source(input)?;

    let mut tree = registry.parse(&source, &from)?;
    if !matches.get_flag("raw") {
        tree = paragraphize(tree)?;
    }

    let format = match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => InspectFormat::Json,
        Some(_) => InspectFormat::Tree,
        None => config.inspect.format,
    };
    match format {
        InspectFormat::Tree => print!("{}", tree.prettify()),
        InspectFormat::Json => {
            let json = serde_json::to_string_pretty(&tree)?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn handle_list_formats_command() {
    let registry = FormatRegistry::with_defaults();
    println!("Available formats:\n");
    for name in registry.list_formats() {
        if let Ok(format) = registry.get(&name) {
            let mut modes = Vec::new();
            if format.supports_parsing() {
                modes.push("parse");
            }
            if format.supports_serialization() {
                modes.push("render");
            }
            println!("  {}", name);
            println!("    {}", format.description());
            println!(
                "    extensions: {}    supports: {}",
                format.file_extensions().join(", "),
                modes.join(", ")
            );
        }
    }
}
