// hackvm - VM-to-Hack translator
// Translates a .vm file, or a directory of them, into one Hack .asm file

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use hackvm::vm_translator::sources::SourceSet;
use hackvm::vm_translator::{TranslatorConfig, VmTranslator};
use log::{debug, info};

struct Options {
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    entry: Option<String>,
    no_bootstrap: bool,
    no_comments: bool,
    verbose: bool,
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args);

    if let Err(err) = run(&options) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Options {
    let program_name = args.first().map(String::as_str).unwrap_or("hackvm");
    if args.len() < 2 {
        print_usage(program_name);
        process::exit(1);
    }

    let mut input: Option<PathBuf> = None;
    let mut options = Options {
        input: PathBuf::new(),
        output: None,
        config: None,
        entry: None,
        no_bootstrap: false,
        no_comments: false,
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                options.output = Some(PathBuf::from(option_value(args, i, "-o")));
                i += 2;
            }
            "-c" | "--config" => {
                options.config = Some(PathBuf::from(option_value(args, i, "-c")));
                i += 2;
            }
            "--entry" => {
                options.entry = Some(option_value(args, i, "--entry").to_string());
                i += 2;
            }
            "--no-bootstrap" => {
                options.no_bootstrap = true;
                i += 1;
            }
            "--no-comments" => {
                options.no_comments = true;
                i += 1;
            }
            "-v" | "--verbose" => {
                options.verbose = true;
                i += 1;
            }
            "-h" | "--help" => {
                print_usage(program_name);
                process::exit(0);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option '{}'", arg);
                print_usage(program_name);
                process::exit(1);
            }
            _ => {
                if input.is_some() {
                    eprintln!("Error: Multiple inputs specified");
                    process::exit(1);
                }
                input = Some(PathBuf::from(&args[i]));
                i += 1;
            }
        }
    }

    match input {
        Some(path) => options.input = path,
        None => {
            eprintln!("Error: No input file or directory specified");
            print_usage(program_name);
            process::exit(1);
        }
    }

    if options.entry.is_some() && options.no_bootstrap {
        eprintln!("Error: --entry and --no-bootstrap cannot be combined");
        process::exit(1);
    }

    options
}

fn option_value<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value.as_str(),
        None => {
            eprintln!("Error: {} requires a value", flag);
            process::exit(1);
        }
    }
}

fn run(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &options.config {
        Some(path) => TranslatorConfig::load(path)?,
        None => TranslatorConfig::default(),
    };
    if options.no_comments {
        config.emit_comments = false;
    }

    let sources = SourceSet::load(&options.input, &config.first_unit)?;
    let output_path = options
        .output
        .clone()
        .unwrap_or_else(|| sources.output_path.clone());

    // Whole-program directories are bootstrapped unless told otherwise
    let entry = match (&options.entry, sources.is_program_directory && !options.no_bootstrap) {
        (Some(entry), _) => Some(entry.clone()),
        (None, true) => Some(config.entry_function.clone()),
        (None, false) => None,
    };

    if options.verbose {
        println!(
            "Translating {} -> {} ({} units, bootstrap: {})",
            options.input.display(),
            output_path.display(),
            sources.units.len(),
            entry.as_deref().unwrap_or("none")
        );
    }

    let translator = VmTranslator::new(config);
    let translation = translator.translate(&sources.units, entry.as_deref())?;
    write_output(&output_path, &translation.to_string())?;

    let summary = &translation.summary;
    for (unit, functions) in &summary.functions {
        debug!("{}: {}", unit, functions.join(", "));
    }
    info!(
        "{} commands, {} comparison labels, {} return sites, statics: [{}]",
        summary.commands,
        summary.comparison_labels,
        summary.return_sites,
        summary.static_symbols().join(", ")
    );

    if options.verbose {
        println!(
            "Wrote {} instructions to {}",
            translation.executable_len(),
            output_path.display()
        );
    }
    Ok(())
}

fn write_output(path: &Path, text: &str) -> Result<(), String> {
    fs::write(path, text).map_err(|err| format!("cannot write '{}': {}", path.display(), err))
}

fn print_usage(program_name: &str) {
    println!("Usage: {} [options] <file.vm | directory>", program_name);
    println!();
    println!("Options:");
    println!("  -o, --output <file>    Output filename (default: <input>.asm)");
    println!("  -c, --config <file>    TOML configuration file");
    println!("  --entry <function>     Emit bootstrap code that calls <function>");
    println!("  --no-bootstrap         Never emit bootstrap code");
    println!("  --no-comments          Omit the // comment before each command");
    println!("  -v, --verbose          Verbose output");
    println!("  -h, --help             Show this help message");
    println!();
    println!("A directory is translated as a whole program: its .vm files are joined");
    println!("in name order with Sys.vm first, and bootstrap code calls Sys.init.");
    println!();
    println!("Examples:");
    println!("  {} SimpleAdd.vm                 # -> SimpleAdd.asm", program_name);
    println!("  {} FibonacciElement/            # -> FibonacciElement/FibonacciElement.asm", program_name);
    println!("  {} -o out.asm --entry Main.main Main.vm", program_name);
}
