/// CP/M DSK extraction tool
///
/// `cpmdsk <image.dsk> <command>` runs one command; with no command an
/// interactive console opens over the loaded image.

use cpmdsk::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::path::Path;
use std::process::exit;

/// Command completer for the REPL
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "cat", "dir", "dump", "exit", "get", "getall", "help", "info", "ls", "quit",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the first word (command name)
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".cpmdsk_history");
        p
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(image_path) = args.first() else {
        print_usage();
        exit(1);
    };

    let image = match DiskImage::open(image_path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("{}: {}", image_path, e);
            exit(1);
        }
    };

    let fs = match CpmFileSystem::from_image(&image) {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("{}: {}", image_path, e);
            exit(1);
        }
    };

    if args.len() > 1 {
        if !run_command(&fs, &args[1..]) {
            print_usage();
            exit(1);
        }
        return;
    }

    run_console(&fs);
}

/// Interactive console over a mounted image
fn run_console(fs: &CpmFileSystem<'_>) {
    println!("=== cpmdsk ===");
    if let Some(filename) = fs.image().filename() {
        println!("Opened: {}", filename);
    }
    println!("Type 'help' for available commands\n");

    let mut rl = Editor::new().expect("Failed to create editor");
    rl.set_helper(Some(CommandCompleter::new()));

    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    loop {
        let input = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_lowercase().as_str() {
            "quit" | "exit" => break,
            _ => {
                if !run_command(fs, &parts) {
                    println!("Unknown command: {}. Type 'help' for available commands.", parts[0]);
                }
            }
        }
    }

    if let Some(history_path) = history_path() {
        let _ = rl.save_history(&history_path);
    }
    println!("Goodbye!");
}

/// Run one command; returns false if it was not recognised
fn run_command(fs: &CpmFileSystem<'_>, parts: &[String]) -> bool {
    let here = Path::new(".");

    match parts[0].to_lowercase().as_str() {
        "dir" | "ls" | "cat" => list_directory(fs),
        "get" => {
            if parts.len() < 2 {
                println!("Usage: get <file> [file...]");
            }
            for name in &parts[1..] {
                report(name, extract_file(fs, name, here));
            }
        }
        "getall" => {
            for extracted in extract_all(fs, here) {
                report(&extracted.name, extracted.result);
            }
        }
        "info" => print_info(fs),
        "dump" => match parts.get(1) {
            Some(out) => match fs.image().save_raw(out) {
                Ok(()) => println!("Wrote {} bytes to {}", fs.image().len(), out),
                Err(e) => eprintln!("{}: {}", out, e),
            },
            None => println!("Usage: dump <output_path>"),
        },
        "help" => print_help(),
        _ => return false,
    }
    true
}

/// Print the outcome of extracting one file
fn report(name: &str, result: Result<usize>) {
    match result {
        Ok(bytes) => println!("{:<12}   {:>7} bytes", name.to_uppercase(), bytes),
        Err(e) => eprintln!("{}", e),
    }
}

fn list_directory(fs: &CpmFileSystem<'_>) {
    for entry in fs.read_dir() {
        println!(
            "{:<12.12}   {:>7} bytes   {:>2} {}",
            entry.name,
            entry.size,
            entry.user,
            entry.attributes.flags()
        );
    }
}

fn print_info(fs: &CpmFileSystem<'_>) {
    let image = fs.image();
    let spec = image.spec();
    let geometry = fs.geometry();
    let info = fs.info();

    if let Some(filename) = image.filename() {
        println!("Filename: {}", filename);
    }
    println!("Format: {}", image.format().name());
    println!("Sides: {}", spec.num_sides);
    println!("Tracks per side: {}", spec.num_tracks);
    println!("Sectors per track: {}", spec.sectors_per_track);
    println!("Sector size: {} bytes", spec.sector_size);
    println!("First sector ID: 0x{:02X}", spec.first_sector_id);
    println!("Image size: {} bytes", image.len());
    match geometry.source {
        GeometrySource::ParameterBlock => println!("Geometry: disk parameter block"),
        GeometrySource::Heuristic(format) => println!("Geometry: {} format (from sector ID)", format.name()),
    }
    println!("Block size: {} bytes", info.block_size);
    println!("Reserved: {} bytes", info.reserved_bytes);
    println!("Directory entries: {}", info.max_dir_entries);
    println!(
        "Blocks: {} total, {} used, {} free",
        info.total_blocks,
        info.used_blocks,
        info.free_blocks()
    );
}

/// Parse command line input, respecting quoted strings
fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
            }
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn print_usage() {
    eprintln!("Usage: cpmdsk <dsk_file> [command]");
    eprintln!();
    eprintln!("Where command is:");
    eprintln!("  dir             - list contents of the DSK image");
    eprintln!("  get <file>...   - get files from the DSK image");
    eprintln!("  getall          - get all files to the current directory");
    eprintln!("  info            - show container and CP/M geometry");
    eprintln!("  dump <path>     - write the decoded logical image");
    eprintln!();
    eprintln!("With no command an interactive console is opened.");
}

fn print_help() {
    println!("Available commands:");
    println!("  dir, ls, cat              - List files on disk");
    println!("  get <file> [file...]      - Extract files to the current directory");
    println!("  getall                    - Extract every file to the current directory");
    println!("  info                      - Show container and CP/M geometry");
    println!("  dump <path>               - Write the decoded logical image (use quotes for paths with spaces)");
    println!("  help                      - Show this help");
    println!("  quit, exit                - Exit");
}
