use std::io::{self, BufRead, Write};
use std::{path::PathBuf, process};

use clap::Parser;

use flowlang::interpreter;

/// Run a FlowLang program with interactive I/O.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// The .flow file to execute.
    file: PathBuf,
}

fn main() {
    simple_logger::init_with_level(log::Level::Warn).unwrap();
    let args = Cli::parse();

    let result = interpreter::run_file(
        &args.file,
        |prompt| {
            print!("{prompt} ");
            let _ = io::stdout().flush();

            let mut reply = String::new();
            if io::stdin().lock().read_line(&mut reply).is_err() {
                return String::new();
            }
            reply.trim_end_matches(['\r', '\n']).to_string()
        },
        |value| println!("{value}"),
    );

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}
