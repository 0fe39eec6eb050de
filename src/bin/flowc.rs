use std::{fs, path::PathBuf, process};

use clap::{Parser, ValueEnum};
use log::error;

use flowlang::generator::{FlowLangGenerator, Generator, GraphvizGenerator, MermaidGenerator};
use flowlang::lexer::Lexer;
use flowlang::{parser, xml};

/// Convert between FlowXML flowcharts, FlowLang source and diagram formats.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Input file: .fxml/.xml flowchart, .flow source, or .json AST.
    file: PathBuf,

    /// The desired output format.
    #[arg(long = "to", value_enum)]
    to: OutputFormat,

    /// Output path; defaults to the input path with the target extension.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum OutputFormat {
    Flowlang,
    Mermaid,
    Dot,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Flowlang => "flow",
            OutputFormat::Mermaid => "mmd",
            OutputFormat::Dot => "dot",
            OutputFormat::Json => "json",
        }
    }
}

fn main() {
    simple_logger::init_with_level(log::Level::Warn).unwrap();
    let args = Cli::parse();

    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: &Cli) -> anyhow::Result<()> {
    let content = fs::read_to_string(&args.file)?;

    let extension = args.file.extension().and_then(|e| e.to_str()).unwrap_or("");
    let program = match extension {
        "fxml" | "xml" => xml::parse(&content)?,
        "flow" => {
            let tokens = Lexer::new(&content).lex()?;
            parser::parse(&mut tokens.into())?
        }
        "json" => serde_json::from_str(&content)?,
        other => anyhow::bail!(
            "unknown input file type '.{other}'; expected .fxml, .xml, .flow or .json"
        ),
    };

    let rendered = match args.to {
        OutputFormat::Flowlang => FlowLangGenerator.generate(&program)?,
        OutputFormat::Mermaid => MermaidGenerator.generate(&program)?,
        OutputFormat::Dot => GraphvizGenerator.generate(&program)?,
        OutputFormat::Json => serde_json::to_string_pretty(&program)?,
    };

    let destination = args
        .output
        .clone()
        .unwrap_or_else(|| args.file.with_extension(args.to.extension()));
    fs::write(&destination, rendered)?;

    println!("wrote {}", destination.display());

    Ok(())
}
