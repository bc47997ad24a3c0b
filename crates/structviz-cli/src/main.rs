use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use structviz::render::{LayoutOptions, SvgRenderOptions, layout_document, render_scene_svg};
use structviz::{Document, parse_document};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STRUCTVIZ_LOG";

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Parse(structviz::Error),
    Render(structviz_render::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Parse(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<structviz::Error> for CliError {
    fn from(value: structviz::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<structviz_render::Error> for CliError {
    fn from(value: structviz_render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    Detect,
    Layout,
    #[default]
    Render,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    strict: bool,
    config: Option<String>,
    background: Option<String>,
    diagram_id: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "structviz-cli\n\
\n\
USAGE:\n\
  structviz-cli detect [<path>|-]\n\
  structviz-cli layout [--pretty] [--strict] [--config <path>] [--out <path>] [<path>|-]\n\
  structviz-cli [render] [--background <css-color>] [--id <diagram-id>] [--strict] [--config <path>] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - detect prints `diagram` or `tree`.\n\
  - layout prints the resolved geometry as JSON.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - --config deep-merges a JSON object over the defaults (e.g. {\"tree\":{\"nodeRadius\":30}}).\n\
  - --strict rejects connector margins longer than half the connector instead of clamping.\n\
  - Set STRUCTVIZ_LOG (e.g. debug, structviz_render=trace) to log to stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "detect" => args.command = Command::Detect,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--strict" => args.strict = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--id" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.diagram_id = Some(id.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let mut text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    text.push('\n');
    write_text(&text, out)
}

fn layout_options(args: &Args) -> Result<LayoutOptions, CliError> {
    let mut options = LayoutOptions::default();
    if let Some(path) = args.config.as_deref() {
        let overrides: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        if !overrides.is_object() {
            return Err(CliError::Usage("--config must name a JSON object"));
        }
        options = options.with_config_overrides(&overrides);
    }
    if args.strict {
        options
            .config
            .set_value("geometry.strict", Value::Bool(true));
    }
    Ok(options)
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let document: Document = parse_document(&text)?;
    tracing::debug!(kind = document.kind().as_str(), "read document");

    match args.command {
        Command::Detect => {
            println!("{}", document.kind().as_str());
            Ok(())
        }
        Command::Layout => {
            let options = layout_options(&args)?;
            let layout = layout_document(&document, &options)?;
            write_json(&layout, args.pretty, args.out.as_deref())
        }
        Command::Render => {
            let options = layout_options(&args)?;
            let scene = layout_document(&document, &options)?.scene();
            let svg_options = SvgRenderOptions {
                diagram_id: args.diagram_id.clone(),
                background: args.background.clone(),
            };
            write_text(&render_scene_svg(&scene, &svg_options), args.out.as_deref())
        }
    }
}

fn main() {
    init_logging();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
