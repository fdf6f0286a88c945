// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! BPMN Assist CLI entrypoint.
//!
//! Opens (or starts) a BPMN diagram and reads chat lines from stdin. Plain lines go to the
//! assistant; lines starting with `/` are local commands (see `/help`).

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use bpmn_assist::assistant::{AssistantClient, HttpTransport};
use bpmn_assist::engine::{DiagramEngine, InMemoryModeler};
use bpmn_assist::ops::{execute, TransformCommand};
use bpmn_assist::session::{AssistSession, TurnReport};
use bpmn_assist::store::settings::SETTINGS_FILE_NAME;
use bpmn_assist::store::{AssistantSettings, SettingsStore};

const SETTINGS_DIR_NAME: &str = ".bpmn-assist";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<diagram.bpmn>] [--settings <file>] [--model <name>] [--endpoint <url>]\n\nIf the diagram file does not exist yet, a blank diagram is started and `/save` creates it.\n--settings defaults to ~/{SETTINGS_DIR_NAME}/{SETTINGS_FILE_NAME}.\nBPMN_ASSIST_API_KEY, BPMN_ASSIST_ENDPOINT and BPMN_ASSIST_MODEL override stored settings;\n--model and --endpoint override both."
    );
}

const REPL_HELP: &str = "Commands:
  /context          print the diagram summary sent to the assistant
  /export [<path>]  write the diagram as BPMN XML (stdout without a path)
  /save             write the diagram back to the file it was opened from
  /key <api-key>    store the API key in the settings file
  /clear            reset the diagram to a blank process
  /reset            forget the conversation
  /help             show this help
  /quit             exit
Anything else is sent to the assistant.";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    diagram: Option<String>,
    settings: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        let slot = match arg.as_str() {
            "--settings" => &mut options.settings,
            "--model" => &mut options.model,
            "--endpoint" => &mut options.endpoint,
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.diagram.is_some() {
                    return Err(());
                }
                options.diagram = Some(arg);
                continue;
            }
        };
        if slot.is_some() {
            return Err(());
        }
        let value = args.next().ok_or(())?;
        if value.trim().is_empty() {
            return Err(());
        }
        *slot = Some(value);
    }

    Ok(options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplInput {
    Empty,
    Chat(String),
    Context,
    Export(Option<String>),
    Save,
    Key(String),
    Clear,
    Reset,
    Help,
    Quit,
    Unknown(String),
}

fn parse_line(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ReplInput::Chat(line.to_owned());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_owned());
    match (name, argument) {
        ("context", None) => ReplInput::Context,
        ("export", path) => ReplInput::Export(path),
        ("save", None) => ReplInput::Save,
        ("key", Some(key)) => ReplInput::Key(key),
        ("clear", None) => ReplInput::Clear,
        ("reset", None) => ReplInput::Reset,
        ("help", None) => ReplInput::Help,
        ("quit" | "exit", None) => ReplInput::Quit,
        _ => ReplInput::Unknown(line.to_owned()),
    }
}

fn default_settings_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

fn print_report(report: &TurnReport) {
    println!("{}", report.message);
    for result in &report.results {
        let marker = if result.success() { "ok" } else { "failed" };
        println!("  [{marker}] {result}");
    }
    for warning in &report.warnings {
        println!("  [ignored] {warning}");
    }
}

fn write_diagram<E: DiagramEngine>(
    session: &AssistSession<E, HttpTransport>,
    path: &Path,
) -> io::Result<()> {
    std::fs::write(path, session.export_xml())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn run_repl(
    runtime: &tokio::runtime::Runtime,
    session: &mut AssistSession<InMemoryModeler, HttpTransport>,
    store: &SettingsStore,
    diagram_path: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    if !session.client().is_configured() {
        eprintln!("No API key configured. Use `/key <api-key>` or set BPMN_ASSIST_API_KEY.");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            return Ok(());
        };

        match parse_line(&line?) {
            ReplInput::Empty => {}
            ReplInput::Chat(text) => match runtime.block_on(session.submit(&text)) {
                Ok(report) => print_report(&report),
                Err(err) => eprintln!("error: {err}"),
            },
            ReplInput::Context => println!("{}", session.context_json()),
            ReplInput::Export(None) => println!("{}", session.export_xml()),
            ReplInput::Export(Some(path)) => {
                if let Err(err) = write_diagram(session, Path::new(&path)) {
                    eprintln!("error: cannot write {path}: {err}");
                }
            }
            ReplInput::Save => match diagram_path {
                Some(path) => {
                    if let Err(err) = write_diagram(session, path) {
                        eprintln!("error: cannot write {}: {err}", path.display());
                    }
                }
                None => eprintln!("no diagram file was given; use /export <path>"),
            },
            ReplInput::Key(key) => {
                let stored = AssistantSettings::load_from(store)
                    .and_then(|stored| {
                        let stored = stored.with_api_key(Some(key.clone()));
                        stored.save_to(store).map(|()| stored)
                    });
                match stored {
                    Ok(_) => println!("API key saved to {}", store.path().display()),
                    Err(err) => eprintln!("error: {err}"),
                }
                let updated = session.client().settings().clone().with_api_key(Some(key));
                session.client_mut().set_settings(updated);
            }
            ReplInput::Clear => match execute(session.engine_mut(), &TransformCommand::Clear) {
                Ok(output) => println!("{output}"),
                Err(err) => eprintln!("error: {err}"),
            },
            ReplInput::Reset => {
                session.reset_conversation();
                println!("conversation cleared");
            }
            ReplInput::Help => println!("{REPL_HELP}"),
            ReplInput::Quit => return Ok(()),
            ReplInput::Unknown(line) => eprintln!("unknown command: {line} (try /help)"),
        }
    }
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "bpmn-assist".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_tracing();

        let store = SettingsStore::new(
            options.settings.map(PathBuf::from).unwrap_or_else(default_settings_path),
        );
        let mut settings = AssistantSettings::load_from(&store)?.with_env_overrides();
        if let Some(model) = options.model {
            settings = settings.with_model(model);
        }
        if let Some(endpoint) = options.endpoint {
            settings = settings.with_endpoint(endpoint);
        }

        let diagram_path = options.diagram.map(PathBuf::from);
        let engine = match &diagram_path {
            Some(path) if path.exists() => InMemoryModeler::from_xml(&std::fs::read_to_string(path)?)?,
            _ => InMemoryModeler::blank()?,
        };
        tracing::debug!(elements = engine.diagram().len(), "diagram loaded");

        let client = AssistantClient::new(HttpTransport::new()?, settings);
        let mut session = AssistSession::new(engine, client);

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        run_repl(&runtime, &mut session, &store, diagram_path.as_deref())
    })();

    if let Err(err) = result {
        eprintln!("bpmn-assist: {err}");
        std::process::exit(1);
    }
}
