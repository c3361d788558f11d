//! The tnac driver: REPL, `--eval`, and file execution

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use log::info;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tnac::State;
use tnac_common::{Command, Feedback};
use tnac_sema::SymKind;
use tnac_value::{format_value, IntBase, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Base {
    Bin,
    Oct,
    Dec,
    Hex,
}

impl From<Base> for IntBase {
    fn from(b: Base) -> IntBase {
        match b {
            Base::Bin => IntBase::Bin,
            Base::Oct => IntBase::Oct,
            Base::Dec => IntBase::Dec,
            Base::Hex => IntBase::Hex,
        }
    }
}

/// tnac: a tiny interpreted expression language
#[derive(Debug, ClapParser)]
#[command(name = "tnac", version, about)]
struct Cli {
    /// Source files to run in order
    files: Vec<PathBuf>,

    /// Evaluate a single expression and exit
    #[arg(short, long)]
    eval: Option<String>,

    /// Integer base used for result printing
    #[arg(long, value_enum, default_value = "dec")]
    base: Base,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Host-side state shared with the feedback handlers
#[derive(Debug)]
struct Host {
    exit: bool,
    base: IntBase,
    pending: Vec<Command>,
    lines: Vec<String>,
}

impl Host {
    fn new(base: IntBase) -> Self {
        Self { exit: false, base, pending: Vec::new(), lines: Vec::new() }
    }
}

fn install_handlers(shared: &Rc<RefCell<Host>>) -> impl FnOnce(Feedback) -> Feedback + '_ {
    move |fb: Feedback| {
        let cmds = Rc::clone(shared);
        fb.on_error(|msg| eprintln!("error: {}", msg))
            .on_parse_error(|diag| eprintln!("{}", diag))
            .on_compile_error(|at, msg| eprintln!("error: {} at {}", msg, at))
            .on_compile_warning(|at, msg| eprintln!("warning: {} at {}", msg, at))
            .on_compile_note(|at, msg| eprintln!("note: {} at {}", msg, at))
            .on_command(move |cmd| cmds.borrow_mut().pending.push(cmd))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let host = Rc::new(RefCell::new(Host::new(cli.base.into())));
    let mut state = State::with_file_imports(install_handlers(&host));

    for file in &cli.files {
        info!("running {}", file.display());
        let value = state
            .eval_file(file)
            .with_context(|| format!("while running {}", file.display()))?;
        print_value(&host, &value);
        process_commands(&host, &state);
    }

    if let Some(expr) = &cli.eval {
        let value = state.eval_line(expr);
        print_value(&host, &value);
        process_commands(&host, &state);
    }

    if cli.files.is_empty() && cli.eval.is_none() {
        repl(&host, &mut state)?;
    }

    // the feedback bundle collected everything the pipeline reported
    if state.diagnostics().has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn repl(host: &Rc<RefCell<Host>>, state: &mut State) -> Result<()> {
    let stdin = io::stdin();
    let mut out = io::stdout();

    loop {
        write!(out, "tnac> ")?;
        out.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        host.borrow_mut().lines.push(line.to_string());

        let value = state.eval_line(line);
        print_value(host, &value);
        process_commands(host, state);
        if host.borrow().exit {
            break;
        }
    }
    Ok(())
}

fn print_value(host: &Rc<RefCell<Host>>, value: &Value) {
    if value.is_undef() {
        return;
    }
    let base = host.borrow().base;
    println!("{}", format_value(value, base));
}

fn base_of(word: &str) -> Option<IntBase> {
    match word {
        "bin" => Some(IntBase::Bin),
        "oct" => Some(IntBase::Oct),
        "dec" => Some(IntBase::Dec),
        "hex" => Some(IntBase::Hex),
        _ => None,
    }
}

/// Dispatches commands collected during the last evaluation
fn process_commands(host: &Rc<RefCell<Host>>, state: &State) {
    let pending: Vec<Command> = std::mem::take(&mut host.borrow_mut().pending);
    for cmd in pending {
        match cmd.name.as_str() {
            "exit" => host.borrow_mut().exit = true,
            "bin" | "oct" | "dec" | "hex" => {
                host.borrow_mut().base = base_of(&cmd.name).expect("validated by the interpreter");
            }
            "result" => {
                if let Some(arg) = cmd.arg(0) {
                    if let Some(base) = base_of(&arg.value) {
                        host.borrow_mut().base = base;
                    }
                }
            }
            "list" => {
                for line in &host.borrow().lines {
                    println!("{}", line);
                }
            }
            "vars" => print_symbols(state, SymKind::Variable),
            "funcs" => print_symbols(state, SymKind::Function),
            "modules" => print_symbols(state, SymKind::Module),
            "ast" => print_ast(state),
            "env" => {
                if let Ok(cwd) = std::env::current_dir() {
                    println!("{}", cwd.display());
                }
            }
            _ => {}
        }
    }
}

fn print_symbols(state: &State, kind: SymKind) {
    for sym in state.sema().table().symbols_of(kind) {
        match kind {
            SymKind::Function => println!("{} ({} params)", sym.name, sym.param_count()),
            _ => println!("{}", sym.name),
        }
    }
}

fn print_ast(state: &State) {
    let ast = state.ast();
    let Some(root) = ast.root() else {
        return;
    };
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        let marker = if ast.is_valid(node) { "" } else { " (invalid)" };
        println!("{}{:?}{}", "  ".repeat(depth), ast.kind(node), marker);
        let children = ast.children(node);
        for child in children.into_iter().rev() {
            stack.push((child, depth + 1));
        }
    }
}
