//! tnac: the pipeline facade
//!
//! Wires text through lexing, parsing, semantic analysis, IR lowering
//! and evaluation behind one [`State`] type. Hosts install feedback
//! handlers for diagnostics, commands and file loads; everything else
//! is internal.
//!
//! ```no_run
//! use tnac::State;
//! let mut state = State::new(tnac::common::Feedback::new());
//! let value = state.eval_line("1 + 2 * 3");
//! assert_eq!(value, tnac::value::Value::Int(7));
//! ```

use log::debug;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tnac_common::{Diagnostics, Feedback, SourceIndex, TnacError, TnacResult};
use tnac_compiler::Compiler;
use tnac_eval::Machine;
use tnac_ir::{Cfg, FuncId};
use tnac_parser::{Ast, NodeData, Parser};
use tnac_sema::Sema;
use tnac_value::{Value, ValueStore};

pub use tnac_common as common;
pub use tnac_value as value;

/// Files queued by the import loader, as `(module name, contents)`
pub type ImportQueue = Rc<RefCell<Vec<(String, String)>>>;

/// A `load_file` handler that reads `<path>` or `<path>.tnac` from
/// disk and queues the contents for the facade to parse
pub fn file_loader(queue: ImportQueue) -> impl FnMut(&Path) -> bool {
    move |path: &Path| {
        let direct = fs::read_to_string(path);
        let contents = match direct {
            Ok(c) => c,
            Err(_) => match fs::read_to_string(path.with_extension("tnac")) {
                Ok(c) => c,
                Err(_) => return false,
            },
        };
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        queue.borrow_mut().push((name, contents));
        true
    }
}

/// Interpreter state persisting across REPL lines: the AST and symbol
/// table accumulate; each evaluation lowers the whole tree into a
/// fresh CFG and walks it.
pub struct State {
    ast: Ast,
    sema: Sema,
    store: ValueStore,
    feedback: Feedback,
    sources: SourceIndex,
    imports: Option<ImportQueue>,
}

impl State {
    pub fn new(feedback: Feedback) -> Self {
        Self {
            ast: Ast::new(),
            sema: Sema::new(),
            store: ValueStore::new(),
            feedback,
            sources: SourceIndex::new(),
            imports: None,
        }
    }

    /// A state whose feedback already routes imports through the
    /// filesystem loader; `customise` receives the feedback bundle to
    /// install further handlers on.
    pub fn with_file_imports(customise: impl FnOnce(Feedback) -> Feedback) -> Self {
        let queue: ImportQueue = Rc::new(RefCell::new(Vec::new()));
        let feedback = customise(Feedback::new().on_load_file(file_loader(Rc::clone(&queue))));
        let mut state = Self::new(feedback);
        state.imports = Some(queue);
        state
    }

    /// Wires a custom loader's queue into the facade; queued files are
    /// parsed as modules after each evaluation
    pub fn with_import_queue(queue: ImportQueue, feedback: Feedback) -> Self {
        let mut state = Self::new(feedback);
        state.imports = Some(queue);
        state
    }

    pub fn sema(&self) -> &Sema {
        &self.sema
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn feedback_mut(&mut self) -> &mut Feedback {
        &mut self.feedback
    }

    /// Everything the pipeline has reported so far
    pub fn diagnostics(&self) -> &Diagnostics {
        self.feedback.diagnostics()
    }

    /// Hands the accumulated diagnostics over, leaving the collection
    /// empty. Useful between REPL lines.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        self.feedback.take_diagnostics()
    }

    /// Evaluates one REPL line in the default module
    pub fn eval_line(&mut self, input: &str) -> Value {
        self.eval_in_module(input, "repl")
    }

    /// Evaluates a whole source file as its own module
    pub fn eval_file(&mut self, path: &Path) -> TnacResult<Value> {
        let contents = fs::read_to_string(path).map_err(|e| {
            TnacError::io_error(format!("failed to read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main".to_string());
        Ok(self.eval_in_module(&contents, &name))
    }

    fn eval_in_module(&mut self, input: &str, module_name: &str) -> Value {
        let file_id = self.sources.intern(module_name);
        let outcome = {
            let mut parser = Parser::new(&mut self.ast, &mut self.sema, &mut self.feedback);
            parser.parse(input, file_id, module_name)
        };
        self.drain_imports();

        let module_sym = match self.ast.data(outcome.module) {
            NodeData::Module { sym, .. } => *sym,
            _ => return Value::Undef,
        };

        let Some(root) = self.ast.root() else {
            return Value::Undef;
        };

        let mut cfg = Cfg::new();
        {
            let mut compiler = Compiler::new(
                &self.sema,
                &self.ast,
                &mut cfg,
                &mut self.store,
                &mut self.feedback,
            );
            compiler.compile_root(root);
        }
        debug!("compiled {} functions", cfg.functions().count());

        let mut machine = Machine::new(&cfg, &mut self.store, &mut self.feedback);
        machine.evaluate(FuncId(module_sym.0 as u64))
    }

    /// Parses any files the import loader queued, recursively
    fn drain_imports(&mut self) {
        let Some(queue) = self.imports.clone() else {
            return;
        };
        loop {
            let next = queue.borrow_mut().pop();
            let Some((name, contents)) = next else {
                break;
            };
            if self.ast.find_module(&name).is_some() {
                continue;
            }
            let file_id = self.sources.intern(name.clone());
            let mut parser = Parser::new(&mut self.ast, &mut self.sema, &mut self.feedback);
            parser.parse(&contents, file_id, &name);
        }
    }
}
