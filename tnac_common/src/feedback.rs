//! The feedback bundle: handler slots the core calls into
//!
//! The pipeline never talks to the host directly. Every stage receives
//! a `&mut Feedback` and reports diagnostics, commands and file-load
//! requests through it. All slots default to no-ops returning neutral
//! values, so a default bundle is always safe to pass.
//!
//! Besides invoking the host's handlers, the bundle records everything
//! reported into a [`Diagnostics`] collection, so a host that installs
//! no handlers can still inspect what the pipeline produced.

use crate::{Command, Diagnostic, Diagnostics, Span, TnacError};
use std::path::Path;

type ErrorHandler = Box<dyn FnMut(&str)>;
type ParseErrorHandler = Box<dyn FnMut(&Diagnostic)>;
type CompileHandler = Box<dyn FnMut(Span, &str)>;
type CommandHandler = Box<dyn FnMut(Command)>;
type LoadFileHandler = Box<dyn FnMut(&Path) -> bool>;

/// Value-style bundle of host callbacks.
///
/// Handlers are installed by move through the `on_*` builder methods.
#[derive(Default)]
pub struct Feedback {
    error: Option<ErrorHandler>,
    parse_error: Option<ParseErrorHandler>,
    compile_error: Option<CompileHandler>,
    compile_warning: Option<CompileHandler>,
    compile_note: Option<CompileHandler>,
    command: Option<CommandHandler>,
    load_file: Option<LoadFileHandler>,
    diagnostics: Diagnostics,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_error(mut self, handler: impl FnMut(&str) + 'static) -> Self {
        self.error = Some(Box::new(handler));
        self
    }

    pub fn on_parse_error(mut self, handler: impl FnMut(&Diagnostic) + 'static) -> Self {
        self.parse_error = Some(Box::new(handler));
        self
    }

    pub fn on_compile_error(mut self, handler: impl FnMut(Span, &str) + 'static) -> Self {
        self.compile_error = Some(Box::new(handler));
        self
    }

    pub fn on_compile_warning(mut self, handler: impl FnMut(Span, &str) + 'static) -> Self {
        self.compile_warning = Some(Box::new(handler));
        self
    }

    pub fn on_compile_note(mut self, handler: impl FnMut(Span, &str) + 'static) -> Self {
        self.compile_note = Some(Box::new(handler));
        self
    }

    pub fn on_command(mut self, handler: impl FnMut(Command) + 'static) -> Self {
        self.command = Some(Box::new(handler));
        self
    }

    pub fn on_load_file(mut self, handler: impl FnMut(&Path) -> bool + 'static) -> Self {
        self.load_file = Some(Box::new(handler));
        self
    }

    /// Everything reported through this bundle so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Hands the accumulated diagnostics over, leaving the collection
    /// empty
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Generic error surfaced to the user
    pub fn error(&mut self, msg: &str) {
        self.diagnostics.error(msg, Span::dummy());
        if let Some(h) = self.error.as_mut() {
            h(msg);
        }
    }

    /// Reports a typed pipeline error through the generic error slot
    pub fn report(&mut self, err: TnacError) {
        let diag = Diagnostic::from(err);
        if let Some(h) = self.error.as_mut() {
            h(&diag.message);
        }
        self.diagnostics.add(diag);
    }

    /// Non-fatal parse error; parsing continues afterwards
    pub fn parse_error(&mut self, err: &Diagnostic) {
        self.diagnostics.add(err.clone());
        if let Some(h) = self.parse_error.as_mut() {
            h(err);
        }
    }

    pub fn compile_error(&mut self, at: Span, msg: &str) {
        self.diagnostics.error(msg, at);
        if let Some(h) = self.compile_error.as_mut() {
            h(at, msg);
        }
    }

    pub fn compile_warning(&mut self, at: Span, msg: &str) {
        self.diagnostics.warning(msg, at);
        if let Some(h) = self.compile_warning.as_mut() {
            h(at, msg);
        }
    }

    pub fn compile_note(&mut self, at: Span, msg: &str) {
        self.diagnostics.add(Diagnostic::info(msg, at));
        if let Some(h) = self.compile_note.as_mut() {
            h(at, msg);
        }
    }

    /// Delivers a parsed command to the host
    pub fn command(&mut self, cmd: Command) {
        if let Some(h) = self.command.as_mut() {
            h(cmd);
        }
    }

    /// Synchronous file-load request; true means the file was loaded
    /// and parsed by the host
    pub fn load_file(&mut self, path: &Path) -> bool {
        match self.load_file.as_mut() {
            Some(h) => h(path),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn default_bundle_is_inert() {
        let mut fb = Feedback::new();
        fb.error("nothing listens");
        assert!(!fb.load_file(Path::new("nowhere")));
    }

    #[test]
    fn handlers_receive_calls() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut fb = Feedback::new().on_error(move |msg| sink.borrow_mut().push(msg.to_string()));
        fb.error("first");
        fb.error("second");
        assert_eq!(*seen.borrow(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn every_report_lands_in_diagnostics() {
        let mut fb = Feedback::new();
        fb.error("plain");
        fb.compile_error(Span::dummy(), "compile");
        fb.compile_warning(Span::dummy(), "warn");
        fb.compile_note(Span::dummy(), "note");
        fb.parse_error(&Diagnostic::error("parse", Span::dummy()));

        let diags = fb.diagnostics();
        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 3);
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(diags.messages.len(), 5);
    }

    #[test]
    fn typed_errors_convert_to_diagnostics() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut fb = Feedback::new().on_error(move |msg| sink.borrow_mut().push(msg.to_string()));
        fb.report(TnacError::runtime_error("Stack overflow"));

        assert!(seen.borrow()[0].contains("Stack overflow"));
        let diag = &fb.diagnostics().messages[0];
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.message.contains("Runtime error"));
    }

    #[test]
    fn take_diagnostics_drains_the_collection() {
        let mut fb = Feedback::new();
        fb.error("one");
        let taken = fb.take_diagnostics();
        assert_eq!(taken.messages.len(), 1);
        assert!(fb.diagnostics().is_empty());
        assert!(!fb.has_errors());
    }
}
