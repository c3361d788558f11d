//! Command recognition and validation
//!
//! Commands are `#name arg...` sequences. The parser hands raw token
//! lists here; the interpreter checks the name against a descriptor
//! table and validates argument count and kinds. A valid command is
//! delivered through feedback; an invalid one comes back as a typed
//! error describing what was wrong with it.

use tnac_common::{ArgKind, Command, CommandArg, Feedback, Span, TnacError, TnacResult};
use tnac_lexer::{Token, TokenKind};

/// Allowed kinds for one argument slot
#[derive(Debug, Clone)]
struct SlotSpec {
    allowed: &'static [ArgKind],
    /// When set, the argument text must be one of these words
    words: &'static [&'static str],
}

const ANY_STRING: SlotSpec = SlotSpec { allowed: &[ArgKind::String], words: &[] };
const PATH_OR_CURRENT: SlotSpec =
    SlotSpec { allowed: &[ArgKind::String, ArgKind::Identifier], words: &[] };
const BASE_WORD: SlotSpec =
    SlotSpec { allowed: &[ArgKind::Identifier], words: &["bin", "oct", "dec", "hex"] };

/// A known command: name, mandatory arg count and per-slot constraints
struct Descriptor {
    name: &'static str,
    required: usize,
    slots: &'static [SlotSpec],
}

const DESCRIPTORS: &[Descriptor] = &[
    Descriptor { name: "exit", required: 0, slots: &[] },
    Descriptor { name: "result", required: 0, slots: &[BASE_WORD] },
    Descriptor { name: "list", required: 0, slots: &[ANY_STRING] },
    Descriptor { name: "ast", required: 0, slots: &[ANY_STRING, PATH_OR_CURRENT] },
    Descriptor { name: "vars", required: 0, slots: &[ANY_STRING] },
    Descriptor { name: "funcs", required: 0, slots: &[ANY_STRING] },
    Descriptor { name: "modules", required: 0, slots: &[ANY_STRING] },
    Descriptor { name: "env", required: 0, slots: &[ANY_STRING] },
    Descriptor { name: "bin", required: 0, slots: &[] },
    Descriptor { name: "oct", required: 0, slots: &[] },
    Descriptor { name: "dec", required: 0, slots: &[] },
    Descriptor { name: "hex", required: 0, slots: &[] },
];

fn classify(tok: &Token) -> ArgKind {
    match tok.kind() {
        TokenKind::String => ArgKind::String,
        TokenKind::Identifier => ArgKind::Identifier,
        TokenKind::IntBin | TokenKind::IntOct | TokenKind::IntDec | TokenKind::IntHex => {
            ArgKind::Int
        }
        TokenKind::Float => ArgKind::Float,
        _ => ArgKind::Other,
    }
}

/// Validates a raw command against the descriptor table and delivers
/// it on success
pub fn interpret(name: &Token, args: &[Token], feedback: &mut Feedback) -> TnacResult<()> {
    let Some(desc) = DESCRIPTORS.iter().find(|d| d.name == name.text()) else {
        return Err(TnacError::parse_error(format!("Unknown command '{}'", name.text())));
    };

    if args.len() < desc.required {
        return Err(TnacError::parse_error(format!(
            "Too few arguments for '{}': expected at least {}, got {}",
            desc.name,
            desc.required,
            args.len()
        )));
    }
    if args.len() > desc.slots.len() {
        return Err(TnacError::parse_error(format!(
            "Too many arguments for '{}': expected at most {}, got {}",
            desc.name,
            desc.slots.len(),
            args.len()
        )));
    }

    for (idx, (arg, slot)) in args.iter().zip(desc.slots.iter()).enumerate() {
        let kind = classify(arg);
        if !slot.allowed.contains(&kind) {
            return Err(TnacError::parse_error(format!(
                "Wrong kind for argument {} of '{}': expected {}, got {}",
                idx + 1,
                desc.name,
                slot.allowed.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(" or "),
                kind
            )));
        }
        if !slot.words.is_empty() && !slot.words.contains(&arg.text()) {
            return Err(TnacError::parse_error(format!(
                "Wrong value for argument {} of '{}': expected one of {}",
                idx + 1,
                desc.name,
                slot.words.join(", ")
            )));
        }
    }

    let span = name.at();
    let cmd_args: Vec<CommandArg> =
        args.iter().map(|a| CommandArg::new(a.text(), classify(a), a.at())).collect();
    feedback.command(Command::new(name.text(), span, cmd_args));
    Ok(())
}

/// Span helper for hosts that only have the command payload
pub fn command_span(cmd: &Command) -> Span {
    cmd.span
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tnac_common::Span;

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Span::dummy())
    }

    fn run(name: &str, args: Vec<Token>) -> (TnacResult<()>, Vec<Command>) {
        let delivered = Rc::new(RefCell::new(Vec::new()));
        let cmd_sink = Rc::clone(&delivered);
        let mut fb = Feedback::new().on_command(move |cmd| cmd_sink.borrow_mut().push(cmd));
        let res = interpret(&tok(TokenKind::Command, name), &args, &mut fb);
        let cmds = delivered.borrow().clone();
        (res, cmds)
    }

    #[test]
    fn known_command_is_delivered() {
        let (res, cmds) = run("exit", vec![]);
        assert!(res.is_ok());
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].name, "exit");
    }

    #[test]
    fn unknown_command_is_rejected() {
        let (res, cmds) = run("nonsense", vec![]);
        assert!(res.unwrap_err().to_string().contains("Unknown command"));
        assert!(cmds.is_empty());
    }

    #[test]
    fn too_many_arguments() {
        let (res, cmds) = run("exit", vec![tok(TokenKind::Identifier, "now")]);
        assert!(res.unwrap_err().to_string().contains("Too many"));
        assert!(cmds.is_empty());
    }

    #[test]
    fn wrong_kind_argument() {
        let (res, _) = run("list", vec![tok(TokenKind::IntDec, "1")]);
        assert!(res.unwrap_err().to_string().contains("Wrong kind"));
    }

    #[test]
    fn base_word_is_constrained() {
        let (res, cmds) = run("result", vec![tok(TokenKind::Identifier, "hex")]);
        assert!(res.is_ok());
        assert_eq!(cmds[0].args[0].value, "hex");

        let (bad, _) = run("result", vec![tok(TokenKind::Identifier, "roman")]);
        assert!(bad.unwrap_err().to_string().contains("Wrong value"));
    }
}
