//! Canned diagnostic messages for parse errors

pub fn expected(what: char) -> String {
    format!("Expected '{}'", what)
}

pub fn expected_expr() -> String {
    "Expected expression".to_string()
}

pub fn expected_id() -> String {
    "Expected identifier".to_string()
}

pub fn expected_init() -> String {
    "Expected initialisation".to_string()
}

pub fn expected_expr_sep() -> String {
    "Expected expression separator".to_string()
}

pub fn expected_func_end() -> String {
    "Expected ';' at the end of function body".to_string()
}

pub fn expected_cond_end() -> String {
    "Expected ';' at the end of conditional".to_string()
}

pub fn expected_pattern_end() -> String {
    "Expected ';' at the end of pattern body".to_string()
}

pub fn expected_matcher_def() -> String {
    "Expected '->' after matcher".to_string()
}

pub fn expected_args() -> String {
    "Expected argument list".to_string()
}

pub fn expected_single_id() -> String {
    "Expected a single identifier on the left of assignment".to_string()
}

pub fn expected_assignable() -> String {
    "Expected an assignable entity".to_string()
}

pub fn undef_id() -> String {
    "Undefined identifier".to_string()
}

pub fn param_redef() -> String {
    "Parameter redefinition".to_string()
}

pub fn name_redef() -> String {
    "Name redefinition".to_string()
}

pub fn invalid_decl() -> String {
    "Invalid declaration".to_string()
}

pub fn invalid_lambda() -> String {
    "Invalid anonymous function".to_string()
}

pub fn empty_cond() -> String {
    "Conditional expression cannot be empty".to_string()
}

pub fn empty_import() -> String {
    "Import name cannot be empty".to_string()
}

pub fn import_failed(name: &str) -> String {
    format!("Failed to import '{}'", name)
}

pub fn expr_not_allowed() -> String {
    "Expression is not allowed here".to_string()
}
