use crate::ast::Program;
use crate::checker::TypeChecker;
use crate::error::ContractError;
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;
use crate::serialization::{to_schema, ContractSchema};
use log::debug;
use serde::{Serialize, Serializer};

/// The result of a successful analysis of a contract.
///
/// Holds the checked AST, which code generators read directly, and offers
/// span-free exports of the same data.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub program: Program,
}

impl Serialize for AnalysisResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_schema().serialize(serializer)
    }
}

impl AnalysisResult {
    /// Converts the checked contract into a plain schema value.
    #[must_use]
    pub fn to_schema(&self) -> ContractSchema {
        to_schema(&self.program)
    }

    /// Serializes the schema into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the schema into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

/// Turns source text into tokens, ending with an EOF token.
///
/// # Errors
/// Returns an `InvalidCharacterError` for unscannable input.
pub fn tokenize(source: &str, file_name: &str) -> Result<Vec<Token>, ContractError> {
    let tokens = Lexer::new_with_name(source, file_name).lex()?;
    debug!("{}: lexed {} tokens", file_name, tokens.len());
    Ok(tokens)
}

/// Builds the AST from a token stream.
///
/// # Errors
/// Returns a `SyntaxError` at the first grammar violation.
pub fn parse(tokens: Vec<Token>, file_name: &str) -> Result<Program, ContractError> {
    let program = Parser::new_with_name(tokens, file_name).parse_program()?;
    debug!(
        "{}: parsed {} models",
        file_name,
        program.statements.len()
    );
    Ok(program)
}

/// Resolves every type reference and annotation in `program`.
///
/// # Errors
/// Returns a `TypeError` for the first unresolved symbol, re-declaration,
/// generic misuse or illegal annotation.
pub fn check(program: &Program) -> Result<(), ContractError> {
    TypeChecker::new().check(program)?;
    debug!("{}: type check passed", program.span.file);
    Ok(())
}

/// Analyzes a contract source string: lexes, parses and type checks it.
///
/// This is the primary entry point. Errors carry the source text so they can
/// be rendered with `miette`.
///
/// # Arguments
///
/// * `source` - The contract source code as a string.
/// * `file_name` - The name of the file being analyzed (used for error reporting).
///
/// # Errors
///
/// Returns the first `ContractError` raised by any stage.
pub fn analyze(source: &str, file_name: &str) -> Result<AnalysisResult, ContractError> {
    let run = || -> Result<Program, ContractError> {
        let tokens = tokenize(source, file_name)?;
        let program = parse(tokens, file_name)?;
        check(&program)?;
        Ok(program)
    };

    match run() {
        Ok(program) => Ok(AnalysisResult { program }),
        Err(err) => {
            debug!("{}: {} at {}", file_name, err.name(), err.span);
            Err(err.with_source(source))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::analyze;
    use crate::error::ErrorKind;

    #[test]
    fn test_simple_contract_to_json() {
        let source = r#"
@Data
model User {
  @IsEmail("bad email")
  String email
  Array<String> tags
}
"#;

        let expected_json = serde_json::json!({
            "models": [{
                "name": "User",
                "annotations": [{ "name": "Data" }],
                "fields": [
                    {
                        "name": "email",
                        "type": "String",
                        "annotations": [{ "name": "IsEmail", "args": ["bad email"] }],
                        "rules": [{ "rule": "IsEmail", "message": "bad email" }]
                    },
                    {
                        "name": "tags",
                        "type": "Array<String>",
                        "annotations": [],
                        "rules": []
                    }
                ]
            }]
        });

        let analysis_result = analyze(source, "user.contract").unwrap();
        let result = analysis_result.to_json().unwrap();
        let result_json: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert_eq!(result_json, expected_json);
    }

    #[test]
    fn test_simple_contract_to_yaml() {
        let source = "model Flag {\n  Bool enabled\n}\n";

        let expected_yaml = "\
models:
- name: Flag
  annotations: []
  fields:
  - name: enabled
    type: Bool
    annotations: []
    rules: []
";

        let analysis_result = analyze(source, "flag.contract").unwrap();
        assert_eq!(analysis_result.to_yaml().unwrap(), expected_yaml);
    }

    #[test]
    fn test_errors_carry_source() {
        let err = analyze("model A {\n  Uuid id\n}", "a.contract").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
        assert!(err.has_source());
        assert_eq!(&*err.span.file, "a.contract");
    }
}
