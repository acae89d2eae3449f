use crate::ast::*;
use crate::error::ContractError;
use crate::lexer::{Token, TokenType};
use crate::location::{Position, Span};
use std::sync::Arc;

/// A recursive descent parser for contracts.
///
/// The parser walks a token vector with a single cursor and one token of
/// lookahead. It never recovers: the first error aborts the whole unit.
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    file: Arc<str>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::new_with_name(tokens, "source.contract")
    }

    pub fn new_with_name(tokens: Vec<Token>, name: &str) -> Self {
        Self {
            tokens,
            position: 0,
            file: Arc::from(name),
        }
    }

    // === Main Parsing Methods ===

    /// Program ::= { [ AnnotationChain ] ModelStatement [ NEWLINE ] } EOF
    pub fn parse_program(&mut self) -> Result<Program, ContractError> {
        let start = self.current_token()?.span.clone();
        let mut statements = Vec::new();

        loop {
            let (ttype, is_model) = {
                let token = self.current_token()?;
                (token.ttype, token.matches(TokenType::Keyword, "model"))
            };

            match ttype {
                TokenType::Eof => break,
                TokenType::Newline => self.advance(),
                TokenType::At => {
                    let chain = self.parse_annotation_chain()?;
                    if !self.current_token()?.matches(TokenType::Keyword, "model") {
                        return Err(ContractError::syntax(
                            "Dangling annotation: no object affected",
                            chain.span,
                        ));
                    }
                    let model = self.parse_model_statement(Some(chain))?;
                    statements.push(Statement::Model(model));
                    self.expect_statement_end()?;
                }
                TokenType::Keyword if is_model => {
                    let model = self.parse_model_statement(None)?;
                    statements.push(Statement::Model(model));
                    self.expect_statement_end()?;
                }
                _ => return self.err_invalid_syntax(),
            }
        }

        let end = self.current_token()?.span.clone();
        Ok(Program {
            statements,
            span: start.to(&end),
        })
    }

    /// ModelStatement ::= "model" Identifier [ "<" Identifier ">" ] "{" FieldList "}"
    fn parse_model_statement(
        &mut self,
        annotations: Option<AnnotationChain>,
    ) -> Result<ModelStatement, ContractError> {
        let keyword = self.expect_token(TokenType::Keyword, "model", "Expected 'model'")?;
        let name = self.expect(TokenType::Identifier, "Expected model name")?;

        let type_var = if self.check_operator("<") {
            self.advance();
            let var = self.expect(TokenType::Identifier, "Expected type var")?;
            self.expect_token(TokenType::Operator, ">", "Expected '>'")?;
            Some(TypeVar {
                name: var.literal,
                span: var.span,
            })
        } else {
            None
        };

        self.skip_newlines();
        self.expect(TokenType::LBrace, "Expected {")?;
        let fields = self.parse_model_fields()?;
        self.skip_newlines();
        let end = self.expect(TokenType::RBrace, "Expected }")?;

        // An annotated model starts at its first annotation.
        let start = annotations.as_ref().map_or(&keyword.span, |chain| &chain.span);
        Ok(ModelStatement {
            span: start.to(&end.span),
            name: name.literal,
            type_var,
            annotations,
            fields,
        })
    }

    /// FieldList ::= { [ AnnotationChain ] ModelField }
    fn parse_model_fields(&mut self) -> Result<Vec<ModelField>, ContractError> {
        let mut chain: Option<AnnotationChain> = None;
        let mut fields = Vec::new();

        while !self.check(TokenType::Eof) {
            self.skip_newlines();

            if self.check(TokenType::RBrace) {
                break;
            }

            if self.check(TokenType::At) {
                chain = Some(self.parse_annotation_chain()?);
                continue;
            }

            fields.push(self.parse_model_field(chain.take())?);
        }

        if let Some(chain) = chain {
            return Err(ContractError::syntax(
                "Dangling annotation: no field affected",
                chain.span,
            ));
        }

        Ok(fields)
    }

    /// ModelField ::= TypeDeclaration Identifier
    fn parse_model_field(
        &mut self,
        annotations: Option<AnnotationChain>,
    ) -> Result<ModelField, ContractError> {
        let type_decl = self.parse_type()?;

        self.skip_newlines();
        let name = self.expect(TokenType::Identifier, "Expected field name")?;
        self.skip_newlines();

        let start = annotations.as_ref().map_or(&type_decl.span, |chain| &chain.span);
        let span = start.to(&name.span);
        Ok(ModelField {
            name: name.literal,
            type_decl,
            annotations,
            span,
        })
    }

    /// TypeDeclaration ::= Identifier [ "<" TypeDeclaration ">" ]
    fn parse_type(&mut self) -> Result<TypeDeclaration, ContractError> {
        let name = self.expect(TokenType::Identifier, "Expected type name")?;
        let mut end = name.span.clone();

        let generic = if self.check_operator("<") {
            self.advance();
            let inner = self.parse_type()?;
            end = self.expect_token(TokenType::Operator, ">", "Expected '>'")?.span;
            Some(Box::new(inner))
        } else {
            None
        };

        Ok(TypeDeclaration {
            span: name.span.to(&end),
            name: name.literal,
            generic,
        })
    }

    /// AnnotationChain ::= Annotation { NEWLINE | Annotation }
    fn parse_annotation_chain(&mut self) -> Result<AnnotationChain, ContractError> {
        let mut annotations = vec![self.parse_annotation()?];

        loop {
            if self.check(TokenType::At) {
                annotations.push(self.parse_annotation()?);
            } else if self.check(TokenType::Newline) {
                self.advance();
            } else {
                break;
            }
        }

        let first = &annotations[0].span;
        let last = &annotations[annotations.len() - 1].span;
        let span = first.to(last);
        Ok(AnnotationChain { annotations, span })
    }

    /// Annotation ::= "@" Identifier [ "(" [ Literal { "," Literal } [ "," ] ] ")" ] ( NEWLINE | EOF )
    fn parse_annotation(&mut self) -> Result<Annotation, ContractError> {
        let at = self.expect(TokenType::At, "Expected '@'")?;
        let name = self.expect(TokenType::Identifier, "Expected annotation name")?;
        let mut end = name.span.clone();
        let mut args = Vec::new();

        if self.match_token(TokenType::LParen) {
            while !self.check(TokenType::RParen) {
                args.push(self.parse_literal()?);

                if self.match_token(TokenType::Comma) {
                    // Trailing comma
                    if self.check(TokenType::RParen) {
                        break;
                    }
                } else if !self.check(TokenType::RParen) {
                    return self.err_unexpected("Expected ',' or ')' after annotation argument");
                }
            }
            end = self
                .expect(TokenType::RParen, "Expected ')' after arguments")?
                .span;
        }

        if self.check(TokenType::Newline) {
            self.advance();
        } else if !self.check(TokenType::Eof) {
            return self.err_invalid_syntax();
        }

        Ok(Annotation {
            name: name.literal,
            args,
            span: at.span.to(&end),
        })
    }

    /// Literal ::= Number | String | Bool | Null
    fn parse_literal(&mut self) -> Result<Literal, ContractError> {
        let token = self.current_token()?;
        match token.ttype {
            TokenType::Number | TokenType::String | TokenType::Bool | TokenType::Null => {
                let literal = Literal {
                    ttype: token.ttype,
                    raw: token.literal.clone(),
                    span: token.span.clone(),
                };
                self.advance();
                Ok(literal)
            }
            _ => self.err_unexpected("Only numbers, strings, booleans, or null are allowed here"),
        }
    }

    // === Token Cursor Helpers ===

    fn current_token(&self) -> Result<&Token, ContractError> {
        self.tokens
            .get(self.position)
            .ok_or_else(|| ContractError::syntax("Unexpected end of input", self.end_span()))
    }

    /// Zero-width span just past the last token.
    fn end_span(&self) -> Span {
        match self.tokens.last() {
            Some(token) => Span::point(token.span.end, token.span.file.clone()),
            None => Span::point(Position::new(1, 1, 0), self.file.clone()),
        }
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check(&self, ttype: TokenType) -> bool {
        self.current_token().is_ok_and(|t| t.has_type(ttype))
    }

    fn check_operator(&self, op: &str) -> bool {
        self.current_token()
            .is_ok_and(|t| t.matches(TokenType::Operator, op))
    }

    fn match_token(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenType::Newline) {
            self.advance();
        }
    }

    /// Consumes the current token if it has type `ttype`, returning a copy.
    fn expect(&mut self, ttype: TokenType, message: &str) -> Result<Token, ContractError> {
        let token = self.current_token()?;
        if token.has_type(ttype) {
            let token = token.clone();
            self.advance();
            Ok(token)
        } else {
            self.err_unexpected(message)
        }
    }

    /// Like [`Parser::expect`] but also requires the literal text to match.
    fn expect_token(
        &mut self,
        ttype: TokenType,
        literal: &str,
        message: &str,
    ) -> Result<Token, ContractError> {
        let token = self.current_token()?;
        if token.matches(ttype, literal) {
            let token = token.clone();
            self.advance();
            Ok(token)
        } else {
            self.err_unexpected(message)
        }
    }

    /// A statement is followed by a line break or the end of the file.
    fn expect_statement_end(&mut self) -> Result<(), ContractError> {
        match self.current_token()?.ttype {
            TokenType::Newline => {
                self.advance();
                Ok(())
            }
            TokenType::Eof => Ok(()),
            _ => self.err_invalid_syntax(),
        }
    }

    fn err_unexpected<T>(&self, message: &str) -> Result<T, ContractError> {
        let token = self.current_token()?;
        Err(ContractError::syntax(message, token.span.clone()))
    }

    fn err_invalid_syntax<T>(&self) -> Result<T, ContractError> {
        self.err_unexpected("Invalid syntax")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::lexer::Lexer;
    use crate::printer::print_tree;
    use miette::Report;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new_with_name(source, "test.contract").lex().unwrap()
    }

    fn parse_ok(source: &str) -> Program {
        let mut parser = Parser::new_with_name(tokens(source), "test.contract");
        match parser.parse_program() {
            Ok(program) => program,
            Err(err) => {
                let report = Report::new(err.with_source(source));
                panic!("{:?}", report);
            }
        }
    }

    fn parse_err(source: &str) -> ContractError {
        let mut parser = Parser::new_with_name(tokens(source), "test.contract");
        match parser.parse_program() {
            Ok(program) => panic!("Expected a SyntaxError, got {:#?}", program),
            Err(err) => err,
        }
    }

    fn token(ttype: TokenType, literal: &str) -> Token {
        let pos = Position::new(1, 1, 0);
        Token::new(ttype, literal, Span::point(pos, Arc::from("test.src")))
    }

    const LOGIN_DTO: &str = r#"
@CreateConstructor
@Data
model LoginDTO {
  @Private
  @Optional
  @IsEmail("Invalid email")
  String email

  String password
}
"#;

    #[test]
    fn test_login_dto() {
        let program = parse_ok(LOGIN_DTO);
        assert_eq!(program.statements.len(), 1);

        let model = program.model("LoginDTO").unwrap();
        let model_annotations: Vec<&str> = model
            .annotations
            .as_ref()
            .unwrap()
            .annotations
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(model_annotations, vec!["CreateConstructor", "Data"]);
        assert!(model.type_var.is_none());
        assert_eq!(model.fields.len(), 2);

        let email = &model.fields[0];
        assert_eq!(email.name, "email");
        assert_eq!(email.type_decl.name, "String");
        let names: Vec<&str> = email
            .annotations
            .as_ref()
            .unwrap()
            .annotations
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["Private", "Optional", "IsEmail"]);
        let is_email = email.annotation("IsEmail").unwrap();
        assert_eq!(is_email.args.len(), 1);
        assert_eq!(is_email.args[0].raw, "Invalid email");

        let password = &model.fields[1];
        assert_eq!(password.name, "password");
        assert!(password.annotations.is_none());
    }

    #[test]
    fn test_generic_model_and_nested_types() {
        let program = parse_ok("model Response<T> {\n  Array<T> data\n  Array<Array<String>> grid\n}\n");
        let model = program.model("Response").unwrap();
        assert_eq!(model.type_var.as_ref().unwrap().name, "T");

        let data = model.field("data").unwrap();
        assert_eq!(data.type_decl.to_string(), "Array<T>");
        let grid = model.field("grid").unwrap();
        let inner = grid.type_decl.generic.as_ref().unwrap();
        assert_eq!(inner.name, "Array");
        assert_eq!(inner.generic.as_ref().unwrap().name, "String");
    }

    #[test]
    fn test_newlines_between_type_and_name_and_blank_lines() {
        let program = parse_ok("model User\n{\n\n  String\n  name\n\n\n  Number age\n}");
        let model = program.model("User").unwrap();
        assert_eq!(model.fields.len(), 2);
        assert_eq!(model.fields[0].name, "name");
        assert_eq!(model.fields[1].name, "age");
    }

    #[test]
    fn test_empty_program_and_empty_model() {
        assert!(parse_ok("").statements.is_empty());
        assert!(parse_ok("\n# only a comment\n\n").statements.is_empty());
        assert!(parse_ok("model Empty {}").model("Empty").unwrap().fields.is_empty());
    }

    #[test]
    fn test_annotation_arguments() {
        let program = parse_ok("model Age {\n  @Max(130, `too old`,)\n  Number value\n}");
        let max = program.model("Age").unwrap().fields[0]
            .annotation("Max")
            .unwrap();
        assert_eq!(max.args.len(), 2);
        assert_eq!(max.args[0].ttype, TokenType::Number);
        assert_eq!(max.args[0].raw, "130");
        assert_eq!(max.args[1].ttype, TokenType::String);
    }

    #[test]
    fn test_annotation_with_bool_argument_from_tokens() {
        let mut parser = Parser::new(vec![
            token(TokenType::At, "@"),
            token(TokenType::Identifier, "Table"),
            token(TokenType::LParen, "("),
            token(TokenType::String, "users"),
            token(TokenType::Comma, ","),
            token(TokenType::Bool, "true"),
            token(TokenType::RParen, ")"),
            token(TokenType::Newline, "\n"),
            token(TokenType::Eof, ""),
        ]);
        let annotation = parser.parse_annotation().unwrap();
        assert_eq!(annotation.name, "Table");
        assert_eq!(annotation.args.len(), 2);
        assert_eq!(annotation.args[1].value(), LiteralValue::Bool(true));
    }

    #[test]
    fn test_literal_rejects_identifier() {
        let mut parser = Parser::new(vec![token(TokenType::Identifier, "wrong")]);
        let err = parser.parse_literal().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(
            err.message,
            "Only numbers, strings, booleans, or null are allowed here"
        );

        let err = parse_err("@Min(true)\nmodel A {}");
        assert_eq!(
            err.message,
            "Only numbers, strings, booleans, or null are allowed here"
        );
    }

    #[test]
    fn test_parse_type_from_tokens() {
        let mut parser = Parser::new(vec![
            token(TokenType::Identifier, "List"),
            token(TokenType::Operator, "<"),
            token(TokenType::Identifier, "String"),
            token(TokenType::Operator, ">"),
            token(TokenType::Eof, ""),
        ]);
        let t = parser.parse_type().unwrap();
        assert_eq!(t.name, "List");
        assert_eq!(t.generic.unwrap().name, "String");
    }

    #[test]
    fn test_model_statement_from_tokens() {
        let mut parser = Parser::new(vec![
            token(TokenType::Keyword, "model"),
            token(TokenType::Identifier, "User"),
            token(TokenType::LBrace, "{"),
            token(TokenType::Identifier, "String"),
            token(TokenType::Identifier, "name"),
            token(TokenType::RBrace, "}"),
            token(TokenType::Eof, ""),
        ]);
        let model = parser.parse_model_statement(None).unwrap();
        assert_eq!(model.name, "User");
        assert_eq!(model.fields.len(), 1);
        assert_eq!(model.fields[0].name, "name");
    }

    #[test]
    fn test_running_out_of_tokens() {
        let mut parser = Parser::new(vec![
            token(TokenType::Keyword, "model"),
            token(TokenType::Identifier, "User"),
        ]);
        let err = parser.parse_program().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.message, "Unexpected end of input");

        let err = Parser::new(vec![]).parse_program().unwrap_err();
        assert_eq!(err.message, "Unexpected end of input");
    }

    #[test]
    fn test_dangling_annotation_at_end_of_input() {
        let err = parse_err("model A {}\n@Data\n");
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.message, "Dangling annotation: no object affected");
        assert_eq!((err.span.start.line, err.span.start.column), (2, 1));

        let err = parse_err("@Data");
        assert_eq!(err.message, "Dangling annotation: no object affected");
    }

    #[test]
    fn test_dangling_annotation_before_other_token() {
        let err = parse_err("@Data\nUser\n");
        assert_eq!(err.message, "Dangling annotation: no object affected");
    }

    #[test]
    fn test_dangling_annotation_inside_model() {
        let err = parse_err("model A {\n  String name\n  @Optional\n}");
        assert_eq!(err.message, "Dangling annotation: no field affected");
        assert_eq!((err.span.start.line, err.span.start.column), (3, 3));

        let err = parse_err("model A {\n  @Optional\n");
        assert_eq!(err.message, "Dangling annotation: no field affected");
    }

    #[test]
    fn test_annotation_must_end_its_line() {
        let err = parse_err("model A {\n  @Private String name\n}");
        assert_eq!(err.message, "Invalid syntax");
        assert_eq!(err.span.start.column, 12);
    }

    #[test]
    fn test_statement_must_end_its_line() {
        let err = parse_err("model A {} model B {}");
        assert_eq!(err.message, "Invalid syntax");
    }

    #[test]
    fn test_top_level_garbage() {
        let err = parse_err("rest Api {}");
        assert_eq!(err.message, "Invalid syntax");
        assert_eq!(err.span.start.column, 1);
    }

    #[test]
    fn test_expectation_messages() {
        assert_eq!(parse_err("model {}").message, "Expected model name");
        assert_eq!(parse_err("model A<> {}").message, "Expected type var");
        assert_eq!(parse_err("model A<T {}").message, "Expected '>'");
        assert_eq!(parse_err("model A [").message, "Expected {");
        assert_eq!(parse_err("model A {\n  String\n}").message, "Expected field name");
        assert_eq!(parse_err("model A {\n  Array<String name\n}").message, "Expected '>'");
        assert_eq!(parse_err("model A {\n  (\n}").message, "Expected type name");
        assert_eq!(parse_err("@\nmodel A {}").message, "Expected annotation name");
        assert_eq!(
            parse_err("@Max(1 2)\nmodel A {}").message,
            "Expected ',' or ')' after annotation argument"
        );
        assert_eq!(parse_err("model A {\n  String name\n").message, "Expected }");
    }

    #[test]
    fn test_node_spans_are_ordered() {
        let program = parse_ok(LOGIN_DTO);
        let model = program.model("LoginDTO").unwrap();
        assert!(program.span.start <= program.span.end);
        assert!(model.span.start <= model.span.end);
        assert_eq!((model.span.start.line, model.span.start.column), (2, 1));
        assert_eq!((model.span.end.line, model.span.end.column), (11, 2));

        let chain = model.annotations.as_ref().unwrap();
        assert_eq!((chain.span.start.line, chain.span.end.line), (2, 3));
        assert_eq!(model.span.start, chain.span.start);

        let email = model.field("email").unwrap();
        assert_eq!((email.span.start.line, email.span.start.column), (5, 3));
        assert_eq!((email.span.end.line, email.span.end.column), (8, 15));
        let password = model.field("password").unwrap();
        assert_eq!(password.span.start, password.type_decl.span.start);

        for field in &model.fields {
            assert!(field.span.start <= field.span.end);
            assert!(field.type_decl.span.start <= field.type_decl.span.end);
            for annotation in field.annotations.iter().flat_map(|c| &c.annotations) {
                assert!(annotation.span.start <= annotation.span.end);
            }
        }
    }

    /// Parses an optional annotation chain followed by one field.
    fn reparse_field(text: &str) -> ModelField {
        let mut parser = Parser::new(tokens(text));
        let chain = if parser.check(TokenType::At) {
            Some(parser.parse_annotation_chain().unwrap())
        } else {
            None
        };
        parser.parse_model_field(chain).unwrap()
    }

    #[test]
    fn test_reparsing_span_text_reproduces_nodes() {
        let source = "model Page<T> {\n  @ArrayMaxSize(50, `too many`)\n  Array<T> items\n  Number\n    total\n}\n";
        let program = parse_ok(source);
        let model = program.model("Page").unwrap();

        let model_text = &source[model.span.byte_range()];
        let mut parser = Parser::new(tokens(model_text));
        let reparsed = parser.parse_model_statement(None).unwrap();
        assert_eq!(
            print_tree(Node::ModelStatement(&reparsed)),
            print_tree(Node::ModelStatement(model))
        );

        for field in &model.fields {
            let field_text = &source[field.span.byte_range()];
            let reparsed = reparse_field(field_text);
            assert_eq!(
                print_tree(Node::ModelField(&reparsed)),
                print_tree(Node::ModelField(field))
            );

            let type_text = &source[field.type_decl.span.byte_range()];
            let reparsed = Parser::new(tokens(type_text)).parse_type().unwrap();
            assert_eq!(reparsed.to_string(), field.type_decl.to_string());
        }

        let items = model.field("items").unwrap();
        assert!(source[items.span.byte_range()].starts_with("@ArrayMaxSize"));

        let annotation = items.annotation("ArrayMaxSize").unwrap();
        let annotation_text = &source[annotation.span.byte_range()];
        let reparsed = Parser::new(tokens(annotation_text))
            .parse_annotation()
            .unwrap();
        assert_eq!(
            print_tree(Node::Annotation(&reparsed)),
            print_tree(Node::Annotation(annotation))
        );
    }

    #[test]
    fn test_reparsing_annotated_model_keeps_its_chain() {
        let source = "# users\n@Data\n@Mapper\nmodel A {\n  @Optional\n  @IsNotEmpty(\"required\")\n  String s\n}\n";
        let program = parse_ok(source);
        let model = program.model("A").unwrap();

        let model_text = &source[model.span.byte_range()];
        assert!(model_text.starts_with("@Data"));
        let reparsed = parse_ok(model_text);
        assert_eq!(reparsed.statements.len(), 1);
        assert_eq!(
            print_tree(Node::from(&reparsed.statements[0])),
            print_tree(Node::ModelStatement(model))
        );
        assert!(reparsed.model("A").unwrap().annotation("Mapper").is_some());

        let field = &model.fields[0];
        let reparsed = reparse_field(&source[field.span.byte_range()]);
        assert_eq!(
            print_tree(Node::ModelField(&reparsed)),
            print_tree(Node::ModelField(field))
        );
        assert!(reparsed.annotation("Optional").is_some());
        assert!(reparsed.annotation("IsNotEmpty").is_some());
    }
}
