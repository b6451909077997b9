#[cfg(test)]
mod parser_tests {
    use treelox as lox;

    use lox::ast_printer::AstPrinter;
    use lox::host::BufferHost;
    use lox::parser::Parser;
    use lox::scanner;
    use lox::stmt::Stmt;

    /// Parse a single expression and render it in prefix form.
    fn parse_expr(source: &str) -> String {
        let host = BufferHost::new();
        let (tokens, scan_error) = scanner::scan(source.as_bytes(), &host);

        assert!(!scan_error, "scan failed for {:?}", source);

        let expr = Parser::new(tokens, &host)
            .parse_expression()
            .unwrap_or_else(|e| panic!("parse failed for {:?}: {}", source, e));

        AstPrinter::print(&expr)
    }

    /// Parse a whole program, returning the statements, the error flag and
    /// whatever diagnostics were reported.
    fn parse_program(source: &str) -> (Vec<Stmt>, bool, Vec<String>) {
        let host = BufferHost::new();
        let (tokens, scan_error) = scanner::scan(source.as_bytes(), &host);

        assert!(!scan_error, "scan failed for {:?}", source);

        let (statements, had_error) = Parser::new(tokens, &host).parse();

        (statements, had_error, host.diagnostics())
    }

    #[test]
    fn test_precedence_arithmetic() {
        assert_eq!(parse_expr("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(parse_expr("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
        assert_eq!(parse_expr("10 % 4 - 1"), "(- (% 10.0 4.0) 1.0)");
    }

    #[test]
    fn test_precedence_comparison_and_equality() {
        assert_eq!(parse_expr("1 < 2 == true"), "(== (< 1.0 2.0) true)");
        assert_eq!(parse_expr("!a == b"), "(== (! a) b)");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(parse_expr("1 - 2 - 3"), "(- (- 1.0 2.0) 3.0)");
        assert_eq!(parse_expr("8 / 4 / 2"), "(/ (/ 8.0 4.0) 2.0)");
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(parse_expr("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn test_unary_nesting() {
        assert_eq!(parse_expr("!!true"), "(! (! true))");
        assert_eq!(parse_expr("--1"), "(- (- 1.0))");
    }

    #[test]
    fn test_assignment_right_associative() {
        assert_eq!(parse_expr("a = b = c"), "(= a (= b c))");
    }

    #[test]
    fn test_assignment_lowering() {
        // Property and index targets lower to Set / SetIndex forms.
        assert_eq!(parse_expr("a.b = 1"), "(= (. a b) 1.0)");
        assert_eq!(parse_expr("xs[0] = 1"), "(= (index xs 0.0) 1.0)");
    }

    #[test]
    fn test_call_chain_postfixes() {
        assert_eq!(
            parse_expr("a.b(c)[0]"),
            "(index (call (. a b) c) 0.0)"
        );
        assert_eq!(parse_expr("f()()"), "(call (call f))");
    }

    #[test]
    fn test_list_literal() {
        assert_eq!(parse_expr("[1, 2, 3]"), "(list 1.0 2.0 3.0)");
        assert_eq!(parse_expr("[]"), "(list)");
        assert_eq!(parse_expr("[[1], 2]"), "(list (list 1.0) 2.0)");
    }

    #[test]
    fn test_super_and_this() {
        assert_eq!(parse_expr("super.greet"), "(super greet)");
        assert_eq!(parse_expr("this.x"), "(. this x)");
    }

    #[test]
    fn test_program_statement_shapes() {
        let (statements, had_error, _) =
            parse_program("var a = 1; print a; { a = 2; } if (a) print a; while (a) a = a - 1;");

        assert!(!had_error);
        assert_eq!(statements.len(), 5);

        assert!(matches!(statements[0], Stmt::Var { .. }));
        assert!(matches!(statements[1], Stmt::Print(_)));
        assert!(matches!(statements[2], Stmt::Block(_)));
        assert!(matches!(statements[3], Stmt::If { .. }));
        assert!(matches!(statements[4], Stmt::While { .. }));
    }

    #[test]
    fn test_for_desugars_to_while_in_block() {
        let (statements, had_error, _) = parse_program("for (var i = 0; i < 3; i = i + 1) print i;");

        assert!(!had_error);
        assert_eq!(statements.len(), 1);

        // Block { Var, While { cond, Block { body, increment } } }
        let outer = match &statements[0] {
            Stmt::Block(stmts) => stmts,

            other => panic!("expected Block, got {:?}", other),
        };

        assert!(matches!(outer[0], Stmt::Var { .. }));

        let (_, body) = match &outer[1] {
            Stmt::While { condition, body } => (condition, body),

            other => panic!("expected While, got {:?}", other),
        };

        match body.as_ref() {
            Stmt::Block(inner) => {
                assert_eq!(inner.len(), 2);
                assert!(matches!(inner[0], Stmt::Print(_)));
                assert!(matches!(inner[1], Stmt::Expression(_)));
            }

            other => panic!("expected Block body, got {:?}", other),
        }
    }

    #[test]
    fn test_for_without_clauses() {
        // `for (;;)` gets a literal-true condition and no wrapper block.
        let (statements, had_error, _) = parse_program("for (;;) print 1;");

        assert!(!had_error);
        assert!(matches!(statements[0], Stmt::While { .. }));
    }

    #[test]
    fn test_class_declaration() {
        let (statements, had_error, _) = parse_program(
            "class B < A { init(x) { this.x = x; } greet() { return super.greet(); } }",
        );

        assert!(!had_error);

        match &statements[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "B");
                assert_eq!(superclass.as_ref().unwrap().lexeme, "A");
                assert_eq!(methods.len(), 2);
            }

            other => panic!("expected Class, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_target_is_non_fatal() {
        let (statements, had_error, diagnostics) = parse_program("1 = 2; print 3;");

        assert!(had_error);

        // The parse keeps going: both statements are present.
        assert_eq!(statements.len(), 2);

        assert!(diagnostics
            .iter()
            .any(|d| d.contains("Invalid assignment target.")));
    }

    #[test]
    fn test_synchronize_collects_multiple_errors() {
        let (statements, had_error, diagnostics) = parse_program("var = 1; print 2; var + 3;");

        assert!(had_error);
        assert!(diagnostics.len() >= 2, "diagnostics: {:?}", diagnostics);

        // The healthy middle statement still parses.
        assert!(statements.iter().any(|s| matches!(s, Stmt::Print(_))));
    }

    #[test]
    fn test_missing_paren_message() {
        let (_, had_error, diagnostics) = parse_program("print (1 + 2;");

        assert!(had_error);
        assert!(diagnostics
            .iter()
            .any(|d| d.contains("Expect ')' after expression.")));
    }

    #[test]
    fn test_error_at_end_of_input() {
        let (_, had_error, diagnostics) = parse_program("print 1");

        assert!(had_error);
        assert!(diagnostics.iter().any(|d| d.contains("Error at end")));
    }
}
