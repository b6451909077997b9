#[cfg(test)]
mod resolver_tests {
    use std::rc::Rc;

    use treelox as lox;

    use lox::host::{BufferHost, CancelToken, Host};
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner;

    /// Run the front end through the resolve pass, returning the error flag
    /// and the diagnostics that were reported.
    fn resolve_source(source: &str) -> (bool, Vec<String>) {
        let host = Rc::new(BufferHost::new());
        let (tokens, scan_error) = scanner::scan(source.as_bytes(), host.as_ref());

        assert!(!scan_error, "scan failed for {:?}", source);

        let (statements, parse_error) = Parser::new(tokens, host.as_ref()).parse();

        assert!(!parse_error, "parse failed for {:?}", source);

        let mut interpreter =
            Interpreter::new(Rc::clone(&host) as Rc<dyn Host>, CancelToken::new());

        let had_error = Resolver::new(&mut interpreter, host.as_ref()).resolve(&statements);

        (had_error, host.diagnostics())
    }

    fn assert_resolve_error(source: &str, expected_message: &str) {
        let (had_error, diagnostics) = resolve_source(source);

        assert!(had_error, "expected an error for {:?}", source);
        assert!(
            diagnostics.iter().any(|d| d.contains(expected_message)),
            "expected {:?} in {:?}",
            expected_message,
            diagnostics
        );
    }

    fn assert_resolves_cleanly(source: &str) {
        let (had_error, diagnostics) = resolve_source(source);

        assert!(
            !had_error,
            "unexpected diagnostics for {:?}: {:?}",
            source, diagnostics
        );
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_resolve_error(
            "var a = \"outer\"; { var a = a; }",
            "Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_shadowing_outer_variable_is_fine() {
        assert_resolves_cleanly("var a = 1; { var b = a; }");
    }

    #[test]
    fn test_duplicate_declaration_in_local_scope() {
        assert_resolve_error(
            "{ var a = 1; var a = 2; }",
            "Already a variable with this name in this scope.",
        );
    }

    #[test]
    fn test_duplicate_declaration_in_globals_is_allowed() {
        assert_resolves_cleanly("var a = 1; var a = 2;");
    }

    #[test]
    fn test_duplicate_parameter_names() {
        assert_resolve_error(
            "fun f(x, x) { return x; }",
            "Already a variable with this name in this scope.",
        );
    }

    #[test]
    fn test_return_outside_function() {
        assert_resolve_error("return 1;", "Can't return from top-level code.");
    }

    #[test]
    fn test_return_value_in_initializer() {
        assert_resolve_error(
            "class A { init() { return 1; } }",
            "Can't return a value from an initializer.",
        );
    }

    #[test]
    fn test_bare_return_in_initializer_is_allowed() {
        assert_resolves_cleanly("class A { init() { return; } }");
    }

    #[test]
    fn test_this_outside_class() {
        assert_resolve_error("print this;", "Can't use 'this' outside of a class.");
        assert_resolve_error(
            "fun f() { return this; }",
            "Can't use 'this' outside of a class.",
        );
    }

    #[test]
    fn test_this_inside_method_is_allowed() {
        assert_resolves_cleanly("class A { who() { return this; } }");
    }

    #[test]
    fn test_super_outside_class() {
        assert_resolve_error(
            "print super.x;",
            "Can't use 'super' outside of a class.",
        );
    }

    #[test]
    fn test_super_without_superclass() {
        assert_resolve_error(
            "class A { f() { return super.f(); } }",
            "Can't use 'super' in a class with no superclass.",
        );
    }

    #[test]
    fn test_super_with_superclass_is_allowed() {
        assert_resolves_cleanly(
            "class A { f() { return 1; } } class B < A { f() { return super.f(); } }",
        );
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_resolve_error("class A < A {}", "A class can't inherit from itself.");
    }

    #[test]
    fn test_errors_accumulate_across_statements() {
        let (had_error, diagnostics) = resolve_source("return 1; print this;");

        assert!(had_error);
        assert!(diagnostics.len() >= 2, "diagnostics: {:?}", diagnostics);
    }

    #[test]
    fn test_function_self_reference_is_allowed() {
        assert_resolves_cleanly("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }");
    }

    #[test]
    fn test_closure_capture_resolves() {
        assert_resolves_cleanly(
            "fun outer() { var x = 1; fun inner() { return x; } return inner; }",
        );
    }
}
