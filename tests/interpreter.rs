#[cfg(test)]
mod interpreter_tests {
    use std::rc::Rc;

    use treelox as lox;

    use lox::host::{BufferHost, CancelToken, Host};

    /// Run a program through the full pipeline, capturing exit code, program
    /// output and diagnostics.
    fn run_program(source: &str) -> (i32, Vec<String>, Vec<String>) {
        let host = Rc::new(BufferHost::new());

        let code = lox::run(
            source.as_bytes(),
            Rc::clone(&host) as Rc<dyn Host>,
            CancelToken::new(),
        );

        (code, host.output(), host.diagnostics())
    }

    fn assert_output(source: &str, expected: &[&str]) {
        let (code, output, diagnostics) = run_program(source);

        assert_eq!(code, 0, "diagnostics: {:?}", diagnostics);
        assert_eq!(output, expected, "for program: {}", source);
    }

    fn assert_runtime_error(source: &str, expected_message: &str) {
        let (code, _, diagnostics) = run_program(source);

        assert_eq!(code, 70, "expected runtime error for: {}", source);
        assert!(
            diagnostics.iter().any(|d| d.contains(expected_message)),
            "expected {:?} in {:?}",
            expected_message,
            diagnostics
        );
    }

    fn assert_compile_error(source: &str, expected_message: &str) {
        let (code, _, diagnostics) = run_program(source);

        assert_eq!(code, 65, "expected compile error for: {}", source);
        assert!(
            diagnostics.iter().any(|d| d.contains(expected_message)),
            "expected {:?} in {:?}",
            expected_message,
            diagnostics
        );
    }

    // ── the seed scenarios ──────────────────────────────────────────────

    #[test]
    fn test_scoped_closure_counter() {
        assert_output(
            "fun makeCounter() { var i = 0; fun c() { i = i + 1; return i; } return c; }\n\
             var c = makeCounter(); print c(); print c(); print c();",
            &["1", "2", "3"],
        );
    }

    #[test]
    fn test_inheritance_and_super() {
        assert_output(
            "class A { greet() { return \"hi\"; } }\n\
             class B < A { greet() { return super.greet() + \"!\"; } }\n\
             print B().greet();",
            &["hi!"],
        );
    }

    #[test]
    fn test_variable_in_own_initializer_blocks_execution() {
        assert_compile_error(
            "var a = \"outer\";\n{ var a = a; }",
            "Can't read local variable in its own initializer.",
        );
    }

    #[test]
    fn test_for_loop_desugaring() {
        assert_output("for (var i = 0; i < 3; i = i + 1) print i;", &["0", "1", "2"]);
    }

    #[test]
    fn test_list_mutation_and_indexing() {
        assert_output(
            "var xs = [1,2,3]; xs.append(4); xs[0] = 9; print xs; print xs[-1];",
            &["[9, 2, 3, 4]", "4"],
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_runtime_error("print 1 / 0;", "Division by zero");
    }

    // ── values, truthiness, equality ────────────────────────────────────

    #[test]
    fn test_truthiness() {
        // Zero is truthy; only nil and false are falsy.
        assert_output("if (0) print \"t\"; else print \"f\";", &["t"]);
        assert_output("if (nil) print \"t\"; else print \"f\";", &["f"]);
        assert_output("if (false) print \"t\"; else print \"f\";", &["f"]);
        assert_output("if (\"\") print \"t\"; else print \"f\";", &["t"]);
    }

    #[test]
    fn test_equality_table() {
        assert_output("print 1 == 1; print 1 == 2;", &["true", "false"]);
        assert_output("print \"a\" == \"a\"; print \"a\" == \"b\";", &["true", "false"]);
        assert_output("print nil == nil; print nil == false;", &["true", "false"]);
        assert_output("print 1 == \"1\";", &["false"]);
        assert_output("print true != false;", &["true"]);
    }

    #[test]
    fn test_instance_identity_equality() {
        assert_output(
            "class A {} var a = A(); var b = a; print a == b; print a == A();",
            &["true", "false"],
        );
    }

    #[test]
    fn test_function_equality() {
        assert_output("fun f() {} var a = f; print a == f;", &["true"]);
    }

    #[test]
    fn test_number_formatting() {
        assert_output("print 3.0; print 2.5; print 100;", &["3", "2.5", "100"]);
    }

    // ── operators ───────────────────────────────────────────────────────

    #[test]
    fn test_string_concatenation_stringifies() {
        assert_output("print \"n=\" + 3;", &["n=3"]);
        assert_output("print 3 + \"!\";", &["3!"]);
        assert_output("print \"a\" + \"b\";", &["ab"]);
    }

    #[test]
    fn test_list_concatenation_with_plus() {
        assert_output(
            "var a = [1]; var b = [2]; print a + b; print a; print b;",
            &["[1, 2]", "[1]", "[2]"],
        );
    }

    #[test]
    fn test_modulo() {
        assert_output("print 10 % 3; print 9 % 3;", &["1", "0"]);
        assert_runtime_error("print 10 % 0;", "Division by zero");
    }

    #[test]
    fn test_arithmetic_type_errors() {
        assert_runtime_error("print 1 - \"a\";", "Operands must be numbers.");
        assert_runtime_error("print -\"a\";", "Operand must be a number.");
        assert_runtime_error("print 1 < \"a\";", "Operands must be numbers.");
        assert_runtime_error("print true + false;", "Operands must be two numbers or two strings.");
    }

    #[test]
    fn test_logical_short_circuit() {
        assert_output(
            "fun t() { print \"t\"; return true; }\n\
             fun f() { print \"f\"; return false; }\n\
             t() or f(); f() and t();",
            &["t", "f"],
        );

        assert_output("print 1 or 2; print nil or 2; print 1 and 2;", &["1", "2", "2"]);
    }

    #[test]
    fn test_chained_assignment() {
        assert_output(
            "var a = 1; var b = 2; var c = 3; print a = b = c; print a; print b;",
            &["3", "3", "3"],
        );
    }

    // ── scoping and closures ────────────────────────────────────────────

    #[test]
    fn test_static_resolution_ignores_later_shadows() {
        // The closure binds the global `a` at resolve time; the block-local
        // declaration afterwards must not change what it sees.
        assert_output(
            "var a = \"global\";\n\
             {\n\
               fun show() { print a; }\n\
               show();\n\
               var a = \"block\";\n\
               show();\n\
             }",
            &["global", "global"],
        );
    }

    #[test]
    fn test_closures_share_captured_environment() {
        assert_output(
            "fun make() {\n\
               var i = 0;\n\
               fun inc() { i = i + 1; return i; }\n\
               fun get() { return i; }\n\
               return [inc, get];\n\
             }\n\
             var fns = make(); fns[0](); fns[0](); print fns[1]();",
            &["2"],
        );
    }

    #[test]
    fn test_block_scope_restored_after_exit() {
        assert_output(
            "var x = \"outer\"; { var x = \"inner\"; print x; } print x;",
            &["inner", "outer"],
        );
    }

    #[test]
    fn test_recursion() {
        assert_output(
            "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);",
            &["55"],
        );
    }

    // ── functions and calls ─────────────────────────────────────────────

    #[test]
    fn test_arity_mismatch_caught_before_body() {
        let (code, output, diagnostics) =
            run_program("fun f(a) { print \"ran\"; } f(1, 2);");

        assert_eq!(code, 70);
        assert!(output.is_empty(), "body must not run: {:?}", output);
        assert!(diagnostics
            .iter()
            .any(|d| d.contains("Expected 1 arguments but got 2.")));
    }

    #[test]
    fn test_calling_non_callable() {
        assert_runtime_error("var x = 1; x();", "Can only call functions and classes.");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_output("fun f() {} print f();", &["nil"]);
    }

    #[test]
    fn test_return_unwinds_nested_blocks() {
        assert_output(
            "fun f() { { { return 42; } } } print f();",
            &["42"],
        );
    }

    // ── classes ─────────────────────────────────────────────────────────

    #[test]
    fn test_initializer_always_returns_instance() {
        assert_output(
            "class A { init() { this.x = 1; return; } }\n\
             var a = A();\n\
             print a.x;",
            &["1"],
        );
    }

    #[test]
    fn test_init_with_arguments() {
        assert_output(
            "class Point { init(x, y) { this.x = x; this.y = y; } }\n\
             var p = Point(3, 4);\n\
             print p.x + p.y;",
            &["7"],
        );
    }

    #[test]
    fn test_bound_method_keeps_this() {
        assert_output(
            "class C { init() { this.n = 5; } get() { return this.n; } }\n\
             var m = C().get;\n\
             print m();",
            &["5"],
        );
    }

    #[test]
    fn test_fields_shadow_methods() {
        assert_output(
            "class C { f() { return \"method\"; } }\n\
             var c = C();\n\
             c.f = 1;\n\
             print c.f;",
            &["1"],
        );
    }

    #[test]
    fn test_method_inherited_without_override() {
        assert_output(
            "class A { greet() { return \"hi\"; } } class B < A {} print B().greet();",
            &["hi"],
        );
    }

    #[test]
    fn test_superclass_must_be_class() {
        assert_runtime_error(
            "var NotAClass = 1; class B < NotAClass {}",
            "Superclass must be a class.",
        );
    }

    #[test]
    fn test_undefined_property() {
        assert_runtime_error("class A {} print A().missing;", "Undefined property 'missing'.");
    }

    #[test]
    fn test_set_on_non_instance() {
        assert_runtime_error("var x = 1; x.y = 2;", "Only instances have fields.");
    }

    #[test]
    fn test_class_prints_its_name() {
        assert_output("class A {} print A; print A();", &["A", "A instance"]);
    }

    // ── lists and indexing ──────────────────────────────────────────────

    #[test]
    fn test_list_methods() {
        assert_output(
            "var xs = [1, 2];\n\
             xs.extend([3, 4]);\n\
             print xs;\n\
             print xs.pop();\n\
             xs.remove(0);\n\
             print xs;\n\
             xs.insert(1, 9);\n\
             print xs;\n\
             print xs.concat([0]);\n\
             print xs;",
            &["[1, 2, 3, 4]", "4", "[2, 3]", "[2, 9, 3]", "[2, 9, 3, 0]", "[2, 9, 3]"],
        );
    }

    #[test]
    fn test_list_display_quotes_strings() {
        assert_output("print [\"a\", 1, nil];", &["[\"a\", 1, nil]"]);
    }

    #[test]
    fn test_nested_lists_share_by_reference() {
        assert_output(
            "var inner = [1]; var outer = [inner]; inner.append(2); print outer;",
            &["[[1, 2]]"],
        );
    }

    #[test]
    fn test_index_out_of_bounds() {
        assert_runtime_error("var xs = [1]; print xs[5];", "Index out of bounds.");
        assert_runtime_error("var xs = [1]; print xs[-2];", "Index out of bounds.");
    }

    #[test]
    fn test_negative_index_assignment() {
        assert_output("var xs = [1, 2]; xs[-1] = 5; print xs;", &["[1, 5]"]);
    }

    #[test]
    fn test_index_must_be_number() {
        assert_runtime_error("var xs = [1]; print xs[\"0\"];", "Index must be a number.");
    }

    #[test]
    fn test_index_assignment_only_on_lists() {
        assert_runtime_error("\"abc\"[0] = \"x\";", "Only lists support index assignment.");
    }

    #[test]
    fn test_string_indexing() {
        assert_output(
            "print \"hello\"[1]; print \"hello\"[-1];",
            &["e", "o"],
        );

        assert_runtime_error("print \"abc\"[3];", "Index out of bounds.");
    }

    // ── natives ─────────────────────────────────────────────────────────

    #[test]
    fn test_clock_returns_milliseconds() {
        // Anything after 2020 in milliseconds is a 13-digit number.
        assert_output("print clock() > 1500000000000;", &["true"]);
    }

    #[test]
    fn test_sleep_returns_nil() {
        assert_output("print sleep(1);", &["nil"]);
    }

    #[test]
    fn test_len() {
        assert_output("print len([1, 2, 3]); print len([]);", &["3", "0"]);
        assert_runtime_error("print len(1);", "len() can only be called on iterables.");
    }

    #[test]
    fn test_parse_number() {
        assert_output("print parseNumber(\"42\") + 1;", &["43"]);
        assert_runtime_error(
            "print parseNumber(\"abc\");",
            "Could not parse 'abc' as a number.",
        );
    }

    #[test]
    fn test_floor_and_ord() {
        assert_output("print floor(3.7); print floor(-1.5);", &["3", "-2"]);
        assert_output("print ord(\"A\"); print ord(\"a\");", &["65", "97"]);
    }

    #[test]
    fn test_rand_int_in_range() {
        assert_output(
            "var r = randInt(10); print r >= 0 and r < 10; print r == floor(r);",
            &["true", "true"],
        );
    }

    #[test]
    fn test_input_native() {
        let host = Rc::new(BufferHost::new());

        host.queue_input("Alice");

        let code = lox::run(
            b"var name = input(\"> \"); print \"hi \" + name;",
            Rc::clone(&host) as Rc<dyn Host>,
            CancelToken::new(),
        );

        assert_eq!(code, 0);
        assert_eq!(host.output(), vec!["hi Alice"]);
    }

    #[test]
    fn test_print_call_syntax_matches_statement() {
        // `print` is a keyword, so `print(42)` routes through the print
        // statement with a grouped operand; output is identical either way.
        assert_output("print(42); print 42;", &["42", "42"]);
    }

    // ── pipeline behaviour ──────────────────────────────────────────────

    #[test]
    fn test_undefined_variable() {
        assert_runtime_error("print q;", "Undefined variable 'q'.");
        assert_runtime_error("q = 1;", "Undefined variable 'q'.");
    }

    #[test]
    fn test_runtime_error_reports_position() {
        let (_, _, diagnostics) = run_program("print 1 / 0;");

        assert!(
            diagnostics.iter().any(|d| d.contains("[line 1:")),
            "diagnostics: {:?}",
            diagnostics
        );
    }

    #[test]
    fn test_parse_error_exit_code() {
        assert_compile_error("print (1;", "Expect ')' after expression.");
    }

    #[test]
    fn test_scan_error_exit_code() {
        let (code, _, diagnostics) = run_program("var a = @;");

        assert_eq!(code, 65);
        assert!(diagnostics
            .iter()
            .any(|d| d.contains("Unexpected character")));
    }

    #[test]
    fn test_compile_errors_accumulate() {
        let (code, _, diagnostics) = run_program("print (1; print );");

        assert_eq!(code, 65);
        assert!(diagnostics.len() >= 2, "diagnostics: {:?}", diagnostics);
    }

    #[test]
    fn test_runtime_error_aborts_remaining_statements() {
        let (code, output, _) = run_program("print 1; print 1 / 0; print 2;");

        assert_eq!(code, 70);
        assert_eq!(output, vec!["1"]);
    }

    #[test]
    fn test_cancellation_before_run_is_clean() {
        let host = Rc::new(BufferHost::new());
        let cancel = CancelToken::new();

        cancel.cancel();

        let code = lox::run(
            b"while (true) { print 1; }",
            Rc::clone(&host) as Rc<dyn Host>,
            cancel,
        );

        assert_eq!(code, 0);
        assert!(host.output().is_empty());
        assert!(host.diagnostics().is_empty());
    }

    #[test]
    fn test_evaluate_mode() {
        let host = Rc::new(BufferHost::new());

        let code = lox::evaluate(b"(1 + 2) * 3", Rc::clone(&host) as Rc<dyn Host>);

        assert_eq!(code, 0);
        assert_eq!(host.output(), vec!["9"]);
    }

    #[test]
    fn test_tokenize_mode() {
        let host = Rc::new(BufferHost::new());

        let code = lox::tokenize(b"var x = 1;", Rc::clone(&host) as Rc<dyn Host>);

        assert_eq!(code, 0);
        assert_eq!(
            host.output(),
            vec![
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 1 1.0",
                "SEMICOLON ; null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_parse_mode() {
        let host = Rc::new(BufferHost::new());

        let code = lox::parse(b"1 + 2 * 3", Rc::clone(&host) as Rc<dyn Host>);

        assert_eq!(code, 0);
        assert_eq!(host.output(), vec!["(+ 1.0 (* 2.0 3.0))"]);
    }
}
