use calico::{ErrorKind, Runner};

fn run_err(source: &str) -> calico::Diagnostic {
    match Runner::new(source, "test.cal") {
        Ok(runner) => runner.run_collect().unwrap_err(),
        Err(diagnostic) => diagnostic,
    }
}

#[test]
fn lex_error_reports_position() {
    let err = run_err("a = `;");
    assert_eq!(err.kind, ErrorKind::Lex);
    assert_eq!((err.line, err.column), (1, 5));
}

#[test]
fn unterminated_string_is_a_lex_error() {
    let err = run_err("s = \"oops;");
    assert_eq!(err.kind, ErrorKind::Lex);
}

#[test]
fn parse_error_names_the_unexpected_token() {
    let err = run_err("if { print(1); }");
    assert_eq!(err.kind, ErrorKind::Parse);
}

#[test]
fn missing_semicolon_is_a_parse_error() {
    let err = run_err("a = 1");
    assert_eq!(err.kind, ErrorKind::Parse);
    assert!(err.message.contains("';'"));
}

#[test]
fn undefined_variable_is_a_name_error() {
    let err = run_err("print(x);");
    assert_eq!(err.kind, ErrorKind::Name);
    assert!(err.message.contains("'x'"));
    assert_eq!((err.line, err.column), (1, 7));
}

#[test]
fn unsupported_operator_is_a_type_error() {
    let err = run_err("a = [1] + [2];");
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.contains("Array"));
}

#[test]
fn type_error_points_at_the_offending_operand() {
    // The right operand is the invalid one; the diagnostic must carry its
    // sub-area, not the whole expression's.
    let err = run_err("a = 1 + \"x\";");
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!((err.line, err.column), (1, 9));
    assert!(err.message.contains("expected Integer but got String"));
}

#[test]
fn out_of_bounds_index_is_a_range_error() {
    let err = run_err("a = [1, 2]; a[2];");
    assert_eq!(err.kind, ErrorKind::Range);
    // The index operand's sub-area.
    assert_eq!((err.line, err.column), (1, 15));

    let err = run_err("a = [1, 2]; b = a[0 - 1];");
    assert_eq!(err.kind, ErrorKind::Range);
}

#[test]
fn negative_resize_is_a_range_error() {
    let err = run_err("a = [1]; a.resize(0 - 1);");
    assert_eq!(err.kind, ErrorKind::Range);
    // Size zero is accepted.
    let ok = Runner::new("a = [1]; a.resize(0); print(a.empty());", "test.cal")
        .unwrap()
        .run_collect()
        .unwrap();
    assert_eq!(ok, "true\n");
}

#[test]
fn division_by_zero_is_an_arithmetic_error() {
    let err = run_err("print(1 / 0);");
    assert_eq!(err.kind, ErrorKind::Arithmetic);
    let err = run_err("print(1 % 0);");
    assert_eq!(err.kind, ErrorKind::Arithmetic);
}

#[test]
fn string_bool_coercion_rejects_other_content() {
    assert_eq!(
        Runner::new("print(bool(\"true\"), bool(\"false\"));", "test.cal")
            .unwrap()
            .run_collect()
            .unwrap(),
        "true false\n"
    );
    let err = run_err("bool(\"maybe\");");
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn coercion_without_magic_method_is_a_type_error() {
    let err = run_err("int([1]);");
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.contains("cannot convert"));
}

#[test]
fn condition_without_bool_magic_is_a_type_error() {
    let err = run_err("if [1] { print(1); }");
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn unknown_field_is_a_name_error() {
    let err = run_err("record Pt { x; } p = make(Pt); p.z = 1;");
    assert_eq!(err.kind, ErrorKind::Name);
    assert!(err.message.contains("'z'"));

    let err = run_err("record Pt { x; } p = make(Pt); print(p.z);");
    assert_eq!(err.kind, ErrorKind::Name);
}

#[test]
fn make_requires_a_type_value() {
    let err = run_err("make(1);");
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.contains("expected a type"));
}

#[test]
fn unknown_module_is_a_module_error() {
    let err = run_err("load(\"nonsense\");");
    assert_eq!(err.kind, ErrorKind::Module);
    assert!(err.message.contains("nonsense"));
}

#[test]
fn control_flow_outside_loops_is_rejected() {
    assert_eq!(run_err("break;").kind, ErrorKind::Type);
    assert_eq!(run_err("continue;").kind, ErrorKind::Type);
    assert_eq!(run_err("return 1;").kind, ErrorKind::Type);
}

#[test]
fn function_without_result_where_one_is_needed() {
    let err = run_err("function f() { ; } print(f());");
    assert_eq!(err.kind, ErrorKind::Type);
    assert!(err.message.contains("did not produce a value"));
}

#[test]
fn recursion_within_the_limit_succeeds() {
    let source = "
        function sum(n) {
            if n == 0 { return 0; }
            return n + sum(n - 1);
        }
        print(sum(100));
    ";
    assert_eq!(
        Runner::new(source, "test.cal").unwrap().run_collect().unwrap(),
        "5050\n"
    );
}

#[test]
fn runaway_recursion_is_a_fatal_error() {
    // The call-depth guard burns native stack before it trips; give the
    // interpreter room so the guard, not the OS, stops the recursion.
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| run_err("function f() { return f(); } f();"))
        .unwrap();
    let err = handle.join().unwrap();
    assert_eq!(err.kind, ErrorKind::Fatal);
    assert!(err.message.contains("call depth"));
}

#[test]
fn diagnostics_render_with_location_prefix() {
    let err = run_err("print(x);");
    assert_eq!(err.to_string(), "test.cal:1:7: name error: variable 'x' is not defined");
}

#[test]
fn file_errors_are_observable_not_fatal() {
    let source = "
        io = load(\"io\");
        f = io.open(\"/definitely/not/a/real/path\", \"r\");
        print(f.error());
        f.close();
    ";
    assert_eq!(
        Runner::new(source, "test.cal").unwrap().run_collect().unwrap(),
        "true\n"
    );
}
