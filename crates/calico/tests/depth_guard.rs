//! Tests for the data recursion depth guard.
//!
//! Repr and equality walk composite structures recursively; without a
//! guard, an array nested hundreds of levels deep would overflow the Rust
//! call stack. Repr truncates with `...` at the limit; equality reports an
//! error instead of silently truncating.

use calico::{ErrorKind, Runner};

fn run(source: &str) -> String {
    Runner::new(source, "test.cal").unwrap().run_collect().unwrap()
}

#[test]
fn deeply_nested_array_repr_truncates() {
    let source = "
        a = [42];
        i = 0;
        while i < 200 {
            a = [a];
            i = i + 1;
        }
        print(a);
    ";
    let output = run(source);
    assert!(output.starts_with('{'));
    assert!(output.contains("..."));
}

#[test]
fn self_referential_array_repr_does_not_crash() {
    let source = "
        a = [1];
        a.append(a);
        print(a);
    ";
    let output = run(source);
    assert!(output.starts_with("{1, {1, "));
    assert!(output.contains("..."));
}

#[test]
fn deeply_nested_equality_reports_an_error() {
    let source = "
        a = [42];
        b = [42];
        i = 0;
        while i < 200 {
            a = [a];
            b = [b];
            i = i + 1;
        }
        print(a == b);
    ";
    let err = Runner::new(source, "test.cal").unwrap().run_collect().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Fatal);
    assert!(err.message.contains("nested too deeply"));
}

#[test]
fn shallow_structures_are_unaffected() {
    assert_eq!(run("print([[[1]]] == [[[1]]]);"), "true\n");
    assert_eq!(run("print([[[1]]]);"), "{{{1}}}\n");
}
