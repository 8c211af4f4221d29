//! Grammar coverage for the winnow parser.
//!
//! These tests check that the parser accepts the Go subset model files are
//! written in and rejects malformed input with located diagnostics.

use crate::{
    error::{Diagnostic, ErrorCode},
    lexer, parser,
    parser_types::{Decl, Expr, Stmt},
};

/// Helper function to parse a source string and return success/failure
fn parse_source(source: &str) -> Result<(), String> {
    let tokens = lexer::tokenize(source).map_err(|err| format!("Lexer error: {}", err))?;
    parser::build_source_file(&tokens).map_err(|err| format!("Parser error: {}", err))?;
    Ok(())
}

/// Helper function to parse a source string and assert success
fn assert_parses_successfully(source: &str) {
    if let Err(e) = parse_source(source) {
        panic!("Expected parsing to succeed, but got error: {}", e);
    }
}

/// Helper function to parse a source string and return the diagnostic
fn parse_error(source: &str) -> Diagnostic {
    let tokens = lexer::tokenize(source).expect("Lexer should succeed");
    match parser::build_source_file(&tokens) {
        Ok(_) => panic!("Expected parsing to fail, but it succeeded"),
        Err(diag) => diag,
    }
}

/// Wrap statements in a minimal model file
fn model(body: &str) -> String {
    format!("package model\n\nvar _ = Design(func() {{\n{body}\n}})\n")
}

#[test]
fn test_package_only() {
    assert_parses_successfully("package model");
    assert_parses_successfully("package model;");
    assert_parses_successfully("// Package model holds the design.\npackage model\n");
}

#[test]
fn test_imports() {
    assert_parses_successfully("package model\nimport \"fmt\"\n");
    assert_parses_successfully("package model\nimport . \"goa.design/model/dsl\"\n");
    assert_parses_successfully("package model\nimport _ \"embed\"\n");
    assert_parses_successfully("package model\nimport m \"goa.design/model/dsl\"\n");
    assert_parses_successfully(
        "package model\n\nimport (\n\t. \"goa.design/model/dsl\"\n\t\"fmt\"\n)\n",
    );
    assert_parses_successfully("package model\nimport ()\n");
}

#[test]
fn test_import_after_declaration_fails() {
    let diag = parse_error("package model\nvar _ = Design()\nimport \"fmt\"\n");
    assert!(diag.message().contains("imports before declarations"));
}

#[test]
fn test_top_level_declarations() {
    assert_parses_successfully("package model\nvar _ = Design()\n");
    assert_parses_successfully("package model\nvar _ = Design(\"name\", \"desc\", func() {})\n");
    assert_parses_successfully("package model\nvar A = 1\nvar B = \"b\"\n");
    assert_parses_successfully("package model\nvar _ = Design(); var _ = Design()\n");
}

#[test]
fn test_nested_elements() {
    assert_parses_successfully(&model(
        r#"	SoftwareSystem("Bank", "desc", func() {
		Container("API", "Serves requests", "Go", func() {
			Component("Accounts", func() {
				Tag("core")
			})
		})
	})"#,
    ));
}

#[test]
fn test_statement_forms() {
    assert_parses_successfully(&model(
        r#"	var Customer = Person("Customer")
	Bank := SoftwareSystem("Bank")
	Bank = SoftwareSystem("Bank 2")
	Customer.Uses(Bank, "Uses")"#,
    ));
}

#[test]
fn test_expressions() {
    assert_parses_successfully(&model(
        r#"	Uses("A", "B", "C", dsl.Synchronous)
	AutoLayout(RankTopBottom, -1, 3.5)
	Prop("raw", `multi
line`)
	Tag(("paren"))
	Call()()"#,
    ));
}

#[test]
fn test_trailing_commas_and_line_breaks_in_arguments() {
    assert_parses_successfully(&model(
        "\tUses(\n\t\t\"A\",\n\t\t\"desc\",\n\t)\n\tTag(\"x\" /* note */, \"y\")",
    ));
}

#[test]
fn test_comments_everywhere() {
    assert_parses_successfully(
        "// file\npackage model // trailing\n\n/* block */\nvar _ = Design(func() { // open\n\t// inside\n\tTag(\"x\") /* after */\n}) // end\n",
    );
}

#[test]
fn test_semicolon_separated_statements() {
    assert_parses_successfully(&model("\tTag(\"a\"); Tag(\"b\");"));
    assert_parses_successfully(&model(";;"));
}

#[test]
fn test_statements_need_separator() {
    let diag = parse_error(&model("\tTag(\"a\") Tag(\"b\")"));
    assert_eq!(diag.code(), Some(ErrorCode::E100));
    assert!(diag.message().contains("newline or `;` between statements"));
}

#[test]
fn test_newline_before_call_ends_expression() {
    // `Tag` then `("x")` on the next line are two statements.
    assert_parses_successfully(&model("\tTag\n\t(\"x\")"));

    let tokens = lexer::tokenize("Tag\n(\"x\")").expect("Lexer should succeed");
    let diag = parser::build_snippet(&tokens).unwrap_err();
    assert_eq!(diag.code(), Some(ErrorCode::E200));
}

#[test]
fn test_missing_package_fails() {
    let diag = parse_error("var _ = Design()\n");
    assert_eq!(diag.code(), Some(ErrorCode::E100));
    assert!(diag.message().contains("expected `package` clause"));
}

#[test]
fn test_unclosed_block_fails() {
    let diag = parse_error("package model\nvar _ = Design(func() {\n\tTag(\"x\")\n");
    assert_eq!(diag.code(), Some(ErrorCode::E100));
}

#[test]
fn test_unclosed_call_fails() {
    let source = model("\tSoftwareSystem(\"A\", func() {}");
    let diag = parse_error(&source);
    assert_eq!(diag.code(), Some(ErrorCode::E100));
    let span = diag.primary_span().expect("diagnostic has a span");
    assert!(span.end() <= source.len());
}

#[test]
fn test_func_literals_with_signatures() {
    assert_parses_successfully(&model("\tRun(func(x int) {})"));
    assert_parses_successfully(&model("\tRun(func() string { return \"x\" })"));
    assert_parses_successfully(&model("\tRun(func(a, b int) (string, error) {\n\t\treturn \"\", nil\n\t})"));
    assert_parses_successfully(&model("\tfunc(i int) {\n\t\tTag(\"x\")\n\t}(1)"));
}

#[test]
fn test_go_expressions() {
    assert_parses_successfully(&model(
        r#"	Tag(fmt.Sprintf("Shape %d", i+1))
	Tag(names[i*2], !ok, a && b || c)
	Tag(string(b), v.(string), &Style{Color: "red"})
	Tag(parts...)
	Prop("x", 'a')"#,
    ));
}

#[test]
fn test_typed_var_group_inside_design() {
    assert_parses_successfully(&model(
        r#"	var (
		Database *expr.Container
		API      *expr.Container
	)
	var count int = 3
	Database = Container("Database")
	API = Container("API")
	API.Uses(Database, "Reads from")"#,
    ));
}

#[test]
fn test_control_flow_statements() {
    assert_parses_successfully(&model(
        r#"	for i, sh := range shapes {
		func(i int) {
			Tag(fmt.Sprintf("Shape %d", i+1))
		}(i)
	}
	for i := 0; i < 3; i++ {
		Tag("x")
	}
	if len(shapes) > 0 {
		Tag("y")
	} else {
		Tag("z")
	}
	total += 1
	n++"#,
    ));
}

#[test]
fn test_top_level_go_declarations() {
    assert_parses_successfully(
        r#"package model

import (
	"goa.design/model/expr"
	mdl "goa.design/model/mdl"
)

const prefix = "Shape"

type ShapeKind = expr.ShapeKind

var shapes = []ShapeKind{ShapeBox, ShapeCircle}

var (
	styles map[string]int
)

var _ = Design(func() {
	for _, sh := range shapes {
		SoftwareSystem(shapeName(sh))
	}
})

func shapeName(sh ShapeKind) string {
	b, _ := mdl.ShapeKind(sh).MarshalJSON()
	return string(b)
}
"#,
    );
}

#[test]
fn test_unbalanced_opaque_statement_fails() {
    let diag = parse_error(&model("\tfor i := range (shapes {\n\t}"));
    assert_eq!(diag.code(), Some(ErrorCode::E100));
}

#[test]
fn test_stray_closer_still_fails() {
    let diag = parse_error(&model("\tPerson(\"Customer\"))"));
    assert_eq!(diag.code(), Some(ErrorCode::E100));
}

#[test]
fn test_error_span_points_at_offending_token() {
    let source = model("\tSoftwareSystem(\"A\",, \"B\")");
    let diag = parse_error(&source);
    let span = diag.primary_span().expect("diagnostic has a span");
    assert_eq!(&source[span.range()], ",");
}

#[test]
fn test_empty_input_fails_with_span() {
    let diag = parse_error("");
    assert_eq!(diag.primary_span().map(|s| s.range()), Some(0..0));
}

#[test]
fn test_ast_shape() {
    let source = "package model\nvar Bank = SoftwareSystem(\"Bank\", func() {\n\tUses(Other, \"x\")\n})\n";
    let tokens = lexer::tokenize(source).expect("Lexer should succeed");
    let file = parser::build_source_file(&tokens).expect("Parser should succeed");

    assert_eq!(file.decls.len(), 1);
    let Decl::Var(decl) = &file.decls[0] else {
        panic!("expected a var declaration");
    };
    let Expr::Call(call) = &decl.value else {
        panic!("expected a call");
    };
    assert_eq!(call.callee.name(), Some("SoftwareSystem"));
    assert_eq!(call.args.len(), 2);

    let Expr::FuncLit(func) = &call.args[1] else {
        panic!("expected a function literal");
    };
    assert_eq!(&source[func.body.span.range()], "{\n\tUses(Other, \"x\")\n}");
    assert_eq!(func.body.stmts.len(), 1);
    assert!(matches!(&func.body.stmts[0], Stmt::Expr(Expr::Call(_))));
}

#[test]
fn test_opaque_shapes() {
    let source = "package model\nvar _ = Design(func() {\n\tfor _, s := range all {\n\t\tTag(s)\n\t}\n\tn, m := 1, 2\n})\nfunc f() {}\n";
    let tokens = lexer::tokenize(source).expect("Lexer should succeed");
    let file = parser::build_source_file(&tokens).expect("Parser should succeed");

    assert_eq!(file.decls.len(), 2);
    let Decl::Opaque(func) = &file.decls[1] else {
        panic!("expected an opaque declaration");
    };
    assert_eq!(&source[func.span.range()], "func f() {}");

    let Decl::Var(design) = &file.decls[0] else {
        panic!("expected a var declaration");
    };
    let Expr::Call(call) = &design.value else {
        panic!("expected a call");
    };
    let Expr::FuncLit(body) = &call.args[0] else {
        panic!("expected a function literal");
    };
    let Stmt::Opaque(for_loop) = &body.body.stmts[0] else {
        panic!("expected an opaque statement");
    };
    assert_eq!(
        &source[for_loop.span.range()],
        "for _, s := range all {\n\t\tTag(s)\n\t}"
    );
    assert_eq!(for_loop.blocks.len(), 1);
    assert!(matches!(&for_loop.blocks[0].stmts[0], Stmt::Expr(Expr::Call(_))));
    assert!(matches!(&body.body.stmts[1], Stmt::Other { exprs, .. } if exprs.len() == 4));
}
