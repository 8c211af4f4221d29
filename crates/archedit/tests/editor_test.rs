//! Integration tests for the Editor API
//!
//! Every test works on a temporary package directory and checks both the
//! returned content and the file left on disk.

use std::{fs, path::Path};

use archedit::{
    EditError, Editor, ParseOrigin,
    config::EditorConfig,
    kind::{ElementKind, IdKind, StyleKind, ViewKind},
    snippet::{ContainerSnippet, Declaration},
};
use archedit_parser::parse;

const MODEL: &str = r#"package model

import . "goa.design/model/dsl"

var _ = Design("Bank", "Banking architecture", func() {
	var Mainframe = SoftwareSystem("Mainframe", "Legacy core")

	Person("Customer", func() {
		Uses("Internet Banking", "Banks with")
	})

	SoftwareSystem("Internet Banking", func() {
		Uses(Mainframe, "Reads accounts")
		Uses("Email", "Sends mail")
		Container("API", "JSON API", "Rust", func() {
			Uses("Database", "Reads from")
			Component("Accounts")
		})
		Container("Database")
	})

	SoftwareSystem("Email")

	SoftwareSystem("ExistingSystem")

	Views(func() {
		SystemContextView("Internet Banking", "context", func() {
			AddAll()
		})
	})
})
"#;

fn package(files: &[(&str, &str)]) -> (tempfile::TempDir, Editor) {
    package_with(EditorConfig::default(), files)
}

fn package_with(config: EditorConfig, files: &[(&str, &str)]) -> (tempfile::TempDir, Editor) {
    let repo = tempfile::tempdir().expect("Failed to create repository");
    let dir = repo.path().join("design");
    fs::create_dir_all(&dir).expect("Failed to create package");
    for (name, content) in files {
        fs::write(dir.join(name), content).expect("Failed to write model file");
    }
    let editor = Editor::new(config, repo.path(), "design");
    (repo, editor)
}

fn on_disk(repo: &tempfile::TempDir, filename: &str) -> String {
    fs::read_to_string(repo.path().join("design").join(filename)).expect("Failed to read file")
}

fn assert_well_formed(content: &str) {
    let tree = parse(content).expect("Edited content should parse");
    assert!(tree.check_spans().is_ok(), "Spans should nest:\n{content}");
}

#[test]
fn test_fixture_is_canonical() {
    assert_eq!(archedit::format(MODEL).unwrap(), MODEL);
}

#[test]
fn test_replace_element_without_body() {
    let (repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::SoftwareSystem,
            "ExistingSystem",
            r#"SoftwareSystem("ExistingSystem", func(){ Tag("EditedSystem") })"#,
        )
        .expect("Failed to replace system");

    let expected = MODEL.replace(
        "\tSoftwareSystem(\"ExistingSystem\")\n",
        "\tSoftwareSystem(\"ExistingSystem\", func() {\n\t\tTag(\"EditedSystem\")\n\t})\n",
    );
    assert_eq!(result.content, expected);
    assert_eq!(on_disk(&repo, "model.go"), expected);
    assert_eq!(result.locator.filename, "model.go");
    assert_eq!(result.locator.path(), repo.path().join("design/model.go"));
}

#[test]
fn test_replace_preserves_direct_relationships() {
    let source = r#"package model

var _ = Design(func() {
	SoftwareSystem("AnotherSystem")
	SoftwareSystem("YetAnotherSystem")
	SoftwareSystem("ExistingSystem", func() {
		Tag("Original")
		Uses("AnotherSystem", "Calls")
		Container("Worker", func() {
			Uses("YetAnotherSystem", "Polls")
		})
		Uses("YetAnotherSystem", "Notifies", "HTTPS")
	})
})
"#;
    let (_repo, editor) = package(&[("model.go", source)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::SoftwareSystem,
            "ExistingSystem",
            "SoftwareSystem(\"ExistingSystem\", \"Updated\", func() {\n\tTag(\"Edited\")\n})",
        )
        .expect("Failed to replace system");

    let expected = r#"package model

var _ = Design(func() {
	SoftwareSystem("AnotherSystem")
	SoftwareSystem("YetAnotherSystem")
	SoftwareSystem("ExistingSystem", "Updated", func() {
		Tag("Edited")
		Uses("AnotherSystem", "Calls")
		Uses("YetAnotherSystem", "Notifies", "HTTPS")
	})
})
"#;
    assert_eq!(result.content, expected);
    // The container's relationship went away with the container.
    assert!(!result.content.contains("Polls"));
    assert_well_formed(&result.content);
}

#[test]
fn test_redeclared_relationships_are_not_duplicated() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::SoftwareSystem,
            "Internet Banking",
            "SoftwareSystem(\"Internet Banking\", func() {\n\tUses(Mainframe, \"Writes accounts\")\n})",
        )
        .expect("Failed to replace system");

    let expected = MODEL.replace(
        concat!(
            "\t\tUses(Mainframe, \"Reads accounts\")\n",
            "\t\tUses(\"Email\", \"Sends mail\")\n",
            "\t\tContainer(\"API\", \"JSON API\", \"Rust\", func() {\n",
            "\t\t\tUses(\"Database\", \"Reads from\")\n",
            "\t\t\tComponent(\"Accounts\")\n",
            "\t\t})\n",
            "\t\tContainer(\"Database\")\n",
        ),
        concat!(
            "\t\tUses(Mainframe, \"Writes accounts\")\n",
            "\t\tUses(\"Email\", \"Sends mail\")\n",
        ),
    );
    assert_eq!(result.content, expected);
    assert!(!result.content.contains("Reads accounts"));
}

#[test]
fn test_insert_container_as_last_child() {
    let (repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::Container,
            "Internet Banking/Mobile",
            r#"Container("Mobile", "Mobile app")"#,
        )
        .expect("Failed to insert container");

    let expected = MODEL.replace(
        "\t\tContainer(\"Database\")\n\t})",
        "\t\tContainer(\"Database\")\n\t\tContainer(\"Mobile\", \"Mobile app\")\n\t})",
    );
    assert_eq!(result.content, expected);
    assert_eq!(on_disk(&repo, "model.go"), expected);
}

#[test]
fn test_insert_component_under_bodiless_container() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::Component,
            "Internet Banking/Database/Schema",
            r#"Component("Schema")"#,
        )
        .expect("Failed to insert component");

    let expected = MODEL.replace(
        "\t\tContainer(\"Database\")\n",
        "\t\tContainer(\"Database\", func() {\n\t\t\tComponent(\"Schema\")\n\t\t})\n",
    );
    assert_eq!(result.content, expected);
}

#[test]
fn test_insert_component_synthesizes_container() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::Component,
            "Email/SMTP/Relay",
            r#"Component("Relay")"#,
        )
        .expect("Failed to insert component");

    let expected = MODEL.replace(
        "\tSoftwareSystem(\"Email\")\n",
        concat!(
            "\tSoftwareSystem(\"Email\", func() {\n",
            "\t\tContainer(\"SMTP\", func() {\n",
            "\t\t\tComponent(\"Relay\")\n",
            "\t\t})\n",
            "\t})\n",
        ),
    );
    assert_eq!(result.content, expected);
}

#[test]
fn test_top_level_elements_go_before_views() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::SoftwareSystem,
            "Payments",
            r#"SoftwareSystem("Payments")"#,
        )
        .expect("Failed to insert system");

    let expected = MODEL.replace(
        "\tSoftwareSystem(\"ExistingSystem\")\n\n\tViews(",
        "\tSoftwareSystem(\"ExistingSystem\")\n\n\tSoftwareSystem(\"Payments\")\n\tViews(",
    );
    assert_eq!(result.content, expected);
}

#[test]
fn test_missing_system_is_synthesized_around_container() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::Container,
            "Ledger/Store",
            r#"Container("Store")"#,
        )
        .expect("Failed to insert container");

    let expected = MODEL.replace(
        "\tSoftwareSystem(\"ExistingSystem\")\n\n\tViews(",
        concat!(
            "\tSoftwareSystem(\"ExistingSystem\")\n\n",
            "\tSoftwareSystem(\"Ledger\", func() {\n",
            "\t\tContainer(\"Store\")\n",
            "\t})\n",
            "\tViews(",
        ),
    );
    assert_eq!(result.content, expected);
}

#[test]
fn test_add_relationship_to_container() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_relationship(
            "Internet Banking/API",
            "Email",
            r#"Uses("Email", "Sends notifications")"#,
        )
        .expect("Failed to add relationship");

    let expected = MODEL.replace(
        "\t\t\tComponent(\"Accounts\")\n",
        "\t\t\tComponent(\"Accounts\")\n\t\t\tUses(\"Email\", \"Sends notifications\")\n",
    );
    assert_eq!(result.content, expected);
}

#[test]
fn test_add_relationship_synthesizes_block() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_relationship(
            "Internet Banking/Database",
            "Email",
            r#"Uses("Email", "Writes")"#,
        )
        .expect("Failed to add relationship");

    let expected = MODEL.replace(
        "\t\tContainer(\"Database\")\n",
        "\t\tContainer(\"Database\", func() {\n\t\t\tUses(\"Email\", \"Writes\")\n\t\t})\n",
    );
    assert_eq!(result.content, expected);
    assert_well_formed(&result.content);
}

#[test]
fn test_replace_relationship_with_relative_destination() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_relationship(
            "Internet Banking/API",
            "Internet Banking/Database",
            r#"Uses("Database", "Reads and writes", "SQL")"#,
        )
        .expect("Failed to replace relationship");

    let expected = MODEL.replace(
        "Uses(\"Database\", \"Reads from\")",
        "Uses(\"Database\", \"Reads and writes\", \"SQL\")",
    );
    assert_eq!(result.content, expected);
}

#[test]
fn test_replace_relationship_through_binding() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_relationship(
            "Internet Banking",
            "Mainframe",
            r#"Uses(Mainframe, "Reads and writes accounts")"#,
        )
        .expect("Failed to replace relationship");

    assert_eq!(
        result.content,
        MODEL.replace("Reads accounts", "Reads and writes accounts")
    );
}

#[test]
fn test_relationship_source_must_exist() {
    let (repo, editor) = package(&[("model.go", MODEL)]);

    let err = editor
        .upsert_relationship("Shop", "Email", r#"Uses("Email", "Sends")"#)
        .unwrap_err();
    assert!(matches!(err, EditError::NotFound(_)), "got {err:?}");
    assert_eq!(on_disk(&repo, "model.go"), MODEL);
}

#[test]
fn test_relationship_destination_verification() {
    let (repo, editor) = package(&[("model.go", MODEL)]);
    let err = editor
        .upsert_relationship("Customer", "Shop", r#"Uses("Shop", "Buys from")"#)
        .unwrap_err();
    assert!(matches!(err, EditError::NotFound(_)), "got {err:?}");
    assert_eq!(on_disk(&repo, "model.go"), MODEL);

    let config = EditorConfig::default().with_verify_destination(false);
    let (_repo, editor) = package_with(config, &[("model.go", MODEL)]);
    let result = editor
        .upsert_relationship("Customer", "Shop", r#"Uses("Shop", "Buys from")"#)
        .expect("Failed to add unverified relationship");
    assert!(
        result
            .content
            .contains("\t\tUses(\"Internet Banking\", \"Banks with\")\n\t\tUses(\"Shop\", \"Buys from\")\n")
    );
}

#[test]
fn test_unbalanced_code_leaves_file_untouched() {
    let (repo, editor) = package(&[("model.go", MODEL)]);

    let err = editor
        .upsert_element_by_path(
            ElementKind::SoftwareSystem,
            "ExistingSystem",
            r#"SoftwareSystem("ExistingSystem", func() {"#,
        )
        .unwrap_err();

    let EditError::Parse { origin, .. } = &err else {
        panic!("Expected a parse error, got {err:?}");
    };
    assert_eq!(*origin, ParseOrigin::Snippet);
    assert!(err.diagnostics().is_some());
    assert_eq!(on_disk(&repo, "model.go"), MODEL);
}

#[test]
fn test_broken_model_file_is_reported() {
    let (_repo, editor) = package(&[("model.go", "package model\n\nvar _ = Design(func() {\n")]);

    let err = editor
        .upsert_element_by_path(ElementKind::Person, "Customer", r#"Person("Customer")"#)
        .unwrap_err();
    let EditError::Parse { origin, .. } = &err else {
        panic!("Expected a parse error, got {err:?}");
    };
    let ParseOrigin::File(path) = origin else {
        panic!("Expected the file to be blamed, got {origin:?}");
    };
    assert!(path.ends_with(Path::new("design/model.go")));
}

#[test]
fn test_wrong_segment_count_is_rejected() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);
    let err = editor
        .upsert_element_by_path(ElementKind::Component, "Internet Banking/API", "Component(\"API\")")
        .unwrap_err();
    assert!(matches!(err, EditError::InvalidArgument(_)));
}

#[test]
fn test_replace_view_by_key() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_id(
            IdKind::View(ViewKind::SystemContext),
            "context",
            "SystemContextView(\"Internet Banking\", \"context\", \"Updated\", func() {\n\tAddAll()\n\tAutoLayout(RankLeftRight)\n})",
        )
        .expect("Failed to replace view");

    let expected = MODEL.replace(
        "\t\tSystemContextView(\"Internet Banking\", \"context\", func() {\n\t\t\tAddAll()\n\t\t})",
        "\t\tSystemContextView(\"Internet Banking\", \"context\", \"Updated\", func() {\n\t\t\tAddAll()\n\t\t\tAutoLayout(RankLeftRight)\n\t\t})",
    );
    assert_eq!(result.content, expected);
}

#[test]
fn test_insert_view_into_existing_views() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_id(
            IdKind::View(ViewKind::Container),
            "containers",
            "ContainerView(\"Internet Banking\", \"containers\", func() {\n\tAddAll()\n})",
        )
        .expect("Failed to insert view");

    let expected = MODEL.replace(
        "\t\t\tAddAll()\n\t\t})\n\t})",
        concat!(
            "\t\t\tAddAll()\n\t\t})\n",
            "\t\tContainerView(\"Internet Banking\", \"containers\", func() {\n",
            "\t\t\tAddAll()\n",
            "\t\t})\n",
            "\t})",
        ),
    );
    assert_eq!(result.content, expected);
}

#[test]
fn test_styles_section_is_synthesized_inside_views() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_id(
            IdKind::Style(StyleKind::Element),
            "database",
            "ElementStyle(\"database\", func() {\n\tShape(ShapeCylinder)\n})",
        )
        .expect("Failed to insert style");

    let expected = MODEL.replace(
        "\t\t})\n\t})\n})\n",
        concat!(
            "\t\t})\n",
            "\t\tStyles(func() {\n",
            "\t\t\tElementStyle(\"database\", func() {\n",
            "\t\t\t\tShape(ShapeCylinder)\n",
            "\t\t\t})\n",
            "\t\t})\n",
            "\t})\n",
            "})\n",
        ),
    );
    assert_eq!(result.content, expected);

    // The next style goes into the section that now exists.
    let result = editor
        .upsert_element_by_id(
            IdKind::Style(StyleKind::Relationship),
            "async",
            "RelationshipStyle(\"async\", func() {\n\tDashed()\n})",
        )
        .expect("Failed to insert second style");
    assert_eq!(result.content.matches("Styles(").count(), 1);
    assert!(result.content.contains(concat!(
        "\t\t\t})\n",
        "\t\t\tRelationshipStyle(\"async\", func() {\n",
        "\t\t\t\tDashed()\n",
        "\t\t\t})\n",
        "\t\t})\n",
    )));
}

#[test]
fn test_views_and_styles_are_synthesized_in_design() {
    let source = "package model\n\nvar _ = Design(func() {\n\tSoftwareSystem(\"Bank\")\n})\n";
    let (_repo, editor) = package(&[("model.go", source)]);

    let result = editor
        .upsert_element_by_id(
            IdKind::Style(StyleKind::Element),
            "database",
            "ElementStyle(\"database\", func() {\n\tShape(ShapeCylinder)\n})",
        )
        .expect("Failed to insert style");

    let expected = r#"package model

var _ = Design(func() {
	SoftwareSystem("Bank")
	Views(func() {
		Styles(func() {
			ElementStyle("database", func() {
				Shape(ShapeCylinder)
			})
		})
	})
})
"#;
    assert_eq!(result.content, expected);
}

#[test]
fn test_new_file_for_empty_package() {
    let (repo, editor) = package(&[]);

    let result = editor
        .upsert_element_by_id(
            IdKind::View(ViewKind::SystemLandscape),
            "landscape",
            "SystemLandscapeView(\"landscape\", func() {\n\tAddAll()\n})",
        )
        .expect("Failed to create file");

    let expected = r#"package model

import . "goa.design/model/dsl"

var _ = Design(func() {
	Views(func() {
		SystemLandscapeView("landscape", func() {
			AddAll()
		})
	})
})
"#;
    assert_eq!(result.content, expected);
    assert_eq!(on_disk(&repo, "model.go"), expected);
}

#[test]
fn test_design_is_appended_to_default_file() {
    let source = "package model\n\nimport . \"goa.design/model/dsl\"\n";
    let (_repo, editor) = package(&[("model.go", source)]);

    let result = editor
        .upsert_element_by_path(ElementKind::Person, "Customer", r#"Person("Customer")"#)
        .expect("Failed to add design");

    assert_eq!(
        result.content,
        "package model\n\nimport . \"goa.design/model/dsl\"\n\nvar _ = Design(func() {\n\tPerson(\"Customer\")\n})\n"
    );
}

#[test]
fn test_multi_file_package() {
    let a = "package model\n\nvar _ = Design(func() {\n\tSoftwareSystem(\"A\")\n})\n";
    let b = "package model\n\nvar _ = Design(func() {\n\tSoftwareSystem(\"B\")\n})\n";
    let (repo, editor) = package(&[("a.go", a), ("model.go", b)]);

    // A full match wins wherever it is.
    let result = editor
        .upsert_element_by_path(ElementKind::SoftwareSystem, "B", r#"SoftwareSystem("B", "Second")"#)
        .expect("Failed to replace B");
    assert_eq!(result.locator.filename, "model.go");
    assert_eq!(on_disk(&repo, "a.go"), a);

    // Ties prefer the default file.
    let result = editor
        .upsert_element_by_path(ElementKind::SoftwareSystem, "C", r#"SoftwareSystem("C")"#)
        .expect("Failed to insert C");
    assert_eq!(result.locator.filename, "model.go");

    // An existing ancestor beats the default file.
    let result = editor
        .upsert_element_by_path(ElementKind::Container, "A/Queue", r#"Container("Queue")"#)
        .expect("Failed to insert container");
    assert_eq!(result.locator.filename, "a.go");
    assert_eq!(
        result.content,
        "package model\n\nvar _ = Design(func() {\n\tSoftwareSystem(\"A\", func() {\n\t\tContainer(\"Queue\")\n\t})\n})\n"
    );
}

#[test]
fn test_upserts_are_idempotent() {
    let (repo, editor) = package(&[("model.go", MODEL)]);
    let code = "Container(\"Mobile\", \"Mobile app\", func() {\n\tTag(\"mobile\")\n})";

    let first = editor
        .upsert_element_by_path(ElementKind::Container, "Internet Banking/Mobile", code)
        .expect("Failed to insert");
    let second = editor
        .upsert_element_by_path(ElementKind::Container, "Internet Banking/Mobile", code)
        .expect("Failed to replace");
    assert_eq!(first.content, second.content);

    let code = r#"SoftwareSystem("ExistingSystem", "Described")"#;
    let first = editor
        .upsert_element_by_path(ElementKind::SoftwareSystem, "ExistingSystem", code)
        .expect("Failed to replace");
    let second = editor
        .upsert_element_by_path(ElementKind::SoftwareSystem, "ExistingSystem", code)
        .expect("Failed to replace again");
    assert_eq!(first.content, second.content);
    assert_eq!(on_disk(&repo, "model.go"), second.content);
    assert_well_formed(&second.content);
}

#[test]
fn test_binding_is_kept_or_replaced() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::SoftwareSystem,
            "Mainframe",
            r#"SoftwareSystem("Mainframe", "Retired core")"#,
        )
        .expect("Failed to replace bound system");
    assert!(
        result
            .content
            .contains("\tvar Mainframe = SoftwareSystem(\"Mainframe\", \"Retired core\")\n")
    );

    let result = editor
        .upsert_element_by_path(
            ElementKind::SoftwareSystem,
            "Mainframe",
            r#"var Core = SoftwareSystem("Mainframe")"#,
        )
        .expect("Failed to rebind system");
    assert!(result.content.contains("\tvar Core = SoftwareSystem(\"Mainframe\")\n"));
    assert!(!result.content.contains("var Mainframe"));
}

#[test]
fn test_upsert_declaration() {
    let (_repo, editor) = package(&[("model.go", MODEL)]);

    let declaration = Declaration::Container(ContainerSnippet {
        system: "Internet Banking".to_string(),
        name: "Mobile".to_string(),
        technology: Some("Swift".to_string()),
        ..Default::default()
    });
    let result = editor
        .upsert_declaration(&declaration)
        .expect("Failed to upsert declaration");

    assert!(result.content.contains(
        "\t\tContainer(\"Database\")\n\t\tContainer(\"Mobile\", \"\", \"Swift\")\n\t})"
    ));
}

#[test]
fn test_create_package() {
    let (repo, editor) = package(&[]);

    let result = editor.create_package().expect("Failed to create package");
    assert_eq!(
        result.content,
        "package model\n\nimport . \"goa.design/model/dsl\"\n\nvar _ = Design(\"model\", \"System architecture model\", func() {})\n"
    );
    assert_eq!(on_disk(&repo, "model.go"), result.content);

    let err = editor.create_package().unwrap_err();
    assert!(matches!(err, EditError::AlreadyExists(_)));
}

#[test]
fn test_read_package() {
    let (_repo, editor) = package(&[("views.go", "package model\n"), ("model.go", MODEL)]);

    let files = editor.read_package().expect("Failed to read package");
    let names: Vec<&str> = files.iter().map(|f| f.locator.filename.as_str()).collect();
    assert_eq!(names, ["model.go", "views.go"]);
    assert_eq!(files[0].content, MODEL);
}

#[test]
fn test_update_and_format_file() {
    let (repo, editor) = package(&[]);

    let result = editor
        .update_file(
            "model.go",
            "package model\nvar _ = Design(func() { SoftwareSystem(\"A\") })",
        )
        .expect("Failed to update file");
    let canonical = "package model\nvar _ = Design(func() {\n\tSoftwareSystem(\"A\")\n})\n";
    assert_eq!(result.content, canonical);

    let err = editor
        .update_file("model.go", "package model\nvar _ = Design(func() {")
        .unwrap_err();
    assert!(matches!(err, EditError::Parse { .. }));
    assert_eq!(on_disk(&repo, "model.go"), canonical);

    fs::write(
        repo.path().join("design/views.go"),
        "package model\nvar _ = Design(func() {Views(func() {})})\n",
    )
    .unwrap();
    let result = editor.format_file("views.go").expect("Failed to format file");
    assert_eq!(
        result.content,
        "package model\nvar _ = Design(func() {\n\tViews(func() {})\n})\n"
    );
    assert_eq!(on_disk(&repo, "views.go"), result.content);

    assert!(matches!(
        editor.format_file("missing.go"),
        Err(EditError::NotFound(_))
    ));
}

#[test]
fn test_container_goes_into_system_of_second_design() {
    let source = r#"package model

var _ = Design(func() {
	Person("Customer")
})

var _ = Design(func() {
	SoftwareSystem("Bank", func() {
		Container("API")
	})
})
"#;
    let (_repo, editor) = package(&[("model.go", source)]);

    let result = editor
        .upsert_element_by_path(ElementKind::Container, "Bank/Web", r#"Container("Web")"#)
        .expect("Failed to insert container");

    let expected = source.replace(
        "\t\tContainer(\"API\")\n",
        "\t\tContainer(\"API\")\n\t\tContainer(\"Web\")\n",
    );
    assert_eq!(result.content, expected);
    assert_eq!(result.content.matches("SoftwareSystem(\"Bank\"").count(), 1);
}

#[test]
fn test_component_goes_into_file_with_deepest_ancestor() {
    let systems = "package model\n\nvar _ = Design(func() {\n\tSoftwareSystem(\"Bank\")\n})\n";
    let containers = "package model\n\nvar _ = Design(func() {\n\tSoftwareSystem(\"Bank\", func() {\n\t\tContainer(\"API\")\n\t})\n})\n";
    let (_repo, editor) = package(&[("a.go", systems), ("b.go", containers)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::Component,
            "Bank/API/Ledger",
            r#"Component("Ledger")"#,
        )
        .expect("Failed to insert component");
    assert_eq!(result.locator.filename, "b.go");
    assert!(
        result
            .content
            .contains("\t\tContainer(\"API\", func() {\n\t\t\tComponent(\"Ledger\")\n\t\t})\n"),
        "{}",
        result.content
    );
}

const BIG_BANK: &str = r#"package model

import (
	. "goa.design/model/dsl"
	"goa.design/model/expr"
)

var _ = Design("Big Bank plc", "Banking", func() {
	var (
		Database *expr.Container
		API      *expr.Container
	)

	SoftwareSystem("Internet Banking System", func() {
		Database = Container("Database", "Stores accounts", "Oracle")
		API = Container("API Application", "Provides banking", "Java", func() {
			Uses(Database, "Reads from and writes to", "JDBC")
		})
	})
})
"#;

#[test]
fn test_typed_var_groups_are_kept() {
    assert_eq!(archedit::format(BIG_BANK).unwrap(), BIG_BANK);
    let (repo, editor) = package(&[("model.go", BIG_BANK)]);

    let result = editor
        .upsert_element_by_path(
            ElementKind::Container,
            "Internet Banking System/Mobile App",
            r#"Container("Mobile App", "Mobile banking")"#,
        )
        .expect("Failed to insert container");
    let expected = BIG_BANK.replace(
        "\t\t})\n\t})\n})",
        "\t\t})\n\t\tContainer(\"Mobile App\", \"Mobile banking\")\n\t})\n})",
    );
    assert_eq!(result.content, expected);

    let result = editor
        .upsert_element_by_path(
            ElementKind::Container,
            "Internet Banking System/Database",
            r#"Container("Database", "Stores accounts", "PostgreSQL")"#,
        )
        .expect("Failed to replace container");
    assert!(result.content.contains(
        "\t\tDatabase = Container(\"Database\", \"Stores accounts\", \"PostgreSQL\")\n"
    ));
    assert!(result.content.contains("\t\tDatabase *expr.Container\n"));
    assert_eq!(on_disk(&repo, "model.go"), result.content);
    assert_well_formed(&result.content);
}

const SHAPES: &str = r#"package model

import (
	"fmt"

	. "goa.design/model/dsl"
)

var shapes = []string{"Box", "Circle"}

var _ = Design(func() {
	SoftwareSystem("Hub", func() {
		Uses("Store", "Reads")
		for i, sh := range shapes {
			Uses(sh, fmt.Sprintf("Link %d", i+1))
		}
	})
	SoftwareSystem("Store")
})

func shapeName(i int) string {
	return shapes[i]
}
"#;

#[test]
fn test_go_code_around_declarations_is_kept() {
    assert_eq!(archedit::format(SHAPES).unwrap(), SHAPES);
    let (_repo, editor) = package(&[("model.go", SHAPES)]);

    let result = editor
        .upsert_relationship("Hub", "Store", r#"Uses("Store", "Writes")"#)
        .expect("Failed to replace relationship");
    assert_eq!(result.content, SHAPES.replace("\"Reads\"", "\"Writes\""));

    let result = editor
        .upsert_element_by_path(
            ElementKind::SoftwareSystem,
            "Hub",
            r#"SoftwareSystem("Hub", "Central hub")"#,
        )
        .expect("Failed to replace system");
    let expected = SHAPES.replace(
        concat!(
            "\tSoftwareSystem(\"Hub\", func() {\n",
            "\t\tUses(\"Store\", \"Reads\")\n",
            "\t\tfor i, sh := range shapes {\n",
            "\t\t\tUses(sh, fmt.Sprintf(\"Link %d\", i+1))\n",
            "\t\t}\n",
        ),
        concat!(
            "\tSoftwareSystem(\"Hub\", \"Central hub\", func() {\n",
            "\t\tUses(\"Store\", \"Writes\")\n",
        ),
    );
    // The loop went away with the old body; only direct relationships move.
    assert_eq!(result.content, expected);
    assert!(result.content.contains("func shapeName(i int) string {\n\treturn shapes[i]\n}\n"));
    assert_well_formed(&result.content);
}

#[test]
fn test_list_packages_finds_dsl_imports_only() {
    let (repo, editor) = package(&[("model.go", MODEL)]);
    let tools = repo.path().join("tools");
    fs::create_dir_all(&tools).unwrap();
    fs::write(
        tools.join("main.go"),
        "package main\n\nimport \"goa.design/model/mdl\"\n\nfunc main() { mdl.Run() }\n",
    )
    .unwrap();
    let nested = repo.path().join("design/views");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        nested.join("views.go"),
        "package views\n\nimport (\n\t\"fmt\"\n\t. \"goa.design/model/dsl\"\n)\n",
    )
    .unwrap();

    let packages = editor.list_packages().unwrap();
    assert_eq!(
        packages,
        [Path::new("design").to_path_buf(), Path::new("design/views").to_path_buf()]
    );
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_direct_relationships_are_carried_in_order(
            descriptions in prop::collection::vec("[a-z]{1,8}", 0..6),
        ) {
            let uses: Vec<String> = descriptions
                .iter()
                .enumerate()
                .map(|(i, description)| format!("Uses(\"Dest{i}\", \"{description}\")"))
                .collect();
            let body: String = uses.iter().map(|line| format!("\t\t{line}\n")).collect();
            let source = format!(
                "package model\n\nvar _ = Design(func() {{\n\tSoftwareSystem(\"Owner\", func() {{\n\t\tTag(\"old\")\n{body}\t}})\n}})\n"
            );
            let (_repo, editor) = package(&[("model.go", source.as_str())]);

            let result = editor
                .upsert_element_by_path(
                    ElementKind::SoftwareSystem,
                    "Owner",
                    "SoftwareSystem(\"Owner\", func() {\n\tTag(\"new\")\n})",
                )
                .expect("Failed to replace system");

            let expected = format!(
                "package model\n\nvar _ = Design(func() {{\n\tSoftwareSystem(\"Owner\", func() {{\n\t\tTag(\"new\")\n{body}\t}})\n}})\n"
            );
            prop_assert_eq!(&result.content, &expected);
            prop_assert_eq!(result.content.matches("Uses(").count(), uses.len());
        }
    }
}
