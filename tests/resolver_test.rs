use miette::Report;
use yang_core::ast::BuiltinType;
use yang_core::error::ResolverError;
use yang_core::resolver::{grouping_find, type_find, PrefixMatch, Scope, TypeTarget};
use yang_core::{Context, ContextOptions, MemorySource, ModuleId, ParseOptions, YangError};

fn memory_context(source: MemorySource) -> Context {
    let mut ctx = Context::new(ContextOptions {
        disable_searchdirs: true,
        ..ContextOptions::default()
    });
    ctx.add_source(source);
    ctx
}

fn implement_ok(ctx: &mut Context, text: &str) -> ModuleId {
    match ctx.parse_mem(text, &ParseOptions::default().implement(true)) {
        Ok(id) => id,
        Err(err) => panic!("{:?}", Report::new(err)),
    }
}

fn implement_err(ctx: &mut Context, text: &str) -> YangError {
    match ctx.parse_mem(text, &ParseOptions::default().implement(true)) {
        Ok(_) => panic!("Expected an error, but got Ok"),
        Err(err) => err,
    }
}

fn base_of(ctx: &Context, id: ModuleId, path: &str) -> BuiltinType {
    ctx.module(id)
        .compiled
        .as_ref()
        .and_then(|c| c.find_path(path))
        .and_then(|n| n.type_())
        .map(|t| t.base)
        .unwrap_or_else(|| panic!("no typed node at {path}"))
}

const LIB: &str = r#"
module lib {
  namespace "urn:lib";
  prefix lib;

  typedef x { type int64; }

  container holder {
    typedef x { type string; }
    leaf inner { type x; }
  }

  grouping endpoint {
    leaf address { type x; }
  }
}
"#;

#[test]
fn test_local_typedef_shadows_module_typedef() {
    let mut ctx = memory_context(MemorySource::new());
    let id = implement_ok(
        &mut ctx,
        r#"
        module a {
          namespace "urn:a";
          prefix a;
          typedef t { type int8; }
          container n {
            typedef t { type boolean; }
            leaf near { type t; }
          }
          leaf far { type t; }
        }
    "#,
    );
    assert_eq!(base_of(&ctx, id, "/n/near"), BuiltinType::Boolean);
    assert_eq!(base_of(&ctx, id, "/far"), BuiltinType::Int8);
}

#[test]
fn test_prefixed_lookup_only_sees_foreign_top_level() {
    let mut source = MemorySource::new();
    source.add("lib", None, LIB);
    let mut ctx = memory_context(source);
    let id = implement_ok(
        &mut ctx,
        r#"
        module a {
          namespace "urn:a";
          prefix a;
          import lib { prefix l; }
          container holder {
            typedef x { type boolean; }
            leaf foreign { type l:x; }
            leaf own { type x; }
          }
        }
    "#,
    );
    assert_eq!(base_of(&ctx, id, "/holder/foreign"), BuiltinType::Int64);
    assert_eq!(base_of(&ctx, id, "/holder/own"), BuiltinType::Boolean);
}

#[test]
fn test_foreign_grouping_resolves_in_its_own_module() {
    let mut source = MemorySource::new();
    source.add("lib", None, LIB);
    let mut ctx = memory_context(source);
    let id = implement_ok(
        &mut ctx,
        r#"
        module a {
          namespace "urn:a";
          prefix a;
          import lib { prefix l; }
          typedef x { type boolean; }
          container peer { uses l:endpoint; }
        }
    "#,
    );
    // `x` inside the grouping means lib's top-level typedef, not a's.
    assert_eq!(base_of(&ctx, id, "/peer/address"), BuiltinType::Int64);
    let origin = &ctx
        .module(id)
        .compiled
        .as_ref()
        .unwrap()
        .find_path("/peer/address")
        .unwrap()
        .type_()
        .unwrap()
        .derived_from[0];
    assert_eq!(origin.module, "lib");
    assert!(origin.node.is_none());
}

#[test]
fn test_unknown_prefix_and_missing_type() {
    let mut ctx = memory_context(MemorySource::new());
    let err = implement_err(
        &mut ctx,
        "module a { namespace urn:a; prefix a; leaf l { type zz:t; } }",
    );
    assert!(matches!(
        err,
        YangError::Resolver(ResolverError::UnknownPrefix { .. })
    ));

    let err = implement_err(
        &mut ctx,
        "module a { namespace urn:a; prefix a;\n leaf l { type nothing; } }",
    );
    match err {
        YangError::Resolver(ResolverError::TypeNotFound { name, line, .. }) => {
            assert_eq!(name, "nothing");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {:?}", Report::new(other)),
    }
    assert!(ctx.is_empty());
}

#[test]
fn test_prefix_lookup_in_all_three_forms() {
    let mut source = MemorySource::new();
    source.add("lib", None, LIB);
    let mut ctx = memory_context(source);
    let id = implement_ok(
        &mut ctx,
        "module a { namespace urn:a; prefix a; import lib { prefix l; } }",
    );
    let lib = ctx.get_module("lib", None).unwrap();

    let parsed = ctx.parsed(id).unwrap();
    assert!(matches!(parsed.find_prefix("a"), Some(PrefixMatch::Local)));
    assert_eq!(parsed.find_prefix("l").and_then(|m| m.module_id(id)), Some(lib));
    assert!(parsed.find_prefix("lib").is_none());

    let compiled = ctx.module(id).compiled.as_ref().unwrap();
    assert_eq!(compiled.find_prefix("a"), Some(id));
    assert_eq!(compiled.find_prefix("l"), Some(lib));

    assert_eq!(ctx.module_by_prefix(id, "l"), Some(lib));
    assert_eq!(ctx.module_by_prefix(id, "a"), Some(id));
    assert_eq!(ctx.module_by_prefix(id, "x"), None);

    // Only the compiled form left: the lookup still works.
    ctx.release_parsed(id);
    assert_eq!(ctx.module_by_prefix(id, "l"), Some(lib));
}

#[test]
fn test_type_find_through_the_context() {
    let mut source = MemorySource::new();
    source.add("lib", None, LIB);
    let mut ctx = memory_context(source);
    let id = implement_ok(
        &mut ctx,
        "module a { namespace urn:a; prefix a; import lib { prefix l; } }",
    );
    let lib = ctx.get_module("lib", None).unwrap();
    let parsed = ctx.parsed(id).unwrap();
    let scope = Scope::top(parsed);

    match type_find(&ctx, &scope, "l:x", 1).unwrap() {
        TypeTarget::Typedef(found) => {
            assert_eq!(found.foreign, Some(lib));
            assert_eq!(found.item.type_ref.name, "int64");
            assert!(found.node.is_none());
        }
        TypeTarget::Builtin(_) => panic!("expected a typedef"),
    }
    assert!(matches!(
        type_find(&ctx, &scope, "string", 1),
        Ok(TypeTarget::Builtin(BuiltinType::String))
    ));
    // Built-in names are never looked up with a prefix.
    assert!(type_find(&ctx, &scope, "l:string", 1).is_err());

    let found = grouping_find(&ctx, &scope, "l:endpoint", 1).unwrap();
    assert_eq!(found.module.name, "lib");
}

#[test]
fn test_augment_of_implemented_module() {
    let mut source = MemorySource::new();
    source.add(
        "base",
        None,
        "module base { namespace urn:base; prefix b; container c { leaf x { type string; } } }",
    );
    let mut ctx = memory_context(source);
    let base = ctx.load_module("base", None, true, false).unwrap();
    let ext = implement_ok(
        &mut ctx,
        r#"
        module ext {
          namespace "urn:ext";
          prefix e;
          import base { prefix b; }
          augment "/b:c" {
            leaf extra { type uint8; }
          }
        }
    "#,
    );
    let compiled = ctx.module(base).compiled.as_ref().unwrap();
    let extra = compiled.find_path("/c/extra").unwrap();
    assert_eq!(extra.module, ext);
    assert!(extra.config);
}

#[test]
fn test_augment_of_imported_only_module() {
    let mut source = MemorySource::new();
    source.add(
        "base",
        None,
        "module base { namespace urn:base; prefix b; container c { } }",
    );
    let mut ctx = memory_context(source);
    let err = implement_err(
        &mut ctx,
        r#"module ext { namespace urn:ext; prefix e; import base { prefix b; } augment "/b:c" { leaf extra { type uint8; } } }"#,
    );
    assert!(matches!(
        err,
        YangError::Resolver(ResolverError::TargetNotImplemented { .. })
    ));
    // The import itself went through and stays registered.
    assert!(ctx.get_module("base", None).is_some());
    assert!(ctx.get_module("ext", None).is_none());
}

#[test]
fn test_failed_foreign_augment_registers_nothing() {
    let mut source = MemorySource::new();
    source.add(
        "base",
        None,
        "module base { namespace urn:base; prefix b; container c { choice ch { leaf x { type string; } } } }",
    );
    let mut ctx = memory_context(source);
    let base = ctx.load_module("base", None, true, false).unwrap();
    let before = ctx.len();
    let err = implement_err(
        &mut ctx,
        r#"
        module ext {
          namespace "urn:ext";
          prefix e;
          import base { prefix b; }
          augment "/b:c" { leaf extra { type string; } }
          augment "/b:c/b:ch" { action reset; }
        }
    "#,
    );
    match err {
        YangError::Resolver(ResolverError::AugmentSlotMismatch { kind, node, .. }) => {
            assert_eq!(kind, "action");
            assert_eq!(node, "reset");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(ctx.len(), before);
    assert!(ctx.get_module("ext", None).is_none());
    let compiled = ctx.module(base).compiled.as_ref().unwrap();
    assert!(compiled.find_path("/c/extra").is_none());
}

const DEVIATED: &str = r#"
module dev-base {
  namespace "urn:dev-base";
  prefix db;
  container settings {
    leaf legacy { type string; }
    leaf timeout { type uint16; default 30; units seconds; }
    list peer {
      key name;
      leaf name { type string; }
    }
  }
}
"#;

#[test]
fn test_deviation_removes_and_replaces() {
    let mut source = MemorySource::new();
    source.add("dev-base", None, DEVIATED);
    let mut ctx = memory_context(source);
    let base = ctx.load_module("dev-base", None, true, false).unwrap();
    implement_ok(
        &mut ctx,
        r#"
        module dev-vendor {
          namespace "urn:dev-vendor";
          prefix dv;
          import dev-base { prefix db; }
          deviation /db:settings/db:legacy { deviate not-supported; }
          deviation /db:settings/db:timeout {
            deviate replace { type uint32; default 60; }
          }
          deviation /db:settings/db:peer {
            deviate add { max-elements 8; unique name; }
          }
        }
    "#,
    );
    let compiled = ctx.module(base).compiled.as_ref().unwrap();
    assert!(compiled.find_path("/settings/legacy").is_none());
    let timeout = compiled.find_path("/settings/timeout").unwrap();
    let yang_core::CompiledNodeKind::Leaf { type_, units, default } = &timeout.kind else {
        panic!("expected a leaf");
    };
    assert_eq!(type_.base, BuiltinType::Uint32);
    assert_eq!(default.as_deref(), Some("60"));
    assert_eq!(units.as_deref(), Some("seconds"));
    let peer = compiled.find_path("/settings/peer").unwrap();
    let yang_core::CompiledNodeKind::List { max_elements, uniques, .. } = &peer.kind else {
        panic!("expected a list");
    };
    assert_eq!(*max_elements, Some(8));
    assert_eq!(uniques, &["name"]);
}

#[test]
fn test_invalid_deviation_leaves_target_untouched() {
    let mut source = MemorySource::new();
    source.add("dev-base", None, DEVIATED);
    let mut ctx = memory_context(source);
    let base = ctx.load_module("dev-base", None, true, false).unwrap();
    let before = ctx.len();
    let err = implement_err(
        &mut ctx,
        r#"
        module dev-vendor {
          namespace "urn:dev-vendor";
          prefix dv;
          import dev-base { prefix db; }
          deviation /db:settings/db:legacy { deviate not-supported; }
          deviation /db:settings/db:timeout { deviate add { default 10; } }
        }
    "#,
    );
    assert!(matches!(
        err,
        YangError::Resolver(ResolverError::InvalidDeviation { .. })
    ));
    assert_eq!(ctx.len(), before);
    let compiled = ctx.module(base).compiled.as_ref().unwrap();
    assert!(compiled.find_path("/settings/legacy").is_some());
}

#[test]
fn test_deviation_of_imported_only_module() {
    let mut source = MemorySource::new();
    source.add("dev-base", None, DEVIATED);
    let mut ctx = memory_context(source);
    let err = implement_err(
        &mut ctx,
        r#"module dev-vendor { namespace urn:dv; prefix dv; import dev-base { prefix db; } deviation /db:settings { deviate not-supported; } }"#,
    );
    assert!(matches!(
        err,
        YangError::Resolver(ResolverError::TargetNotImplemented { .. })
    ));
}
