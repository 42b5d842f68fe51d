use miette::Report;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;
use yang_core::error::LoadError;
use yang_core::{Context, ContextOptions, MemorySource, ModuleId, ParseOptions, YangError};

fn fixture_dir(subdir: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(subdir)
}

fn context_for(subdir: &str) -> Context {
    Context::new(ContextOptions {
        search_dirs: vec![fixture_dir(subdir)],
        ..ContextOptions::default()
    })
}

fn implement() -> ParseOptions<'static> {
    ParseOptions::default().implement(true)
}

fn load_ok(ctx: &mut Context, subdir: &str, file: &str) -> ModuleId {
    match ctx.parse_path(fixture_dir(subdir).join(file), &implement()) {
        Ok(id) => id,
        Err(err) => panic!("{:?}", Report::new(err)),
    }
}

fn memory_context(source: MemorySource) -> Context {
    let mut ctx = Context::new(ContextOptions {
        disable_searchdirs: true,
        ..ContextOptions::default()
    });
    ctx.add_source(source);
    ctx
}

#[test]
fn test_scenario_import_include_and_single_implementation() {
    let mut ctx = context_for("scenario");
    let m = load_ok(&mut ctx, "scenario", "m@2021-01-01.yang");

    let n = ctx.get_module("n", Some("2020-01-01")).unwrap();
    assert!(ctx.module(m).implemented);
    assert!(!ctx.module(n).implemented);

    let compiled = ctx.module(m).compiled.as_ref().unwrap();
    let vlan = compiled.find_path("/vlan").unwrap().type_().unwrap();
    assert_eq!(vlan.range.as_deref(), Some("1..4094"));
    assert_eq!(vlan.derived_from[0].module, "n");

    let level = compiled.find_path("/m:settings/level").unwrap();
    let level_type = level.type_().unwrap();
    let chain: Vec<&str> = level_type.derived_from.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(chain, ["local-t", "base-type"]);
    assert_eq!(level_type.derived_from[0].node.as_deref(), Some("settings"));
    assert_eq!(level_type.range.as_deref(), Some("1..100"));

    // n was only imported, so another revision may still be implemented.
    let n2 = ctx.load_module("n", Some("2021-06-01"), true, false).unwrap();
    assert!(ctx.module(n2).implemented);
    assert!(ctx.module(n2).latest_revision);
    assert!(!ctx.module(n).latest_revision);

    // m is implemented already; a second revision must be refused and leave no trace.
    let before = ctx.len();
    let err = ctx.load_module("m", Some("2022-03-01"), true, false).unwrap_err();
    assert!(matches!(
        err,
        YangError::Load(LoadError::AlreadyImplemented { .. })
    ));
    assert_eq!(ctx.len(), before);
    assert!(ctx.get_module("m", Some("2022-03-01")).is_none());
    assert_eq!(ctx.get_module_implemented("m"), Some(m));

    // Loading it without implementing is fine.
    let m2 = ctx.load_module("m", Some("2022-03-01"), false, false).unwrap();
    assert!(!ctx.module(m2).implemented);
    assert_eq!(ctx.get_revisions("m").len(), 2);
}

#[test]
fn test_include_cycle_registers_nothing() {
    let mut ctx = context_for("cycle");
    let err = ctx
        .parse_path(fixture_dir("cycle").join("main.yang"), &implement())
        .unwrap_err();
    match err {
        YangError::Load(LoadError::CircularInclude { cycle }) => {
            assert_eq!(cycle, "main -> s -> t -> s");
        }
        other => panic!("unexpected error: {:?}", Report::new(other)),
    }
    assert!(ctx.is_empty());
}

#[test]
fn test_submodule_diamond_is_loaded_once() {
    let mut ctx = context_for("diamond");
    let top = load_ok(&mut ctx, "diamond", "top.yang");

    let parsed = ctx.parsed(top).unwrap();
    let names: Vec<&str> = parsed.submodules().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["left", "bottom", "right"]);

    let compiled = ctx.module(top).compiled.as_ref().unwrap();
    for path in ["/shared", "/left-box/l", "/right-box/r"] {
        let ty = compiled.find_path(path).unwrap().type_().unwrap();
        assert_eq!(ty.length.as_deref(), Some("1..64"), "{path}");
    }
}

#[test]
fn test_self_include_and_wrong_owner() {
    let mut source = MemorySource::new();
    source.add(
        "other-sub",
        None,
        "submodule other-sub { belongs-to other { prefix o; } }",
    );
    let mut ctx = memory_context(source);

    let err = ctx
        .parse_mem(
            "module a { namespace urn:a; prefix a; include a; }",
            &implement(),
        )
        .unwrap_err();
    assert!(matches!(err, YangError::Load(LoadError::SelfInclude { .. })));

    let err = ctx
        .parse_mem(
            "module a { namespace urn:a; prefix a; include other-sub; }",
            &implement(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        YangError::Load(LoadError::BelongsToMismatch { .. })
    ));
    assert!(ctx.is_empty());
}

#[test]
fn test_include_of_a_module_is_rejected() {
    let mut source = MemorySource::new();
    source.add("b", None, "module b { namespace urn:b; prefix b; }");
    let mut ctx = memory_context(source);
    let err = ctx
        .parse_mem("module a { namespace urn:a; prefix a; include b; }", &implement())
        .unwrap_err();
    assert!(matches!(
        err,
        YangError::Load(LoadError::ExpectedSubmodule { .. })
    ));
}

#[test]
fn test_standalone_submodule_is_rejected() {
    let mut ctx = memory_context(MemorySource::new());
    let err = ctx
        .parse_mem(
            "submodule s { belongs-to a { prefix a; } }",
            &ParseOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        YangError::Load(LoadError::SubmoduleStandalone { .. })
    ));
}

#[test]
fn test_missing_import() {
    let mut ctx = memory_context(MemorySource::new());
    let err = ctx
        .parse_mem(
            "module a { namespace urn:a; prefix a; import nowhere { prefix nw; } }",
            &implement(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        YangError::Load(LoadError::ModuleNotFound { .. })
    ));
    assert_eq!(err.kind(), yang_core::ErrorKind::NotFound);
}

#[test]
fn test_parse_same_module_twice() {
    let mut ctx = memory_context(MemorySource::new());
    let text = "module a { namespace urn:a; prefix a; revision 2020-01-01; }";
    ctx.parse_mem(text, &ParseOptions::default()).unwrap();
    let err = ctx.parse_mem(text, &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, YangError::Load(LoadError::AlreadyPresent { .. })));
}

#[test]
fn test_search_dir_picks_newest_revision() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("lib@2019-05-01.yang"),
        "module lib { namespace urn:lib; prefix l; revision 2019-05-01; }",
    )
    .unwrap();
    fs::write(
        dir.path().join("lib@2023-05-01.yang"),
        "module lib { namespace urn:lib; prefix l; revision 2023-05-01; revision 2019-05-01; }",
    )
    .unwrap();

    let mut ctx = Context::default();
    ctx.set_searchdir(dir.path());
    let id = ctx.load_module("lib", None, false, false).unwrap();
    assert_eq!(ctx.module(id).revision.as_deref(), Some("2023-05-01"));
    assert!(ctx.module(id).filepath.is_some());

    let old = ctx.load_module("lib", Some("2019-05-01"), false, false).unwrap();
    assert_ne!(old, id);
    assert!(ctx.module(id).latest_revision);
}

#[test]
fn test_disabled_search_dirs() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("lib.yang"),
        "module lib { namespace urn:lib; prefix l; }",
    )
    .unwrap();
    let mut ctx = Context::new(ContextOptions {
        search_dirs: vec![dir.path().to_path_buf()],
        disable_searchdirs: true,
        ..ContextOptions::default()
    });
    assert!(ctx.load_module("lib", None, false, false).is_err());
}

#[test]
fn test_parse_file_rejects_directories() {
    let dir = tempdir().unwrap();
    let mut handle = fs::File::open(dir.path()).unwrap();
    let mut ctx = Context::default();
    let err = ctx.parse_file(&mut handle, &ParseOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        YangError::Load(LoadError::UnsupportedInput { .. })
    ));
}

#[test]
fn test_parse_file_reads_regular_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plain.yang");
    fs::write(&path, "module plain { namespace urn:plain; prefix p; leaf x { type int8; } }").unwrap();
    let mut handle = fs::File::open(&path).unwrap();
    let mut ctx = Context::default();
    let id = ctx.parse_file(&mut handle, &implement()).unwrap();
    assert!(ctx.module(id).compiled.as_ref().unwrap().find_path("/x").is_some());
}

#[test]
fn test_mark_implemented_is_unchecked() {
    let mut source = MemorySource::new();
    source
        .add("b", Some("2020-01-01"), "module b { namespace urn:b; prefix b; revision 2020-01-01; }")
        .add("b", Some("2021-01-01"), "module b { namespace urn:b; prefix b; revision 2021-01-01; }");
    let mut ctx = memory_context(source);
    let first = ctx.load_module("b", Some("2020-01-01"), true, false).unwrap();
    let second = ctx.load_module("b", Some("2021-01-01"), false, false).unwrap();

    // The caller owns the invariant here.
    ctx.mark_implemented(second);
    assert!(ctx.module(first).implemented);
    assert!(ctx.module(second).implemented);
}

#[test]
fn test_revisionless_import_uses_newest_registered() {
    let mut source = MemorySource::new();
    source.add(
        "lib",
        Some("2020-01-01"),
        "module lib { namespace urn:lib; prefix l; revision 2020-01-01; }",
    );
    let mut ctx = memory_context(source);
    let newer = ctx
        .parse_mem(
            "module lib { namespace urn:lib; prefix l; revision 2021-06-01; }",
            &ParseOptions::default(),
        )
        .unwrap();
    let app = ctx
        .parse_mem(
            "module app { namespace urn:app; prefix app; import lib { prefix l; } }",
            &implement(),
        )
        .unwrap();
    assert_eq!(ctx.len(), 2);
    assert!(ctx.get_module("lib", Some("2020-01-01")).is_none());
    let compiled = ctx.module(app).compiled.as_ref().unwrap();
    assert_eq!(compiled.find_prefix("l"), Some(newer));
}
