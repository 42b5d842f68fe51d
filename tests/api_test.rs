use std::cell::RefCell;
use std::rc::Rc;
use yang_core::api::analyze;
use yang_core::error::ResolverError;
use yang_core::YangError;

const SYSTEM: &str = r#"
module system {
  yang-version 1.1;
  namespace "urn:example:system";
  prefix sys;

  revision 2024-01-15 {
    description "Initial revision.";
  }

  typedef percent {
    type uint8 {
      range "0..100";
    }
    units "percent";
  }

  grouping threshold {
    leaf warn { type percent; default 80; }
    leaf critical { type percent; }
  }

  container system {
    leaf hostname {
      type string {
        length "1..253";
        pattern "[a-z0-9.-]+";
      }
    }
    container cpu {
      uses threshold {
        refine critical {
          mandatory true;
        }
      }
    }
    list user {
      key "name";
      leaf name { type string; }
      leaf-list role {
        type enumeration {
          enum admin;
          enum viewer { value 10; }
        }
        ordered-by user;
      }
      action reset-password {
        input { leaf temporary { type boolean; } }
      }
    }
  }

  rpc reboot {
    input { leaf delay { type uint32; units "seconds"; } }
  }

  notification rebooted {
    leaf at { type string; }
  }
}
"#;

#[test]
fn test_compiled_tree_shape() {
    let result = analyze(SYSTEM, "system.yang").unwrap();
    let compiled = result.compiled().unwrap();

    let warn = compiled.find_path("/system/cpu/warn").unwrap();
    assert!(!warn.mandatory);
    let critical = compiled.find_path("/system/cpu/critical").unwrap();
    assert!(critical.mandatory);
    assert_eq!(critical.type_().unwrap().range.as_deref(), Some("0..100"));

    let role = compiled.find_path("/system/user/role").unwrap();
    assert_eq!(role.type_().unwrap().enums.len(), 2);

    let temporary = compiled
        .find_path("/system/user/reset-password/input/temporary")
        .unwrap();
    assert!(!temporary.config);

    assert_eq!(compiled.rpcs.len(), 1);
    assert_eq!(compiled.notifications.len(), 1);
}

#[test]
fn test_json_dump() {
    let result = analyze(SYSTEM, "system.yang").unwrap();
    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();

    assert_eq!(json["name"], "system");
    assert_eq!(json["revision"], "2024-01-15");
    let system = &json["data"][0];
    assert_eq!(system["kind"], "container");
    let user = &system["children"][2];
    assert_eq!(user["kind"], "list");
    assert_eq!(user["keys"], serde_json::json!(["name"]));
    assert_eq!(user["actions"][0]["name"], "reset-password");
    let hostname = &system["children"][0];
    assert_eq!(hostname["type"]["patterns"], serde_json::json!(["[a-z0-9.-]+"]));
    assert_eq!(json["rpcs"][0]["kind"], "action");
    assert_eq!(json["rpcs"][0]["rpc"], true);
}

#[test]
fn test_private_data_is_freed_once() {
    let result = analyze(SYSTEM, "system.yang").unwrap();
    let module = result.module;
    let mut context = result.context;

    let previous = context
        .set_private(module, "/sys:system/hostname", Box::new(7u32))
        .unwrap();
    assert!(previous.is_none());
    context
        .set_private(module, "/system/cpu", Box::new(String::from("cpu")))
        .unwrap();
    let replaced = context
        .set_private(module, "/system/hostname", Box::new(8u32))
        .unwrap();
    assert_eq!(replaced.and_then(|b| b.downcast::<u32>().ok()).map(|b| *b), Some(7));

    let value = context.private(module, "/system/hostname").unwrap();
    assert_eq!(value.downcast_ref::<u32>(), Some(&8));

    let err = context
        .set_private(module, "/system/nope", Box::new(1u8))
        .unwrap_err();
    assert!(matches!(
        err,
        YangError::Resolver(ResolverError::PathNotFound { .. })
    ));

    let freed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&freed);
    context.free(move |node, _data| sink.borrow_mut().push(node.name.clone()));
    let mut freed = freed.borrow().clone();
    freed.sort();
    assert_eq!(freed, ["cpu", "hostname"]);
}

#[test]
fn test_analyze_reports_parse_errors() {
    let result = analyze("module a {", "a.yang");
    assert!(matches!(result, Err(YangError::Parser(_))));
}
