use std::fs;

use serde_json::json;
use serial_test::serial;
use stackbrew_lib::build::{BuildError, DeployDescriptor, StackBuildError, build_stack};

use super::common::{RECORDING_COMPILE, TestEnv, write_script};

const RELEASE_PYTHON: &str = r#"#!/bin/sh
cat <<EOF
processes:
  web: gunicorn app:app
config_vars:
  PYTHONPATH: $1
EOF
"#;

#[test]
#[serial]
fn builds_custom_and_python_services() {
  let env = TestEnv::new("web:\n  type: custom\n  buildscript: build.sh\nworker:\n  type: python\n");
  env.write_source("build.sh", "#!/bin/sh\n");
  env.write_source("app.py", "print('hi')\n");
  env.buildpack("custom", RECORDING_COMPILE, None);
  env.buildpack("python", RECORDING_COMPILE, Some(RELEASE_PYTHON));

  let deploy = build_stack(&env.builder(), &env.source(), &env.build_dir()).unwrap();

  let out = env.build_dir();
  assert!(out.join("web/compiled").exists());
  assert!(out.join("worker/compiled").exists());
  assert!(out.join("worker/app.py").exists());

  let written = DeployDescriptor::read(&out.join("deploy.json")).unwrap();
  assert_eq!(written.service_names().collect::<Vec<_>>(), vec!["web", "worker"]);
  assert!(written.get("web").unwrap().is_empty());

  let worker_dir = dunce::canonicalize(out.join("worker")).unwrap();
  let worker = written.get("worker").unwrap();
  assert_eq!(worker["processes"], json!({ "web": "gunicorn app:app" }));
  assert_eq!(worker["config_vars"]["PYTHONPATH"], json!(worker_dir.to_string_lossy()));
  assert_eq!(written, deploy);
}

#[test]
#[serial]
fn cache_directory_is_shared_across_builds() {
  let env = TestEnv::new("web:\n  type: python\n");
  let pack = env.buildpack("python", RECORDING_COMPILE, None);

  build_stack(&env.builder(), &env.source(), &env.build_dir()).unwrap();
  let first = fs::read_to_string(pack.join("_cache/last-build")).unwrap();

  let second_out = env.temp.path().join("out2");
  build_stack(&env.builder(), &env.source(), &second_out).unwrap();
  let second = fs::read_to_string(pack.join("_cache/last-build")).unwrap();

  assert_ne!(first, second);
  assert!(second.trim().ends_with("out2/web"));
}

#[test]
#[serial]
fn failing_compile_aborts_the_stack() {
  let env = TestEnv::new("api:\n  type: broken\nweb:\n  type: python\n");
  env.buildpack("broken", "#!/bin/sh\necho 'missing toolchain' >&2\nexit 7\n", None);
  env.buildpack("python", RECORDING_COMPILE, None);

  let err = build_stack(&env.builder(), &env.source(), &env.build_dir()).unwrap_err();

  match err {
    StackBuildError::ServiceFailed {
      service,
      source: BuildError::CompileFailed { code, buildpack, .. },
    } => {
      assert_eq!(service, "api");
      assert_eq!(buildpack, "broken");
      assert_eq!(code, Some(7));
    }
    other => panic!("unexpected error: {other}"),
  }
  assert!(!env.build_dir().join("web").exists());
  assert!(!env.build_dir().join("deploy.json").exists());
}

#[test]
#[serial]
fn garbage_release_output_fails() {
  let env = TestEnv::new("web:\n  type: python\n");
  env.buildpack("python", RECORDING_COMPILE, Some("#!/bin/sh\necho '{not: [valid'\n"));

  let err = build_stack(&env.builder(), &env.source(), &env.build_dir()).unwrap_err();

  assert!(matches!(
    err,
    StackBuildError::ServiceFailed {
      source: BuildError::ReleaseFailed { .. },
      ..
    }
  ));
}

#[test]
#[serial]
fn literal_buildpack_path_in_stackfile() {
  let env = TestEnv::new("");
  let pack = env.temp.path().join("elsewhere/ruby");
  write_script(&pack.join("bin/compile"), RECORDING_COMPILE);
  fs::write(env.source().join("Stackfile"), format!("web:\n  type: {}\n", pack.display())).unwrap();

  build_stack(&env.builder(), &env.source(), &env.build_dir()).unwrap();

  assert!(env.build_dir().join("web/compiled").exists());
  assert!(pack.join("_cache/last-build").exists());
}

#[test]
#[serial]
fn unknown_buildpack_fails() {
  let env = TestEnv::new("web:\n  type: stackbrew-test-fortran\n");

  let err = build_stack(&env.builder(), &env.source(), &env.build_dir()).unwrap_err();

  assert!(err.to_string().contains("web"));
  assert!(matches!(
    err,
    StackBuildError::ServiceFailed {
      source: BuildError::Resolve(_),
      ..
    }
  ));
}
