use predicates::prelude::*;
use serde_json::Value;
use serial_test::serial;

use super::common::{MARKER_COMPILE, TestEnv};

const RELEASE: &str = "#!/bin/sh\necho 'processes:'\necho '  web: ./run'\n";

#[test]
#[serial]
fn build_writes_deploy_json() {
  let env = TestEnv::new("www:\n  type: static\napi:\n  type: python\n");
  env.write_source("index.html", "<p>hi</p>");
  env.buildpack("static", MARKER_COMPILE, None);
  env.buildpack("python", MARKER_COMPILE, Some(RELEASE));

  env
    .cmd()
    .arg("build")
    .arg(env.source())
    .arg(env.path("out"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Built 2 service(s)"));

  let out = env.path("out");
  assert!(out.join("www/compiled").exists());
  assert!(out.join("www/index.html").exists());
  assert!(out.join("api/compiled").exists());

  let deploy: Value = serde_json::from_slice(&std::fs::read(out.join("deploy.json")).unwrap()).unwrap();
  let names: Vec<&String> = deploy.as_object().unwrap().keys().collect();
  assert_eq!(names, vec!["www", "api"]);
  assert_eq!(deploy["www"], serde_json::json!({}));
  assert_eq!(deploy["api"]["processes"]["web"], "./run");
}

#[test]
#[serial]
fn build_refuses_existing_build_dir() {
  let env = TestEnv::new("www:\n  type: static\n");
  env.buildpack("static", MARKER_COMPILE, None);
  std::fs::create_dir_all(env.path("out")).unwrap();

  env
    .cmd()
    .arg("build")
    .arg(env.source())
    .arg(env.path("out"))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("build directory already exists"));

  assert!(!env.path("out/www").exists());
}

#[test]
#[serial]
fn build_reports_failing_compile() {
  let env = TestEnv::new("www:\n  type: static\n");
  env.buildpack("static", "#!/bin/sh\nexit 3\n", None);

  env
    .cmd()
    .arg("build")
    .arg(env.source())
    .arg(env.path("out"))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("service 'www'"))
    .stderr(predicate::str::contains("code 3"));

  assert!(!env.path("out/deploy.json").exists());
}

#[test]
#[serial]
fn buildpack_path_flag_overrides_environment() {
  let env = TestEnv::new("www:\n  type: static\n");
  let other = env.path("other-packs");
  super::common::write_script(&other.join("static/bin/compile"), MARKER_COMPILE);

  env
    .cmd()
    .arg("--buildpack-path")
    .arg(&other)
    .arg("build")
    .arg(env.source())
    .arg(env.path("out"))
    .assert()
    .success();

  assert!(other.join("static/_cache").is_dir());
}

#[test]
#[serial]
fn unknown_buildpack_lists_searched_locations() {
  let env = TestEnv::new("www:\n  type: cobol\n");

  env
    .cmd()
    .arg("build")
    .arg(env.source())
    .arg(env.path("out"))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("no such buildpack: 'cobol'"));
}
