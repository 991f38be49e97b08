use std::process::Command;

use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

const STACKFILE: &str = "site:\n  type: custom\n  approot: site\n  buildscript: site/build.sh\n";
const BUILD_SCRIPT: &str = "#!/bin/sh\ntouch \"$1/done\"\n";

#[test]
#[serial]
fn convert_creates_buildpack() {
  let env = TestEnv::new(STACKFILE);
  env.write_source("site/build.sh", BUILD_SCRIPT);
  env.write_source("site/page.html", "<p>page</p>");
  let dest = env.path("site-pack");

  env
    .cmd()
    .arg("convert")
    .arg(env.source())
    .arg("site")
    .arg(&dest)
    .assert()
    .success()
    .stdout(predicate::str::contains("Converted service 'site'"));

  assert_eq!(std::fs::read_to_string(dest.join("bin/compile")).unwrap(), BUILD_SCRIPT);
  assert!(dest.join("page.html").exists());

  let release = Command::new(dest.join("bin/release")).output().unwrap();
  assert!(release.status.success());
  assert!(String::from_utf8_lossy(&release.stdout).contains("buildscript: site/build.sh"));
}

#[test]
#[serial]
fn convert_refuses_existing_destination() {
  let env = TestEnv::new(STACKFILE);
  env.write_source("site/build.sh", BUILD_SCRIPT);
  let dest = env.path("site-pack");
  std::fs::create_dir_all(&dest).unwrap();

  env
    .cmd()
    .arg("convert")
    .arg(env.source())
    .arg("site")
    .arg(&dest)
    .assert()
    .code(1)
    .stderr(predicate::str::contains("destination already exists"));

  assert!(!dest.join("bin").exists());
}

#[test]
#[serial]
fn convert_unknown_service_fails() {
  let env = TestEnv::new(STACKFILE);

  env
    .cmd()
    .arg("convert")
    .arg(env.source())
    .arg("nope")
    .arg(env.path("pack"))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("no such service: nope"));
}
