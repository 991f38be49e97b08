//! Types for service and stack builds.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_yaml::Value as Yaml;
use serde_yaml::value::TaggedValue;
use thiserror::Error;

use crate::buildpack::{CacheError, ResolveError};

/// Release metadata emitted by a buildpack's `bin/release`, in output order.
pub type ReleaseMetadata = Map<String, Value>;

/// Why a release step could not produce metadata.
#[derive(Debug, Error)]
pub enum ReleaseFailure {
  #[error("{}", describe_exit(.0))]
  Exit(Option<i32>),

  #[error("output is not valid UTF-8: {0}")]
  Utf8(#[source] std::str::Utf8Error),

  #[error("output is not valid YAML: {0}")]
  Parse(#[source] serde_yaml::Error),

  #[error("output is {0}, expected a mapping")]
  NotAMapping(&'static str),

  #[error("output uses a sequence or mapping as a mapping key")]
  NonScalarKey,
}

/// Errors that can occur while building a single service.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Cache(#[from] CacheError),

  /// The resolved directory has no `bin/compile`.
  #[error("buildpack '{buildpack}' at '{}' has no bin/compile", .dir.display())]
  InvalidBuildpack { buildpack: String, dir: PathBuf },

  #[error("failed to run '{}': {source}", .program.display())]
  Spawn {
    program: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("compile step for service '{service}' {} (buildpack '{buildpack}')", describe_exit(.code))]
  CompileFailed {
    service: String,
    buildpack: String,
    code: Option<i32>,
  },

  #[error("release step for service '{service}' failed (buildpack '{buildpack}'): {reason}")]
  ReleaseFailed {
    service: String,
    buildpack: String,
    #[source]
    reason: ReleaseFailure,
  },
}

fn describe_exit(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exited with code {}", code),
    None => "was terminated by a signal".to_string(),
  }
}

/// Parse the standard output of `bin/release`.
///
/// The output must be a YAML (or JSON) mapping. Blank output means no
/// metadata. Scalar keys that are not strings (`8080: web`, `true: x`) are
/// turned into their string form; sequence or mapping keys are rejected.
pub fn parse_release(stdout: &[u8]) -> Result<ReleaseMetadata, ReleaseFailure> {
  let text = std::str::from_utf8(stdout).map_err(ReleaseFailure::Utf8)?;
  if text.trim().is_empty() {
    return Ok(ReleaseMetadata::new());
  }

  match untag(serde_yaml::from_str::<Yaml>(text).map_err(ReleaseFailure::Parse)?) {
    Yaml::Mapping(mapping) => mapping_to_json(mapping),
    Yaml::Null => Ok(ReleaseMetadata::new()),
    Yaml::Sequence(_) => Err(ReleaseFailure::NotAMapping("a sequence")),
    Yaml::String(_) => Err(ReleaseFailure::NotAMapping("a string")),
    Yaml::Number(_) => Err(ReleaseFailure::NotAMapping("a number")),
    Yaml::Bool(_) => Err(ReleaseFailure::NotAMapping("a boolean")),
    Yaml::Tagged(_) => Err(ReleaseFailure::NotAMapping("a tagged value")),
  }
}

fn untag(value: Yaml) -> Yaml {
  match value {
    Yaml::Tagged(tagged) => {
      let TaggedValue { value, .. } = *tagged;
      untag(value)
    }
    other => other,
  }
}

fn mapping_to_json(mapping: serde_yaml::Mapping) -> Result<ReleaseMetadata, ReleaseFailure> {
  let mut map = ReleaseMetadata::new();
  for (key, value) in mapping {
    map.insert(key_to_string(key)?, yaml_to_json(value)?);
  }
  Ok(map)
}

fn key_to_string(key: Yaml) -> Result<String, ReleaseFailure> {
  match untag(key) {
    Yaml::String(key) => Ok(key),
    Yaml::Number(key) => Ok(key.to_string()),
    Yaml::Bool(key) => Ok(key.to_string()),
    Yaml::Null => Ok("null".to_string()),
    _ => Err(ReleaseFailure::NonScalarKey),
  }
}

fn yaml_to_json(value: Yaml) -> Result<Value, ReleaseFailure> {
  Ok(match value {
    Yaml::Null => Value::Null,
    Yaml::Bool(value) => Value::Bool(value),
    Yaml::Number(number) => {
      if let Some(int) = number.as_i64() {
        Value::from(int)
      } else if let Some(uint) = number.as_u64() {
        Value::from(uint)
      } else {
        // NaN and infinities have no JSON form.
        number
          .as_f64()
          .and_then(serde_json::Number::from_f64)
          .map_or(Value::Null, Value::Number)
      }
    }
    Yaml::String(value) => Value::String(value),
    Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect::<Result<_, _>>()?),
    Yaml::Mapping(mapping) => Value::Object(mapping_to_json(mapping)?),
    Yaml::Tagged(tagged) => {
      let TaggedValue { value, .. } = *tagged;
      yaml_to_json(value)?
    }
  })
}

/// The merged release metadata of every service in a stack, written to
/// `deploy.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployDescriptor {
  services: Map<String, Value>,
}

impl DeployDescriptor {
  pub fn insert(&mut self, service: &str, metadata: ReleaseMetadata) {
    self.services.insert(service.to_string(), Value::Object(metadata));
  }

  pub fn get(&self, service: &str) -> Option<&ReleaseMetadata> {
    self.services.get(service).and_then(Value::as_object)
  }

  pub fn service_names(&self) -> impl Iterator<Item = &str> {
    self.services.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.services.len()
  }

  pub fn is_empty(&self) -> bool {
    self.services.is_empty()
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }

  pub fn read(path: &Path) -> io::Result<Self> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(io::Error::other)
  }
}
