use std::path::{Path, PathBuf};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::StackError;
use crate::consts::CUSTOM_SERVICE_TYPE;
use crate::util::fs::join_path;

/// Configuration of a single service as written in the stack descriptor.
///
/// Unknown keys are kept in `extra`, in file order, so the configuration can
/// be written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
  /// Buildpack reference. Absent means `custom`.
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,

  /// Service root relative to the stack root.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub approot: Option<PathBuf>,

  /// Build script relative to the stack root (custom services).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub buildscript: Option<PathBuf>,

  #[serde(flatten)]
  pub extra: serde_yaml::Mapping,
}

impl ServiceConfig {
  /// Whether this is an inline `custom` service rather than a buildpack reference.
  pub fn is_custom(&self) -> bool {
    self.kind.as_deref().is_none_or(|kind| kind == CUSTOM_SERVICE_TYPE)
  }

  pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(self)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
  pub name: String,
  pub config: ServiceConfig,
}

impl Service {
  /// The service's root directory inside `source_dir` (`approot`, default `.`).
  pub fn root(&self, source_dir: &Path) -> PathBuf {
    let approot = self.config.approot.as_deref().unwrap_or(Path::new("."));
    join_path([source_dir, approot])
  }

  /// Path of the declared build script inside `source_dir`.
  pub fn buildscript_path(&self, source_dir: &Path) -> Result<PathBuf, StackError> {
    let script = self
      .config
      .buildscript
      .as_deref()
      .ok_or_else(|| StackError::MissingBuildscript(self.name.clone()))?;
    Ok(join_path([source_dir, script]))
  }
}

/// A parsed stack descriptor: services in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stack {
  services: Vec<Service>,
}

impl Stack {
  /// Parse descriptor text. `path` is only used for error context.
  pub fn parse(text: &str, path: &Path) -> Result<Self, StackError> {
    let document: serde_yaml::Value = serde_yaml::from_str(text).map_err(|source| StackError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    let mapping = match document {
      serde_yaml::Value::Null => return Ok(Stack::default()),
      serde_yaml::Value::Mapping(mapping) => mapping,
      _ => return Err(StackError::NotAMapping { path: path.to_path_buf() }),
    };

    let mut services = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
      let name = match key {
        serde_yaml::Value::String(name) => name,
        other => {
          return Err(StackError::InvalidServiceName {
            path: path.to_path_buf(),
            key: serde_yaml::to_string(&other).unwrap_or_default().trim().to_string(),
          });
        }
      };

      let config = match value {
        serde_yaml::Value::Null => ServiceConfig::default(),
        value => serde_yaml::from_value(value).map_err(|source| StackError::InvalidService {
          path: path.to_path_buf(),
          service: name.clone(),
          source,
        })?,
      };

      services.push(Service { name, config });
    }

    Ok(Stack { services })
  }

  pub fn services(&self) -> &[Service] {
    &self.services
  }

  pub fn len(&self) -> usize {
    self.services.len()
  }

  pub fn is_empty(&self) -> bool {
    self.services.is_empty()
  }

  pub fn service(&self, name: &str) -> Result<&Service, StackError> {
    self
      .services
      .iter()
      .find(|service| service.name == name)
      .ok_or_else(|| StackError::ServiceNotFound(name.to_string()))
  }

  pub fn names_sorted(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.services.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    names
  }
}

impl Serialize for Stack {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.services.len()))?;
    for service in &self.services {
      map.serialize_entry(&service.name, &service.config)?;
    }
    map.end()
  }
}
