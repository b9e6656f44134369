//! Analysis module interface and registry

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::ProcessingError;

/// Format of one named module output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputSpec {
    pub extension: &'static str,
    pub mimetype: &'static str,
    /// Output is split into several numbered parts
    pub parts: bool,
}

impl OutputSpec {
    pub const fn json() -> Self {
        Self {
            extension: "json",
            mimetype: "application/json",
            parts: false,
        }
    }

    pub const fn multipart(self) -> Self {
        Self {
            parts: true,
            ..self
        }
    }
}

/// Data of one output part
#[derive(Debug, Clone, PartialEq)]
pub enum OutputData {
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

impl OutputData {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProcessingError> {
        match self {
            OutputData::Json(value) => Ok(serde_json::to_vec(value)?),
            OutputData::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// `{output name: parts}`. Single-part outputs carry exactly one part.
pub type ModuleOutputs = BTreeMap<String, Vec<OutputData>>;

/// A piece of analysis that turns one source file into named outputs
pub trait AnalysisModule: Send + Sync {
    /// Dotted identifier stored in `modules.module`
    fn module_path(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn slug(&self) -> &'static str;
    fn version(&self) -> &'static str;
    /// Slug of the source file type the module reads
    fn source_type(&self) -> &'static str;

    fn depends(&self) -> Option<&'static str> {
        None
    }

    fn outputs(&self) -> BTreeMap<&'static str, OutputSpec>;

    fn process(&self, source: &Path) -> Result<ModuleOutputs, ProcessingError>;
}

/// Modules available to this server, keyed by module path
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<&'static str, Arc<dyn AnalysisModule>>,
}

impl ModuleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(super::builtin::FileHash));
        registry.register(Arc::new(super::builtin::TagInfo));
        registry
    }

    pub fn register(&mut self, module: Arc<dyn AnalysisModule>) {
        self.modules.insert(module.module_path(), module);
    }

    pub fn get(&self, module_path: &str) -> Option<Arc<dyn AnalysisModule>> {
        self.modules.get(module_path).cloned()
    }

    pub fn module_paths(&self) -> Vec<&'static str> {
        let mut paths: Vec<_> = self.modules.keys().copied().collect();
        paths.sort_unstable();
        paths
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.module_paths())
            .finish()
    }
}

/// Check module outputs against the declared formats
pub fn check_outputs(
    declared: &BTreeMap<&'static str, OutputSpec>,
    outputs: &ModuleOutputs,
) -> Result<(), ProcessingError> {
    for (name, parts) in outputs {
        let spec = declared
            .get(name.as_str())
            .ok_or_else(|| ProcessingError::UnknownOutput(name.clone()))?;
        if parts.is_empty() {
            return Err(ProcessingError::EmptyOutput(name.clone()));
        }
        if !spec.parts && parts.len() > 1 {
            return Err(ProcessingError::NotMultipart(name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn declared() -> BTreeMap<&'static str, OutputSpec> {
        BTreeMap::from([
            ("hash", OutputSpec::json()),
            ("blocks", OutputSpec::json().multipart()),
        ])
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ModuleRegistry::builtin();
        let module = registry.get("dunya.filehash.FileHash").unwrap();
        assert_eq!(module.slug(), "filehash");
        assert!(registry.get("compmusic.extractors.Missing").is_none());
        assert_eq!(registry.module_paths().len(), 2);
    }

    #[test]
    fn test_check_outputs_accepts_declared() {
        let outputs = ModuleOutputs::from([
            ("hash".to_string(), vec![OutputData::Json(json!({}))]),
            (
                "blocks".to_string(),
                vec![OutputData::Json(json!([])), OutputData::Json(json!([]))],
            ),
        ]);
        assert!(check_outputs(&declared(), &outputs).is_ok());
    }

    #[test]
    fn test_check_outputs_rejects_unknown_and_extra_parts() {
        let unknown = ModuleOutputs::from([("pitch".to_string(), vec![OutputData::Bytes(vec![1])])]);
        assert!(matches!(
            check_outputs(&declared(), &unknown),
            Err(ProcessingError::UnknownOutput(_))
        ));

        let too_many = ModuleOutputs::from([(
            "hash".to_string(),
            vec![OutputData::Bytes(vec![1]), OutputData::Bytes(vec![2])],
        )]);
        assert!(matches!(
            check_outputs(&declared(), &too_many),
            Err(ProcessingError::NotMultipart(_))
        ));
    }

    #[test]
    fn test_json_output_serialises() {
        let bytes = OutputData::Json(json!({"a": 1})).to_bytes().unwrap();
        assert_eq!(bytes, br#"{"a":1}"#);
    }
}
