use serde::{Deserialize, Serialize};

use crate::{BuildId, VmSeqId};

/// Metadata of one build attempt handed to a worker process.
///
/// Immutable once the worker is registered; the tracker only ever hands out clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// Owning project.
    #[serde(default)]
    pub project_id: String,
    /// Unique build attempt identifier.
    pub build_id: BuildId,
    /// Executor slot on this host.
    pub vm_seq_id: VmSeqId,
    /// Pipeline the build belongs to.
    #[serde(default)]
    pub pipeline_id: String,
    /// Workspace directory the worker runs in.
    #[serde(default)]
    pub workspace: String,
    /// How many times the control plane has executed this build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_count: Option<u32>,
    /// Container hash of the job the build runs for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_hash_id: Option<String>,
    /// Temporary files the control plane asked to have deleted. Carried through to the
    /// completion report untouched; this crate never removes them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_del_tmp_files: Vec<String>,
}

impl BuildInfo {
    /// Minimal build info: identifier plus executor slot.
    pub fn new(build_id: impl Into<BuildId>, vm_seq_id: VmSeqId) -> Self {
        Self {
            project_id: String::new(),
            build_id: build_id.into(),
            vm_seq_id,
            pipeline_id: String::new(),
            workspace: String::new(),
            execute_count: None,
            container_hash_id: None,
            to_del_tmp_files: Vec::new(),
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn with_pipeline(mut self, pipeline_id: impl Into<String>) -> Self {
        self.pipeline_id = pipeline_id.into();
        self
    }

    pub fn with_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = workspace.into();
        self
    }

    pub fn with_execute_count(mut self, count: u32) -> Self {
        self.execute_count = Some(count);
        self
    }

    pub fn with_container_hash(mut self, hash: impl Into<String>) -> Self {
        self.container_hash_id = Some(hash.into());
        self
    }

    pub fn with_tmp_file(mut self, path: impl Into<String>) -> Self {
        self.to_del_tmp_files.push(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_camel_case() {
        let info = BuildInfo::new("b-1", 3)
            .with_project("demo")
            .with_pipeline("p-9")
            .with_execute_count(2);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["buildId"], "b-1");
        assert_eq!(json["vmSeqId"], 3);
        assert_eq!(json["projectId"], "demo");
        assert_eq!(json["pipelineId"], "p-9");
        assert_eq!(json["executeCount"], 2);
        assert!(json.get("containerHashId").is_none());
        assert!(json.get("toDelTmpFiles").is_none());
    }

    #[test]
    fn container_and_tmp_files_pass_through() {
        let info = BuildInfo::new("b-2", 1)
            .with_container_hash("sha256:abc")
            .with_tmp_file("/tmp/b-2.tar")
            .with_tmp_file("/tmp/b-2.env");

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["containerHashId"], "sha256:abc");
        assert_eq!(
            json["toDelTmpFiles"],
            serde_json::json!(["/tmp/b-2.tar", "/tmp/b-2.env"])
        );

        let back: BuildInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn minimal_payload_deserializes() {
        let info: BuildInfo = serde_json::from_str(r#"{"buildId":"b-7","vmSeqId":1}"#).unwrap();
        assert_eq!(info, BuildInfo::new("b-7", 1));
    }
}
