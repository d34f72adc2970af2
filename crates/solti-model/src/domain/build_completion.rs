use serde::{Deserialize, Serialize};

use crate::BuildInfo;

/// Terminal status of a build worker, produced once per registered build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCompletion {
    #[serde(flatten)]
    pub build: BuildInfo,
    pub success: bool,
    /// Either `worker pid[..] exit` or the failure text.
    pub message: String,
}

impl BuildCompletion {
    pub fn succeeded(build: BuildInfo, message: impl Into<String>) -> Self {
        Self {
            build,
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(build: BuildInfo, message: impl Into<String>) -> Self {
        Self {
            build,
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_fields_are_flattened() {
        let done = BuildCompletion::succeeded(BuildInfo::new("b1", 1), "worker pid[100] exit");
        let json = serde_json::to_value(&done).unwrap();

        assert_eq!(json["buildId"], "b1");
        assert_eq!(json["vmSeqId"], 1);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "worker pid[100] exit");
        assert!(json.get("build").is_none());
    }

    #[test]
    fn failed_sets_flag() {
        let done = BuildCompletion::failed(BuildInfo::new("b2", 2), "killed");
        assert!(!done.success);
        assert_eq!(done.message, "killed");
    }
}
