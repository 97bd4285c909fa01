use serde::{Deserialize, Serialize};

/// Steps of one commit run, in order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    #[default]
    Idle,
    FetchParent,
    FetchBaseTree,
    CreateBlobs,
    CreateTree,
    CreateCommit,
    UpdateRef,
    Committed,
    Failed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FetchParent => "fetch parent",
            Self::FetchBaseTree => "fetch base tree",
            Self::CreateBlobs => "create blobs",
            Self::CreateTree => "create tree",
            Self::CreateCommit => "create commit",
            Self::UpdateRef => "update ref",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
