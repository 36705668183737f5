//! Tool Studio core: pure job-client state machine, wire types and presenters.
mod effect;
mod job;
mod msg;
mod origin;
mod reply;
mod state;
pub mod submit;
mod update;
mod view_model;

pub use effect::Effect;
pub use job::{
    normalize_logs, Artifact, JobId, JobLogs, JobSnapshot, JobStatus, Payload, SnapshotError,
    NO_LOG_OUTPUT,
};
pub use msg::Msg;
pub use origin::{
    resolve_primary_origin, strip_trailing_slashes, OriginConfig, OriginSlot, QueryParams,
    BACKUP_ORIGIN, DEV_PORT, PRODUCTION_HOST, PRODUCTION_ORIGIN,
};
pub use reply::{FailureKind, HttpReply, TransportError};
pub use state::{AppState, SessionConfig, POLL_INTERVAL};
pub use update::update;
pub use view_model::{
    artifact_download_path, artifact_download_url, encode_path_segment, render_artifacts,
    AppViewModel, ArtifactListView, ArtifactRowView, StatusState, DEFAULT_ARTIFACT_LABEL,
    DEFAULT_ARTIFACT_NAME, NO_ARTIFACTS,
};
