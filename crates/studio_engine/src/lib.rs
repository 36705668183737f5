//! Tool Studio engine: HTTP client, origin failover and poll scheduling.
mod api;
mod engine;
mod origin;
mod persist;

pub use api::{ClientSettings, DownloadError, JobApi, ReqwestJobApi, ACCESS_KEY_HEADER};
pub use engine::{EngineEvent, EngineHandle};
pub use origin::OriginPool;
pub use persist::{ensure_dir, safe_file_name, AtomicFileWriter, PersistError};
