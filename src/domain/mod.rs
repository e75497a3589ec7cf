pub mod error;
pub mod model;
pub mod session;

pub use error::AppError;
pub use model::{
    DownloadPhase, DownloadPlan, FetchedVideo, FormatChoice, FormatOption, Thumbnail, VideoInfo,
};
pub use session::{ProgressMeter, Session};
