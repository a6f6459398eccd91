//! Testing utilities for stillshot
//!
//! Synthetic frames plus mock collaborators, so the whole screen can run
//! without camera hardware or a permission dialog.

pub mod mock;
pub mod synthetic_data;

pub use mock::{MockPermissionRequester, MockProvider, MockProviderState};
pub use synthetic_data::{synthetic_video_frame, SyntheticSource};
