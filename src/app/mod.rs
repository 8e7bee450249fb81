// Application layer - Use case interactors

pub mod container;
pub mod pipeline;
pub mod scenes_interactor;
pub mod summarize_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use scenes_interactor::{ScenesInteractor, ScenesReport, ScenesRequest};
pub use summarize_interactor::{SummarizeInteractor, SummarizeRequest, SummaryReport};
