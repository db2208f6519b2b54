//! Collaborators the season database drives: service name resolution,
//! the user interface and remote downloads.

pub mod fetch;
pub mod sync;
pub mod ui;

pub use fetch::{FetchRequest, FetchResponse, HttpSeasonFetcher, RequestKind, SeasonFetcher};
pub use sync::ServiceManager;
pub use ui::{ConsoleUi, SeasonUi};
