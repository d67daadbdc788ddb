#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod graph_file;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod text_metrics;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use layout::{LayoutManager, LayoutPhase};
pub use view::GraphView;
