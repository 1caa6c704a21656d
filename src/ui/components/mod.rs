pub mod dashboard;
pub mod progress_bar;
pub mod stats_dashboard;
pub mod stats_sidebar;
pub mod typing_area;
