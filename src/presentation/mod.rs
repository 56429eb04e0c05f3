// Presentation layer - HTTP surface read by the chart renderer
pub mod app_state;
pub mod chart_publisher;
pub mod handlers;
