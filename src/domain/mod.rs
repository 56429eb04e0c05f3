// Domain layer - Raw forecast payload and chart dataset models
pub mod chart;
pub mod forecast;
