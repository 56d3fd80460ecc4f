// Widget rendering for the repair workflow screens.

pub mod attributes;
pub mod status_bar;
pub mod suggestions;
pub mod summary;
