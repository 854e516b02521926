pub mod footer;
pub mod header;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{format_clock, goal_difference_color, overlay_rect, status_color, truncate};
