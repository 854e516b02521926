mod command_input;
mod filter_tabs;
mod input;
mod key_result;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use filter_tabs::{FilterTabs, FilterTabsEvent};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
