pub mod search_input;
pub mod status_bar;
pub mod toast;
