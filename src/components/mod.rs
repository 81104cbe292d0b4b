pub mod dialogs;
pub mod palette;
pub mod toast;
