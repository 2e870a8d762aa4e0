pub mod confirmation;

pub use confirmation::{confirm, ConfirmationValidator};
