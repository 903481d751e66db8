pub mod time_slot;
pub mod validation;
