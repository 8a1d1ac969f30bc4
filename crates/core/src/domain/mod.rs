pub mod pick;
pub mod roster;
