pub use self::{helpers::*, structs_and_traits::*};

mod helpers;
mod structs_and_traits;
