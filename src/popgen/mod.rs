pub use self::{fst::*, weights::*};

mod fst;
mod weights;
