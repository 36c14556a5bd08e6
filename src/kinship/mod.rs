pub use self::{allele_freq::*, estimate::*, rescale::*};

mod allele_freq;
mod estimate;
mod rescale;
