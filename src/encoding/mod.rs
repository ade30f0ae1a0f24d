//! Encoding between structured dialogue data and numeric form
mod act;
mod state;
mod vocab;

pub use act::{ActCodec, EncodedAct};
pub use state::StateEncoder;
pub use vocab::{Tokenizer, Vocabulary, PAD_ID, UNK_ID};
