mod note;
mod realm;

pub use note::{merge_reply, to_millis, Note, NoteId, NotePatch, UNTITLED};
pub use realm::Realm;
