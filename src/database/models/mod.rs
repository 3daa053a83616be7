pub mod account;
pub mod person;

pub use account::Account;
pub use person::{PatchError, Person, PersonInput, PersonPatch};
