// Profile resource: upsert, public lookup, embedded experience/education
// lists, account deletion and the GitHub repo proxy.

pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod store;
pub mod validation;
